//! Migration orchestrator - main workflow coordinator.
//!
//! Opens both stores, disables foreign key checks, migrates every user table
//! in catalog order, and always tears the session down on the way out.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::mysql::MysqlWriter;
use crate::drivers::sqlite::SqliteReader;
use crate::error::{MigrateError, Result, Severity};
use crate::transfer::{skip_reason, TableMigrator, TableOutcome, TablePlan};

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Box<dyn SourceReader>,
    target: Box<dyn TargetWriter>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: `completed` or `completed_with_errors`.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Tables found in the source, internal ones included.
    pub tables_total: usize,

    /// Tables whose DDL succeeded.
    pub tables_success: usize,

    pub tables_skipped: usize,

    /// Tables that failed.
    pub tables_failed: usize,

    pub rows_attempted: u64,

    /// Rows in committed batches.
    pub rows_committed: u64,

    /// Rows actually stored by the target.
    pub rows_inserted: u64,

    /// Rows skipped by the target as duplicates.
    pub rows_ignored: u64,

    pub batches_total: usize,
    pub batches_failed: usize,

    /// Average throughput (rows/second).
    pub rows_per_second: i64,

    /// List of failed table names.
    pub failed_tables: Vec<String>,

    /// Per-table detail in migration order.
    pub tables: Vec<TableOutcome>,
}

impl MigrationResult {
    fn from_outcomes(
        run_id: String,
        started_at: DateTime<Utc>,
        duration_seconds: f64,
        tables: Vec<TableOutcome>,
    ) -> Self {
        let failed_tables: Vec<String> = tables
            .iter()
            .filter(|t| t.is_failed())
            .map(|t| t.table.clone())
            .collect();
        let tables_skipped = tables.iter().filter(|t| t.is_skipped()).count();
        let rows_inserted: u64 = tables.iter().map(|t| t.rows_inserted).sum();
        let rows_per_second = if duration_seconds > 0.0 {
            (rows_inserted as f64 / duration_seconds) as i64
        } else {
            0
        };
        let status = if failed_tables.is_empty() && tables.iter().all(|t| t.batches_failed() == 0) {
            "completed"
        } else {
            "completed_with_errors"
        };

        Self {
            run_id,
            status: status.to_string(),
            duration_seconds,
            started_at,
            completed_at: Utc::now(),
            tables_total: tables.len(),
            tables_success: tables.len() - tables_skipped - failed_tables.len(),
            tables_skipped,
            tables_failed: failed_tables.len(),
            rows_attempted: tables.iter().map(|t| t.rows_attempted).sum(),
            rows_committed: tables.iter().map(|t| t.rows_committed).sum(),
            rows_inserted,
            rows_ignored: tables.iter().map(|t| t.rows_ignored()).sum(),
            batches_total: tables.iter().map(|t| t.batches_total).sum(),
            batches_failed: tables.iter().map(|t| t.batches_failed()).sum(),
            rows_per_second,
            failed_tables,
            tables,
        }
    }

    /// Check whether any table failed outright.
    pub fn has_failures(&self) -> bool {
        !self.failed_tables.is_empty()
    }

    /// Serialize the result as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of a dry run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DryRunResult {
    /// Translated tables in catalog order.
    pub plans: Vec<TablePlan>,

    /// Tables that could not be translated.
    pub failed_tables: Vec<PlanFailure>,
}

impl DryRunResult {
    /// Check whether any table failed to translate.
    pub fn has_failures(&self) -> bool {
        !self.failed_tables.is_empty()
    }
}

/// A table a dry run could not translate.
#[derive(Debug, Clone, Serialize)]
pub struct PlanFailure {
    pub table: String,
    pub reason: String,
}

/// Connectivity report for both stores.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl Orchestrator {
    /// Connect to the source, then the target.
    ///
    /// If the target cannot be reached the already open source is closed
    /// before the error is returned.
    pub async fn new(config: Config) -> Result<Self> {
        let source = SqliteReader::connect(&config.source).await?;
        let target = match MysqlWriter::connect(&config.target).await {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        Ok(Self::with_stores(config, Box::new(source), Box::new(target)))
    }

    /// Build an orchestrator over already opened stores.
    pub fn with_stores(
        config: Config,
        source: Box<dyn SourceReader>,
        target: Box<dyn TargetWriter>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    /// Run the migration.
    ///
    /// Table-level failures are reported in the result. Any other failure
    /// rolls back the open transaction and is returned after teardown.
    pub async fn run(mut self) -> Result<MigrationResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Starting migration run: {}", run_id);

        if let Err(e) = self.target.set_foreign_key_checks(false).await {
            warn!("Could not disable foreign key checks, continuing: {}", e);
        }

        let mut outcomes = Vec::new();
        let run = self.migrate_tables(&mut outcomes).await;

        if let Err(ref e) = run {
            error!("Migration aborted: {}", e);
            if let Err(rb) = self.target.rollback().await {
                warn!("Rollback after abort failed: {}", rb);
            }
        }

        self.teardown().await;

        let result = MigrationResult::from_outcomes(
            run_id,
            started_at,
            start.elapsed().as_secs_f64(),
            outcomes,
        );
        Self::log_summary(&result);

        run.map(|()| result)
            .map_err(|e| match e {
                MigrateError::Source(inner) => MigrateError::TopLevel(inner.to_string()),
                other => other,
            })
    }

    async fn migrate_tables(&mut self, outcomes: &mut Vec<TableOutcome>) -> Result<()> {
        let tables = self.source.list_tables().await?;
        info!("Found {} tables in source", tables.len());

        let migrator = TableMigrator::new(&self.config.migration);
        for name in &tables {
            let outcome = migrator
                .migrate(self.source.as_ref(), self.target.as_mut(), name)
                .await?;
            outcomes.push(outcome);
        }
        Ok(())
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.target.set_foreign_key_checks(true).await {
            warn!("Could not re-enable foreign key checks: {}", e);
        }
        self.target.close().await;
        self.source.close().await;
        info!("Connections closed");
    }

    fn log_summary(result: &MigrationResult) {
        info!(
            "Run {} {}: {}/{} tables migrated, {} skipped, {} failed; {} rows inserted, {} ignored; {}/{} batches committed in {:.2}s",
            result.run_id,
            result.status,
            result.tables_success,
            result.tables_total,
            result.tables_skipped,
            result.tables_failed,
            result.rows_inserted,
            result.rows_ignored,
            result.batches_total - result.batches_failed,
            result.batches_total,
            result.duration_seconds
        );
        if result.has_failures() {
            warn!("Failed tables: {:?}", result.failed_tables);
        }
    }

    /// Translate every selected table without touching the target.
    pub async fn plan(config: &Config) -> Result<DryRunResult> {
        let source = SqliteReader::connect(&config.source).await?;
        let result = Self::plan_with(&source, config).await;
        source.close().await;
        result
    }

    /// Plan every selected table of an open source.
    ///
    /// A table that cannot be translated is recorded and the dry run moves
    /// on, the same way a real run abandons only that table.
    pub async fn plan_with(source: &dyn SourceReader, config: &Config) -> Result<DryRunResult> {
        let migrator = TableMigrator::new(&config.migration);
        let mut result = DryRunResult::default();
        for name in source.list_tables().await? {
            if skip_reason(&name, &config.migration).is_some() {
                continue;
            }
            match migrator.plan_table(source, &name).await {
                Ok(plan) => result.plans.push(plan),
                Err(e) if e.severity() == Severity::Table => {
                    error!("{}", e);
                    result.failed_tables.push(PlanFailure {
                        table: name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Connect to both stores and time a round trip on each.
    pub async fn health_check(config: &Config) -> HealthCheckResult {
        let start = Instant::now();
        let source = match SqliteReader::connect(&config.source).await {
            Ok(reader) => {
                let pinged = reader.ping().await;
                reader.close().await;
                pinged
            }
            Err(e) => Err(e),
        };
        let source_latency_ms = start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let target = match MysqlWriter::connect(&config.target).await {
            Ok(mut writer) => {
                let pinged = writer.ping().await;
                writer.close().await;
                pinged
            }
            Err(e) => Err(e),
        };
        let target_latency_ms = start.elapsed().as_millis() as u64;

        HealthCheckResult {
            source_connected: source.is_ok(),
            source_latency_ms,
            target_connected: target.is_ok(),
            target_latency_ms,
            healthy: source.is_ok() && target.is_ok(),
            source_error: source.err().map(|e| e.to_string()),
            target_error: target.err().map(|e| e.to_string()),
        }
    }
}
