//! Per-table migration: translate the schema, recreate the table, copy rows.
//!
//! Tables are handled one at a time and rows one batch at a time. A DDL
//! failure abandons the current table only; a failed batch is rolled back
//! and skipped while the remaining batches continue.

pub mod timestamp;

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::core::schema::Table;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::mysql::MysqlDialect;
use crate::error::{MigrateError, Result};
use crate::typemap::{build_column_spec, TargetColumnSpec, TranslationWarning};

use self::timestamp::normalize_epoch_column;

/// SQLite's AUTOINCREMENT bookkeeping table.
pub const SEQUENCE_TABLE: &str = "sqlite_sequence";

/// Prefix of SQLite's implicit index objects.
pub const AUTOINDEX_PREFIX: &str = "sqlite_autoindex_";

/// Why a table was not migrated.
pub fn skip_reason(table: &str, config: &MigrationConfig) -> Option<&'static str> {
    if table == SEQUENCE_TABLE || table.starts_with(AUTOINDEX_PREFIX) {
        Some("internal SQLite table")
    } else if !config.is_table_selected(table) {
        Some("excluded by table filter")
    } else {
        None
    }
}

/// Final state of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    /// DDL succeeded; batches may still have failed individually.
    Migrated,
    Skipped { reason: String },
    /// DDL failed, no rows were copied.
    Failed { reason: String },
}

/// Outcome of migrating one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    pub table: String,

    #[serde(flatten)]
    pub status: TableStatus,

    /// Rows read from the source and offered to the target.
    pub rows_attempted: u64,

    /// Rows in batches that committed.
    pub rows_committed: u64,

    /// Rows the target actually stored (committed minus ignored duplicates).
    pub rows_inserted: u64,

    pub batches_total: usize,
    pub batches_succeeded: usize,

    /// Wall time spent on this table.
    pub duration_seconds: f64,

    pub warnings: Vec<TranslationWarning>,
}

impl TableOutcome {
    fn new(table: &str, status: TableStatus) -> Self {
        Self {
            table: table.to_string(),
            status,
            rows_attempted: 0,
            rows_committed: 0,
            rows_inserted: 0,
            batches_total: 0,
            batches_succeeded: 0,
            duration_seconds: 0.0,
            warnings: Vec::new(),
        }
    }

    fn failed(table: &str, err: MigrateError, warnings: Vec<TranslationWarning>) -> Self {
        error!("{}", err);
        let mut outcome = Self::new(
            table,
            TableStatus::Failed {
                reason: err.to_string(),
            },
        );
        outcome.warnings = warnings;
        outcome
    }

    /// Batches that were rolled back.
    pub fn batches_failed(&self) -> usize {
        self.batches_total - self.batches_succeeded
    }

    /// Committed rows the target skipped as duplicates.
    pub fn rows_ignored(&self) -> u64 {
        self.rows_committed.saturating_sub(self.rows_inserted)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TableStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, TableStatus::Skipped { .. })
    }
}

/// Translated schema for one table, before anything touches the target.
#[derive(Debug, Clone, Serialize)]
pub struct TablePlan {
    pub table: String,
    pub columns: Vec<TargetColumnSpec>,
    pub create_sql: String,
    pub warnings: Vec<TranslationWarning>,
}

impl TablePlan {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Migrates single tables from a source reader to a target writer.
pub struct TableMigrator<'a> {
    config: &'a MigrationConfig,
    dialect: MysqlDialect,
}

impl<'a> TableMigrator<'a> {
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self {
            config,
            dialect: MysqlDialect::new(),
        }
    }

    /// Translate introspected table metadata into a CREATE TABLE statement.
    ///
    /// Failures are table-fatal and come back as [`MigrateError::Ddl`].
    pub fn plan(&self, table: &Table) -> Result<TablePlan> {
        self.translate(table)
            .map_err(|e| MigrateError::ddl(&table.name, e))
    }

    fn translate(&self, table: &Table) -> Result<TablePlan> {
        let mut columns = Vec::with_capacity(table.columns.len());
        let mut warnings = Vec::new();
        let mut unique_columns: Vec<&str> = Vec::new();

        for column in &table.columns {
            let is_unique = table.is_single_column_unique(&column.name);
            if is_unique && !column.is_primary_key() {
                unique_columns.push(&column.name);
            }
            let build = build_column_spec(column, &table.name, is_unique)?;
            warnings.extend(build.warnings);
            columns.push(build.spec);
        }

        for index in table.composite_unique_indexes() {
            warnings.push(TranslationWarning::CompositeUniqueDropped {
                table: table.name.clone(),
                index: index.name.clone(),
                columns: index.columns.clone(),
            });
        }

        let definitions: Vec<String> = columns.iter().map(|c| c.definition.clone()).collect();
        let create_sql = self.dialect.build_create_table(
            &table.name,
            &definitions,
            &table.primary_key(),
            &unique_columns,
        )?;

        Ok(TablePlan {
            table: table.name.clone(),
            columns,
            create_sql,
            warnings,
        })
    }

    /// Introspect a table and plan it.
    pub async fn plan_table(&self, source: &dyn SourceReader, name: &str) -> Result<TablePlan> {
        let table = source.load_table(name).await?;
        self.plan(&table)
    }

    /// Migrate one table end to end.
    ///
    /// Returns `Err` only for failures outside this table's control (the
    /// source became unreadable). DDL failures come back as a
    /// [`TableStatus::Failed`] outcome.
    pub async fn migrate(
        &self,
        source: &dyn SourceReader,
        target: &mut dyn TargetWriter,
        name: &str,
    ) -> Result<TableOutcome> {
        if let Some(reason) = skip_reason(name, self.config) {
            debug!("Skipping {}: {}", name, reason);
            return Ok(TableOutcome::new(
                name,
                TableStatus::Skipped {
                    reason: reason.to_string(),
                },
            ));
        }

        let started = Instant::now();
        info!("Migrating table: {}", name);

        let table = source.load_table(name).await?;
        let mut outcome = match self.plan(&table) {
            Ok(plan) => {
                for warning in &plan.warnings {
                    warn!("{}", warning);
                }
                match self.recreate(&plan, target).await {
                    Ok(()) => {
                        let mut outcome = TableOutcome::new(name, TableStatus::Migrated);
                        outcome.warnings = plan.warnings.clone();
                        self.copy_rows(source, target, &plan, &mut outcome).await?;
                        outcome
                    }
                    Err(e) => TableOutcome::failed(name, e, plan.warnings),
                }
            }
            Err(e) => TableOutcome::failed(name, e, Vec::new()),
        };

        outcome.duration_seconds = started.elapsed().as_secs_f64();
        if !outcome.is_failed() {
            info!(
                "{}: {} rows attempted, {} inserted, {} ignored; {}/{} batches committed",
                name,
                outcome.rows_attempted,
                outcome.rows_inserted,
                outcome.rows_ignored(),
                outcome.batches_succeeded,
                outcome.batches_total
            );
        }
        Ok(outcome)
    }

    /// Drop and recreate the target table. Any failure here is table-fatal.
    async fn recreate(&self, plan: &TablePlan, target: &mut dyn TargetWriter) -> Result<()> {
        target
            .drop_table(&plan.table)
            .await
            .map_err(|e| MigrateError::ddl(&plan.table, e))?;
        debug!("{}", plan.create_sql);
        target
            .create_table(&plan.create_sql)
            .await
            .map_err(|e| MigrateError::ddl(&plan.table, e))
    }

    async fn copy_rows(
        &self,
        source: &dyn SourceReader,
        target: &mut dyn TargetWriter,
        plan: &TablePlan,
        outcome: &mut TableOutcome,
    ) -> Result<()> {
        let columns = plan.column_names();
        let mut rows = source.read_rows(&plan.table, &columns).await?;
        outcome.rows_attempted = rows.len() as u64;

        if rows.is_empty() {
            info!("{}: no rows to copy", plan.table);
            return Ok(());
        }

        if plan.table == self.config.migrations_log_table {
            let index = self.config.migrations_log_timestamp_column;
            let column = columns.get(index).map(String::as_str).unwrap_or_default();
            let warnings = normalize_epoch_column(
                &mut rows,
                index,
                self.config.epoch_millis_threshold,
                &plan.table,
                column,
            );
            outcome.warnings.extend(warnings);
        }

        for (i, batch) in rows.chunks(self.config.batch_size.max(1)).enumerate() {
            let number = i + 1;
            outcome.batches_total += 1;

            match target.insert_ignore_batch(&plan.table, &columns, batch).await {
                Ok(inserted) => {
                    outcome.batches_succeeded += 1;
                    outcome.rows_committed += batch.len() as u64;
                    outcome.rows_inserted += inserted;
                    debug!(
                        "{}: batch {} committed ({} rows, {} inserted)",
                        plan.table,
                        number,
                        batch.len(),
                        inserted
                    );
                }
                Err(e) => {
                    let err = MigrateError::batch_insert(&plan.table, number, e);
                    error!("{}; batch rolled back and skipped", err);
                }
            }
        }

        Ok(())
    }
}
