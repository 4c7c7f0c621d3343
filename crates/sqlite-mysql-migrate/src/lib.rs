//! # sqlite-mysql-migrate
//!
//! SQLite to MySQL/MariaDB schema and data migration library.
//!
//! The library translates every user table of a SQLite database into a
//! MySQL table and copies its rows:
//!
//! - **Type mapping** from SQLite's free-form declarations to MySQL types
//! - **Default translation** with integer-range widening
//! - **Primary key and unique constraints** carried over per column
//! - **Batched, duplicate-tolerant inserts** with per-batch rollback
//! - **Dry-run planning** that renders DDL without touching the target
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlite_mysql_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlite_mysql_migrate::MigrateError> {
//!     let config = Config::from_env()?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("Migrated {} rows", result.rows_inserted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod transfer;
pub mod typemap;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result, Severity};
pub use orchestrator::{DryRunResult, HealthCheckResult, MigrationResult, Orchestrator, PlanFailure};
pub use transfer::{TableMigrator, TableOutcome, TablePlan, TableStatus};
pub use typemap::{map_type, TranslationWarning};
