//! Error types for the migration library.
//!
//! Every failure the migration can hit belongs to one of a closed set of kinds.
//! [`MigrateError::severity`] tells callers how far a failure reaches: the whole
//! run, one table, one batch, or one row.

use thiserror::Error;

/// How far a failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The whole run is aborted (after teardown).
    Run,
    /// Only the current table is abandoned.
    Table,
    /// The current batch is rolled back and skipped.
    Batch,
    /// A single field is nulled; the row is still written.
    Row,
    /// Logged, nothing is skipped.
    Warning,
}

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store could not be reached at startup.
    #[error("Cannot connect to {store}: {message}")]
    Connection { store: String, message: String },

    /// Enabling or disabling foreign key checks failed.
    #[error("Failed to toggle foreign key checks: {0}")]
    IntegrityToggle(String),

    /// DROP/CREATE for a table failed.
    #[error("DDL failed for table {table}: {message}")]
    Ddl { table: String, message: String },

    /// A batch insert failed and was rolled back.
    #[error("Insert failed for table {table} (batch {batch}): {message}")]
    BatchInsert {
        table: String,
        batch: usize,
        message: String,
    },

    /// A single value could not be transformed.
    #[error("Cannot transform {table}.{column}: {message}")]
    RowTransform {
        table: String,
        column: String,
        message: String,
    },

    /// Source database query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// Target database query error
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// Unexpected failure while driving the run.
    #[error("Migration aborted: {0}")]
    TopLevel(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error for the named store.
    pub fn connection(store: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Connection {
            store: store.into(),
            message: message.to_string(),
        }
    }

    /// Create a Ddl error.
    pub fn ddl(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        MigrateError::Ddl {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Create a BatchInsert error.
    pub fn batch_insert(table: impl Into<String>, batch: usize, message: impl std::fmt::Display) -> Self {
        MigrateError::BatchInsert {
            table: table.into(),
            batch,
            message: message.to_string(),
        }
    }

    /// Create a RowTransform error.
    pub fn row_transform(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        MigrateError::RowTransform {
            table: table.into(),
            column: column.into(),
            message: message.to_string(),
        }
    }

    /// Classify how far this failure reaches.
    pub fn severity(&self) -> Severity {
        match self {
            MigrateError::IntegrityToggle(_) => Severity::Warning,
            MigrateError::Ddl { .. } => Severity::Table,
            MigrateError::BatchInsert { .. } => Severity::Batch,
            MigrateError::RowTransform { .. } => Severity::Row,
            MigrateError::Config(_)
            | MigrateError::Connection { .. }
            | MigrateError::Source(_)
            | MigrateError::Target(_)
            | MigrateError::TopLevel(_)
            | MigrateError::Io(_)
            | MigrateError::Yaml(_)
            | MigrateError::Json(_) => Severity::Run,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Io(_) => 2,
            MigrateError::Connection { .. } => 3,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
