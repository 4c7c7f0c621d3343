//! Configuration type definitions with environment-driven defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (SQLite).
    #[serde(default)]
    pub source: SourceConfig,

    /// Target database configuration (MySQL/MariaDB).
    #[serde(default)]
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (SQLite) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

/// Target database (MySQL/MariaDB) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,

    /// Username.
    #[serde(default = "default_user")]
    pub user: String,

    /// Password.
    #[serde(default = "default_password")]
    pub password: String,

    /// SSL mode: disable, prefer, require (default: "disable").
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_mysql_port(),
            database: default_database(),
            user: default_user(),
            password: default_password(),
            ssl_mode: default_ssl_mode(),
        }
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per INSERT batch (default: 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Table whose timestamp column holds epoch values (default: knex_migrations).
    #[serde(default = "default_migrations_log_table")]
    pub migrations_log_table: String,

    /// Zero-based index of the epoch column in that table (default: 3).
    #[serde(default = "default_migrations_log_timestamp_column")]
    pub migrations_log_timestamp_column: usize,

    /// Epoch values above this are read as milliseconds.
    #[serde(default = "default_epoch_millis_threshold")]
    pub epoch_millis_threshold: i64,

    /// Only migrate these tables (empty means all).
    #[serde(default)]
    pub include_tables: Vec<String>,

    /// Never migrate these tables.
    #[serde(default)]
    pub exclude_tables: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            migrations_log_table: default_migrations_log_table(),
            migrations_log_timestamp_column: default_migrations_log_timestamp_column(),
            epoch_millis_threshold: default_epoch_millis_threshold(),
            include_tables: Vec::new(),
            exclude_tables: Vec::new(),
        }
    }
}

impl MigrationConfig {
    /// Check the include/exclude lists for a table name (case-insensitive).
    pub fn is_table_selected(&self, table: &str) -> bool {
        let listed = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(table));
        if !self.include_tables.is_empty() && !listed(&self.include_tables) {
            return false;
        }
        !listed(&self.exclude_tables)
    }
}

// Default value functions for serde
pub(crate) fn default_sqlite_path() -> PathBuf {
    PathBuf::from("kuma.db")
}

pub(crate) fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub(crate) fn default_mysql_port() -> u16 {
    3306
}

pub(crate) fn default_database() -> String {
    "kumadb".to_string()
}

pub(crate) fn default_user() -> String {
    "kuma".to_string()
}

pub(crate) fn default_password() -> String {
    "secret".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_migrations_log_table() -> String {
    "knex_migrations".to_string()
}

fn default_migrations_log_timestamp_column() -> usize {
    3
}

fn default_epoch_millis_threshold() -> i64 {
    4_000_000_000
}
