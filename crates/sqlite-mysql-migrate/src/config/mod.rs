//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from process environment variables.
    ///
    /// | Variable           | Default     |
    /// |--------------------|-------------|
    /// | `SQLITE_DB`        | `kuma.db`   |
    /// | `MARIADB_HOST`     | `127.0.0.1` |
    /// | `MARIADB_PORT`     | `3306`      |
    /// | `MARIADB_USER`     | `kuma`      |
    /// | `MARIADB_PASSWORD` | `secret`    |
    /// | `MARIADB_DATABASE` | `kumadb`    |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("MARIADB_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| MigrateError::Config(format!("MARIADB_PORT is not a port: {raw}")))?,
            None => default_mysql_port(),
        };

        let config = Config {
            source: SourceConfig {
                path: lookup("SQLITE_DB")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_sqlite_path),
            },
            target: TargetConfig {
                host: lookup("MARIADB_HOST").unwrap_or_else(default_host),
                port,
                database: lookup("MARIADB_DATABASE").unwrap_or_else(default_database),
                user: lookup("MARIADB_USER").unwrap_or_else(default_user),
                password: lookup("MARIADB_PASSWORD").unwrap_or_else(default_password),
                ..TargetConfig::default()
            },
            migration: MigrationConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}
