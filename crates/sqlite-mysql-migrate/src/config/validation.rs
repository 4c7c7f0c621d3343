//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.path.as_os_str().is_empty() {
        return Err(MigrateError::Config("source.path is required".into()));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }
    if config.target.port == 0 {
        return Err(MigrateError::Config("target.port must be non-zero".into()));
    }

    // Migration config validation
    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }
    if config.migration.epoch_millis_threshold <= 0 {
        return Err(MigrateError::Config(
            "migration.epoch_millis_threshold must be positive".into(),
        ));
    }

    for name in &config.migration.include_tables {
        if config
            .migration
            .exclude_tables
            .iter()
            .any(|e| e.eq_ignore_ascii_case(name))
        {
            return Err(MigrateError::Config(format!(
                "table '{}' is both included and excluded",
                name
            )));
        }
    }

    Ok(())
}
