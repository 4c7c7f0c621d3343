//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! Provides MySQL-specific SQL syntax for identifier quoting, table DDL and
//! duplicate-tolerant inserts.

use crate::core::identifier::quote_mysql;
use crate::core::traits::Dialect;
use crate::error::Result;

/// Storage policy appended to every CREATE TABLE.
pub const TABLE_OPTIONS: &str =
    "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

/// MySQL server limit on placeholders in one prepared statement.
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// MySQL/MariaDB dialect implementation.
///
/// Compatible with MySQL 5.7+, 8.0+, and MariaDB 10.2+.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// `DROP TABLE IF EXISTS`.
    pub fn build_drop_table(&self, table: &str) -> Result<String> {
        Ok(format!("DROP TABLE IF EXISTS {}", self.quote_ident(table)?))
    }

    /// Build `CREATE TABLE IF NOT EXISTS` from rendered column definitions.
    ///
    /// `primary_key` lists key columns in key order; `unique_columns` get a
    /// standalone `UNIQUE (col)` clause each.
    pub fn build_create_table(
        &self,
        table: &str,
        column_defs: &[String],
        primary_key: &[&str],
        unique_columns: &[&str],
    ) -> Result<String> {
        let mut defs: Vec<String> = column_defs.to_vec();

        if !primary_key.is_empty() {
            let cols = primary_key
                .iter()
                .map(|c| self.quote_ident(c))
                .collect::<Result<Vec<_>>>()?;
            defs.push(format!("PRIMARY KEY ({})", cols.join(", ")));
        }

        for col in unique_columns {
            defs.push(format!("UNIQUE ({})", self.quote_ident(col)?));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n) {}",
            self.quote_ident(table)?,
            defs.join(",\n    "),
            TABLE_OPTIONS
        ))
    }

    /// Build a multi-row `INSERT IGNORE` with `row_count` placeholder tuples.
    pub fn build_insert_ignore(
        &self,
        table: &str,
        columns: &[String],
        row_count: usize,
    ) -> Result<String> {
        let col_list = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
        let tuples: Vec<String> = std::iter::repeat_n(tuple, row_count).collect();

        Ok(format!(
            "INSERT IGNORE INTO {} ({}) VALUES {}",
            self.quote_ident(table)?,
            col_list,
            tuples.join(", ")
        ))
    }

    /// Rows per statement so that placeholders stay under the server limit.
    pub fn max_rows_per_statement(&self, column_count: usize) -> usize {
        (MAX_PLACEHOLDERS / column_count.max(1)).max(1)
    }

    /// `SET FOREIGN_KEY_CHECKS`.
    pub fn foreign_key_checks(&self, enabled: bool) -> &'static str {
        if enabled {
            "SET FOREIGN_KEY_CHECKS = 1"
        } else {
            "SET FOREIGN_KEY_CHECKS = 0"
        }
    }
}

impl Dialect for MysqlDialect {
    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_mysql(name)
    }
}
