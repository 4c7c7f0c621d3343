//! MySQL/MariaDB database driver.
//!
//! This module provides MySQL-specific implementations for:
//! - [`MysqlDialect`]: SQL syntax strategy
//! - [`MysqlWriter`]: Target database writer
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod dialect;
mod writer;

pub use dialect::{MysqlDialect, MAX_PLACEHOLDERS, TABLE_OPTIONS};
pub use writer::MysqlWriter;
