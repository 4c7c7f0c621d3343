//! Database driver implementations.
//!
//! - [`sqlite`]: source reader and dialect
//! - [`mysql`]: target writer and dialect (MySQL and MariaDB)
//!
//! Each driver implements the [`Dialect`](crate::core::Dialect) trait for its
//! SQL syntax plus the reader or writer side it is used for.

pub mod mysql;
pub mod sqlite;

pub use mysql::{MysqlDialect, MysqlWriter};
pub use sqlite::{SqliteDialect, SqliteReader};
