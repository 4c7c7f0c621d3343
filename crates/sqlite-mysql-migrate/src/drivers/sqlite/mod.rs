//! SQLite database driver.
//!
//! - [`SqliteDialect`]: SQL syntax strategy
//! - [`SqliteReader`]: Source database reader
//!
//! The source file is opened read-only and never created.

mod dialect;
mod reader;

pub use dialect::SqliteDialect;
pub use reader::SqliteReader;

#[cfg(test)]
pub(crate) use reader::in_memory;
