//! Core abstractions shared by the drivers and the migration engine.
//!
//! - [`schema`]: table, column and index metadata
//! - [`value`]: SQL value representation for row transfer
//! - [`traits`]: source reader and target writer seams
//! - [`identifier`]: identifier validation and quoting

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{Column, Index, Table};
pub use traits::{Dialect, SourceReader, TargetWriter};
pub use value::{Row, SqlValue};
