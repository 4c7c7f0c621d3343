//! Core traits for the two stores a migration talks to.
//!
//! - [`SourceReader`]: introspects schema and reads rows from the source
//! - [`TargetWriter`]: executes DDL and batched inserts against the target
//! - [`Dialect`]: identifier quoting and query text for one engine
//!
//! The migration engine only sees these traits, so it can be driven against
//! in-memory stores in tests.

use async_trait::async_trait;

use crate::error::Result;

use super::schema::{Column, Index, Table};
use super::value::Row;

/// Read schema and data from a source database.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Names of all tables in catalog order, internal tables included.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Column metadata for a table, in declaration order.
    async fn load_columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Index metadata for a table, member columns in key order.
    async fn load_indexes(&self, table: &str) -> Result<Vec<Index>>;

    /// Load full metadata for a table.
    ///
    /// Template method over [`load_columns`](Self::load_columns) and
    /// [`load_indexes`](Self::load_indexes).
    async fn load_table(&self, table: &str) -> Result<Table> {
        let columns = self.load_columns(table).await?;
        let indexes = self.load_indexes(table).await?;
        Ok(Table {
            name: table.to_string(),
            columns,
            indexes,
        })
    }

    /// Read every row of a table, values ordered as `columns`.
    async fn read_rows(&self, table: &str, columns: &[String]) -> Result<Vec<Row>>;

    /// Round-trip a trivial query.
    async fn ping(&self) -> Result<()>;

    /// Close the connection.
    async fn close(&self);
}

/// Write schema and data to a target database.
///
/// Holds a single session: the foreign key toggle is session-scoped, so all
/// DDL and inserts of a run must go through the same writer.
#[async_trait]
pub trait TargetWriter: Send {
    /// Enable or disable referential-integrity enforcement for the session.
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<()>;

    /// Drop a table if it exists.
    async fn drop_table(&mut self, table: &str) -> Result<()>;

    /// Execute a rendered CREATE TABLE statement.
    async fn create_table(&mut self, ddl: &str) -> Result<()>;

    /// Insert rows in one transaction, skipping rows that violate a unique key.
    ///
    /// Commits on success and returns the number of rows actually inserted.
    /// On failure the transaction is rolled back before the error is returned.
    async fn insert_ignore_batch(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64>;

    /// Roll back any transaction left open on the session.
    async fn rollback(&mut self) -> Result<()>;

    /// Round-trip a trivial query.
    async fn ping(&mut self) -> Result<()>;

    /// Close the session. Further calls fail.
    async fn close(&mut self);
}

/// SQL syntax strategy for one database engine.
pub trait Dialect: Send + Sync {
    /// Quote an identifier (table name, column name, index name).
    ///
    /// - SQLite: `"identifier"`
    /// - MySQL: `` `identifier` ``
    fn quote_ident(&self, name: &str) -> Result<String>;

    /// Build a SELECT of the given columns, in that order, over a whole table.
    fn build_select_query(&self, table: &str, columns: &[String]) -> Result<String> {
        let cols = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Result<Vec<_>>>()?;
        let cols = if cols.is_empty() {
            "*".to_string()
        } else {
            cols.join(", ")
        };
        Ok(format!("SELECT {} FROM {}", cols, self.quote_ident(table)?))
    }
}
