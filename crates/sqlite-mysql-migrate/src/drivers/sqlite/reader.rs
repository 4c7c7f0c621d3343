//! SQLite source reader implementation.
//!
//! Implements the `SourceReader` trait over a SQLx SQLite pool. Schema comes
//! from `sqlite_master` and the `table_info`/`index_list`/`index_info`
//! pragmas; rows are decoded by their runtime storage class rather than the
//! declared column type, since SQLite does not enforce the latter.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::schema::{Column, Index};
use crate::core::traits::{Dialect, SourceReader};
use crate::core::value::{Row, SqlValue};
use crate::error::{MigrateError, Result};

use super::dialect::SqliteDialect;

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

const STORE: &str = "SQLite";

/// SQLite source reader implementation.
pub struct SqliteReader {
    pool: SqlitePool,
    dialect: SqliteDialect,
}

impl SqliteReader {
    /// Open the configured database file read-only.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(false)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| {
                MigrateError::connection(STORE, format!("{}: {}", config.path.display(), e))
            })?;

        // Test connection
        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| MigrateError::connection(STORE, e))?;

        info!("Connected to SQLite source: {}", config.path.display());

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect: SqliteDialect::new(),
        }
    }

    /// Members of an index in key order. Expression members have no name.
    async fn load_index_members(&self, index: &str) -> Result<Vec<Option<String>>> {
        let query = self.dialect.index_info_query(index)?;
        let rows: Vec<SqliteRow> = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut members: Vec<(i64, Option<String>)> = Vec::with_capacity(rows.len());
        for row in rows {
            let seqno: i64 = row.try_get("seqno")?;
            members.push((seqno, row.try_get("name")?));
        }
        members.sort_by_key(|(seqno, _)| *seqno);
        Ok(members.into_iter().map(|(_, name)| name).collect())
    }

    fn row_to_values(row: &SqliteRow, width: usize) -> Result<Row> {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                values.push(SqlValue::Null);
                continue;
            }
            let storage = raw.type_info().name().to_string();
            let value = match storage.as_str() {
                "INTEGER" => SqlValue::Integer(row.try_get::<i64, _>(i)?),
                "REAL" => SqlValue::Real(row.try_get::<f64, _>(i)?),
                "BLOB" => SqlValue::from(row.try_get::<Vec<u8>, _>(i)?),
                _ => SqlValue::text_owned(row.try_get::<String, _>(i)?),
            };
            values.push(value);
        }
        Ok(values)
    }
}

#[async_trait]
impl SourceReader for SqliteReader {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows: Vec<SqliteRow> =
            sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    async fn load_columns(&self, table: &str) -> Result<Vec<Column>> {
        let query = self.dialect.table_info_query(table)?;
        let rows: Vec<SqliteRow> = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let cid: i64 = row.try_get("cid")?;
            let notnull: i64 = row.try_get("notnull")?;
            let pk: i64 = row.try_get("pk")?;
            columns.push(Column {
                name: row.try_get("name")?,
                declared_type: row.try_get::<Option<String>, _>("type")?.unwrap_or_default(),
                is_nullable: notnull == 0,
                default_value: row.try_get("dflt_value")?,
                pk_ordinal: u32::try_from(pk).unwrap_or(0),
                position: u32::try_from(cid).unwrap_or(0),
            });
        }

        debug!("SQLite: loaded {} columns for {}", columns.len(), table);
        Ok(columns)
    }

    async fn load_indexes(&self, table: &str) -> Result<Vec<Index>> {
        let query = self.dialect.index_list_query(table)?;
        let rows: Vec<SqliteRow> = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut indexes = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            let unique: i64 = row.try_get("unique")?;
            let members = self.load_index_members(&name).await?;
            indexes.push(Index::from_members(name, unique == 1, members));
        }

        debug!("SQLite: loaded {} indexes for {}", indexes.len(), table);
        Ok(indexes)
    }

    async fn read_rows(&self, table: &str, columns: &[String]) -> Result<Vec<Row>> {
        let query = self.dialect.build_select_query(table, columns)?;
        let rows: Vec<SqliteRow> = sqlx::query(&query).fetch_all(&self.pool).await?;

        let width = columns.len();
        let values = rows
            .iter()
            .map(|row| Self::row_to_values(row, width))
            .collect::<Result<Vec<_>>>()?;

        debug!("SQLite: read {} rows from {}", values.len(), table);
        Ok(values)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// In-memory source for tests in other modules.
#[cfg(test)]
pub(crate) async fn in_memory(setup: &str) -> SqliteReader {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::raw_sql(setup).execute(&pool).await.unwrap();
    SqliteReader::from_pool(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SCHEMA: &str = r#"
        CREATE TABLE "order" (
            id INTEGER PRIMARY KEY,
            total REAL DEFAULT 0,
            note TEXT NOT NULL DEFAULT 'n/a',
            payload BLOB,
            code VARCHAR(32) UNIQUE
        );
        CREATE TABLE orders (id INTEGER PRIMARY KEY, label TEXT);
        CREATE TABLE monitor_tag (
            monitor_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            value TEXT,
            PRIMARY KEY (tag_id, monitor_id)
        );
        CREATE UNIQUE INDEX monitor_tag_pair ON monitor_tag (monitor_id, value);
        INSERT INTO "order" (id, total, note, payload, code)
            VALUES (1, 9.5, 'first', X'00FF', 'A1'), (2, NULL, 'second', NULL, NULL);
        INSERT INTO orders (id, label) VALUES (1, 'x');
    "#;

    #[tokio::test]
    async fn test_list_tables_in_catalog_order() {
        let reader = in_memory(SCHEMA).await;
        let tables = reader.list_tables().await.unwrap();
        assert_eq!(tables, vec!["order", "orders", "monitor_tag"]);
    }

    #[tokio::test]
    async fn test_load_columns_reserved_table_name() {
        let reader = in_memory(SCHEMA).await;
        let columns = reader.load_columns("order").await.unwrap();

        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].declared_type, "INTEGER");
        assert_eq!(columns[0].pk_ordinal, 1);
        assert_eq!(columns[1].default_value.as_deref(), Some("0"));
        assert!(columns[1].is_nullable);
        assert_eq!(columns[2].default_value.as_deref(), Some("'n/a'"));
        assert!(!columns[2].is_nullable);
        assert_eq!(columns[4].declared_type, "VARCHAR(32)");
        assert_eq!(columns[4].position, 4);
    }

    #[tokio::test]
    async fn test_composite_pk_ordinals() {
        let reader = in_memory(SCHEMA).await;
        let table = reader.load_table("monitor_tag").await.unwrap();
        assert_eq!(table.primary_key(), vec!["tag_id", "monitor_id"]);
    }

    #[tokio::test]
    async fn test_load_indexes() {
        let reader = in_memory(SCHEMA).await;

        let table = reader.load_table("order").await.unwrap();
        assert!(table.is_single_column_unique("code"));
        assert!(!table.is_single_column_unique("note"));

        let table = reader.load_table("monitor_tag").await.unwrap();
        let composite: Vec<&Index> = table.composite_unique_indexes().collect();
        assert!(composite
            .iter()
            .any(|idx| idx.name == "monitor_tag_pair"
                && idx.columns == vec!["monitor_id".to_string(), "value".to_string()]));
    }

    #[tokio::test]
    async fn test_load_indexes_keeps_expression_members() {
        let reader = in_memory(
            "CREATE TABLE t (a INTEGER, b TEXT);
             CREATE UNIQUE INDEX ix ON t (a, lower(b));",
        )
        .await;

        let table = reader.load_table("t").await.unwrap();
        let ix = table.indexes.iter().find(|idx| idx.name == "ix").unwrap();
        assert!(ix.is_unique);
        assert!(ix.has_expression);
        assert_eq!(ix.columns, vec!["a".to_string()]);
        assert!(!table.is_single_column_unique("a"));
    }

    #[tokio::test]
    async fn test_read_rows_by_storage_class() {
        let reader = in_memory(SCHEMA).await;
        let columns: Vec<String> = ["id", "total", "note", "payload", "code"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = reader.read_rows("order", &columns).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], SqlValue::Integer(1));
        assert_eq!(rows[0][1], SqlValue::Real(9.5));
        assert_eq!(rows[0][2], SqlValue::from("first"));
        assert_eq!(rows[0][3], SqlValue::from(vec![0u8, 255]));
        assert_eq!(rows[1][1], SqlValue::Null);
        assert_eq!(rows[1][3], SqlValue::Null);
    }

    #[tokio::test]
    async fn test_read_rows_mixed_storage_in_one_column() {
        let reader = in_memory(
            "CREATE TABLE loose (v TEXT); INSERT INTO loose VALUES ('a'), (X'01');
             CREATE TABLE anyv (v); INSERT INTO anyv VALUES (7), ('7'), (2.5);",
        )
        .await;

        let rows = reader.read_rows("anyv", &["v".to_string()]).await.unwrap();
        assert_eq!(rows[0][0], SqlValue::Integer(7));
        assert_eq!(rows[1][0], SqlValue::from("7"));
        assert_eq!(rows[2][0], SqlValue::Real(2.5));

        let rows = reader.read_rows("loose", &["v".to_string()]).await.unwrap();
        assert_eq!(rows[1][0], SqlValue::from(vec![1u8]));
    }

    #[tokio::test]
    async fn test_connect_missing_file() {
        let config = SourceConfig {
            path: PathBuf::from("/nonexistent/dir/kuma.db"),
        };
        let err = SqliteReader::connect(&config).await.err().unwrap();
        assert!(matches!(err, MigrateError::Connection { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_connect_opens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kuma.db");

        let seed = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(&path).create_if_missing(true))
            .await
            .unwrap();
        sqlx::raw_sql("CREATE TABLE monitor (id INTEGER PRIMARY KEY, name TEXT); INSERT INTO monitor VALUES (1, 'web');")
            .execute(&seed)
            .await
            .unwrap();
        seed.close().await;

        let reader = SqliteReader::connect(&SourceConfig { path }).await.unwrap();
        assert_eq!(reader.list_tables().await.unwrap(), vec!["monitor"]);
        let rows = reader
            .read_rows("monitor", &["id".to_string(), "name".to_string()])
            .await
            .unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Integer(1), SqlValue::from("web")]]);
        reader.close().await;
    }

    #[tokio::test]
    async fn test_ping() {
        let reader = in_memory("CREATE TABLE t (a);").await;
        reader.ping().await.unwrap();
        reader.close().await;
    }
}
