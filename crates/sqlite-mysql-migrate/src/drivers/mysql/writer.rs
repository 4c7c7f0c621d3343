//! MySQL/MariaDB target writer implementation.
//!
//! Implements the `TargetWriter` trait over one mysql_async session. A single
//! `Conn` is held for the whole run because `FOREIGN_KEY_CHECKS` is a session
//! variable; a pool could hand DDL and inserts to a connection that never saw
//! the toggle.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, SslOpts, TxOpts};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::traits::TargetWriter;
use crate::core::value::{Row, SqlValue};
use crate::error::{MigrateError, Result};

use super::dialect::MysqlDialect;

const STORE: &str = "MySQL";

/// MySQL target writer implementation using mysql_async.
pub struct MysqlWriter {
    conn: Option<Conn>,
    dialect: MysqlDialect,
}

impl MysqlWriter {
    /// Open a session against the target and verify it with `SELECT 1`.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&config.host)
            .tcp_port(config.port)
            .db_name(Some(&config.database))
            .user(Some(&config.user))
            .pass(Some(&config.password))
            // Use utf8mb4 for full Unicode support
            .init(vec!["SET NAMES utf8mb4"]);

        if let Some(ssl) = ssl_opts_for(&config.ssl_mode) {
            builder = builder.ssl_opts(ssl);
        }

        let opts: Opts = builder.into();
        let mut conn = Conn::new(opts)
            .await
            .map_err(|e| MigrateError::connection(STORE, e))?;

        conn.query_drop("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection(STORE, e))?;

        info!(
            "Connected to MySQL target: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            conn: Some(conn),
            dialect: MysqlDialect::new(),
        })
    }

    fn conn(&mut self) -> Result<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| MigrateError::connection(STORE, "session is closed"))
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("MySQL: {}", sql);
        self.conn()?.query_drop(sql).await?;
        Ok(())
    }
}

#[async_trait]
impl TargetWriter for MysqlWriter {
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<()> {
        let sql = self.dialect.foreign_key_checks(enabled);
        self.execute(sql)
            .await
            .map_err(|e| MigrateError::IntegrityToggle(e.to_string()))
    }

    async fn drop_table(&mut self, table: &str) -> Result<()> {
        let sql = self.dialect.build_drop_table(table)?;
        self.execute(&sql).await
    }

    async fn create_table(&mut self, ddl: &str) -> Result<()> {
        self.execute(ddl).await
    }

    async fn insert_ignore_batch(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64> {
        if rows.is_empty() || columns.is_empty() {
            return Ok(0);
        }

        let max_rows = self.dialect.max_rows_per_statement(columns.len());
        let statements = rows
            .chunks(max_rows)
            .map(|chunk| {
                let sql = self.dialect.build_insert_ignore(table, columns, chunk.len())?;
                let params: Vec<mysql_async::Value> = chunk
                    .iter()
                    .flat_map(|row| row.iter().map(sql_value_to_mysql))
                    .collect();
                Ok((sql, params))
            })
            .collect::<Result<Vec<_>>>()?;

        let conn = self.conn()?;
        let mut tx = conn.start_transaction(TxOpts::default()).await?;
        let mut inserted = 0u64;

        for (sql, params) in statements {
            match tx.exec_drop(&sql, params).await {
                Ok(()) => inserted += tx.affected_rows(),
                Err(e) => {
                    if let Err(rb) = tx.rollback().await {
                        warn!("MySQL: rollback after failed insert into {} failed: {}", table, rb);
                    }
                    return Err(e.into());
                }
            }
        }

        tx.commit().await?;

        debug!(
            "MySQL: inserted {}/{} rows into {} using INSERT IGNORE",
            inserted,
            rows.len(),
            table
        );
        Ok(inserted)
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.conn.is_none() {
            return Ok(());
        }
        self.execute("ROLLBACK").await
    }

    async fn ping(&mut self) -> Result<()> {
        self.execute("SELECT 1").await
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.disconnect().await {
                warn!("MySQL: error while closing session: {}", e);
            }
        }
    }
}

/// TLS options for a configured `ssl_mode`.
fn ssl_opts_for(mode: &str) -> Option<SslOpts> {
    match mode.to_lowercase().as_str() {
        "disable" => {
            warn!("MySQL TLS is disabled. Credentials will be transmitted in plaintext.");
            None
        }
        "prefer" | "require" => Some(SslOpts::default().with_danger_accept_invalid_certs(true)),
        "verify-ca" | "verify_ca" | "verify-full" | "verify_identity" => Some(SslOpts::default()),
        _ => {
            warn!("Unknown ssl_mode '{}', defaulting to Preferred", mode);
            Some(SslOpts::default().with_danger_accept_invalid_certs(true))
        }
    }
}

/// Convert a transfer value to a mysql_async parameter.
fn sql_value_to_mysql(value: &SqlValue<'_>) -> mysql_async::Value {
    match value {
        SqlValue::Null => mysql_async::Value::NULL,
        SqlValue::Integer(i) => mysql_async::Value::from(*i),
        SqlValue::Real(f) => mysql_async::Value::from(*f),
        SqlValue::Text(s) => mysql_async::Value::from(s.as_ref()),
        SqlValue::Bytes(b) => mysql_async::Value::from(b.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_to_mysql() {
        assert_eq!(sql_value_to_mysql(&SqlValue::Null), mysql_async::Value::NULL);
        assert_eq!(
            sql_value_to_mysql(&SqlValue::Integer(42)),
            mysql_async::Value::Int(42)
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::Real(1.5)),
            mysql_async::Value::Double(1.5)
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::from("héllo")),
            mysql_async::Value::Bytes("héllo".as_bytes().to_vec())
        );
        assert_eq!(
            sql_value_to_mysql(&SqlValue::from(vec![0u8, 159, 255])),
            mysql_async::Value::Bytes(vec![0, 159, 255])
        );
    }

    #[test]
    fn test_ssl_opts_for() {
        assert!(ssl_opts_for("disable").is_none());
        assert!(ssl_opts_for("DISABLE").is_none());
        assert!(ssl_opts_for("require").is_some());
        assert!(ssl_opts_for("verify_identity").is_some());
        assert!(ssl_opts_for("bogus").is_some());
    }
}
