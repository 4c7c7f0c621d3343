//! SQLite SQL dialect.

use crate::core::identifier::quote_sqlite;
use crate::core::traits::Dialect;
use crate::error::Result;

/// SQLite dialect implementation.
///
/// Every identifier is double-quoted, including the ones passed to PRAGMA
/// functions, so reserved words such as `order` or `group` introspect the
/// same way they are read.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// `PRAGMA table_info(...)` for a table.
    pub fn table_info_query(&self, table: &str) -> Result<String> {
        Ok(format!("PRAGMA table_info({})", self.quote_ident(table)?))
    }

    /// `PRAGMA index_list(...)` for a table.
    pub fn index_list_query(&self, table: &str) -> Result<String> {
        Ok(format!("PRAGMA index_list({})", self.quote_ident(table)?))
    }

    /// `PRAGMA index_info(...)` for an index.
    pub fn index_info_query(&self, index: &str) -> Result<String> {
        Ok(format!("PRAGMA index_info({})", self.quote_ident(index)?))
    }
}

impl Dialect for SqliteDialect {
    fn quote_ident(&self, name: &str) -> Result<String> {
        quote_sqlite(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pragma_queries_quote_reserved_words() {
        let d = SqliteDialect::new();
        assert_eq!(d.table_info_query("order").unwrap(), r#"PRAGMA table_info("order")"#);
        assert_eq!(d.index_list_query("group").unwrap(), r#"PRAGMA index_list("group")"#);
        assert_eq!(
            d.index_info_query("sqlite_autoindex_user_1").unwrap(),
            r#"PRAGMA index_info("sqlite_autoindex_user_1")"#
        );
    }

    #[test]
    fn test_select_query() {
        let d = SqliteDialect::new();
        assert_eq!(
            d.build_select_query("order", &["id".to_string(), "a\"b".to_string()])
                .unwrap(),
            r#"SELECT "id", "a""b" FROM "order""#
        );
        assert_eq!(d.build_select_query("t", &[]).unwrap(), r#"SELECT * FROM "t""#);
    }
}
