//! Identifier validation and quoting.
//!
//! SQL identifiers (table names, column names, index names) cannot be passed
//! as parameters in prepared statements - only data values can be
//! parameterized. Every identifier that reaches dynamic SQL goes through one
//! of the quoting functions here, so reserved words such as `order` or
//! `group` are escaped the same way in every introspection and data query.

use crate::error::{MigrateError, Result};

/// Maximum MySQL identifier length.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
///
/// # Errors
///
/// Returns `MigrateError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    Ok(())
}

/// Quote a SQLite identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_sqlite("order")?, "\"order\"");
/// ```
pub fn quote_sqlite(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a MySQL identifier using backticks.
///
/// Escapes backticks by doubling them and wraps in backticks. MySQL also
/// caps identifiers at 64 characters, which SQLite does not.
///
/// ```ignore
/// assert_eq!(quote_mysql("table`name")?, "`table``name`");
/// ```
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds MySQL maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_sqlite() {
        assert_eq!(quote_sqlite("order").unwrap(), "\"order\"");
        assert_eq!(quote_sqlite("we\"ird").unwrap(), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_mysql() {
        assert_eq!(quote_mysql("group").unwrap(), "`group`");
        assert_eq!(quote_mysql("table`name").unwrap(), "`table``name`");
    }

    #[test]
    fn test_reserved_and_plain_names_quote_alike() {
        let reserved = quote_mysql("order").unwrap();
        let plain = quote_mysql("orders").unwrap();
        assert_eq!(reserved, "`order`");
        assert_eq!(plain, "`orders`");
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("a\0b").is_err());
        assert!(quote_mysql(&"x".repeat(65)).is_err());
        assert!(quote_mysql(&"x".repeat(64)).is_ok());
        assert!(quote_sqlite(&"x".repeat(65)).is_ok());
    }
}
