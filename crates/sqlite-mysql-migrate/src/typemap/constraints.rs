//! NOT NULL and AUTO_INCREMENT resolution for target columns.

use super::TranslationWarning;

const INTEGER_PREFIXES: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT"];

/// Check whether a MySQL type belongs to the integer family.
pub fn is_integer_type(target_type: &str) -> bool {
    let upper = target_type.trim().to_uppercase();
    INTEGER_PREFIXES.iter().any(|p| upper.starts_with(p))
}

/// Column constraint clauses, each with a leading space or empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Constraints {
    pub auto_increment: String,
    pub not_null: String,
    pub warning: Option<TranslationWarning>,
}

/// Derive AUTO_INCREMENT and NOT NULL for a column.
///
/// The first column of an integer primary key becomes AUTO_INCREMENT, which
/// is how SQLite's rowid alias behaves. Every primary key column is NOT NULL
/// in MySQL; if SQLite allowed NULL there a warning is returned.
pub fn resolve_constraints(
    pk_ordinal: u32,
    target_type: &str,
    source_not_null: bool,
    column_name: &str,
    table_name: &str,
) -> Constraints {
    if pk_ordinal == 0 {
        return Constraints {
            not_null: if source_not_null { " NOT NULL".into() } else { String::new() },
            ..Constraints::default()
        };
    }

    let warning = (!source_not_null).then(|| TranslationWarning::NullablePrimaryKey {
        table: table_name.to_string(),
        column: column_name.to_string(),
    });

    let auto_increment = if pk_ordinal == 1 && is_integer_type(target_type) {
        " AUTO_INCREMENT".to_string()
    } else {
        String::new()
    };

    Constraints {
        auto_increment,
        not_null: " NOT NULL".to_string(),
        warning,
    }
}
