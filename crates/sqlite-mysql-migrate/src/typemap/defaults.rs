//! Translation of SQLite column defaults into MySQL DEFAULT clauses.

use super::TranslationWarning;

/// Spellings SQLite schemas use for "now", compared after uppercasing and
/// normalizing double quotes to single quotes.
const CURRENT_TIMESTAMP_ALIASES: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "'CURRENT_TIMESTAMP'",
    "(CURRENT_TIMESTAMP)",
    "NOW()",
];

/// Outcome of translating one default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultResolution {
    /// Clause with a leading space (e.g. `" DEFAULT 0"`), or empty.
    pub clause: String,
    /// Column type, widened if the default did not fit.
    pub target_type: String,
    pub warning: Option<TranslationWarning>,
}

impl DefaultResolution {
    fn keep(clause: impl Into<String>, target_type: &str) -> Self {
        Self {
            clause: clause.into(),
            target_type: target_type.to_string(),
            warning: None,
        }
    }
}

fn is_current_timestamp(normalized: &str) -> bool {
    CURRENT_TIMESTAMP_ALIASES.contains(&normalized) || normalized.contains("DATETIME('NOW'")
}

/// Parse a finite number the way SQLite would accept a numeric literal.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Remove one layer of matching quotes and return the literal text.
///
/// A single-quoted SQL literal has its doubled quotes collapsed so the text
/// can be re-escaped exactly once.
fn unquote(raw: &str) -> String {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            let inner = &raw[1..raw.len() - 1];
            return if first == b'\'' {
                inner.replace("''", "'")
            } else {
                inner.to_string()
            };
        }
    }
    raw.to_string()
}

/// Build a MySQL DEFAULT clause from a SQLite default value.
///
/// Returns the clause together with the column type, which is widened from
/// TINYINT to SMALLINT when a numeric default falls outside -128..=127.
pub fn resolve_default(
    raw_default: Option<&str>,
    target_type: &str,
    table_name: &str,
    column_name: &str,
) -> DefaultResolution {
    let Some(raw) = raw_default else {
        return DefaultResolution::keep("", target_type);
    };

    let normalized = raw.trim().to_uppercase().replace('"', "'");

    if is_current_timestamp(&normalized) {
        return DefaultResolution::keep(" DEFAULT CURRENT_TIMESTAMP", target_type);
    }

    if normalized == "NULL" || normalized == "'NULL'" {
        return DefaultResolution::keep(" DEFAULT NULL", target_type);
    }

    if let Some(value) = parse_number(raw) {
        let literal = raw.trim();
        if target_type.contains("TINYINT") && !(-128.0..=127.0).contains(&value) {
            let widened = target_type.replace("TINYINT", "SMALLINT");
            let warning = TranslationWarning::IntegerPromoted {
                table: table_name.to_string(),
                column: column_name.to_string(),
                default_value: literal.to_string(),
                target_type: widened.clone(),
            };
            return DefaultResolution {
                clause: format!(" DEFAULT {literal}"),
                target_type: widened,
                warning: Some(warning),
            };
        }
        return DefaultResolution::keep(format!(" DEFAULT {literal}"), target_type);
    }

    let escaped = unquote(raw).replace('\'', "''");
    DefaultResolution::keep(format!(" DEFAULT '{escaped}'"), target_type)
}
