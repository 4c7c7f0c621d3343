//! Type mapping from SQLite declarations to MySQL column types.
//!
//! SQLite accepts almost any string as a column type and derives an affinity
//! from keywords inside it. The mapper mirrors that: a declaration is matched
//! against an ordered list of rules, each pairing a keyword predicate with a
//! mapping, and the first rule whose predicate matches wins. Order matters
//! because keywords overlap (`POINT` contains `INT`, `BIGINT` contains `INT`,
//! `CHARBLOB` contains both `CHAR` and `BLOB`).
//!
//! Mapping never fails. Lossy choices (bounding an indexed text column,
//! falling back for an unknown declaration) are reported as
//! [`TranslationWarning`]s alongside the result.

mod column;
mod constraints;
mod defaults;

pub use column::{build_column_spec, ColumnSpecBuild, TargetColumnSpec};
pub use constraints::{is_integer_type, resolve_constraints, Constraints};
pub use defaults::{resolve_default, DefaultResolution};

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Longest VARCHAR/VARBINARY that stays indexable under utf8mb4 with the
/// 767-byte InnoDB key prefix limit.
pub const INDEXED_VARCHAR_MAX: u32 = 191;

/// Upper bound for explicitly sized text columns.
pub const DEFAULT_VARCHAR_MAX: u32 = 255;

/// Integer keywords and their MySQL types, narrowest match first.
const INTEGER_TYPES: &[(&str, &str)] = &[
    ("TINYINT", "TINYINT"),
    ("SMALLINT", "SMALLINT"),
    ("MEDIUMINT", "MEDIUMINT"),
    ("BIGINT", "BIGINT UNSIGNED"),
    ("INT", "INT UNSIGNED"),
];

const TEXT_KEYWORDS: &[&str] = &["CHAR", "CLOB", "TEXT"];
const BLOB_KEYWORDS: &[&str] = &["BLOB"];

/// Numeric keywords grouped by their MySQL type.
const NUMERIC_TYPES: &[(&[&str], &str)] = &[
    (&["REAL", "FLOA", "DOUB"], "DOUBLE"),
    (&["NUM", "DEC"], "DECIMAL(10,2)"),
    (&["BOOL"], "TINYINT(1)"),
];

static LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)\)").expect("length pattern is valid"));

/// A non-fatal decision made while translating schema or data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationWarning {
    /// An indexed text/blob column was bounded to [`INDEXED_VARCHAR_MAX`].
    IndexBounded {
        declared_type: String,
        target_type: String,
    },
    /// The declaration matched no rule and fell back to `VARCHAR(255)`.
    UnknownType { declared_type: String },
    /// A primary key column allowed NULL in the source.
    NullablePrimaryKey { table: String, column: String },
    /// A default value did not fit TINYINT and the column was widened.
    IntegerPromoted {
        table: String,
        column: String,
        default_value: String,
        target_type: String,
    },
    /// A multi-column unique index has no counterpart in the target.
    CompositeUniqueDropped {
        table: String,
        index: String,
        columns: Vec<String>,
    },
    /// An epoch timestamp could not be converted; the value was nulled.
    TimestampConversion {
        table: String,
        column: String,
        value: String,
        reason: String,
    },
}

impl fmt::Display for TranslationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationWarning::IndexBounded {
                declared_type,
                target_type,
            } => write!(
                f,
                "Indexed column '{}' mapped to {} for index compatibility",
                declared_type, target_type
            ),
            TranslationWarning::UnknownType { declared_type } => write!(
                f,
                "Unknown SQLite type '{}', defaulting to VARCHAR({})",
                declared_type, DEFAULT_VARCHAR_MAX
            ),
            TranslationWarning::NullablePrimaryKey { table, column } => write!(
                f,
                "Primary key '{}' in table '{}' is NULLABLE in SQLite, forcing NOT NULL",
                column, table
            ),
            TranslationWarning::IntegerPromoted {
                table,
                column,
                default_value,
                target_type,
            } => write!(
                f,
                "Default value {} for TINYINT column '{}.{}' exceeds range, promoting column to {}",
                default_value, table, column, target_type
            ),
            TranslationWarning::CompositeUniqueDropped {
                table,
                index,
                columns,
            } => write!(
                f,
                "Composite unique index '{}' on '{}' ({}) is not migrated",
                index,
                table,
                columns.join(", ")
            ),
            TranslationWarning::TimestampConversion {
                table,
                column,
                value,
                reason,
            } => write!(
                f,
                "Could not convert timestamp {} in '{}.{}': {}",
                value, table, column, reason
            ),
        }
    }
}

/// Result of mapping a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Target type string (e.g., "VARCHAR(191)", "INT UNSIGNED").
    pub target_type: String,
    /// Set when the mapping narrowed or guessed.
    pub warning: Option<TranslationWarning>,
}

impl TypeMapping {
    /// Create a lossless type mapping.
    pub fn lossless(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            warning: None,
        }
    }

    fn bounded_for_index(declared: &str, target_type: String) -> Self {
        Self {
            warning: Some(TranslationWarning::IndexBounded {
                declared_type: declared.to_string(),
                target_type: target_type.clone(),
            }),
            target_type,
        }
    }
}

/// Category a declaration falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Text,
    Blob,
    Numeric,
    Temporal,
}

/// Inputs handed to each rule.
#[derive(Debug)]
pub struct TypeRequest<'a> {
    /// Declaration as written.
    pub declared: &'a str,
    /// Uppercased declaration used for keyword matching.
    pub upper: String,
    pub is_primary_key: bool,
    pub is_unique: bool,
}

impl<'a> TypeRequest<'a> {
    fn new(declared: &'a str, is_primary_key: bool, is_unique: bool) -> Self {
        Self {
            declared,
            upper: declared.to_uppercase(),
            is_primary_key,
            is_unique,
        }
    }

    fn is_indexed(&self) -> bool {
        self.is_primary_key || self.is_unique
    }

    fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.upper.contains(k))
    }
}

/// A keyword predicate paired with the mapping it selects.
pub struct Rule {
    pub family: TypeFamily,
    pub matches: fn(&TypeRequest<'_>) -> bool,
    pub map: fn(&TypeRequest<'_>) -> TypeMapping,
}

/// Mapping rules in priority order.
pub static RULES: &[Rule] = &[
    Rule {
        family: TypeFamily::Integer,
        matches: |r| r.upper.contains("INT"),
        map: map_integer,
    },
    Rule {
        family: TypeFamily::Text,
        matches: |r| r.contains_any(TEXT_KEYWORDS),
        map: map_text,
    },
    Rule {
        family: TypeFamily::Blob,
        matches: |r| r.contains_any(BLOB_KEYWORDS),
        map: map_blob,
    },
    Rule {
        family: TypeFamily::Numeric,
        matches: |r| NUMERIC_TYPES.iter().any(|(keys, _)| r.contains_any(keys)),
        map: map_numeric,
    },
    Rule {
        family: TypeFamily::Temporal,
        matches: |r| r.upper.trim() == "TIME" || r.upper.contains("DATE"),
        map: map_temporal,
    },
];

fn map_integer(r: &TypeRequest<'_>) -> TypeMapping {
    let target = INTEGER_TYPES
        .iter()
        .find(|(key, _)| r.upper.contains(key))
        .map_or("INT UNSIGNED", |(_, mysql)| *mysql);
    TypeMapping::lossless(target)
}

fn map_text(r: &TypeRequest<'_>) -> TypeMapping {
    if r.is_indexed() {
        return TypeMapping::bounded_for_index(r.declared, format!("VARCHAR({INDEXED_VARCHAR_MAX})"));
    }

    let declared_len = LENGTH_RE
        .captures(r.declared)
        .and_then(|caps| caps[1].parse::<u64>().ok());

    match declared_len {
        Some(len) => {
            let len = len.min(u64::from(DEFAULT_VARCHAR_MAX));
            TypeMapping::lossless(format!("VARCHAR({len})"))
        }
        None => TypeMapping::lossless("LONGTEXT"),
    }
}

fn map_blob(r: &TypeRequest<'_>) -> TypeMapping {
    if r.is_indexed() {
        return TypeMapping::bounded_for_index(
            r.declared,
            format!("VARBINARY({INDEXED_VARCHAR_MAX})"),
        );
    }
    TypeMapping::lossless("BLOB")
}

fn map_numeric(r: &TypeRequest<'_>) -> TypeMapping {
    let target = NUMERIC_TYPES
        .iter()
        .find(|(keys, _)| r.contains_any(keys))
        .map_or("DOUBLE", |(_, mysql)| *mysql);
    TypeMapping::lossless(target)
}

fn map_temporal(r: &TypeRequest<'_>) -> TypeMapping {
    if r.upper.trim() == "TIME" {
        TypeMapping::lossless("TIME")
    } else {
        TypeMapping::lossless("DATETIME")
    }
}

/// Which rule family a declaration resolves to, if any.
#[cfg(test)]
fn type_family(declared_type: &str) -> Option<TypeFamily> {
    let request = TypeRequest::new(declared_type, false, false);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&request))
        .map(|rule| rule.family)
}

/// Map a SQLite type declaration to a MySQL column type.
///
/// `is_primary_key` and `is_unique` only affect text and blob columns,
/// which must be bounded to stay indexable.
pub fn map_type(declared_type: &str, is_primary_key: bool, is_unique: bool) -> TypeMapping {
    let request = TypeRequest::new(declared_type, is_primary_key, is_unique);

    match RULES.iter().find(|rule| (rule.matches)(&request)) {
        Some(rule) => (rule.map)(&request),
        None => TypeMapping {
            target_type: format!("VARCHAR({DEFAULT_VARCHAR_MAX})"),
            warning: Some(TranslationWarning::UnknownType {
                declared_type: declared_type.to_string(),
            }),
        },
    }
}
