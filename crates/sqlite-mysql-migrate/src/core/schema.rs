//! Schema metadata for source tables, columns and indexes.
//!
//! These types are produced by source introspection and live for the
//! duration of one table's migration.

use serde::{Deserialize, Serialize};

/// Table metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Column definitions in declaration order.
    pub columns: Vec<Column>,

    /// Indexes declared on the table (including implicit ones).
    pub indexes: Vec<Index>,
}

impl Table {
    /// Create a table with no indexes.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
        }
    }

    /// Primary key column names ordered by their position in the key.
    pub fn primary_key(&self) -> Vec<&str> {
        let mut pk: Vec<&Column> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        pk.sort_by_key(|c| c.pk_ordinal);
        pk.into_iter().map(|c| c.name.as_str()).collect()
    }

    /// Check whether a unique index on exactly `column`, and nothing else,
    /// exists.
    pub fn is_single_column_unique(&self, column: &str) -> bool {
        self.indexes.iter().any(|idx| {
            idx.is_unique && !idx.has_expression && idx.columns.len() == 1 && idx.columns[0] == column
        })
    }

    /// Unique indexes that cannot be expressed as a column constraint:
    /// multi-column ones and any with an expression member. The index
    /// backing a composite primary key is not included.
    pub fn composite_unique_indexes(&self) -> impl Iterator<Item = &Index> {
        let mut pk = self.primary_key();
        pk.sort_unstable();
        self.indexes.iter().filter(move |idx| {
            if !idx.is_unique {
                return false;
            }
            if idx.has_expression {
                return true;
            }
            let mut cols: Vec<&str> = idx.columns.iter().map(String::as_str).collect();
            cols.sort_unstable();
            idx.columns.len() > 1 && cols != pk
        })
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type exactly as written in the source DDL (may be empty).
    pub declared_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Raw default expression as stored by the source, if any.
    pub default_value: Option<String>,

    /// Position within the primary key (1-based); 0 when not part of it.
    pub pk_ordinal: u32,

    /// Ordinal position in the table (0-based).
    pub position: u32,
}

impl Column {
    /// Check if this column is part of the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.pk_ordinal > 0
    }
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Whether the index is unique.
    pub is_unique: bool,

    /// Indexed column names in key order. Expression members are not listed.
    pub columns: Vec<String>,

    /// Whether any member is an expression rather than a plain column.
    #[serde(default)]
    pub has_expression: bool,
}

impl Index {
    /// Build from index members in key order, `None` marking an expression.
    pub fn from_members(name: impl Into<String>, is_unique: bool, members: Vec<Option<String>>) -> Self {
        let has_expression = members.iter().any(Option::is_none);
        Self {
            name: name.into(),
            is_unique,
            columns: members.into_iter().flatten().collect(),
            has_expression,
        }
    }
}
