//! Assembly of a full MySQL column definition from a source column.

use serde::Serialize;

use crate::core::identifier::quote_mysql;
use crate::core::schema::Column;
use crate::error::Result;

use super::{map_type, resolve_constraints, resolve_default, TranslationWarning};

/// Translated column, ready to be placed in a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetColumnSpec {
    pub name: String,
    /// Final MySQL type (after any default-driven widening).
    pub target_type: String,
    /// `" NOT NULL"` or empty.
    pub not_null_clause: String,
    /// `" DEFAULT ..."` or empty.
    pub default_clause: String,
    pub auto_increment: bool,
    /// `` `name` TYPE [NOT NULL] [DEFAULT ...] [AUTO_INCREMENT] ``
    pub definition: String,
}

/// A column spec plus the warnings raised while producing it.
#[derive(Debug, Clone)]
pub struct ColumnSpecBuild {
    pub spec: TargetColumnSpec,
    pub warnings: Vec<TranslationWarning>,
}

/// Translate one column: type, then constraints, then default.
pub fn build_column_spec(column: &Column, table_name: &str, is_unique: bool) -> Result<ColumnSpecBuild> {
    let mut warnings = Vec::new();

    let mapping = map_type(&column.declared_type, column.is_primary_key(), is_unique);
    warnings.extend(mapping.warning);

    let constraints = resolve_constraints(
        column.pk_ordinal,
        &mapping.target_type,
        !column.is_nullable,
        &column.name,
        table_name,
    );
    warnings.extend(constraints.warning);

    let default = resolve_default(
        column.default_value.as_deref(),
        &mapping.target_type,
        table_name,
        &column.name,
    );
    warnings.extend(default.warning);

    let definition = format!(
        "{} {}{}{}{}",
        quote_mysql(&column.name)?,
        default.target_type,
        constraints.not_null,
        default.clause,
        constraints.auto_increment
    )
    .trim()
    .to_string();

    Ok(ColumnSpecBuild {
        spec: TargetColumnSpec {
            name: column.name.clone(),
            target_type: default.target_type,
            not_null_clause: constraints.not_null,
            default_clause: default.clause,
            auto_increment: !constraints.auto_increment.is_empty(),
            definition,
        },
        warnings,
    })
}
