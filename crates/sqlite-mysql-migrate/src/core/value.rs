//! SQL value types for transferring rows between stores.
//!
//! SQLite values carry one of five storage classes; [`SqlValue`] mirrors
//! them so rows can be moved without guessing at declared column types.

use std::borrow::Cow;

/// SQL value with zero-copy support for text and binary data.
///
/// The `'a` lifetime allows borrowing from source buffers. For owned data
/// that outlives the source buffer, use `.into_owned()`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// NULL.
    Null,

    /// 64-bit signed integer.
    Integer(i64),

    /// 64-bit floating point.
    Real(f64),

    /// Text data.
    Text(Cow<'a, str>),

    /// Binary data.
    Bytes(Cow<'a, [u8]>),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Integer(v) => SqlValue::Integer(v),
            SqlValue::Real(v) => SqlValue::Real(v),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Create a text value from an owned String.
    #[must_use]
    pub fn text_owned(s: String) -> SqlValue<'static> {
        SqlValue::Text(Cow::Owned(s))
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl<T> From<Option<T>> for SqlValue<'static>
where
    T: Into<SqlValue<'static>>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// A single row, values in column declaration order.
pub type Row = Vec<SqlValue<'static>>;
