//! Epoch-to-DATETIME normalization for the migrations log table.
//!
//! The log table stores its run time as a bare epoch number, sometimes in
//! seconds and sometimes in milliseconds. MySQL wants a DATETIME literal.

use chrono::{DateTime, Datelike};
use tracing::warn;

use crate::core::value::{Row, SqlValue};
use crate::error::MigrateError;
use crate::typemap::TranslationWarning;

/// Output format for converted values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest year a MySQL DATETIME can hold.
const MAX_DATETIME_YEAR: i32 = 9999;

/// Epoch digits of a value, if it looks like an epoch at all.
///
/// Positive integers and non-empty all-digit text qualify. Zero, negatives,
/// reals, blobs and anything else are left alone.
fn epoch_digits(value: &SqlValue<'_>) -> Option<String> {
    match value {
        SqlValue::Integer(v) if *v > 0 => Some(v.to_string()),
        SqlValue::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            Some(s.to_string())
        }
        _ => None,
    }
}

/// Convert an epoch value to a `YYYY-MM-DD HH:MM:SS` string in UTC.
///
/// Returns `None` when the value is not an epoch, `Some(Err(reason))` when it
/// is one but cannot be represented.
pub fn epoch_to_datetime(value: &SqlValue<'_>, millis_threshold: i64) -> Option<Result<String, String>> {
    let digits = epoch_digits(value)?;

    let converted = digits
        .parse::<i64>()
        .map_err(|e| format!("not an epoch: {}", e))
        .and_then(|raw| {
            let secs = if raw > millis_threshold { raw / 1000 } else { raw };
            DateTime::from_timestamp(secs, 0)
                .filter(|dt| dt.year() <= MAX_DATETIME_YEAR)
                .map(|dt| dt.format(DATETIME_FORMAT).to_string())
                .ok_or_else(|| format!("{} seconds is out of DATETIME range", secs))
        });

    Some(converted)
}

/// Normalize one column of every row in place.
///
/// Unconvertible values are set to NULL and reported; the rows themselves
/// are always kept.
pub fn normalize_epoch_column(
    rows: &mut [Row],
    column_index: usize,
    millis_threshold: i64,
    table: &str,
    column: &str,
) -> Vec<TranslationWarning> {
    let mut warnings = Vec::new();

    for row in rows.iter_mut() {
        let Some(value) = row.get_mut(column_index) else {
            continue;
        };
        match epoch_to_datetime(value, millis_threshold) {
            None => {}
            Some(Ok(formatted)) => *value = SqlValue::text_owned(formatted),
            Some(Err(reason)) => {
                let digits = epoch_digits(value).unwrap_or_default();
                let err = MigrateError::row_transform(table, column, format!("{}: {}", digits, reason));
                warn!("{}; value set to NULL", err);
                warnings.push(TranslationWarning::TimestampConversion {
                    table: table.to_string(),
                    column: column.to_string(),
                    value: digits,
                    reason,
                });
                *value = SqlValue::Null;
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: i64 = 4_000_000_000;

    #[test]
    fn test_seconds_and_millis_agree() {
        let secs = epoch_to_datetime(&SqlValue::Integer(1_700_000_000), THRESHOLD);
        let millis = epoch_to_datetime(&SqlValue::Integer(1_700_000_000_000), THRESHOLD);
        assert_eq!(secs, Some(Ok("2023-11-14 22:13:20".to_string())));
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_digit_text_is_converted() {
        assert_eq!(
            epoch_to_datetime(&SqlValue::from("1700000000"), THRESHOLD),
            Some(Ok("2023-11-14 22:13:20".to_string()))
        );
    }

    #[test]
    fn test_non_epoch_values_untouched() {
        assert_eq!(epoch_to_datetime(&SqlValue::Null, THRESHOLD), None);
        assert_eq!(epoch_to_datetime(&SqlValue::Integer(0), THRESHOLD), None);
        assert_eq!(epoch_to_datetime(&SqlValue::Integer(-5), THRESHOLD), None);
        assert_eq!(epoch_to_datetime(&SqlValue::Real(1.7e9), THRESHOLD), None);
        assert_eq!(epoch_to_datetime(&SqlValue::from(""), THRESHOLD), None);
        assert_eq!(
            epoch_to_datetime(&SqlValue::from("2023-11-14 22:13:20"), THRESHOLD),
            None
        );
    }

    #[test]
    fn test_threshold_boundary() {
        // At the threshold the value is still seconds (year 2096).
        let at = epoch_to_datetime(&SqlValue::Integer(THRESHOLD), THRESHOLD);
        assert_eq!(at, Some(Ok("2096-10-02 07:06:40".to_string())));
        let above = epoch_to_datetime(&SqlValue::Integer(THRESHOLD + 1000), THRESHOLD);
        assert_eq!(above, Some(Ok("1970-02-16 07:06:41".to_string())));
    }

    #[test]
    fn test_unrepresentable_values_fail() {
        let huge = epoch_to_datetime(&SqlValue::from("99999999999999999999999"), THRESHOLD);
        assert!(matches!(huge, Some(Err(_))));

        // Divided by 1000 this is still past year 9999.
        let far = epoch_to_datetime(&SqlValue::Integer(i64::MAX), THRESHOLD);
        assert!(matches!(far, Some(Err(_))));
    }

    #[test]
    fn test_normalize_column_nulls_failures() {
        let mut rows: Vec<Row> = vec![
            vec![SqlValue::Integer(1), SqlValue::from("a.js"), SqlValue::Integer(1), SqlValue::Integer(1_700_000_000_000)],
            vec![SqlValue::Integer(2), SqlValue::from("b.js"), SqlValue::Integer(1), SqlValue::from("99999999999999999999999")],
            vec![SqlValue::Integer(3), SqlValue::from("c.js"), SqlValue::Integer(1), SqlValue::Null],
        ];

        let warnings = normalize_epoch_column(&mut rows, 3, THRESHOLD, "knex_migrations", "migration_time");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][3], SqlValue::from("2023-11-14 22:13:20"));
        assert_eq!(rows[1][3], SqlValue::Null);
        assert_eq!(rows[1][1], SqlValue::from("b.js"));
        assert_eq!(rows[2][3], SqlValue::Null);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            TranslationWarning::TimestampConversion { table, value, .. }
                if table == "knex_migrations" && value == "99999999999999999999999"
        ));
    }

    #[test]
    fn test_normalize_short_rows_skipped() {
        let mut rows: Vec<Row> = vec![vec![SqlValue::Integer(1)]];
        let warnings = normalize_epoch_column(&mut rows, 3, THRESHOLD, "t", "c");
        assert!(warnings.is_empty());
        assert_eq!(rows[0], vec![SqlValue::Integer(1)]);
    }
}
