//! Date parsing with configurable `strftime` formats.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{AltoroError, Result};

/// Parse a calendar date such as `2025-02-01` using `format`.
///
/// # Errors
/// Returns `AltoroError::InvalidInput` when the input does not match.
pub fn parse_date(raw: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format)
        .map_err(|e| {
            AltoroError::InvalidInput(format!("date '{raw}' does not match '{format}': {e}"))
        })
}

/// Parse a transaction timestamp such as `2025-03-12 14:05`.
///
/// Returns `None` for anything that does not match; scraped rows with an
/// unreadable time are skipped rather than failing the page.
pub fn parse_transaction_time(raw: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), format).ok()
}
