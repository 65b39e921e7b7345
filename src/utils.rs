//! Utility functions for date keys, A1 notation and log formatting.
//!
//! This module provides helper functions used throughout the application:
//! - Date-derived sheet keys (`YYMMDD`)
//! - Column letters, cell references and quoted sheet titles for A1 ranges
//! - String truncation for logging

use crate::errors::{HarvestError, Result};
use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}(0[1-9]|1[0-2])(0[1-9]|[12]\d|3[01])$").expect("static date key pattern")
});

/// Sheet key for a point in time, e.g. `250101` for 1 January 2025.
pub fn date_key<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%y%m%d").to_string()
}

/// Accept a user-supplied date key only in `YYMMDD` form.
pub fn validate_date_key(key: &str) -> Result<String> {
    if DATE_KEY.is_match(key) {
        Ok(key.to_string())
    } else {
        Err(HarvestError::Config(format!(
            "date key '{key}' is not in YYMMDD form"
        )))
    }
}

/// Column letters for a 1-based column number: 1 → `A`, 27 → `AA`, 50 → `AX`.
pub fn column_letter(column: usize) -> String {
    let mut n = column.max(1);
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1 reference of a cell from 1-based column and row.
pub fn a1_cell(column: usize, row: usize) -> String {
    format!("{}{}", column_letter(column), row)
}

/// Quote a sheet title for use in an A1 range, doubling embedded quotes.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and a count
/// of the dropped bytes appended. Cuts always land on a char boundary, which
/// matters for the Japanese page text this tool handles.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}
