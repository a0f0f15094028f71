//! Record dates
//!
//! Dates are stored as ISO-8601 strings so they sort lexically; this module
//! is the single place that decides which spellings are accepted.

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a calendar date (`2024-01-01`) into midnight UTC.
pub fn parse_record_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
