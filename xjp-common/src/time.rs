//! Date utilities
//!
//! Release and graduation dates are stored as free ISO strings
//! (`2025-09-01`, `2025-09-01T10:00:00Z`, ...). Only the date part matters;
//! anything that does not parse is treated as absent.

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse the leading `YYYY-MM-DD` of an ISO date/time string.
///
/// Returns `None` for empty or unparsable values.
pub fn iso_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let head = trimmed.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Same as [`iso_date`] for optional fields.
pub fn iso_date_opt(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(iso_date)
}
