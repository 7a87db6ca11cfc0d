//! Common types used across CLI modules

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use stratwatch_core::domain::log::LOG_TIMESTAMP_FORMAT;

/// Parse a window bound given on the command line
///
/// Accepts RFC 3339, the `YYYY-mm-dd HH:MM:SS` form used in job logs, or a
/// bare date meaning midnight. Values without an offset are taken as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(input, LOG_TIMESTAMP_FORMAT) {
        return Ok(naive.and_utc());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{}'", input))
}
