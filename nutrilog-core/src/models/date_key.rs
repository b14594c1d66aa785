//! Date keys used as path segments for time-series records (`yyyyMMdd`).

use chrono::NaiveDate;

const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// Formats a date as a `yyyyMMdd` path segment.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses a `yyyyMMdd` path segment. Returns `None` for anything else.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    if key.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}
