//! Parsing of caller-supplied window bounds and article publication times.
//!
//! All values are naive local date-times; nothing here knows about time zones
//! beyond converting epoch timestamps into the local clock.

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::warn;

use crate::error::{AppError, Result};

/// Canonical format for window bounds, article times and output.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Older compact format still accepted for window bounds.
pub const COMPACT_DATETIME_FORMAT: &str = "%Y%m%d %H%M%S";

/// Timestamps above this magnitude are taken to be milliseconds.
pub const MILLIS_THRESHOLD: f64 = 30_000_000_000.0;

/// Parses a window bound in either the canonical or the compact format.
pub fn parse_input_time(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, COMPACT_DATETIME_FORMAT))
        .map_err(|_| {
            warn!(input, "time string is neither YYYY-MM-DD HH:MM:SS nor YYYYMMDD HHMMSS");
            AppError::ParseError(format!(
                "invalid time '{}', expected YYYY-MM-DD HH:MM:SS",
                input
            ))
        })
}

/// Parses an article's own datetime string. Only the canonical format counts.
pub fn parse_article_datetime(input: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), DATETIME_FORMAT).ok()
}

/// Converts an epoch timestamp to local time, guessing seconds vs milliseconds.
pub fn timestamp_to_local(ts: f64) -> Option<NaiveDateTime> {
    if !ts.is_finite() {
        return None;
    }
    let millis = if ts.abs() > MILLIS_THRESHOLD { ts } else { ts * 1000.0 };
    let millis = millis.round();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
        .map(|utc| utc.with_timezone(&Local).naive_local())
}

pub fn format_datetime(time: &NaiveDateTime) -> String {
    time.format(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn canonical_format_round_trips() {
        for input in ["2024-03-01 08:15:42", "1999-12-31 23:59:59", "2024-02-29 00:00:00"] {
            let parsed = parse_input_time(input).unwrap();
            assert_eq!(format_datetime(&parsed), input);
        }
    }

    #[test]
    fn compact_format_is_accepted() {
        let parsed = parse_input_time("20240301 081542").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 15, 42)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn other_formats_are_rejected() {
        for input in ["", "yesterday", "2024/03/01 08:15:42", "2024-03-01T08:15:42", "2024-13-01 00:00:00"] {
            let err = parse_input_time(input).unwrap_err();
            assert!(matches!(err, AppError::ParseError(_)), "{input} should fail");
        }
    }

    #[test]
    fn article_datetime_only_accepts_canonical_format() {
        assert!(parse_article_datetime("2024-03-01 08:15:42").is_some());
        assert!(parse_article_datetime("20240301 081542").is_none());
        assert!(parse_article_datetime("March 1st").is_none());
    }

    #[test]
    fn seconds_and_millis_give_the_same_instant() {
        let from_secs = timestamp_to_local(1_700_000_000.0).unwrap();
        let from_millis = timestamp_to_local(1_700_000_000_000.0).unwrap();
        assert_eq!(from_secs, from_millis);

        let expected = Local.timestamp_opt(1_700_000_000, 0).single().unwrap().naive_local();
        assert_eq!(from_secs, expected);
    }

    #[test]
    fn threshold_itself_is_read_as_seconds() {
        let at_threshold = timestamp_to_local(MILLIS_THRESHOLD).unwrap();
        let expected = Local
            .timestamp_opt(30_000_000_000, 0)
            .single()
            .unwrap()
            .naive_local();
        assert_eq!(at_threshold, expected);
    }

    #[test]
    fn non_finite_timestamps_are_rejected() {
        assert!(timestamp_to_local(f64::NAN).is_none());
        assert!(timestamp_to_local(f64::INFINITY).is_none());
    }
}
