//! Fixed table of valid retention interval names.
//!
//! Intervals are a compile-time table, never extended at runtime. The
//! `year` entry is exactly 365 days; nothing here is calendar-aware.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Valid interval names and their lengths in seconds, ascending.
const INTERVALS: &[(&str, u64)] = &[
    ("minute", MINUTE),
    ("5minute", 5 * MINUTE),
    ("10minute", 10 * MINUTE),
    ("15minute", 15 * MINUTE),
    ("30minute", 30 * MINUTE),
    ("hour", HOUR),
    ("3hour", 3 * HOUR),
    ("6hour", 6 * HOUR),
    ("12hour", 12 * HOUR),
    ("day", DAY),
    ("week", WEEK),
    ("2week", 2 * WEEK),
    ("4week", 4 * WEEK),
    ("30day", 30 * DAY),
    ("8week", 8 * WEEK),
    ("year", 365 * DAY),
];

/// Look up the duration of a named interval.
///
/// Returns `None` for unknown names; callers surface that as
/// [`RetenError::UnknownInterval`](crate::reten::RetenError::UnknownInterval).
pub fn lookup(name: &str) -> Option<Duration> {
    INTERVALS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, secs)| Duration::from_secs(*secs))
}

/// All valid interval names, in table order.
pub fn valid_names() -> impl Iterator<Item = &'static str> {
    INTERVALS.iter().map(|(n, _)| *n)
}

/// Comma-separated listing of valid interval names for diagnostics
/// and the `--list-valid-intervals` query.
pub fn list_valid_intervals() -> String {
    valid_names().collect::<Vec<_>>().join(", ")
}
