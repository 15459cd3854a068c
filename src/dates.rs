//! Snapshot name to date conversion.
//!
//! Names are matched strictly against a strftime-style pattern (`%Y`,
//! `%m`, `%d`, `%H`, `%M`, ..., literals included). A name that does not
//! match the full pattern is not an error, it is simply filtered out --
//! blank lines and foreign snapshot names fall through here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Parse one snapshot name. All dates are UTC; no timezone conversion.
pub fn parse_date(name: &str, fmt: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(name, fmt) {
        return Some(dt.and_utc());
    }
    // Patterns with no time directives parse as bare dates; default the
    // time of day to midnight, as strptime does.
    NaiveDate::parse_from_str(name, fmt)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Filter-map a sequence of raw names into the dates that parse.
///
/// Order follows the input; duplicates are preserved; non-matching names
/// are silently skipped.
pub fn parse_dates<'a, I, S>(names: I, fmt: &'a str) -> impl Iterator<Item = DateTime<Utc>> + 'a
where
    I: IntoIterator<Item = S> + 'a,
    S: AsRef<str> + 'a,
{
    names
        .into_iter()
        .filter_map(move |name| parse_date(name.as_ref(), fmt))
}

/// Render a date back through the same pattern it was parsed with.
pub fn format_date(date: DateTime<Utc>, fmt: &str) -> String {
    date.format(fmt).to_string()
}
