//! Bucket selection and the keep/remove retention engine.
//!
//! Ages are computed against a single reference instant `now` that the
//! caller samples once per run and threads through explicitly; nothing in
//! this module reads the clock. Consecutive age boundaries delimit
//! half-open buckets `[agemin, agemax)`; at most one snapshot survives
//! per bucket (two with `keep_oldest`).

use crate::reten::RetenSpec;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, trace};

/// Optional retention overrides applied on top of bucket selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepFlags {
    /// Always keep the single most recent snapshot.
    pub keep_latest: bool,
    /// Additionally keep the oldest snapshot of every populated bucket.
    pub keep_oldest: bool,
    /// Keep every snapshot younger than the smallest age boundary.
    pub keep_younger: bool,
}

/// Reward snapshots aligned to natural calendar boundaries: top of hour,
/// midnight, first of month, January. Higher is better.
fn preference_score(date: &DateTime<Utc>) -> u32 {
    let mut score = 0;
    if date.minute() == 0 {
        score += 8;
    }
    if date.hour() == 0 {
        score += 4;
    }
    if date.day() == 1 {
        score += 2;
    }
    if date.month() == 1 {
        score += 1;
    }
    score
}

/// Convert a table duration into signed chrono arithmetic, saturating on
/// absurd count × interval products rather than overflowing.
fn age_boundary(b: Duration) -> chrono::Duration {
    i64::try_from(b.as_secs())
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// Pick the surviving snapshot(s) of every populated bucket.
///
/// `dates` must be ascending and deduplicated, `boundaries` ascending.
/// N boundaries yield N−1 buckets: the first boundary starts the first
/// bucket, so nothing younger than it is selected here. Per bucket the
/// primary keeper is the oldest among the top-scoring dates; with
/// `keep_oldest` the bucket's overall oldest date survives as well.
/// Keepers are emitted newest-first within each bucket.
pub(crate) fn select_bucket_keepers(
    dates: &[DateTime<Utc>],
    boundaries: &[Duration],
    keep_oldest: bool,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut keepers = Vec::new();

    for window in boundaries.windows(2) {
        let (agemin, agemax) = (age_boundary(window[0]), age_boundary(window[1]));
        let bucket: Vec<DateTime<Utc>> = dates
            .iter()
            .copied()
            .filter(|d| {
                let age = now - *d;
                age >= agemin && age < agemax
            })
            .collect();
        let Some(oldest) = bucket.first().copied() else {
            continue;
        };

        let best_score = bucket.iter().map(preference_score).max().unwrap_or(0);
        let primary = bucket
            .iter()
            .copied()
            .find(|d| preference_score(d) == best_score)
            .unwrap_or(oldest);
        trace!(
            bucket_start = %humantime::format_duration(window[0]),
            bucket_end = %humantime::format_duration(window[1]),
            candidates = bucket.len(),
            keeper = %primary,
            "selected bucket keeper"
        );

        if keep_oldest && oldest != primary {
            // Emit newest-first within the bucket.
            keepers.push(primary.max(oldest));
            keepers.push(primary.min(oldest));
        } else {
            keepers.push(primary);
        }
    }

    keepers
}

/// Partition `snapdates` into keep/remove sets and return the requested
/// side: the keep set ascending, or the remove set descending (newest
/// first, so destructive consumers can delete incrementally).
///
/// Input is treated as a date set: it is sorted and deduplicated before
/// bucketing. Empty input yields empty output with no error.
pub fn date_filter(
    keep: bool,
    snapdates: &[DateTime<Utc>],
    reten: &RetenSpec,
    now: DateTime<Utc>,
    flags: KeepFlags,
) -> Vec<DateTime<Utc>> {
    let mut dates = snapdates.to_vec();
    dates.sort_unstable();
    dates.dedup();
    if dates.is_empty() {
        return Vec::new();
    }

    let boundaries = reten.age_boundaries();
    debug!(
        snapshots = dates.len(),
        boundaries = boundaries.len(),
        "scanning retention buckets"
    );

    let mut keepers: BTreeSet<DateTime<Utc>> =
        select_bucket_keepers(&dates, &boundaries, flags.keep_oldest, now)
            .into_iter()
            .collect();

    if flags.keep_latest
        && let Some(latest) = dates.last()
    {
        keepers.insert(*latest);
    }

    if flags.keep_younger
        && let Some(first) = boundaries.first()
    {
        let cutoff = age_boundary(*first);
        keepers.extend(dates.iter().copied().filter(|d| now - *d < cutoff));
    }

    debug!(kept = keepers.len(), total = dates.len(), "computed keep set");

    if keep {
        keepers.into_iter().collect()
    } else {
        dates
            .iter()
            .rev()
            .copied()
            .filter(|d| !keepers.contains(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn date(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .expect("valid test date")
            .and_utc()
    }

    fn days(n: u64) -> Duration {
        Duration::from_secs(n * 86_400)
    }

    #[test]
    fn test_preference_score_rewards_calendar_alignment() {
        assert_eq!(preference_score(&date("2024-06-15 10:30:00")), 0);
        assert_eq!(preference_score(&date("2024-06-15 10:00:00")), 8);
        assert_eq!(preference_score(&date("2024-06-15 00:00:00")), 12);
        assert_eq!(preference_score(&date("2024-06-01 00:00:00")), 14);
        assert_eq!(preference_score(&date("2024-01-01 00:00:00")), 15);
    }

    #[test]
    fn test_score_tie_picks_the_older_date() {
        let now = date("2024-06-15 12:00:00");
        // Both in [1d, 2d), both score 8 (top of hour).
        let older = date("2024-06-13 20:00:00"); // 40h old
        let newer = date("2024-06-14 11:00:00"); // 25h old
        let keepers = select_bucket_keepers(&[older, newer], &[days(1), days(2)], false, now);
        assert_eq!(keepers, vec![older]);
    }

    #[test]
    fn test_higher_score_beats_age() {
        let now = date("2024-06-15 12:00:00");
        let older = date("2024-06-13 20:30:00"); // score 0
        let newer = date("2024-06-14 11:00:00"); // score 8
        let keepers = select_bucket_keepers(&[older, newer], &[days(1), days(2)], false, now);
        assert_eq!(keepers, vec![newer]);
    }

    #[test]
    fn test_bucket_edges_are_half_open() {
        let now = date("2024-06-15 00:00:00");
        let exactly_one_day = date("2024-06-14 00:00:00");
        let exactly_two_days = date("2024-06-13 00:00:00");
        // agemin is inclusive: a date exactly 1d old is in [1d, 2d).
        let keepers =
            select_bucket_keepers(&[exactly_one_day], &[days(1), days(2)], false, now);
        assert_eq!(keepers, vec![exactly_one_day]);
        // agemax is exclusive: a date exactly 2d old belongs to the next bucket.
        let keepers =
            select_bucket_keepers(&[exactly_two_days], &[days(1), days(2)], false, now);
        assert!(keepers.is_empty());
        let keepers =
            select_bucket_keepers(&[exactly_two_days], &[days(1), days(2), days(3)], false, now);
        assert_eq!(keepers, vec![exactly_two_days]);
    }

    #[test]
    fn test_extreme_boundaries_saturate_instead_of_panicking() {
        let now = date("2024-06-15 12:00:00");
        let d = date("2024-06-14 11:00:00"); // 25h old
        // Boundary seconds beyond chrono's representable range must clamp,
        // not abort: count × interval can exceed it in a valid spec.
        let huge = Duration::from_secs(u64::MAX);
        let near_huge = Duration::from_secs(i64::MAX as u64);
        let keepers =
            select_bucket_keepers(&[d], &[days(1), near_huge, huge], false, now);
        assert_eq!(keepers, vec![d]);
    }

    #[test]
    fn test_nothing_selected_younger_than_first_boundary() {
        let now = date("2024-06-15 12:00:00");
        let young = date("2024-06-15 02:00:00"); // 10h old
        let keepers = select_bucket_keepers(&[young], &[days(1), days(2)], false, now);
        assert!(keepers.is_empty());
    }

    #[test]
    fn test_keep_oldest_adds_bucket_minimum_newest_first() {
        let now = date("2024-06-15 12:00:00");
        let oldest = date("2024-06-13 20:30:00"); // score 0, bucket minimum
        let scored = date("2024-06-14 11:00:00"); // score 8, primary keeper
        let keepers =
            select_bucket_keepers(&[oldest, scored], &[days(1), days(2)], true, now);
        assert_eq!(keepers, vec![scored, oldest]);
    }

    #[test]
    fn test_keep_oldest_does_not_duplicate_the_primary() {
        let now = date("2024-06-15 12:00:00");
        let only = date("2024-06-14 11:00:00");
        let keepers = select_bucket_keepers(&[only], &[days(1), days(2)], true, now);
        assert_eq!(keepers, vec![only]);
    }

    #[test]
    fn test_empty_buckets_are_skipped() {
        let now = date("2024-06-15 12:00:00");
        let old = date("2024-06-05 11:00:00");
        // Buckets [1d,2d) and [2d,3d) are empty, and the 10-day-old date
        // is past the last boundary, so nothing is selected.
        let keepers =
            select_bucket_keepers(&[old], &[days(1), days(2), days(3)], false, now);
        assert!(keepers.is_empty());
    }

    fn spec(s: &str) -> RetenSpec {
        RetenSpec::parse(s).unwrap()
    }

    #[test]
    fn test_engine_empty_input_is_empty_output() {
        let now = date("2024-06-15 12:00:00");
        let flags = KeepFlags {
            keep_latest: true,
            keep_oldest: true,
            keep_younger: true,
        };
        assert!(date_filter(true, &[], &spec("day 2"), now, flags).is_empty());
        assert!(date_filter(false, &[], &spec("day 2"), now, flags).is_empty());
    }

    #[test]
    fn test_engine_keep_and_remove_partition_the_input() {
        let now = date("2024-06-15 12:00:00");
        let input: Vec<DateTime<Utc>> = (1..=20)
            .map(|h| now - chrono::Duration::hours(h * 7))
            .collect();
        let reten = spec("day 3 week 2");
        let keep = date_filter(true, &input, &reten, now, KeepFlags::default());
        let remove = date_filter(false, &input, &reten, now, KeepFlags::default());
        assert_eq!(keep.len() + remove.len(), input.len());
        for d in &input {
            assert_ne!(keep.contains(d), remove.contains(d));
        }
    }

    #[test]
    fn test_engine_worked_scenario_single_date_in_bucket() {
        // spec "day 2": boundaries {1d, 2d}. One date in [1d, 2d), one
        // younger than the first boundary, one past the last boundary.
        let now = date("2024-06-15 12:00:00");
        let young = now - chrono::Duration::hours(10);
        let middle = now - chrono::Duration::hours(25);
        let old = now - chrono::Duration::hours(49);
        let input = [young, old, middle];
        let reten = spec("day 2");

        let keep = date_filter(true, &input, &reten, now, KeepFlags::default());
        assert_eq!(keep, vec![middle]);

        // Remove set is descending: newest first.
        let remove = date_filter(false, &input, &reten, now, KeepFlags::default());
        assert_eq!(remove, vec![young, old]);
    }

    #[test]
    fn test_engine_worked_scenario_two_dates_in_bucket() {
        // With ages 25h and 40h both in [1d, 2d) and tied on score, the
        // older one survives.
        let now = date("2024-06-15 12:00:00");
        let young = now - chrono::Duration::hours(10);
        let middle = now - chrono::Duration::hours(25);
        let old = now - chrono::Duration::hours(40);
        let reten = spec("day 2");

        let keep = date_filter(true, &[young, middle, old], &reten, now, KeepFlags::default());
        assert_eq!(keep, vec![old]);
    }

    #[test]
    fn test_engine_keep_latest_rescues_the_most_recent() {
        let now = date("2024-06-15 12:00:00");
        let young = now - chrono::Duration::hours(10);
        let input = [young];
        let reten = spec("day 2");

        // Base keep set is empty: the only date is younger than 1d.
        assert!(date_filter(true, &input, &reten, now, KeepFlags::default()).is_empty());

        let flags = KeepFlags {
            keep_latest: true,
            ..Default::default()
        };
        assert_eq!(date_filter(true, &input, &reten, now, flags), vec![young]);
    }

    #[test]
    fn test_engine_keep_younger_rescues_everything_below_first_boundary() {
        let now = date("2024-06-15 12:00:00");
        let very_young = now - chrono::Duration::hours(2);
        let young = now - chrono::Duration::hours(10);
        let kept_by_bucket = now - chrono::Duration::hours(25);
        let input = [very_young, young, kept_by_bucket];
        let reten = spec("day 2");

        let flags = KeepFlags {
            keep_younger: true,
            ..Default::default()
        };
        let keep = date_filter(true, &input, &reten, now, flags);
        assert_eq!(keep, vec![kept_by_bucket, young, very_young]);
    }

    #[test]
    fn test_engine_keep_younger_is_strict() {
        let now = date("2024-06-15 12:00:00");
        let exactly_one_day = now - chrono::Duration::days(1);
        let reten = spec("day 2");
        let flags = KeepFlags {
            keep_younger: true,
            ..Default::default()
        };
        // Age == smallest boundary is not younger; it is kept by its
        // bucket instead, so both modes agree with the base run.
        let keep = date_filter(true, &[exactly_one_day], &reten, now, flags);
        assert_eq!(keep, vec![exactly_one_day]);
        let base = date_filter(true, &[exactly_one_day], &reten, now, KeepFlags::default());
        assert_eq!(keep, base);
    }

    #[test]
    fn test_engine_deduplicates_input() {
        let now = date("2024-06-15 12:00:00");
        let d = now - chrono::Duration::hours(25);
        let reten = spec("day 2");
        let keep = date_filter(true, &[d, d, d], &reten, now, KeepFlags::default());
        assert_eq!(keep, vec![d]);
        let remove = date_filter(false, &[d, d, d], &reten, now, KeepFlags::default());
        assert!(remove.is_empty());
    }

    #[test]
    fn test_engine_remove_is_descending() {
        let now = date("2024-06-15 12:00:00");
        let input: Vec<DateTime<Utc>> = (1..=30)
            .map(|h| now - chrono::Duration::hours(h * 5))
            .collect();
        let remove = date_filter(false, &input, &spec("day 1"), now, KeepFlags::default());
        assert!(remove.windows(2).all(|w| w[0] > w[1]));
    }
}
