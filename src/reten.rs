//! Retention specification parsing and age boundary expansion.
//!
//! A retention spec is a single string of whitespace-separated
//! `<interval> <count>` pairs, e.g. `"day 7 week 4 year 3"`: keep one
//! representative snapshot for each of the last 7 day-slots, 4 week-slots
//! and 3 year-slots. Parsing is eager and fails before any snapshot data
//! is touched.

use crate::intervals;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing a retention specification.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetenError {
    /// Odd token count: the spec is not a sequence of pairs.
    #[error("malformed retention spec: expected whitespace-separated <interval> <count> pairs")]
    MalformedSpec,

    /// Interval name not present in the interval table.
    #[error(
        "unknown interval '{name}', valid intervals are: {}",
        intervals::list_valid_intervals()
    )]
    UnknownInterval { name: String },

    /// Count token is not a positive integer.
    #[error("invalid count '{token}': must be a positive integer")]
    InvalidCount { token: String },

    /// The spec parsed to zero pairs.
    #[error("empty retention spec")]
    EmptySpec,
}

/// A parsed retention specification: interval name → slot count.
///
/// Immutable once constructed. Later occurrences of the same interval
/// name overwrite earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetenSpec {
    slots: HashMap<String, Slot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    duration: Duration,
    count: u32,
}

impl RetenSpec {
    /// Parse a retention spec string.
    ///
    /// # Errors
    ///
    /// Returns [`RetenError::MalformedSpec`] on an odd token count,
    /// [`RetenError::UnknownInterval`] for names outside the interval
    /// table, [`RetenError::InvalidCount`] when a count is not a positive
    /// integer, and [`RetenError::EmptySpec`] when no pairs were given.
    pub fn parse(spec: &str) -> Result<Self, RetenError> {
        let tokens: Vec<&str> = spec.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(RetenError::MalformedSpec);
        }

        let mut slots = HashMap::new();
        for pair in tokens.chunks_exact(2) {
            let (name, count_token) = (pair[0], pair[1]);
            let duration =
                intervals::lookup(name).ok_or_else(|| RetenError::UnknownInterval {
                    name: name.to_string(),
                })?;
            let count = count_token
                .parse::<u32>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| RetenError::InvalidCount {
                    token: count_token.to_string(),
                })?;
            slots.insert(name.to_string(), Slot { duration, count });
        }

        if slots.is_empty() {
            return Err(RetenError::EmptySpec);
        }
        Ok(Self { slots })
    }

    /// Expand the spec into its age boundary set: every multiple
    /// `i × duration(interval)` for `i in 1..=count`, ascending,
    /// deduplicated. Consecutive boundaries delimit the half-open
    /// age buckets the selector scans.
    pub fn age_boundaries(&self) -> Vec<Duration> {
        let mut boundaries: Vec<Duration> = self
            .slots
            .values()
            .flat_map(|slot| {
                let secs = slot.duration.as_secs();
                (1..=u64::from(slot.count)).map(move |i| Duration::from_secs(i * secs))
            })
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();
        boundaries
    }

    /// Number of distinct intervals in the spec.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the spec holds no intervals. `parse` never produces this.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
