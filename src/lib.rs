//! snapfilter: tiered time-bucket retention filtering for snapshot names.
//!
//! This crate classifies timestamped snapshot names into "keep" and
//! "remove" sets according to a tiered time-bucket retention policy. It is
//! a filter stage: upstream produces a list of named snapshots, downstream
//! destroys whatever the remove set designates. The computation is a
//! single deterministic in-memory transformation against one fixed
//! reference instant.
//!
//! ## Architecture
//!
//! - `intervals`: fixed table of valid interval names and their lengths
//! - `reten`: retention spec parsing and age boundary expansion
//! - `dates`: strict strftime parsing/rendering of snapshot names
//! - `filter`: bucket selection and the keep/remove engine
//!
//! ## Usage
//!
//! ```
//! use chrono::Utc;
//! use snapfilter::{KeepFlags, RetenSpec, date_filter, parse_dates};
//!
//! let reten = RetenSpec::parse("day 7 week 4")?;
//! let names = ["backup-2024-03-01_00.00.00", "not-a-snapshot"];
//! let dates: Vec<_> = parse_dates(names, "backup-%Y-%m-%d_%H.%M.%S").collect();
//!
//! let keep = date_filter(true, &dates, &reten, Utc::now(), KeepFlags::default());
//! assert!(keep.len() <= dates.len());
//! # Ok::<(), snapfilter::RetenError>(())
//! ```

pub mod dates;
pub mod filter;
pub mod intervals;
pub mod reten;

// Re-export commonly used types
pub use dates::{format_date, parse_date, parse_dates};
pub use filter::{KeepFlags, date_filter};
pub use reten::{RetenError, RetenSpec};
