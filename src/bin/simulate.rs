//! Simulate snapshot creation and removal over time.
//!
//! The initial snapshot list is read from stdin. Each run prints the keep
//! set for the current clock, then jumps `-i <seconds>` forward; with
//! `--create` a new snapshot is taken at every step and the keep set is
//! fed back in as the next snapshot list. Useful for eyeballing how a
//! retention spec thins a snapshot history.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use snapfilter::{KeepFlags, RetenSpec, date_filter, dates, intervals};
use std::io::{self, Read};

#[derive(Parser)]
#[command(name = "simulate")]
#[command(about = "Simulate snapshot creation and removal under a retention policy")]
#[command(version)]
struct Cli {
    /// Date format pattern the snapshot names follow (strftime directives)
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FMT",
        required_unless_present = "list_valid_intervals"
    )]
    format: Option<String>,

    /// Retention specification: whitespace-separated <interval> <count> pairs
    #[arg(
        short = 'r',
        long = "reten",
        value_name = "RETEN",
        required_unless_present = "list_valid_intervals"
    )]
    reten: Option<String>,

    /// Jump this many seconds forward in time at each iteration
    #[arg(
        short = 'i',
        long = "interval",
        value_name = "SECONDS",
        required_unless_present = "list_valid_intervals"
    )]
    interval: Option<i64>,

    /// Create a snapshot at each iteration
    #[arg(short = 'c', long)]
    create: bool,

    /// Always keep the single most recent snapshot
    #[arg(short = 'l', long)]
    keep_latest: bool,

    /// Keep every snapshot younger than the smallest age boundary
    #[arg(short = 'y', long)]
    keep_younger: bool,

    /// Wait for <Enter> between runs
    #[arg(short = 'p', long)]
    prompt: bool,

    /// List valid interval names and exit
    #[arg(short = 'R', long)]
    list_valid_intervals: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_valid_intervals {
        println!("{}", intervals::list_valid_intervals());
        return Ok(());
    }

    let fmt = cli.format.as_deref().context("-f <fmt> is required")?;
    let reten = RetenSpec::parse(cli.reten.as_deref().context("-r <reten> is required")?)?;
    let interval = cli.interval.context("-i <seconds> is required")?;
    let step = chrono::Duration::try_seconds(interval)
        .context("-i <seconds> is out of range")?;

    let flags = KeepFlags {
        keep_latest: cli.keep_latest,
        keep_oldest: false,
        keep_younger: cli.keep_younger,
    };

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read snapshot names from stdin")?;
    let mut snapdates: Vec<DateTime<Utc>> = dates::parse_dates(input.lines(), fmt).collect();

    // The simulated clock starts at the newest snapshot.
    let mut now = snapdates
        .iter()
        .copied()
        .max()
        .context("empty snapshot list")?;

    let mut run = 0u64;
    loop {
        println!("RUN {run}  NOW {}", now.format("%Y-%m-%d_%H.%M.%S"));
        if snapdates.is_empty() {
            println!("No more snapshots");
            return Ok(());
        }

        let kept = date_filter(true, &snapdates, &reten, now, flags);
        for date in &kept {
            println!("{}", dates::format_date(*date, fmt));
        }

        if cli.prompt {
            let mut line = String::new();
            io::stdin()
                .read_line(&mut line)
                .context("failed to read prompt input")?;
        }
        println!();

        now += step;
        snapdates = kept;
        if cli.create {
            snapdates.push(now);
        }
        run += 1;
    }
}
