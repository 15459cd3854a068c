use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use snapfilter::{KeepFlags, RetenSpec, date_filter, dates, intervals};
use std::io::{self, Read, Write};

#[derive(Parser)]
#[command(name = "snapfilter")]
#[command(about = "Filter timestamped snapshot names through a tiered retention policy")]
#[command(version)]
struct Cli {
    /// Print the snapshots to keep, oldest first
    #[arg(long, conflicts_with = "remove")]
    keep: bool,

    /// Print the snapshots to remove, newest first
    #[arg(long)]
    remove: bool,

    /// Date format pattern the snapshot names follow (strftime directives,
    /// literal characters must match exactly)
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FMT",
        required_unless_present = "list_valid_intervals"
    )]
    format: Option<String>,

    /// Retention specification: whitespace-separated <interval> <count> pairs,
    /// e.g. "day 7 week 4 year 3"
    #[arg(
        short = 'r',
        long = "reten",
        value_name = "RETEN",
        required_unless_present = "list_valid_intervals"
    )]
    reten: Option<String>,

    /// Always keep the single most recent snapshot
    #[arg(short = 'l', long)]
    keep_latest: bool,

    /// Also keep the oldest snapshot of every populated bucket
    #[arg(short = 'o', long)]
    keep_oldest: bool,

    /// Keep every snapshot younger than the smallest age boundary
    #[arg(short = 'y', long)]
    keep_younger: bool,

    /// List valid interval names and exit
    #[arg(short = 'R', long)]
    list_valid_intervals: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable quiet mode (warnings only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Map the verbosity flags to a log level. Logs go to stderr so stdout
/// stays a clean pipe for the filtered names.
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::WARN
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
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

    if !cli.keep && !cli.remove {
        bail!("one of --keep or --remove is required");
    }
    let fmt = cli.format.as_deref().context("-f <fmt> is required")?;
    let reten_arg = cli.reten.as_deref().context("-r <reten> is required")?;

    // Spec errors abort here, before any snapshot names are read.
    let reten = RetenSpec::parse(reten_arg)?;

    let flags = KeepFlags {
        keep_latest: cli.keep_latest,
        keep_oldest: cli.keep_oldest,
        keep_younger: cli.keep_younger,
    };

    // Reference clock: sampled once, threaded through every age comparison.
    let now = Utc::now();

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read snapshot names from stdin")?;
    let snapdates: Vec<_> = dates::parse_dates(input.lines(), fmt).collect();

    let output = date_filter(cli.keep, &snapdates, &reten, now, flags);

    let mut stdout = io::stdout().lock();
    for date in output {
        writeln!(stdout, "{}", dates::format_date(date, fmt))
            .context("failed to write output")?;
    }
    Ok(())
}
