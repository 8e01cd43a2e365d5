//! `tot`: record timestamped values to named series from the command line.

mod error;
mod paths;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Args, Parser, Subcommand};
use snafu::ResultExt;
use tot_core::{
    DataAccessor, FileDataAccessor, SystemClock,
    query::{self, AfterBound, ListOptions},
    time::{self, format_timestamp},
};

use crate::error::{CliResult, MissingSeriesSnafu, OutputSnafu};

#[derive(Debug, Subcommand)]
enum Command {
    /// Adds a new series
    Add {
        /// Name of the series
        name: String,

        /// Value columns; the time column is added automatically
        columns: Vec<String>,
    },

    /// Lists the defined series, or the entries of one series
    List {
        series: Option<String>,

        /// The start time after which to list events, either as a date (-a "2020-08-12 3pm")
        /// or as a relative time period (-a -45m). A plain date lists that day only.
        #[arg(short, long, allow_hyphen_values = true, requires = "series")]
        after: Option<String>,

        /// List only unique days on which events occurred
        #[arg(long, requires = "series")]
        days: bool,
    },

    /// Lists the latest entry in each series
    Latest,
}

#[derive(Debug, Args)]
struct RecordArgs {
    /// The time of the event, either as a date (-t "2020-08-12 3pm") or as a
    /// relative time period (-t -45m)
    #[arg(short, long, allow_hyphen_values = true)]
    time: Option<String>,

    /// Series to record to
    series: Option<String>,

    /// One value per column of the series
    #[arg(allow_negative_numbers = true)]
    values: Vec<String>,
}

#[derive(Debug, Parser)]
#[command(
    name = "tot",
    version,
    about = "Record timestamped values to named series",
    args_conflicts_with_subcommands = true,
    arg_required_else_help = true
)]
struct Cli {
    /// The directory containing the series
    #[arg(long, global = true, env = "TOT_PATH")]
    path: Option<PathBuf>,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Option<Command>,

    #[command(flatten)]
    record: RecordArgs,
}

fn cmd_add(accessor: &mut dyn DataAccessor, name: &str, columns: &[String]) -> CliResult<()> {
    accessor.create_series(name, columns)?;
    Ok(())
}

fn cmd_record(
    accessor: &mut dyn DataAccessor,
    series: &str,
    values: &[String],
    time: Option<&str>,
    out: &mut dyn Write,
) -> CliResult<()> {
    let now = accessor.clock().now();
    let timestamp = match time {
        Some(token) => time::resolve(token, now)?,
        None => now,
    };

    accessor.append_values(series, Some(timestamp), values)?;

    let mut message = format!("{}: {series}", format_timestamp(timestamp));
    if !values.is_empty() {
        message.push(' ');
        message.push_str(&values.join(" "));
    }
    writeln!(out, "{message}").context(OutputSnafu)
}

fn cmd_list(
    accessor: &dyn DataAccessor,
    series: Option<&str>,
    after: Option<&str>,
    days: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let Some(series) = series else {
        for name in accessor.list_series()? {
            writeln!(out, "{name}").context(OutputSnafu)?;
        }
        return Ok(());
    };

    let now = accessor.clock().now();
    let after = after
        .map(|token| time::resolve_detailed(token, now))
        .transpose()?
        .map(AfterBound::from);

    let lines = query::list_series_contents(accessor, series, &ListOptions { after, days })?;
    for line in lines {
        writeln!(out, "{line}").context(OutputSnafu)?;
    }
    Ok(())
}

fn cmd_latest(accessor: &dyn DataAccessor, out: &mut dyn Write) -> CliResult<()> {
    for latest in query::latest_entries(accessor)? {
        writeln!(out, "{}:", latest.series).context(OutputSnafu)?;
        writeln!(out, "    {}", latest.entry.line).context(OutputSnafu)?;
    }
    Ok(())
}

fn execute(
    cmd: Option<Command>,
    record: RecordArgs,
    accessor: &mut dyn DataAccessor,
    out: &mut dyn Write,
) -> CliResult<()> {
    match cmd {
        Some(Command::Add { name, columns }) => cmd_add(accessor, &name, &columns),

        Some(Command::List {
            series,
            after,
            days,
        }) => cmd_list(accessor, series.as_deref(), after.as_deref(), days, out),

        Some(Command::Latest) => cmd_latest(accessor, out),

        None => {
            let Some(series) = record.series else {
                return MissingSeriesSnafu.fail();
            };
            cmd_record(
                accessor,
                &series,
                &record.values,
                record.time.as_deref(),
                out,
            )
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dir = paths::resolve_storage_dir(cli.path.as_deref())?;
    let mut accessor = FileDataAccessor::open(dir, Arc::new(SystemClock))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli.cmd, cli.record, &mut accessor, &mut out)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
