use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a plan of shell-command operations through retry and fallbacks.
    Run {
        plan: PathBuf,
        /// Keep going after an operation fails outright.
        #[arg(long)]
        continue_on_failure: bool,
        /// Run up to N operations at once (no stop-on-failure).
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
        #[arg(long, value_enum, default_value_t = EventsArg::None)]
        events: EventsArg,
        /// Write the handler/log/combined report bundle here afterwards.
        #[arg(long)]
        report_dir: Option<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Summary, patterns, recommendations and hourly trends over persisted errors.
    Analyze {
        #[arg(long)]
        since_hours: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    Stats {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Export persisted entries as JSON, CSV or text.
    Export {
        #[arg(long = "to", value_enum, default_value_t = ExportFormatArg::Json)]
        to: ExportFormatArg,
        /// Defaults to the log directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Count entries older than N days; with --partitions delete those day files.
    Prune {
        #[arg(long)]
        days: u32,
        #[arg(long)]
        partitions: bool,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Write the three-file report bundle from persisted data.
    Report {
        #[arg(long)]
        out_dir: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        log: LogArgs,
    },
}
