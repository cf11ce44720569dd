use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod plan;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "waterfall", version, about = "Resilient operation runner and error-log analyser")]
struct Cli {
    /// Diagnostic verbosity on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Run {
            plan,
            continue_on_failure,
            concurrency,
            events,
            report_dir,
            output,
            log,
        } => {
            cmd::run::run_cmd(
                &plan,
                continue_on_failure,
                concurrency,
                events,
                report_dir.as_deref(),
                output,
                log,
            )
            .await
        }
        Command::Analyze {
            since_hours,
            output,
            log,
        } => cmd::analyze::analyze_cmd(since_hours, output, log).await,
        Command::Stats { output, log } => cmd::stats::stats_cmd(output, log).await,
        Command::Export {
            to,
            out_dir,
            filter,
            output,
            log,
        } => cmd::export::export_cmd(to, out_dir, filter, output, log).await,
        Command::Prune {
            days,
            partitions,
            output,
            log,
        } => cmd::prune::prune_cmd(days, partitions, output, log).await,
        Command::Report {
            out_dir,
            output,
            log,
        } => cmd::report::report_cmd(&out_dir, output, log).await,
    }
}
