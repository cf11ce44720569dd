use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone, Default)]
pub struct LogArgs {
    /// Config file (JSON or YAML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "WATERFALL_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
    /// Minimum level kept by the error log.
    #[arg(long, env = "WATERFALL_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct FilterArgs {
    /// Minimum level.
    #[arg(long)]
    pub level: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub operation: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormatArg {
    Json,
    Csv,
    Text,
}

impl From<ExportFormatArg> for waterfall_store::ExportFormat {
    fn from(f: ExportFormatArg) -> Self {
        match f {
            ExportFormatArg::Json => waterfall_store::ExportFormat::Json,
            ExportFormatArg::Csv => waterfall_store::ExportFormat::Csv,
            ExportFormatArg::Text => waterfall_store::ExportFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventsArg {
    /// JSON Lines on stderr.
    Stderr,
    /// `debug` records on the diagnostic log (needs `-vv` or `RUST_LOG`).
    Tracing,
    None,
}
