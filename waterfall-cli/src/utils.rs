use std::path::PathBuf;
use std::sync::Arc;

use waterfall_core::{
    parse_config_str, Category, ConfigError, ConfigFormat, LogEntry, LogFilter, LogLevel,
    ResilienceConfig,
};
use waterfall_store::{DailyFileStore, ErrorLog, ErrorLogConfig, PartitionStore, StoreError};

use crate::args::{FilterArgs, LogArgs};
use crate::exit_codes;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Invalid(_) => exit_codes::VALIDATION_FAILED,
            CliError::Read { .. } | CliError::Store(_) => exit_codes::RUNTIME_ERROR,
        }
    }

    /// One line per problem.
    pub fn lines(&self) -> Vec<String> {
        match self {
            CliError::Config(ConfigError::Validation(v)) => {
                v.violations.iter().map(|v| v.to_string()).collect()
            }
            other => vec![other.to_string()],
        }
    }
}

/// Config file, then env/flag overrides (clap has already resolved flag over env).
pub fn load_config(args: &LogArgs) -> Result<ResilienceConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            parse_config_str(&text, ConfigFormat::Auto)?
        }
        None => ResilienceConfig::default(),
    };
    if let Some(dir) = &args.log_dir {
        cfg.log_dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        cfg.log_level = level.parse().map_err(CliError::Invalid)?;
    }
    tracing::debug!(
        log_dir = %cfg.log_dir.display(),
        log_level = %cfg.log_level,
        "configuration loaded"
    );
    Ok(cfg)
}

pub fn partitions(cfg: &ResilienceConfig) -> DailyFileStore {
    DailyFileStore::new(cfg.log_dir.clone())
}

pub async fn load_persisted(cfg: &ResilienceConfig) -> Result<Vec<LogEntry>, CliError> {
    Ok(partitions(cfg).load_all().await?)
}

/// An error log pre-filled with every persisted entry.
pub async fn persisted_log(cfg: &ResilienceConfig) -> Result<Arc<ErrorLog>, CliError> {
    let entries = load_persisted(cfg).await?;
    let log = ErrorLog::new(
        ErrorLogConfig {
            min_level: LogLevel::Debug,
            max_entries: cfg.max_log_entries.max(entries.len()),
        },
        Arc::new(partitions(cfg)),
    );
    log.restore(entries).await;
    Ok(Arc::new(log))
}

pub fn build_filter(args: &FilterArgs) -> Result<LogFilter, CliError> {
    let mut filter = LogFilter::default();
    if let Some(level) = &args.level {
        filter = filter.level(level.parse::<LogLevel>().map_err(CliError::Invalid)?);
    }
    if let Some(category) = &args.category {
        filter = filter.category(category.parse::<Category>().map_err(CliError::Invalid)?);
    }
    if let Some(op) = &args.operation {
        filter = filter.operation(op.clone());
    }
    if let Some(limit) = args.limit {
        filter = filter.limit(limit);
    }
    Ok(filter)
}
