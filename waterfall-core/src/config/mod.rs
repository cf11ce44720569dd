mod parse;
mod validate;

use std::path::PathBuf;

use crate::types::LogLevel;

pub use parse::{parse_config_str, parse_document_str, ConfigFormat};

/// Randomisation applied to each computed backoff delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Deterministic backoff.
    #[default]
    None,
    /// Uniform in `[0, computed delay]`.
    Full,
}

/// Tunables for the retry engine, fallback waterfall and error log.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter: Jitter,
    pub enable_fallbacks: bool,
    pub enable_logging: bool,
    pub log_level: LogLevel,
    pub graceful_degradation: bool,
    pub log_dir: PathBuf,
    pub max_log_entries: usize,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            jitter: Jitter::None,
            enable_fallbacks: true,
            enable_logging: true,
            log_level: LogLevel::Info,
            graceful_degradation: true,
            log_dir: PathBuf::from("test-results/error-logs"),
            max_log_entries: 10_000,
        }
    }
}
