#![forbid(unsafe_code)]

//! Data model, configuration and log analysis shared by the waterfall crates.
//!
//! Nothing in here performs I/O; the store and executor crates build on these types.

pub mod analysis;
pub mod config;
pub mod error;
pub mod types;

pub use crate::analysis::{
    analyze, statistics, ErrorAnalysis, ErrorPattern, ErrorSummary, Impact, LogStatistics,
    MessageCount, PatternKind, TimeSpan, TrendBucket,
};
pub use crate::config::{
    parse_config_str, parse_document_str, ConfigFormat, Jitter, ResilienceConfig,
};
pub use crate::error::{ConfigError, ParseError, ValidationError, Violation};
pub use crate::types::{
    Category, ContextHints, ErrorInfo, ExecutionContext, LogEntry, LogFilter, LogLevel,
    LogMetadata, NewLogEntry, TimeRange,
};
