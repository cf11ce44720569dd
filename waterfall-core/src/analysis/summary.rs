use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::analysis::{recovery_rate, top_messages};
use crate::types::{Category, LogEntry, LogLevel};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageCount {
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorSummary {
    pub total_entries: usize,
    pub total_errors: usize,
    /// Error-level entries per category.
    pub errors_by_category: BTreeMap<Category, usize>,
    pub entries_by_level: BTreeMap<LogLevel, usize>,
    pub most_frequent_errors: Vec<MessageCount>,
    pub recovery_rate: f64,
    pub time_span: Option<TimeSpan>,
}

pub fn summarize(entries: &[&LogEntry]) -> ErrorSummary {
    let mut errors_by_category = BTreeMap::new();
    let mut entries_by_level = BTreeMap::new();
    let mut total_errors = 0;
    let mut recoveries = 0;

    for e in entries {
        *entries_by_level.entry(e.level).or_insert(0) += 1;
        if e.is_error() {
            total_errors += 1;
            *errors_by_category.entry(e.category).or_insert(0) += 1;
        }
        if e.is_successful_recovery() {
            recoveries += 1;
        }
    }

    let most_frequent_errors = top_messages(
        entries
            .iter()
            .filter(|e| e.is_error())
            .map(|e| e.message.as_str()),
        5,
    );

    let time_span = match (
        entries.iter().map(|e| e.timestamp).min(),
        entries.iter().map(|e| e.timestamp).max(),
    ) {
        (Some(start), Some(end)) => Some(TimeSpan {
            start,
            end,
            duration_ms: (end - start).num_milliseconds(),
        }),
        _ => None,
    };

    ErrorSummary {
        total_entries: entries.len(),
        total_errors,
        errors_by_category,
        entries_by_level,
        most_frequent_errors,
        recovery_rate: recovery_rate(total_errors, recoveries),
        time_span,
    }
}
