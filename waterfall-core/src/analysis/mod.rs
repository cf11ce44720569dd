//! Pure derivations over a set of log entries.
//!
//! Every function here takes a slice and returns a fresh snapshot; nothing is cached.

mod patterns;
mod statistics;
mod summary;
mod trends;

use crate::types::{LogEntry, TimeRange};

pub use patterns::{detect_patterns, recommendations, ErrorPattern, Impact, PatternKind};
pub use statistics::{statistics, LogStatistics};
pub use summary::{summarize, ErrorSummary, MessageCount, TimeSpan};
pub use trends::{hourly_trends, TrendBucket};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorAnalysis {
    pub summary: ErrorSummary,
    pub patterns: Vec<ErrorPattern>,
    pub recommendations: Vec<String>,
    pub trends: Vec<TrendBucket>,
}

pub fn analyze(entries: &[LogEntry], range: Option<TimeRange>) -> ErrorAnalysis {
    let range = range.unwrap_or_default();
    let selected: Vec<&LogEntry> = entries
        .iter()
        .filter(|e| range.contains(e.timestamp))
        .collect();

    let summary = summarize(&selected);
    let patterns = detect_patterns(&selected);
    let recommendations = recommendations(&summary, &patterns);
    let trends = hourly_trends(&selected);

    ErrorAnalysis {
        summary,
        patterns,
        recommendations,
        trends,
    }
}

/// Rank messages by frequency, breaking ties alphabetically.
pub(crate) fn top_messages<'a>(
    messages: impl Iterator<Item = &'a str>,
    n: usize,
) -> Vec<MessageCount> {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for m in messages {
        *counts.entry(m).or_default() += 1;
    }
    let mut ranked: Vec<MessageCount> = counts
        .into_iter()
        .map(|(message, count)| MessageCount {
            message: message.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.message.cmp(&b.message)));
    ranked.truncate(n);
    ranked
}

/// Successful recoveries per error-level entry; `0.0` when there are no errors.
pub(crate) fn recovery_rate(errors: usize, recoveries: usize) -> f64 {
    if errors == 0 {
        return 0.0;
    }
    (recoveries as f64 / errors as f64).min(1.0)
}
