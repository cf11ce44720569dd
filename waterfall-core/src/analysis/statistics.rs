use std::collections::BTreeMap;

use crate::analysis::{recovery_rate, top_messages, MessageCount};
use crate::types::LogEntry;

pub const RESOLUTION_RETRY: &str = "retry";
pub const RESOLUTION_FAIL: &str = "fail";

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogStatistics {
    pub total_errors: usize,
    pub errors_by_operation: BTreeMap<String, usize>,
    pub errors_by_resolution: BTreeMap<String, usize>,
    pub recovery_success_rate: f64,
    pub most_common_errors: Vec<MessageCount>,
}

pub fn statistics(entries: &[LogEntry]) -> LogStatistics {
    let errors: Vec<&LogEntry> = entries.iter().filter(|e| e.is_error()).collect();
    let recovered = entries.iter().filter(|e| e.is_successful_recovery()).count();

    let mut errors_by_operation = BTreeMap::new();
    for e in &errors {
        let op = e.operation_name().unwrap_or("unknown").to_string();
        *errors_by_operation.entry(op).or_insert(0) += 1;
    }

    let mut errors_by_resolution = BTreeMap::new();
    if recovered > 0 {
        errors_by_resolution.insert(RESOLUTION_RETRY.to_string(), recovered);
    }
    let unresolved = errors.len().saturating_sub(recovered);
    if unresolved > 0 {
        errors_by_resolution.insert(RESOLUTION_FAIL.to_string(), unresolved);
    }

    LogStatistics {
        total_errors: errors.len(),
        errors_by_operation,
        errors_by_resolution,
        recovery_success_rate: recovery_rate(errors.len(), recovered),
        most_common_errors: top_messages(errors.iter().map(|e| e.message.as_str()), 5),
    }
}
