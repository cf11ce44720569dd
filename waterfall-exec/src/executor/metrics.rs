use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Counters kept by the orchestrator across every operation it has run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HandlerStats {
    pub total_operations: usize,
    /// Failed primary attempts plus failed fallbacks.
    pub total_errors: usize,
    pub errors_by_operation: BTreeMap<String, usize>,
    pub retries_scheduled: usize,
    pub recovered_by_retry: usize,
    pub recovered_by_fallback: usize,
    pub failed_operations: usize,
}

impl HandlerStats {
    pub fn record_operation_started(&mut self) {
        self.total_operations += 1;
    }

    pub fn record_attempt_failure(&mut self, operation: &str) {
        self.total_errors += 1;
        *self
            .errors_by_operation
            .entry(operation.to_string())
            .or_insert(0) += 1;
    }

    pub fn record_retry(&mut self) {
        self.retries_scheduled += 1;
    }

    pub fn record_retry_recovery(&mut self) {
        self.recovered_by_retry += 1;
    }

    pub fn record_fallback_failure(&mut self, operation: &str) {
        self.record_attempt_failure(operation);
    }

    pub fn record_fallback_recovery(&mut self) {
        self.recovered_by_fallback += 1;
    }

    pub fn record_operation_failure(&mut self) {
        self.failed_operations += 1;
    }

    pub fn recovered(&self) -> usize {
        self.recovered_by_retry + self.recovered_by_fallback
    }

    /// `recovered / (recovered + failed)`; `0.0` until something has gone wrong.
    pub fn recovery_success_rate(&self) -> f64 {
        let recovered = self.recovered();
        let denom = recovered + self.failed_operations;
        if denom == 0 {
            0.0
        } else {
            recovered as f64 / denom as f64
        }
    }

    /// Highest error count; ties go to the alphabetically first name.
    pub fn most_problematic_operation(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (name, count) in &self.errors_by_operation {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((name.as_str(), *count));
            }
        }
        best
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total_operations": self.total_operations,
            "total_errors": self.total_errors,
            "errors_by_operation": self.errors_by_operation,
            "retries_scheduled": self.retries_scheduled,
            "recovered": {
                "by_retry": self.recovered_by_retry,
                "by_fallback": self.recovered_by_fallback,
            },
            "failed_operations": self.failed_operations,
            "recovery_success_rate": self.recovery_success_rate(),
        })
    }
}

#[derive(Default)]
pub struct StatsCollector {
    stats: Arc<Mutex<HandlerStats>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_operation_started(&self) {
        self.stats.lock().await.record_operation_started();
    }

    pub async fn record_attempt_failure(&self, operation: &str) {
        self.stats.lock().await.record_attempt_failure(operation);
    }

    pub async fn record_retry(&self) {
        self.stats.lock().await.record_retry();
    }

    pub async fn record_retry_recovery(&self) {
        self.stats.lock().await.record_retry_recovery();
    }

    pub async fn record_fallback_failure(&self, operation: &str) {
        self.stats.lock().await.record_fallback_failure(operation);
    }

    pub async fn record_fallback_recovery(&self) {
        self.stats.lock().await.record_fallback_recovery();
    }

    pub async fn record_operation_failure(&self) {
        self.stats.lock().await.record_operation_failure();
    }

    pub async fn snapshot(&self) -> HandlerStats {
        self.stats.lock().await.clone()
    }
}
