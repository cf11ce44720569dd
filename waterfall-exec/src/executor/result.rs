use std::time::Duration;

use crate::executor::OperationError;

/// Terminal outcome of one `execute_operation` call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    pub attempts: u32,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_method: Option<String>,
    pub execution_time_ms: u64,
}

impl<T> ExecutionResult<T> {
    pub fn succeeded(value: T, attempts: u32, elapsed: Duration) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
            attempts,
            fallback_used: false,
            recovery_method: None,
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }

    /// Success through fallback number `fallback_no` (1-based).
    pub fn recovered(value: T, attempts: u32, fallback_no: usize, elapsed: Duration) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
            attempts,
            fallback_used: true,
            recovery_method: Some(format!("fallback_{fallback_no}")),
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failed(
        error: OperationError,
        attempts: u32,
        fallback_used: bool,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
            attempts,
            fallback_used,
            recovery_method: None,
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }

    /// Primary failed but a fallback succeeded.
    pub fn is_recovered(&self) -> bool {
        self.success && self.fallback_used
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchErrorSummary {
    pub critical_errors: usize,
    pub recoverable_errors: usize,
    pub total_errors: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchResult<T> {
    /// Operations submitted, including any skipped after a stop.
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    /// Operations never attempted because the batch stopped early.
    pub skipped_tests: usize,
    pub fallbacks_used: usize,
    pub total_execution_time_ms: u64,
    pub per_operation_results: Vec<(String, ExecutionResult<T>)>,
    pub error_summary: BatchErrorSummary,
}

impl<T> BatchResult<T> {
    pub(crate) fn new(total_tests: usize) -> Self {
        Self {
            total_tests,
            successful_tests: 0,
            failed_tests: 0,
            skipped_tests: 0,
            fallbacks_used: 0,
            total_execution_time_ms: 0,
            per_operation_results: Vec::with_capacity(total_tests),
            error_summary: BatchErrorSummary::default(),
        }
    }

    pub(crate) fn record(&mut self, name: String, result: ExecutionResult<T>) {
        if result.fallback_used {
            self.fallbacks_used += 1;
            self.error_summary.recoverable_errors += 1;
        }
        if result.success {
            self.successful_tests += 1;
        } else {
            self.failed_tests += 1;
            self.error_summary.critical_errors += 1;
        }
        self.error_summary.total_errors =
            self.error_summary.critical_errors + self.error_summary.recoverable_errors;
        self.per_operation_results.push((name, result));
    }

    pub(crate) fn finish(&mut self, elapsed: Duration) {
        self.skipped_tests = self.total_tests - self.per_operation_results.len();
        self.total_execution_time_ms = elapsed.as_millis() as u64;
    }

    pub fn has_failures(&self) -> bool {
        self.failed_tests > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error(
        "operation {operation} failed after {attempts} attempt(s) \
         and {fallbacks_attempted} fallback(s): {error}"
    )]
    Critical {
        operation: String,
        error: OperationError,
        attempts: u32,
        fallbacks_attempted: usize,
    },
}
