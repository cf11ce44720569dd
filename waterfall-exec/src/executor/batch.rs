use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::future::join_all;
use futures_util::FutureExt;
use tokio::sync::Semaphore;

use waterfall_core::{ContextHints, ExecutionContext, LogLevel, NewLogEntry};

use crate::executor::operation::panic_message;
use crate::executor::orchestrator::is_cancelled_result;
use crate::executor::{
    BatchResult, Event, ExecutionError, ExecutionResult, OperationDescriptor, OperationError,
    ResilientOrchestrator,
};

impl ResilientOrchestrator {
    /// Runs `ops` one after another, in order.
    ///
    /// With `continue_on_failure` off the batch stops at the first operation that fails outright;
    /// later operations are not attempted and do not appear in the results. Cancellation always
    /// stops the batch.
    pub async fn execute_batch<T>(
        &self,
        ops: &[OperationDescriptor<T>],
        continue_on_failure: bool,
    ) -> BatchResult<T> {
        let started = Instant::now();
        let mut batch = BatchResult::new(ops.len());
        self.events.emit(Event::BatchStarted { total: ops.len() }).await;

        for op in ops {
            if self.is_cancelled() {
                break;
            }
            let result = self.run_batch_entry(op).await;
            let stop = !result.success && (!continue_on_failure || is_cancelled_result(&result));
            batch.record(op.name.clone(), result);
            if stop {
                tracing::info!(operation = %op.name, "batch stopped after failure");
                break;
            }
        }

        self.finish_batch(&mut batch, started).await;
        batch
    }

    /// Runs up to `limit` operations at once. Results keep the input order; there is no
    /// stop-on-failure mode. Operations not yet started when cancellation fires are skipped.
    pub async fn execute_batch_concurrent<T>(
        &self,
        ops: &[OperationDescriptor<T>],
        limit: usize,
    ) -> BatchResult<T> {
        let started = Instant::now();
        let mut batch = BatchResult::new(ops.len());
        self.events.emit(Event::BatchStarted { total: ops.len() }).await;

        let semaphore = Semaphore::new(limit.max(1));
        let runs = ops.iter().map(|op| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.ok();
                if self.is_cancelled() {
                    return None;
                }
                Some(self.run_batch_entry(op).await)
            }
        });
        let results = join_all(runs).await;

        for (op, result) in ops.iter().zip(results) {
            if let Some(result) = result {
                batch.record(op.name.clone(), result);
            }
        }

        self.finish_batch(&mut batch, started).await;
        batch
    }

    async fn finish_batch<T>(&self, batch: &mut BatchResult<T>, started: Instant) {
        batch.finish(started.elapsed());
        self.events
            .emit(Event::BatchFinished {
                successful: batch.successful_tests,
                failed: batch.failed_tests,
                skipped: batch.skipped_tests,
            })
            .await;
        tracing::info!(
            total = batch.total_tests,
            successful = batch.successful_tests,
            failed = batch.failed_tests,
            skipped = batch.skipped_tests,
            fallbacks = batch.fallbacks_used,
            "batch finished"
        );
    }

    /// `execute_operation` with strict-mode errors and orchestration panics folded into a
    /// failed result.
    async fn run_batch_entry<T>(&self, op: &OperationDescriptor<T>) -> ExecutionResult<T> {
        let started = Instant::now();
        let hints = ContextHints::default();
        let outcome = AssertUnwindSafe(self.execute_operation(op, &hints))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(ExecutionError::Critical {
                error,
                attempts,
                fallbacks_attempted,
                ..
            })) => {
                ExecutionResult::failed(error, attempts, fallbacks_attempted > 0, started.elapsed())
            }
            Err(payload) => {
                let err = OperationError::Panicked(panic_message(&*payload));
                tracing::error!(operation = %op.name, error = %err, "batch entry panicked");
                if let Some(log) = self.log.as_deref().filter(|_| self.config.enable_logging) {
                    log.record(
                        NewLogEntry::new(LogLevel::Error, format!("{} aborted: {err}", op.name))
                            .context(ExecutionContext::new(op.name.clone(), op.hints.clone(), 0))
                            .error(err.to_info()),
                    )
                    .await;
                }
                ExecutionResult::failed(err, 0, false, started.elapsed())
            }
        }
    }
}
