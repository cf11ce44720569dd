use std::time::Duration;

use tokio_util::sync::CancellationToken;

use waterfall_core::{ExecutionContext, LogLevel, LogMetadata, NewLogEntry};
use waterfall_store::ErrorLog;

use crate::executor::{run_guarded, Event, EventSink, OperationError, OperationFn, StatsCollector};
use crate::retry::{decide_retry, RetryDecision, RetryPolicy, RetryReason};

/// Runs one operation with bounded retries and exponential backoff.
///
/// Every failed attempt is written to `log` (when present): attempts that will be retried at
/// `warn`, the final one at `error`. The attempt that succeeds writes nothing.
pub struct RetryEngine<'a> {
    pub log: Option<&'a ErrorLog>,
    pub events: &'a dyn EventSink,
    pub stats: &'a StatsCollector,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> RetryEngine<'a> {
    pub fn new(
        log: Option<&'a ErrorLog>,
        events: &'a dyn EventSink,
        stats: &'a StatsCollector,
        cancel: Option<&'a CancellationToken>,
    ) -> Self {
        Self {
            log,
            events,
            stats,
            cancel,
        }
    }

    /// Returns the value of the first successful attempt, or the last error once attempts are
    /// exhausted. `ctx.attempt_number` is left at the number of the last attempt made.
    pub async fn execute_with_retry<T>(
        &self,
        run: &OperationFn<T>,
        ctx: &mut ExecutionContext,
        policy: &RetryPolicy,
    ) -> Result<T, OperationError> {
        ctx.max_retries = policy.max_retries;
        ctx.attempt_number = 1;
        let op = ctx.operation_name.clone();

        loop {
            let err = match run_guarded(run, self.cancel).await {
                Ok(value) => {
                    if ctx.attempt_number > 1 {
                        self.stats.record_retry_recovery().await;
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            self.stats.record_attempt_failure(&op).await;
            self.events
                .emit(Event::AttemptFailed {
                    operation: op.clone(),
                    attempt_no: ctx.attempt_number,
                    error: err.to_string(),
                })
                .await;

            let decision = if err.is_cancelled() {
                RetryDecision::Stop {
                    reason: RetryReason::Cancelled,
                }
            } else {
                decide_retry(policy, ctx.attempt_number, || fastrand::u64(..))
            };

            match decision {
                RetryDecision::RetryAfter { delay } => {
                    let delay_ms = delay.as_millis() as u64;
                    self.log_attempt(
                        LogLevel::Warn,
                        ctx,
                        &err,
                        LogMetadata::default().with("delayMs", delay_ms),
                    )
                    .await;
                    tracing::debug!(
                        operation = %op,
                        attempt = ctx.attempt_number,
                        delay_ms,
                        error = %err,
                        "retry scheduled"
                    );
                    self.events
                        .emit(Event::RetryScheduled {
                            operation: op.clone(),
                            attempt_no: ctx.attempt_number,
                            delay_ms,
                        })
                        .await;
                    self.stats.record_retry().await;

                    if !self.sleep(delay).await {
                        return Err(OperationError::Cancelled);
                    }
                    ctx.attempt_number += 1;
                }
                RetryDecision::Stop { reason } => {
                    self.log_attempt(LogLevel::Error, ctx, &err, LogMetadata::default())
                        .await;
                    tracing::debug!(
                        operation = %op,
                        attempt = ctx.attempt_number,
                        ?reason,
                        "retries stopped"
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn log_attempt(
        &self,
        level: LogLevel,
        ctx: &ExecutionContext,
        err: &OperationError,
        metadata: LogMetadata,
    ) {
        let Some(log) = self.log else {
            return;
        };
        let message = format!(
            "{} failed (attempt {}/{}): {}",
            ctx.operation_name,
            ctx.attempt_number,
            ctx.max_attempts(),
            err
        );
        let metadata = LogMetadata {
            recovery_attempt: Some(ctx.attempt_number),
            ..metadata
        };
        log.record(
            NewLogEntry::new(level, message)
                .context(ctx.clone())
                .error(err.to_info())
                .metadata(metadata),
        )
        .await;
    }

    /// `false` when cancelled before the delay elapsed.
    async fn sleep(&self, delay: Duration) -> bool {
        match self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(delay) => true,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}
