use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use waterfall_core::{
    Category, ContextHints, ExecutionContext, LogLevel, LogMetadata, NewLogEntry,
};
use waterfall_store::ErrorLog;

use crate::executor::{
    run_guarded, Event, EventSink, ExecutionError, ExecutionResult, ExecutorConfig,
    HandlerStats, NoOpEventSink, OperationDescriptor, OperationError, StatsCollector,
};
use crate::report::StatisticsReporter;
use crate::retry::RetryEngine;

/// Runs operations through retry, then the fallback waterfall.
pub struct ResilientOrchestrator {
    pub(crate) config: ExecutorConfig,
    pub(crate) log: Option<Arc<ErrorLog>>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) stats: Arc<StatsCollector>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl ResilientOrchestrator {
    pub fn new(config: ExecutorConfig, log: Option<Arc<ErrorLog>>) -> Self {
        Self {
            config,
            log,
            events: Arc::new(NoOpEventSink),
            stats: Arc::new(StatsCollector::new()),
            cancel: None,
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Once `token` fires, backoff sleeps and in-flight operations end with
    /// [`OperationError::Cancelled`] and no further fallbacks or batch entries run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn log(&self) -> Option<&Arc<ErrorLog>> {
        self.log.as_ref()
    }

    pub fn stats(&self) -> &Arc<StatsCollector> {
        &self.stats
    }

    pub async fn handler_stats(&self) -> HandlerStats {
        self.stats.snapshot().await
    }

    pub fn reporter(&self) -> StatisticsReporter {
        StatisticsReporter::new(self.stats.clone(), self.log.clone())
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    fn active_log(&self) -> Option<&ErrorLog> {
        if self.config.enable_logging {
            self.log.as_deref()
        } else {
            None
        }
    }

    async fn record(&self, entry: NewLogEntry) {
        if let Some(log) = self.active_log() {
            log.record(entry).await;
        }
    }

    /// Primary through the retry engine, then each fallback once, in order.
    ///
    /// Terminal failure comes back as an unsuccessful [`ExecutionResult`] carrying the primary
    /// error. With `graceful_degradation` off it is returned as [`ExecutionError::Critical`].
    pub async fn execute_operation<T>(
        &self,
        op: &OperationDescriptor<T>,
        runtime_hints: &ContextHints,
    ) -> Result<ExecutionResult<T>, ExecutionError> {
        let started = Instant::now();
        let policy = op.retry_policy.as_ref().unwrap_or(&self.config.retry);
        let mut ctx = ExecutionContext::new(
            op.name.clone(),
            op.hints.merged(runtime_hints),
            policy.max_retries,
        );

        self.stats.record_operation_started().await;
        self.events
            .emit(Event::OperationStarted {
                operation: op.name.clone(),
            })
            .await;

        let engine = RetryEngine::new(
            self.active_log(),
            self.events.as_ref(),
            &self.stats,
            self.cancel.as_ref(),
        );
        let primary_err = match engine.execute_with_retry(&op.run, &mut ctx, policy).await {
            Ok(value) => {
                self.events
                    .emit(Event::OperationSucceeded {
                        operation: op.name.clone(),
                        attempts: ctx.attempt_number,
                    })
                    .await;
                return Ok(ExecutionResult::succeeded(
                    value,
                    ctx.attempt_number,
                    started.elapsed(),
                ));
            }
            Err(err) => err,
        };
        let attempts = ctx.attempt_number;

        let mut attempted = 0usize;
        if self.config.enable_fallbacks && !primary_err.is_cancelled() {
            for (idx, fallback) in op.fallbacks.iter().enumerate() {
                let fallback_no = idx + 1;
                attempted += 1;
                self.events
                    .emit(Event::FallbackStarted {
                        operation: op.name.clone(),
                        fallback_no,
                    })
                    .await;

                match run_guarded(fallback, self.cancel.as_ref()).await {
                    Ok(value) => {
                        let method = format!("fallback_{fallback_no}");
                        self.record(
                            NewLogEntry::new(
                                LogLevel::Info,
                                format!("{} recovered via {method}", op.name),
                            )
                            .category(Category::Recovery)
                            .context(ctx.clone())
                            .error(primary_err.to_info())
                            .metadata(LogMetadata::recovery(fallback_no as u32, true)),
                        )
                        .await;
                        self.stats.record_fallback_recovery().await;
                        self.events
                            .emit(Event::Recovered {
                                operation: op.name.clone(),
                                method: method.clone(),
                            })
                            .await;
                        tracing::info!(
                            operation = %op.name,
                            %method,
                            attempts,
                            "operation recovered"
                        );
                        return Ok(ExecutionResult::recovered(
                            value,
                            attempts,
                            fallback_no,
                            started.elapsed(),
                        ));
                    }
                    Err(err) => {
                        self.record(
                            NewLogEntry::new(
                                LogLevel::Warn,
                                format!("{} fallback {fallback_no} failed: {err}", op.name),
                            )
                            .context(ctx.clone())
                            .error(err.to_info())
                            .metadata(LogMetadata::recovery(fallback_no as u32, false)),
                        )
                        .await;
                        self.stats.record_fallback_failure(&op.name).await;
                        self.events
                            .emit(Event::FallbackFailed {
                                operation: op.name.clone(),
                                fallback_no,
                                error: err.to_string(),
                            })
                            .await;
                        tracing::warn!(
                            operation = %op.name,
                            fallback = fallback_no,
                            error = %err,
                            "fallback failed"
                        );
                        if err.is_cancelled() {
                            break;
                        }
                    }
                }
            }
        }

        self.record(
            NewLogEntry::new(
                LogLevel::Error,
                format!(
                    "{} failed after {attempts} attempt(s) and {attempted} fallback(s): \
                     {primary_err}",
                    op.name
                ),
            )
            .context(ctx.clone())
            .error(primary_err.to_info())
            .metadata(LogMetadata::default().with("fallbacksAttempted", attempted)),
        )
        .await;
        self.stats.record_operation_failure().await;
        self.events
            .emit(Event::OperationFailed {
                operation: op.name.clone(),
                attempts,
                fallbacks_attempted: attempted,
            })
            .await;
        tracing::error!(
            operation = %op.name,
            attempts,
            fallbacks = attempted,
            error = %primary_err,
            "operation failed"
        );

        if !self.config.graceful_degradation {
            return Err(ExecutionError::Critical {
                operation: op.name.clone(),
                error: primary_err,
                attempts,
                fallbacks_attempted: attempted,
            });
        }
        Ok(ExecutionResult::failed(
            primary_err,
            attempts,
            attempted > 0,
            started.elapsed(),
        ))
    }
}

impl Default for ResilientOrchestrator {
    fn default() -> Self {
        Self::new(ExecutorConfig::default(), None)
    }
}

pub(crate) fn is_cancelled_result<T>(result: &ExecutionResult<T>) -> bool {
    result
        .error
        .as_ref()
        .is_some_and(OperationError::is_cancelled)
}
