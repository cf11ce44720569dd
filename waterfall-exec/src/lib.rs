#![forbid(unsafe_code)]

//! Resilient execution of caller-supplied async operations.
//!
//! An operation runs through the [`RetryEngine`] first; when every attempt fails its fallbacks
//! are tried once each, in order. Failures and recoveries are recorded into an
//! [`waterfall_store::ErrorLog`] and counted in [`HandlerStats`].

pub mod collaborators;
pub mod executor;
pub mod report;
pub mod retry;

pub use crate::collaborators::{
    accessibility_operation, screenshot_operation, AccessibilityAudit, AuditReport,
    AuditViolation, CaptureRequest, ScreenshotCapture,
};
pub use crate::executor::{
    BatchErrorSummary, BatchResult, Event, EventSink, ExecutionError, ExecutionResult,
    ExecutorConfig, HandlerStats, OperationDescriptor, OperationError, OperationFn,
    ResilientOrchestrator, StatsCollector,
};
pub use crate::report::{BundlePaths, CombinedReport, StatisticsReporter};
pub use crate::retry::{
    backoff_delay, decide_retry, Jitter, RetryDecision, RetryEngine, RetryPolicy, RetryReason,
};
