use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use waterfall_core::{ContextHints, ErrorInfo};

use crate::retry::RetryPolicy;

/// Error raised by a wrapped operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum OperationError {
    #[error("{0}")]
    Failed(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation panicked: {0}")]
    Panicked(String),
}

impl OperationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OperationError::Failed(_) => "Failed",
            OperationError::Timeout(_) => "Timeout",
            OperationError::Cancelled => "Cancelled",
            OperationError::Panicked(_) => "Panicked",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationError::Cancelled)
    }

    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind(), self.to_string())
    }
}

pub type OpFuture<T> = BoxFuture<'static, Result<T, OperationError>>;
pub type OperationFn<T> = Arc<dyn Fn() -> OpFuture<T> + Send + Sync>;

pub fn operation_fn<T, F, Fut>(f: F) -> OperationFn<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// A named unit of work plus its ordered fallbacks. Owned by the caller and never mutated by
/// the orchestrator.
pub struct OperationDescriptor<T> {
    pub name: String,
    pub run: OperationFn<T>,
    pub fallbacks: Vec<OperationFn<T>>,
    /// `None` uses the orchestrator's default policy.
    pub retry_policy: Option<RetryPolicy>,
    pub hints: ContextHints,
}

impl<T: Send + 'static> OperationDescriptor<T> {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: operation_fn(run),
            fallbacks: Vec::new(),
            retry_policy: None,
            hints: ContextHints::default(),
        }
    }

    pub fn fallback<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
    {
        self.fallbacks.push(operation_fn(f));
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn hints(mut self, hints: ContextHints) -> Self {
        self.hints = hints;
        self
    }
}

impl<T> Clone for OperationDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: self.run.clone(),
            fallbacks: self.fallbacks.clone(),
            retry_policy: self.retry_policy.clone(),
            hints: self.hints.clone(),
        }
    }
}

impl<T> fmt::Debug for OperationDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("fallbacks", &self.fallbacks.len())
            .field("retry_policy", &self.retry_policy)
            .field("hints", &self.hints)
            .finish()
    }
}

/// Run one invocation of `op`, turning panics into [`OperationError::Panicked`] and racing it
/// against `cancel`.
pub(crate) async fn run_guarded<T>(
    op: &OperationFn<T>,
    cancel: Option<&CancellationToken>,
) -> Result<T, OperationError> {
    let op = op.clone();
    // The closure is invoked inside the future so a panic while building it is caught too.
    let guarded = AssertUnwindSafe(async move { op().await })
        .catch_unwind()
        .map(|r| {
            r.unwrap_or_else(|payload| Err(OperationError::Panicked(panic_message(&*payload))))
        });

    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(OperationError::Cancelled),
                r = guarded => r,
            }
        }
        None => guarded.await,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
