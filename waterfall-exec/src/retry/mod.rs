mod config;
mod decision;
mod engine;

pub use config::{Jitter, RetryPolicy};
pub use decision::{backoff_delay, decide_retry, RetryDecision, RetryReason};
pub use engine::RetryEngine;
