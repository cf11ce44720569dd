use waterfall_core::ResilienceConfig;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Used for operations that carry no policy of their own.
    pub retry: RetryPolicy,
    pub enable_fallbacks: bool,
    pub enable_logging: bool,
    /// When false, a critical failure is returned as [`crate::ExecutionError::Critical`].
    pub graceful_degradation: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            enable_fallbacks: true,
            enable_logging: true,
            graceful_degradation: true,
        }
    }
}

impl From<&ResilienceConfig> for ExecutorConfig {
    fn from(cfg: &ResilienceConfig) -> Self {
        Self {
            retry: RetryPolicy::from(cfg),
            enable_fallbacks: cfg.enable_fallbacks,
            enable_logging: cfg.enable_logging,
            graceful_degradation: cfg.graceful_degradation,
        }
    }
}
