use std::time::Duration;

pub use waterfall_core::Jitter;
use waterfall_core::ResilienceConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; `0` means a single attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(30_000),
            jitter: Jitter::None,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl From<&ResilienceConfig> for RetryPolicy {
    fn from(cfg: &ResilienceConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            backoff_multiplier: cfg.backoff_multiplier,
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            jitter: cfg.jitter,
        }
    }
}
