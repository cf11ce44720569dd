use crate::config::ResilienceConfig;
use crate::error::{ValidationError, Violation};

impl ResilienceConfig {
    /// Check all invariants and report every violation at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if self.base_delay_ms == 0 {
            violations.push(Violation::new("base_delay_ms", "must be greater than 0"));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            violations.push(Violation::new(
                "backoff_multiplier",
                "must be a finite number >= 1",
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            violations.push(Violation::new(
                "max_delay_ms",
                "must be greater than or equal to base_delay_ms",
            ));
        }
        if self.max_log_entries == 0 {
            violations.push(Violation::new("max_log_entries", "must be greater than 0"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }
}
