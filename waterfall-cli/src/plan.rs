use std::collections::HashSet;
use std::time::Duration;

use waterfall_core::{parse_document_str, ContextHints, ParseError, ValidationError, Violation};
use waterfall_exec::{Jitter, RetryPolicy};

/// A file of shell-command operations for `waterfall run`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunPlan {
    #[serde(default)]
    pub continue_on_failure: bool,
    pub operations: Vec<PlanOperation>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlanOperation {
    pub name: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    #[serde(default)]
    pub fallbacks: Vec<Vec<String>>,
    #[serde(default)]
    pub retry: Option<PlanRetry>,
    #[serde(default)]
    pub hints: ContextHints,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PlanOperation {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Per-operation overrides of the configured retry policy.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PlanRetry {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub max_delay_ms: Option<u64>,
    pub jitter: Option<Jitter>,
}

impl PlanRetry {
    pub fn apply(&self, base: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            base_delay: self
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.base_delay),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(base.backoff_multiplier),
            max_delay: self
                .max_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(base.max_delay),
            jitter: self.jitter.unwrap_or(base.jitter),
        }
    }
}

pub fn parse_plan_str(input: &str) -> Result<RunPlan, ParseError> {
    parse_document_str(input)
}

impl RunPlan {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();
        if self.operations.is_empty() {
            violations.push(Violation::new("operations", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for (i, op) in self.operations.iter().enumerate() {
            let path = format!("operations[{i}]");
            if op.name.trim().is_empty() {
                violations.push(Violation::new(format!("{path}.name"), "must not be empty"));
            } else if !seen.insert(op.name.as_str()) {
                violations.push(Violation::new(
                    format!("{path}.name"),
                    format!("duplicate operation name {:?}", op.name),
                ));
            }
            if op.command.is_empty() {
                violations.push(Violation::new(format!("{path}.command"), "must not be empty"));
            }
            for (j, fb) in op.fallbacks.iter().enumerate() {
                if fb.is_empty() {
                    violations.push(Violation::new(
                        format!("{path}.fallbacks[{j}]"),
                        "must not be empty",
                    ));
                }
            }
            if op.timeout_ms == Some(0) {
                violations.push(Violation::new(format!("{path}.timeout_ms"), "must be > 0"));
            }
            if let Some(retry) = &op.retry {
                if retry.base_delay_ms == Some(0) {
                    violations.push(Violation::new(
                        format!("{path}.retry.base_delay_ms"),
                        "must be > 0",
                    ));
                }
                if let Some(m) = retry.backoff_multiplier {
                    if !m.is_finite() || m < 1.0 {
                        violations.push(Violation::new(
                            format!("{path}.retry.backoff_multiplier"),
                            "must be a finite number >= 1",
                        ));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }
}
