use std::time::Duration;

use crate::retry::config::{Jitter, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    AttemptsExhausted,
    Cancelled,
}

/// Wait before attempt `attempt_no + 1`: `min(base * multiplier^(attempt_no-1), max_delay)`.
pub fn backoff_delay(policy: &RetryPolicy, attempt_no: u32) -> Duration {
    let exp = attempt_no.saturating_sub(1).min(i32::MAX as u32) as i32;
    let raw = (policy.base_delay.as_millis() as f64) * policy.backoff_multiplier.powi(exp);
    let cap = policy.max_delay.as_millis() as f64;
    Duration::from_millis(raw.min(cap).max(0.0) as u64)
}

/// Decide whether a failed attempt gets another try.
///
/// - `attempt_no`: 1-based number of the attempt that just failed.
/// - `rand_u64`: RNG, only consulted for [`Jitter::Full`].
pub fn decide_retry(
    policy: &RetryPolicy,
    attempt_no: u32,
    rand_u64: impl Fn() -> u64,
) -> RetryDecision {
    if attempt_no >= policy.max_attempts() {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }

    let delay = backoff_delay(policy, attempt_no);
    let delay = match policy.jitter {
        Jitter::None => delay,
        Jitter::Full => {
            let ms = delay.as_millis() as u64;
            if ms == 0 {
                delay
            } else {
                Duration::from_millis(rand_u64() % (ms + 1))
            }
        }
    };
    RetryDecision::RetryAfter { delay }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_saturates_at_cap() {
        let p = RetryPolicy::default();
        assert_eq!(backoff_delay(&p, 100), Duration::from_millis(30_000));
    }

    #[test]
    fn first_retry_waits_base_delay() {
        let p = RetryPolicy::default();
        assert_eq!(backoff_delay(&p, 1), Duration::from_millis(1000));
    }

    #[test]
    fn full_jitter_stays_within_computed_delay() {
        let p = RetryPolicy {
            jitter: Jitter::Full,
            ..Default::default()
        };
        // attempt 3 -> 4000ms before jitter
        for (rand, expected) in [(0, 0), (1234, 1234), (4000, 4000), (4001, 0)] {
            let decision = decide_retry(&p, 3, || rand);
            assert_eq!(
                decision,
                RetryDecision::RetryAfter {
                    delay: Duration::from_millis(expected)
                }
            );
        }
        for rand in [u64::MAX, u64::MAX / 3, 987_654_321] {
            match decide_retry(&p, 3, || rand) {
                RetryDecision::RetryAfter { delay } => {
                    assert!(delay <= Duration::from_millis(4000))
                }
                other => panic!("expected a retry, got {other:?}"),
            }
        }
    }

    #[test]
    fn no_jitter_ignores_rng() {
        let p = RetryPolicy::default();
        let decision = decide_retry(&p, 2, || panic!("rng consulted"));
        assert_eq!(
            decision,
            RetryDecision::RetryAfter {
                delay: Duration::from_millis(2000)
            }
        );
    }

    #[test]
    fn jitter_follows_config() {
        let cfg = waterfall_core::ResilienceConfig {
            jitter: Jitter::Full,
            ..Default::default()
        };
        assert_eq!(RetryPolicy::from(&cfg).jitter, Jitter::Full);
        assert_eq!(RetryPolicy::from(&Default::default()).jitter, Jitter::None);
    }
}
