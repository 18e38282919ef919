//! Bounded retries with exponential backoff.
//!
//! Only the fetch boundary retries; composition itself never sleeps. The
//! policy is deliberately small: a handful of attempts with doubling delays,
//! capped so a flaky CDN cannot stall a render for long.

use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Clamped to at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// The delay after the 1-based `attempt` fails: doubling, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = 2u32.saturating_pow(exponent);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// Returns the final attempt's error; earlier failures are logged at
    /// debug and otherwise discarded.
    pub fn run<T>(&self, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < attempts {
                        debug!(attempt, "attempt failed, retrying: {err:#}");
                        std::thread::sleep(self.delay_for(attempt));
                    }
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("retry ran zero attempts")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delays_double_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(40), Duration::from_secs(1));
    }

    #[test]
    fn succeeds_once_the_operation_does() {
        let mut calls = 0;
        let result = quick(3).run(|| {
            calls += 1;
            if calls < 3 {
                Err(anyhow!("transient"))
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result.ok(), Some(3));
    }

    #[test]
    fn returns_the_last_error_when_exhausted() {
        let mut calls = 0;
        let result: Result<()> = quick(2).run(|| {
            calls += 1;
            Err(anyhow!("attempt {calls} failed"))
        });

        assert_eq!(calls, 2);
        assert_eq!(result.unwrap_err().to_string(), "attempt 2 failed");
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let mut calls = 0;
        let _ = quick(0).run(|| {
            calls += 1;
            Ok(())
        });
        assert_eq!(calls, 1);
    }
}
