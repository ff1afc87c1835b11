//! Exponential backoff retry for transient external calls
//!
//! Used by the upload pipeline around object storage writes, and usable
//! for any other flaky collaborator call.
//!
//! **Backoff Strategy:**
//! - Attempts: `max_retries + 1` in total
//! - Delay after failed attempt `n` (0-based): `base_delay × 2^n + jitter`
//! - Jitter: uniform in `[0, max_jitter)`
//!
//! Every error is retried. The wrapper cannot tell transient failures from
//! permanent ones, so callers must not pass non-idempotent operations
//! without their own guard.

use rand::Rng;
use rugdesk_common::config::UploadConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// Retry limits and backoff timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Exclusive upper bound of the random jitter
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic part of the delay after failed attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

/// Run `operation` until it succeeds or the policy's attempts are spent.
///
/// On exhaustion the last error is returned unchanged.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "object put")
/// * `policy` - Attempt limit and backoff timing
/// * `operation` - Async closure performing one attempt
pub async fn retry_with_backoff<T, E, F, Fut>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= policy.max_retries {
                    tracing::warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = %err,
                        "Operation failed, retries exhausted"
                    );
                    return Err(err);
                }

                let delay = policy.backoff(attempt).saturating_add(policy.jitter());

                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, will retry after backoff"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1)).with_max_jitter(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let mut calls = 0;

        let result = retry_with_backoff("test_op", &fast_policy(2), || {
            calls += 1;
            async { Ok::<i32, String>(42) }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let mut calls = 0;

        let result = retry_with_backoff("test_op", &fast_policy(2), || {
            calls += 1;
            let call = calls;
            async move {
                if call < 3 {
                    Err(format!("transient failure {call}"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let mut calls = 0;

        let result = retry_with_backoff("test_op", &fast_policy(2), || {
            calls += 1;
            let call = calls;
            async move { Err::<i32, String>(format!("failure {call}")) }
        })
        .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_zero_retries_makes_single_attempt() {
        let mut calls = 0;

        let result = retry_with_backoff("test_op", &fast_policy(0), || {
            calls += 1;
            async { Err::<(), &str>("boom") }
        })
        .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_sleeps_exponentially() {
        let start = tokio::time::Instant::now();

        let result = retry_with_backoff("test_op", &RetryPolicy::default(), || async {
            Err::<(), &str>("down")
        })
        .await;

        assert!(result.is_err());
        // 1000ms + 2000ms of backoff plus at most 2 × 500ms of jitter
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(4000), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(64) >= policy.backoff(31));
    }

    #[test]
    fn test_jitter_stays_below_bound() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            assert!(policy.jitter() < Duration::from_millis(500));
        }
        assert_eq!(fast_policy(1).jitter(), Duration::ZERO);
    }

    #[test]
    fn test_from_config() {
        let config = UploadConfig {
            batch_size: 4,
            max_retries: 5,
            base_delay_ms: 10,
            max_jitter_ms: 0,
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(10));
        assert_eq!(policy.max_jitter, Duration::ZERO);
    }
}
