//! Retry loop for upstream calls.
//!
//! Every attempt is reduced to an [`AttemptOutcome`]; only rate limiting is
//! retried, after an exponential delay. The loop never sleeps after its last
//! attempt.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};

/// Default number of upstream attempts per ticker.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Result of a single upstream attempt.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// The call produced a value.
    Success(T),
    /// The upstream rate limited the call; worth another attempt.
    RateLimited,
    /// The call failed for good.
    Failed(MarketDataError),
}

impl<T> From<Result<T, MarketDataError>> for AttemptOutcome<T> {
    fn from(result: Result<T, MarketDataError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => match e.retry_class() {
                RetryClass::WithBackoff => Self::RateLimited,
                RetryClass::Never => Self::Failed(e),
            },
        }
    }
}

/// How many times to try, and how long to wait between tries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first rate-limited attempt; doubles on each retry.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts,
            backoff_base,
        }
    }

    /// Delay before the attempt following `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails for good, or the attempt budget runs
    /// out.
    ///
    /// # Errors
    ///
    /// Returns the terminal error of the last attempt, or
    /// [`MarketDataError::RetriesExhausted`] when every attempt was rate
    /// limited.
    pub async fn run<T, F, Fut>(&self, provider: &str, mut op: F) -> Result<T, MarketDataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            match AttemptOutcome::from(op().await) {
                AttemptOutcome::Success(value) => return Ok(value),
                AttemptOutcome::Failed(e) => return Err(e),
                AttemptOutcome::RateLimited => {
                    if attempt + 1 == attempts {
                        break;
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        provider,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        debug!(provider, attempts, "rate limited on every attempt");
        Err(MarketDataError::RetriesExhausted {
            provider: provider.to_string(),
            attempts,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn rate_limited() -> MarketDataError {
        MarketDataError::RateLimited {
            provider: "TEST".to_string(),
        }
    }

    #[test]
    fn test_delay_for_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));

        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Duration::from_secs(20));
    }

    #[test]
    fn test_delay_for_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert!(policy.delay_for(64) >= Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn test_attempt_outcome_from_result() {
        assert!(matches!(
            AttemptOutcome::from(Ok::<_, MarketDataError>(1)),
            AttemptOutcome::Success(1)
        ));
        assert!(matches!(
            AttemptOutcome::<i32>::from(Err(rate_limited())),
            AttemptOutcome::RateLimited
        ));
        assert!(matches!(
            AttemptOutcome::<i32>::from(Err(MarketDataError::SymbolNotFound("X".into()))),
            AttemptOutcome::Failed(MarketDataError::SymbolNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_rate_limits() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = policy
            .run("TEST", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(MarketDataError::RetriesExhausted { attempts: 3, .. })
        ));
        // 1s + 2s, and no sleep after the last attempt
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_rate_limit() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = policy
            .run("TEST", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(rate_limited())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = policy
            .run("TEST", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(MarketDataError::ProviderError {
                        provider: "TEST".to_string(),
                        message: "HTTP 500".to_string(),
                    })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(MarketDataError::ProviderError { .. })));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("TEST", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(MarketDataError::RetriesExhausted { attempts: 1, .. })
        ));
    }
}
