use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::UpstreamError;

/// Bounded retry with linear backoff.
///
/// `max_attempts` counts every call, the first one included. The delay before
/// attempt `n + 1` is `n * base_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. Only [`UpstreamError::is_transient`] failures are retried.
    pub async fn run<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{operation_name} succeeded after {attempt} attempts");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_transient() => {
                    debug!("{operation_name} failed with non-retryable error: {error}");
                    return Err(error);
                }
                Err(error) if attempt >= self.max_attempts => {
                    warn!(
                        "{operation_name} failed after {attempt} attempts. Last error: {error}"
                    );
                    return Err(UpstreamError::RetriesExhausted {
                        attempts: attempt,
                        message: error.to_string(),
                    });
                }
                Err(error) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "{operation_name} attempt {attempt}/{} failed: {error}. Retrying in {:.1}s",
                        self.max_attempts,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_last_allowed_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("flaky", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(UpstreamError::transport("connection reset"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_terminal_error() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = policy
            .run("down", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(UpstreamError::rate_limited("429"))
            })
            .await;

        assert!(matches!(
            result,
            Err(UpstreamError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_is_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = policy
            .run("lookup", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(UpstreamError::not_found("no such place"))
            })
            .await;

        assert_eq!(result, Err(UpstreamError::not_found("no such place")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_linear() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let start = Instant::now();

        let _: Result<(), _> = policy
            .run("slow", || async { Err(UpstreamError::transport("timeout")) })
            .await;

        // 1 * 2s after the first failure, 2 * 2s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(policy.delay_after(3), Duration::from_secs(6));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 3);
    }
}
