//! Timeout race and bounded retry around a single remote call.

use crate::error::{FeedError, Result};
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Wraps one remote operation with a per-attempt deadline and a bounded
/// retry budget for transient failures. Permanent errors fail fast without
/// consuming the budget. Dropping a timed-out attempt does not stop the
/// remote side; abandonment is fire-and-forget.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    timeout: Duration,
    max_retries: u32,
    base_delay: Duration,
}

impl ResilientFetcher {
    pub fn new(timeout: Duration, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            base_delay,
        }
    }

    /// Same budget and backoff, different per-attempt deadline. Used to
    /// derive the longer startup/build-context variant.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Linear backoff: the n-th retry sleeps base * n.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `operation` up to `max_retries + 1` times, racing each attempt
    /// against the deadline.
    pub async fn fetch<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error: Option<FeedError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.delay_for_attempt(attempt);
                debug!("retry {} of {} in {:?}", attempt, self.max_retries, delay);
                sleep(delay).await;
            }

            match timeout(self.timeout, operation()).await {
                Ok(Ok(value)) => {
                    if attempt > 0 {
                        info!("remote call succeeded after {} retries", attempt);
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    if !e.should_retry() {
                        warn!("non-retryable error on attempt {}: {}", attempt + 1, e);
                        return Err(e);
                    }
                    warn!("attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!("attempt {} timed out after {:?}", attempt + 1, self.timeout);
                    last_error = Some(FeedError::Timeout(format!(
                        "remote call exceeded {:?}",
                        self.timeout
                    )));
                }
            }
        }

        warn!("all {} attempts failed", self.max_retries + 1);
        Err(last_error
            .unwrap_or_else(|| FeedError::Unknown("retry budget exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fetcher(max_retries: u32) -> ResilientFetcher {
        ResilientFetcher::new(Duration::from_secs(5), max_retries, Duration::from_millis(250))
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_exactly_budget_failures() {
        let attempts = AtomicU32::new(0);
        let result = fetcher(2)
            .fetch(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(FeedError::Unavailable("503".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_past_budget_exhausts() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32> = fetcher(2)
            .fetch(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(FeedError::Unavailable("503".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(FeedError::Unavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_fast() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32> = fetcher(2)
            .fetch(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(FeedError::Parse("bad record".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(FeedError::Parse(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_times_out_and_retries() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32> = fetcher(1)
            .fetch(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    sleep(Duration::from_secs(60)).await;
                    Ok(0)
                }
            })
            .await;

        assert!(matches!(result, Err(FeedError::Timeout(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_is_linear_in_attempt() {
        let f = fetcher(3);
        assert_eq!(f.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(f.delay_for_attempt(2), Duration::from_millis(500));
        assert_eq!(f.delay_for_attempt(3), Duration::from_millis(750));
    }

    #[test]
    fn test_with_timeout_derives_variant() {
        let f = fetcher(2).with_timeout(Duration::from_secs(15));
        assert_eq!(f.timeout, Duration::from_secs(15));
        assert_eq!(f.max_retries, 2);
    }
}
