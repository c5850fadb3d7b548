//! Retry with exponential backoff.
//!
//! Delay before retry `a` (0-based) is `min(initial * multiplier^a, max)`.
//! An operation gets at most `max_retries + 1` attempts.

use crate::config::RetrySettings;
use crate::result::ProbeError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Backoff policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any delay
    pub max_delay: Duration,
    /// Growth factor per retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_secs_f64(settings.initial_delay.max(0.0)),
            max_delay: Duration::from_secs_f64(settings.max_delay.max(0.0)),
            backoff_multiplier: settings.backoff_multiplier,
        }
    }
}

/// One recorded failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    /// 1-indexed attempt
    pub attempt: u32,
    /// Error text
    pub error: String,
}

/// Result of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Whether some attempt succeeded
    pub success: bool,
    /// Value of the successful attempt
    pub value: Option<T>,
    /// Attempts made
    pub attempts: u32,
    /// Time from first attempt to return
    pub total_time: Duration,
    /// Error of the final failed attempt
    pub last_error: Option<E>,
    /// Every failure, in order
    pub errors: Vec<AttemptError>,
}

impl<T, E> RetryOutcome<T, E> {
    /// Convert to a plain `Result`
    pub fn into_result(self) -> Result<T, E>
    where
        E: From<ProbeError>,
    {
        match (self.value, self.last_error) {
            (Some(value), _) => Ok(value),
            (None, Some(error)) => Err(error),
            (None, None) => Err(ProbeError::driver("retry made no attempts").into()),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given retry count and default delays
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the first delay
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before retry `attempt` (0-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Retry every error
    pub async fn retry<T, E, F, Fut>(&self, op: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.retry_on(op, |_| true).await
    }

    /// Retry only errors for which `should_retry` holds; others stop at once
    pub async fn retry_on<T, E, F, Fut, P>(&self, mut op: F, should_retry: P) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let start = Instant::now();
        let mut errors = Vec::new();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match op().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "succeeded after retry");
                    }
                    return RetryOutcome {
                        success: true,
                        value: Some(value),
                        attempts,
                        total_time: start.elapsed(),
                        last_error: None,
                        errors,
                    };
                }
                Err(error) => {
                    errors.push(AttemptError {
                        attempt: attempts,
                        error: error.to_string(),
                    });
                    let exhausted = attempts > self.max_retries;
                    if exhausted || !should_retry(&error) {
                        warn!(attempts, error = %error, "giving up");
                        return RetryOutcome {
                            success: false,
                            value: None,
                            attempts,
                            total_time: start.elapsed(),
                            last_error: Some(error),
                            errors,
                        };
                    }
                    let delay = self.delay_for(attempts - 1);
                    debug!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::ProbeResult;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
    }

    mod delay_tests {
        use super::*;

        #[test]
        fn test_exponential_then_capped() {
            let policy = fast(5);
            assert_eq!(policy.delay_for(0), Duration::from_millis(100));
            assert_eq!(policy.delay_for(1), Duration::from_millis(200));
            assert_eq!(policy.delay_for(2), Duration::from_millis(350));
            assert_eq!(policy.delay_for(40), Duration::from_millis(350));
        }

        #[test]
        fn test_from_settings() {
            let policy = RetryPolicy::from(&RetrySettings::default());
            assert_eq!(policy.max_retries, 3);
            assert_eq!(policy.initial_delay, Duration::from_secs(1));
            assert_eq!(policy.max_delay, Duration::from_secs(10));
            assert_eq!(policy.delay_for(3), Duration::from_secs(8));
            assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        }
    }

    mod retry_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_after_failures() {
            let counter = AtomicU32::new(0);
            let calls = &counter;
            let outcome = fast(3)
                .retry(move || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(ProbeError::driver(format!("flaky {n}")))
                    } else {
                        Ok(n)
                    }
                })
                .await;
            assert!(outcome.success);
            assert_eq!(outcome.attempts, 3);
            assert_eq!(outcome.errors.len(), 2);
            assert_eq!(outcome.errors[1].attempt, 2);
            assert!(outcome.total_time >= Duration::from_millis(300));
            assert!(outcome.total_time < Duration::from_millis(400));
            assert_eq!(outcome.into_result().unwrap(), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_exhausts_retries() {
            let outcome: RetryOutcome<(), ProbeError> = fast(2)
                .retry(|| async { Err(ProbeError::Timeout { ms: 10 }) })
                .await;
            assert!(!outcome.success);
            assert_eq!(outcome.attempts, 3);
            assert_eq!(outcome.errors.len(), 3);
            assert!(outcome.last_error.as_ref().unwrap().is_timeout());
            assert!(outcome.into_result().is_err());
        }

        #[tokio::test(start_paused = true)]
        async fn test_retry_on_stops_on_fatal_error() {
            let counter = AtomicU32::new(0);
            let calls = &counter;
            let outcome: RetryOutcome<(), ProbeError> = fast(5)
                .retry_on(
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        ProbeResult::Err(ProbeError::config("bad"))
                    },
                    ProbeError::is_timeout,
                )
                .await;
            assert_eq!(outcome.attempts, 1);
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }
}
