//! Bounded retry with exponential backoff
//!
//! A call is attempted up to `max_attempts` times. After failed attempt `i`
//! (0-indexed) the executor sleeps `initial_delay * factor^i`, unless the
//! error dictates its own wait. Whether a failure is worth another attempt
//! is decided by a [`RetryPolicy`], kept apart from the loop so the decision
//! can be tested without timers.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a retried call ended without a value.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed transiently; carries the last error.
    #[error("All retry attempts exhausted after {attempts} tries: {error:?}")]
    AttemptsExhausted { attempts: u32, error: E },

    /// The policy declined to retry this error.
    #[error("Operation failed with non-retryable error after {attempts} tries: {error:?}")]
    NonRetryable { attempts: u32, error: E },

    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Result of a retried call and the attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    /// Attempts made, including the first one. Zero when the configuration
    /// was rejected.
    pub attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    /// Retries consumed: attempts beyond the first.
    pub const fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Decides, per failed attempt, whether the call continues.
pub trait RetryPolicy<E> {
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the backoff delay.
    Retry,
    /// Retry after the given delay instead of the backoff delay.
    RetryAfter(Duration),
    Stop,
}

/// `initial_delay * factor^attempt`, saturating at [`Duration::MAX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub factor: f64,
}

impl ExponentialBackoff {
    /// Delay slept after failed attempt `attempt` (0-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let seconds = self.initial_delay.as_secs_f64() * self.factor.powi(exponent);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }
}

/// Attempt budget and backoff of a retried call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff: ExponentialBackoff { initial_delay: Duration::from_secs(1), factor: 2.0 },
        }
    }
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// # Errors
    /// [`RetryError::InvalidConfiguration`] for a zero attempt budget or a
    /// factor that is not a positive finite number.
    pub fn validate(&self) -> Result<(), RetryError<()>> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfiguration {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        let factor = self.backoff.factor;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(RetryError::InvalidConfiguration {
                message: "backoff factor must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for [`RetryConfig`].
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn exponential_backoff(mut self, initial_delay: Duration, factor: f64) -> Self {
        self.config.backoff = ExponentialBackoff { initial_delay, factor };
        self
    }

    /// # Errors
    /// See [`RetryConfig::validate`].
    pub fn build(self) -> Result<RetryConfig, RetryError<()>> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Runs an operation under a [`RetryConfig`] and a [`RetryPolicy`].
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub const fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic and report the attempts made.
    ///
    /// The policy is consulted first: a [`RetryDecision::Stop`] ends the loop
    /// with [`RetryError::NonRetryable`] even on the final attempt, so callers
    /// can tell permanent failures from an exhausted budget.
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Err(err) = self.config.validate() {
            let message = match err {
                RetryError::InvalidConfiguration { message } => message,
                other => other.to_string(),
            };
            return RetryOutcome {
                result: Err(RetryError::InvalidConfiguration { message }),
                attempts: 0,
            };
        }

        let mut attempt: u32 = 0;

        loop {
            let attempts = attempt + 1;
            debug!(attempt = attempts, "executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retries");
                    }
                    return RetryOutcome { result: Ok(value), attempts };
                }
                Err(error) => error,
            };

            let decision = self.policy.should_retry(&error, attempt);

            if decision == RetryDecision::Stop {
                debug!(attempt = attempts, ?error, "retry policy declined to retry");
                return RetryOutcome {
                    result: Err(RetryError::NonRetryable { attempts, error }),
                    attempts,
                };
            }

            if attempts >= self.config.max_attempts {
                warn!(attempts, ?error, "all retry attempts exhausted");
                return RetryOutcome {
                    result: Err(RetryError::AttemptsExhausted { attempts, error }),
                    attempts,
                };
            }

            let delay = match decision {
                RetryDecision::RetryAfter(custom) => custom,
                _ => self.config.backoff.delay_after(attempt),
            };
            warn!(
                attempt = attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                ?error,
                "operation failed, retrying"
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

pub mod policies {
    use super::{RetryDecision, RetryPolicy};
    use crate::error::ErrorClassification;

    /// Retries exactly the errors that classify themselves as retryable,
    /// honouring an error-provided delay when present.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ClassifiedRetry;

    impl<E> RetryPolicy<E> for ClassifiedRetry
    where
        E: ErrorClassification,
    {
        fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
            if !error.is_retryable() {
                return RetryDecision::Stop;
            }
            error.retry_after().map_or(RetryDecision::Retry, RetryDecision::RetryAfter)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the backoff schedule, configuration validation and the
    //! executor's attempt accounting.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::policies::ClassifiedRetry;
    use super::*;
    use crate::error::{ErrorClassification, ErrorSeverity};

    /// `Busy` is transient, `Denied` is not.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Flaky {
        Busy(u32),
        Denied,
    }

    impl ErrorClassification for Flaky {
        fn is_retryable(&self) -> bool {
            matches!(self, Self::Busy(_))
        }

        fn severity(&self) -> ErrorSeverity {
            ErrorSeverity::Warning
        }

        fn is_critical(&self) -> bool {
            false
        }

        fn retry_after(&self) -> Option<Duration> {
            None
        }
    }

    fn fast_executor(max_attempts: u32) -> RetryExecutor<ClassifiedRetry> {
        let config = RetryConfig::builder()
            .max_attempts(max_attempts)
            .exponential_backoff(Duration::from_millis(1), 1.0)
            .build()
            .unwrap();
        RetryExecutor::new(config, ClassifiedRetry)
    }

    /// Validates `ExponentialBackoff::delay_after` for the base times
    /// factor-to-the-attempt schedule.
    ///
    /// Assertions:
    /// - Confirms attempts 0..3 yield 100ms, 200ms, 400ms, 800ms.
    /// - Confirms a fractional factor scales 1s to 1.5s then 2.25s.
    #[test]
    fn test_exponential_schedule() {
        let doubling =
            ExponentialBackoff { initial_delay: Duration::from_millis(100), factor: 2.0 };
        assert_eq!(doubling.delay_after(0), Duration::from_millis(100));
        assert_eq!(doubling.delay_after(1), Duration::from_millis(200));
        assert_eq!(doubling.delay_after(2), Duration::from_millis(400));
        assert_eq!(doubling.delay_after(3), Duration::from_millis(800));

        let gentle = ExponentialBackoff { initial_delay: Duration::from_secs(1), factor: 1.5 };
        assert_eq!(gentle.delay_after(1), Duration::from_millis(1500));
        assert_eq!(gentle.delay_after(2), Duration::from_millis(2250));
    }

    #[test]
    fn test_oversized_delay_saturates() {
        let backoff = ExponentialBackoff { initial_delay: Duration::from_secs(1), factor: 1e300 };
        assert_eq!(backoff.delay_after(5), Duration::MAX);
    }

    #[test]
    fn test_retry_config_validation() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::builder().max_attempts(0).build().is_err());
        assert!(RetryConfig::builder()
            .exponential_backoff(Duration::from_millis(10), 0.0)
            .build()
            .is_err());
    }

    /// Validates `RetryExecutor::execute_with_outcome` for the
    /// transient-then-success scenario.
    ///
    /// Assertions:
    /// - Confirms the value from the third attempt is returned.
    /// - Confirms `attempts == 3` and `retries() == 2`.
    #[tokio::test]
    async fn test_executor_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = fast_executor(4)
            .execute_with_outcome(|| {
                let calls = calls.clone();
                async move {
                    let call = calls.fetch_add(1, Ordering::SeqCst);
                    if call < 2 {
                        Err(Flaky::Busy(call))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.retries(), 2);
        assert_eq!(outcome.result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_executor_exhausts_attempts_with_last_error() {
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = fast_executor(3)
            .execute_with_outcome(|| {
                let calls = calls.clone();
                async move { Err::<(), _>(Flaky::Busy(calls.fetch_add(1, Ordering::SeqCst))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.retries(), 2);
        match outcome.result {
            Err(RetryError::AttemptsExhausted { attempts, error }) => {
                assert_eq!(attempts, 3);
                assert_eq!(error, Flaky::Busy(2));
            }
            other => panic!("expected exhausted attempts, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_executor_stops_on_non_retryable_error() {
        let outcome =
            fast_executor(5).execute_with_outcome(|| async { Err::<(), _>(Flaky::Denied) }).await;

        assert_eq!(outcome.attempts, 1);
        assert!(matches!(outcome.result, Err(RetryError::NonRetryable { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn test_executor_rejects_invalid_configuration_without_calling() {
        let config = RetryConfig { max_attempts: 0, ..RetryConfig::default() };
        let executor = RetryExecutor::new(config, ClassifiedRetry);
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = executor
            .execute_with_outcome(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Flaky>(())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.retries(), 0);
        assert!(matches!(outcome.result, Err(RetryError::InvalidConfiguration { .. })));
    }
}
