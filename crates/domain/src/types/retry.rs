//! Retry policy governing every remote call of a run

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::result::Reason;
use crate::constants::{DEFAULT_BACKOFF_BASE_SEC, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES};

/// Bounded exponential backoff parameters.
///
/// Attempt `i` (0-indexed) that fails transiently waits
/// `backoff_base_sec * backoff_factor^i` before the next attempt, and a call
/// makes at most `max_retries + 1` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_sec: f64,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_sec: DEFAULT_BACKOFF_BASE_SEC,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Build a policy from raw caller input, rejecting invalid values before
    /// any network activity.
    ///
    /// # Errors
    /// - [`Reason::InvalidMaxRetries`] when `max_retries` is negative or does
    ///   not fit in `u32`
    /// - [`Reason::InvalidBackoffValues`] when the base or factor is not a
    ///   positive finite number
    pub fn new(
        max_retries: i64,
        backoff_base_sec: f64,
        backoff_factor: f64,
    ) -> Result<Self, Reason> {
        let max_retries = u32::try_from(max_retries).map_err(|_| Reason::InvalidMaxRetries)?;
        let policy = Self { max_retries, backoff_base_sec, backoff_factor };
        policy.validate()?;
        Ok(policy)
    }

    /// # Errors
    /// [`Reason::InvalidBackoffValues`] when the base or factor is not a
    /// positive finite number.
    pub fn validate(&self) -> Result<(), Reason> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if positive(self.backoff_base_sec) && positive(self.backoff_factor) {
            Ok(())
        } else {
            Err(Reason::InvalidBackoffValues)
        }
    }

    pub const fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn initial_delay(&self) -> Duration {
        seconds(self.backoff_base_sec)
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.total_attempts(), 4);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn initial_delay_is_the_base() {
        let policy = RetryPolicy::new(3, 0.5, 2.0).unwrap();
        assert_eq!(policy.initial_delay(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_negative_retries() {
        assert_eq!(RetryPolicy::new(-1, 1.0, 2.0), Err(Reason::InvalidMaxRetries));
    }

    #[test]
    fn rejects_non_positive_backoff() {
        assert_eq!(RetryPolicy::new(3, 0.0, 2.0), Err(Reason::InvalidBackoffValues));
        assert_eq!(RetryPolicy::new(3, 1.0, -2.0), Err(Reason::InvalidBackoffValues));
        assert_eq!(RetryPolicy::new(3, f64::NAN, 2.0), Err(Reason::InvalidBackoffValues));
    }

    #[test]
    fn zero_retries_is_a_single_attempt() {
        let policy = RetryPolicy::new(0, 1.0, 2.0).unwrap();
        assert_eq!(policy.total_attempts(), 1);
    }

    #[test]
    fn oversized_base_saturates() {
        let policy = RetryPolicy::new(3, 1e300, 2.0).unwrap();
        assert_eq!(policy.initial_delay(), Duration::MAX);
    }
}
