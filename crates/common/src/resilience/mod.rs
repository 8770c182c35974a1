//! Resilience patterns for fault tolerance
//!
//! A small retry engine:
//! - [`RetryPolicy`] decides per error whether another attempt is allowed
//! - [`ExponentialBackoff`] computes the wait before that attempt
//! - [`RetryExecutor`] drives the loop and reports how many attempts a call
//!   consumed
//!
//! The executor is generic over the error type and knows nothing about HTTP;
//! callers plug their own classification in through
//! [`policies::ClassifiedRetry`].

pub mod retry;

pub use retry::{
    policies, ExponentialBackoff, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
