//! Error classification shared by every TaskBridge error type
//!
//! Retry decisions never inspect concrete error variants directly. Error
//! types describe themselves through [`ErrorClassification`] and the
//! resilience layer asks that trait whether another attempt is worthwhile.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use taskbridge_common::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Unavailable,
//!     Rejected,
//! }
//!
//! impl ErrorClassification for FetchError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Unavailable)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         if self.is_retryable() {
//!             ErrorSeverity::Warning
//!         } else {
//!             ErrorSeverity::Error
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         false
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(FetchError::Unavailable.is_retryable());
//! assert_eq!(FetchError::Rejected.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::time::Duration;

/// How an error should be treated by retry loops and log sinks.
pub trait ErrorClassification {
    /// Whether another attempt could succeed, as for rate limits, gateway
    /// failures or dropped connections.
    fn is_retryable(&self) -> bool;

    /// Log level the error deserves once it surfaces.
    fn severity(&self) -> ErrorSeverity;

    /// Whether the failure points at broken configuration rather than a
    /// single bad request.
    fn is_critical(&self) -> bool;

    /// Wait dictated by the error itself, such as a `Retry-After` hint.
    /// `None` leaves the delay to the backoff schedule.
    fn retry_after(&self) -> Option<Duration>;
}

/// Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    /// Short label used in log fields.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
