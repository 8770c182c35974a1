//! Macro for implementing Display and FromStr for wire-named enums
//!
//! Several domain enums travel as fixed strings (`"github.issue"`,
//! `"CI Failed"`, `"duplicate_issue_match"`). This macro keeps the string
//! table in one place and derives both directions from it.
//!
//! # Example
//!
//! ```rust
//! use taskbridge_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RunMode {
//!     DryRun,
//!     Live,
//! }
//!
//! impl_domain_status_conversions!(RunMode {
//!     DryRun => "dry-run",
//!     Live => "live",
//! });
//!
//! assert_eq!(RunMode::DryRun.to_string(), "dry-run");
//! assert_eq!("LIVE".parse::<RunMode>().unwrap(), RunMode::Live);
//! ```

/// Implements Display and FromStr traits for wire-named enums
///
/// This macro generates:
/// - Display trait: writes the variant's wire string exactly as declared
/// - FromStr trait: parses the wire string, ignoring ASCII case
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their wire strings
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation of the variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestState {
        Pending,
        CiFailed,
        Merged,
    }

    impl_domain_status_conversions!(TestState {
        Pending => "pending",
        CiFailed => "CI Failed",
        Merged => "Merged",
    });

    #[test]
    fn test_display_keeps_declared_case() {
        assert_eq!(TestState::Pending.to_string(), "pending");
        assert_eq!(TestState::CiFailed.to_string(), "CI Failed");
        assert_eq!(TestState::Merged.as_str(), "Merged");
    }

    #[test]
    fn test_fromstr_ignores_case() {
        assert_eq!(TestState::from_str("PENDING").unwrap(), TestState::Pending);
        assert_eq!(TestState::from_str("ci failed").unwrap(), TestState::CiFailed);
        assert_eq!(TestState::from_str("mErGeD").unwrap(), TestState::Merged);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestState::from_str("closed");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid TestState: closed"));
        assert!(TestState::from_str("").is_err());
    }

    #[test]
    fn test_roundtrip() {
        for state in [TestState::Pending, TestState::CiFailed, TestState::Merged] {
            assert_eq!(TestState::from_str(&state.to_string()).unwrap(), state);
        }
    }
}
