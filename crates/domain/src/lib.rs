//! # TaskBridge Domain
//!
//! Data types shared by every TaskBridge crate.
//!
//! This crate contains:
//! - Inbound events and the normalized records derived from them
//! - Retry policy, match results and the result record of a pipeline run
//! - The offline idempotency cache and remote schema descriptions
//! - Domain error types and Result definitions
//! - Settings structures and domain constants
//!
//! ## Architecture
//! - No dependencies on other TaskBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
