//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for TaskBridge
///
/// Pipeline outcomes (ambiguous matches, rejected events, exhausted retries)
/// are reported as [`crate::ActionResult::Error`] values. This type covers
/// failures around a run: settings, state files and process plumbing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TaskBridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for TaskBridge operations
pub type Result<T> = std::result::Result<T, TaskBridgeError>;
