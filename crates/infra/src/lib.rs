//! # TaskBridge Infrastructure
//!
//! Infrastructure implementations of the core sync ports.
//!
//! This crate contains:
//! - The retrying HTTP client shared by every remote adapter
//! - Code-host (GitHub) and task-tracker (Notion) adapters
//! - Schema bootstrap for the knowledge and tasks databases
//! - The JSON state store backing the idempotency cache
//! - Settings loading from `.env`, environment and files
//!
//! ## Architecture
//! - Implements traits defined in `taskbridge-core`
//! - Depends on `taskbridge-common`, `taskbridge-domain` and `taskbridge-core`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod state_store;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::*;
pub use state_store::StateStore;
