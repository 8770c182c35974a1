//! Task-tracker page database adapter and schema bootstrap

pub mod bootstrap;
pub mod client;
pub mod types;

pub use bootstrap::{
    bootstrap_schema, BootstrapError, BootstrapOutcome, BootstrapReport, PropertyChanges,
};
pub use client::NotionDatabase;
