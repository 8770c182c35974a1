//! External service integrations

pub mod github;
pub mod notion;

pub use github::GithubIssueTracker;
pub use notion::{
    bootstrap_schema, BootstrapError, BootstrapOutcome, BootstrapReport, NotionDatabase,
    PropertyChanges,
};
