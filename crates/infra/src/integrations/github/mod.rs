//! Code-host issue tracker adapter

pub mod client;
pub mod types;

pub use client::GithubIssueTracker;
