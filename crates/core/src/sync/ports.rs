//! Port interfaces for the remote systems of record
//!
//! Adapters implementing these traits own transport, authentication and the
//! retry loop. Every call reports how many retries it consumed, whether it
//! eventually succeeded or not, so pipelines can surface retry counters.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use taskbridge_common::{ErrorClassification, ErrorSeverity};
use taskbridge_domain::constants::{RETRYABLE_HTTP_STATUSES, TEXT_PROPERTY_LIMIT};
use taskbridge_domain::{DatabaseSchema, IssueFields};
use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// The remote answered with a non-success status. `body` holds the
    /// response when it parsed as JSON.
    #[error("HTTP {status}")]
    Http { status: u16, body: Option<Value> },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    /// A success response whose body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Transport(String),
}

impl RemoteError {
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

/// Whether another attempt may succeed.
///
/// Only rate limiting, gateway and availability statuses plus network
/// timeouts and connection failures qualify.
pub fn is_retryable(error: &RemoteError) -> bool {
    match error {
        RemoteError::Http { status, .. } => RETRYABLE_HTTP_STATUSES.contains(status),
        RemoteError::Timeout(_) | RemoteError::Connect(_) => true,
        RemoteError::Decode(_) | RemoteError::Transport(_) => false,
    }
}

impl ErrorClassification for RemoteError {
    fn is_retryable(&self) -> bool {
        is_retryable(self)
    }

    fn severity(&self) -> ErrorSeverity {
        if self.is_critical() {
            ErrorSeverity::Critical
        } else if self.is_retryable() {
            ErrorSeverity::Warning
        } else {
            ErrorSeverity::Error
        }
    }

    // Rejected credentials fail every later call too
    fn is_critical(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// A successful remote call and the retries it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub retries: u32,
}

impl<T> Attempted<T> {
    pub const fn new(value: T, retries: u32) -> Self {
        Self { value, retries }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempted<U> {
        Attempted { value: f(self.value), retries: self.retries }
    }
}

/// A remote call that failed after exhausting (or skipping) retries.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error} (after {retries} retries)")]
pub struct RemoteFailure {
    pub error: RemoteError,
    pub retries: u32,
}

impl RemoteFailure {
    pub const fn new(error: RemoteError, retries: u32) -> Self {
        Self { error, retries }
    }
}

impl From<RemoteError> for RemoteFailure {
    fn from(error: RemoteError) -> Self {
        Self { error, retries: 0 }
    }
}

pub type RemoteResult<T> = Result<Attempted<T>, RemoteFailure>;

/// An issue as returned by the code host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub number: u64,
    pub html_url: Option<String>,
}

/// Code-host issue tracker scoped to one repository.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    fn owner(&self) -> &str;

    fn repo(&self) -> &str;

    /// Lists issues in any state carrying `label`.
    async fn list_by_label(&self, label: &str) -> RemoteResult<Vec<RemoteIssue>>;

    /// Full-text issue search; used when the label listing comes back empty.
    async fn search(&self, query: &str) -> RemoteResult<Vec<RemoteIssue>>;

    async fn create_issue(&self, fields: &IssueFields) -> RemoteResult<RemoteIssue>;

    async fn update_issue(&self, number: u64, fields: &IssueFields) -> RemoteResult<RemoteIssue>;
}

/// Equality condition of a page query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCondition {
    UrlEquals(String),
    TitleEquals(String),
    RichTextEquals(String),
}

/// Single-property page query filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFilter {
    pub property: String,
    pub condition: FilterCondition,
}

impl PageFilter {
    pub fn new(property: impl Into<String>, condition: FilterCondition) -> Self {
        Self { property: property.into(), condition }
    }
}

/// Typed value written to a page property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Url(String),
    Select(String),
    Date(String),
}

impl PropertyValue {
    /// Title text, truncated to the remote text limit.
    pub fn title(text: &str) -> Self {
        Self::Title(truncate_chars(text, TEXT_PROPERTY_LIMIT))
    }

    /// Rich text, truncated to the remote text limit.
    pub fn rich_text(text: &str) -> Self {
        Self::RichText(truncate_chars(text, TEXT_PROPERTY_LIMIT))
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Ordered set of property writes for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageProperties {
    entries: Vec<(String, PropertyValue)>,
}

impl PageProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an earlier value for the same property.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(existing, _)| existing == name).map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A page as returned by the page database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePage {
    pub id: String,
    pub url: Option<String>,
}

/// A page database (knowledge or tasks) of the task tracker.
#[async_trait]
pub trait PageDatabase: Send + Sync {
    fn database_id(&self) -> &str;

    /// Fetches the database's property schema.
    ///
    /// Yields `None` when the response carries no `properties` mapping.
    async fn retrieve_schema(&self) -> RemoteResult<Option<DatabaseSchema>>;

    async fn query(&self, filter: &PageFilter) -> RemoteResult<Vec<RemotePage>>;

    async fn create_page(&self, properties: &PageProperties) -> RemoteResult<RemotePage>;

    async fn update_page(
        &self,
        page_id: &str,
        properties: &PageProperties,
    ) -> RemoteResult<RemotePage>;
}
