//! Result record of a single pipeline run
//!
//! [`ActionResult`] is the only externally observable output of a run. It
//! serializes to a flat JSON object tagged by `operation` so callers can
//! script against `operation`, `reason` and `idempotency_key`.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::retry::RetryPolicy;
use crate::impl_domain_status_conversions;

/// Target system and entity kind a pipeline writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    GithubIssue,
    NotionKnowledge,
    NotionTask,
}

impl_domain_status_conversions!(Target {
    GithubIssue => "github.issue",
    NotionKnowledge => "notion.knowledge",
    NotionTask => "notion.task",
});

impl Target {
    /// Reason reported when two or more remote records share one key.
    pub const fn duplicate_reason(self) -> Reason {
        match self {
            Self::GithubIssue => Reason::DuplicateIssueMatch,
            Self::NotionKnowledge => Reason::DuplicateKnowledgeMatch,
            Self::NotionTask => Reason::DuplicateTaskMatch,
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Error,
}

impl_domain_status_conversions!(Operation {
    Create => "create",
    Update => "update",
    Error => "error",
});

/// Machine-parseable reason attached to every error result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    // Input
    UnsupportedEventType,
    InvalidPayload,
    MissingTaskKey,
    InvalidTaskKeyFormat,
    InvalidTaskLabelFormat,
    MissingPrUrl,
    InvalidPrUrl,
    InvalidEventJson,
    // Configuration
    InvalidMaxRetries,
    InvalidBackoffValues,
    MissingLiveConfig,
    StateStoreError,
    // Schema
    InvalidDatabaseProperties,
    NoTitlePropertyInKnowledgeDb,
    NoTitlePropertyInTasksDb,
    NoTaskIdPropertyInTasksDb,
    // Ambiguity
    DuplicateIssueMatch,
    DuplicateKnowledgeMatch,
    DuplicateTaskMatch,
    // Transport
    GithubSearchHttpError,
    GithubSearchError,
    GithubWriteHttpError,
    GithubWriteError,
    NotionDbHttpError,
    NotionDbError,
    NotionQueryHttpError,
    NotionQueryError,
    NotionWriteHttpError,
    NotionWriteError,
    NotionCreateHttpError,
    NotionCreateError,
}

impl_domain_status_conversions!(Reason {
    UnsupportedEventType => "unsupported_event_type",
    InvalidPayload => "invalid_payload",
    MissingTaskKey => "missing_task_key",
    InvalidTaskKeyFormat => "invalid_task_key_format",
    InvalidTaskLabelFormat => "invalid_taskkey_label_format",
    MissingPrUrl => "missing_pr_url",
    InvalidPrUrl => "invalid_pr_url",
    InvalidEventJson => "invalid_event_json",
    InvalidMaxRetries => "invalid_max_retries",
    InvalidBackoffValues => "invalid_backoff_values",
    MissingLiveConfig => "missing_live_config",
    StateStoreError => "state_store_error",
    InvalidDatabaseProperties => "invalid_database_properties",
    NoTitlePropertyInKnowledgeDb => "no_title_property_in_knowledge_db",
    NoTitlePropertyInTasksDb => "no_title_property_in_tasks_db",
    NoTaskIdPropertyInTasksDb => "no_task_id_property_in_tasks_db",
    DuplicateIssueMatch => "duplicate_issue_match",
    DuplicateKnowledgeMatch => "duplicate_knowledge_match",
    DuplicateTaskMatch => "duplicate_task_match",
    GithubSearchHttpError => "github_search_http_error",
    GithubSearchError => "github_search_error",
    GithubWriteHttpError => "github_write_http_error",
    GithubWriteError => "github_write_error",
    NotionDbHttpError => "notion_db_http_error",
    NotionDbError => "notion_db_error",
    NotionQueryHttpError => "notion_query_http_error",
    NotionQueryError => "notion_query_error",
    NotionWriteHttpError => "notion_write_http_error",
    NotionWriteError => "notion_write_error",
    NotionCreateHttpError => "notion_create_http_error",
    NotionCreateError => "notion_create_error",
});

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Remote call category whose retries are counted separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStage {
    List,
    Search,
    Schema,
    Query,
    Write,
}

/// Retries consumed per stage plus the policy that governed them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryReport {
    #[serde(flatten)]
    pub counts: BTreeMap<RetryStage, u32>,
    pub policy: RetryPolicy,
}

impl RetryReport {
    /// Report with every listed stage initialised to zero.
    pub fn new(policy: RetryPolicy, stages: &[RetryStage]) -> Self {
        Self { counts: stages.iter().map(|stage| (*stage, 0)).collect(), policy }
    }

    pub fn record(&mut self, stage: RetryStage, retries: u32) {
        *self.counts.entry(stage).or_insert(0) += retries;
    }

    pub fn count(&self, stage: RetryStage) -> u32 {
        self.counts.get(&stage).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// Successful create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub target: Target,
    pub idempotency_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_key: Option<String>,
    pub fields: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_property_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id_property_name: Option<String>,
    pub timestamp_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryReport>,
}

impl Applied {
    pub fn new(
        target: Target,
        idempotency_key: impl Into<String>,
        fields: Value,
        timestamp_utc: impl Into<String>,
    ) -> Self {
        Self {
            target,
            idempotency_key: idempotency_key.into(),
            task_key: None,
            fields,
            ignored_fields: Vec::new(),
            matched_issue: None,
            issue_number: None,
            issue_url: None,
            notion_page_id: None,
            search_query: None,
            link_property_name: None,
            task_id_property_name: None,
            timestamp_utc: timestamp_utc.into(),
            retry: None,
        }
    }

    pub fn with_task_key(mut self, task_key: Option<&str>) -> Self {
        self.task_key = task_key.map(str::to_string);
        self
    }

    pub fn with_ignored_fields(mut self, ignored: Vec<String>) -> Self {
        self.ignored_fields = ignored;
        self
    }

    pub fn with_retry(mut self, retry: RetryReport) -> Self {
        self.retry = Some(retry);
        self
    }
}

/// Structured diagnostics attached to a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_property_name: Option<String>,
}

/// A run that ended without a write being applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub target: Target,
    pub idempotency_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_key: Option<String>,
    pub reason: Reason,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryReport>,
}

impl Failure {
    pub fn new(target: Target, idempotency_key: impl Into<String>, reason: Reason) -> Self {
        Self {
            target,
            idempotency_key: idempotency_key.into(),
            task_key: None,
            reason,
            diagnostics: Diagnostics::default(),
            retry: None,
        }
    }

    pub fn with_task_key(mut self, task_key: Option<&str>) -> Self {
        self.task_key = task_key.map(str::to_string);
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.diagnostics.http_status = Some(status);
        self
    }

    pub fn with_remote_error(mut self, body: Option<Value>) -> Self {
        self.diagnostics.remote_error = body;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.diagnostics.detail = Some(detail.into());
        self
    }

    pub fn with_match_count(mut self, count: usize) -> Self {
        self.diagnostics.match_count = Some(count);
        self
    }

    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.diagnostics.missing = missing;
        self
    }

    pub fn with_link_property(mut self, name: impl Into<String>) -> Self {
        self.diagnostics.link_property_name = Some(name.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryReport) -> Self {
        self.retry = Some(retry);
        self
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ActionResult {
    Create(Applied),
    Update(Applied),
    Error(Failure),
}

impl ActionResult {
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Create(_) => Operation::Create,
            Self::Update(_) => Operation::Update,
            Self::Error(_) => Operation::Error,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn target(&self) -> Target {
        match self {
            Self::Create(applied) | Self::Update(applied) => applied.target,
            Self::Error(failure) => failure.target,
        }
    }

    pub fn idempotency_key(&self) -> &str {
        match self {
            Self::Create(applied) | Self::Update(applied) => &applied.idempotency_key,
            Self::Error(failure) => &failure.idempotency_key,
        }
    }

    pub fn reason(&self) -> Option<Reason> {
        match self {
            Self::Error(failure) => Some(failure.reason),
            _ => None,
        }
    }

    pub fn applied(&self) -> Option<&Applied> {
        match self {
            Self::Create(applied) | Self::Update(applied) => Some(applied),
            Self::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Error(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn retry(&self) -> Option<&RetryReport> {
        match self {
            Self::Create(applied) | Self::Update(applied) => applied.retry.as_ref(),
            Self::Error(failure) => failure.retry.as_ref(),
        }
    }
}

impl From<Failure> for ActionResult {
    fn from(failure: Failure) -> Self {
        Self::Error(failure)
    }
}
