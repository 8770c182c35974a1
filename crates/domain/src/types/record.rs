//! Normalized records derived from inbound events

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::result::Target;
use crate::constants::{ISSUES_BY_TASK_KEY, KNOWLEDGE_BY_LINK, TASKS_BY_TASK_KEY};
use crate::impl_domain_status_conversions;

/// Common view over the three normalized record kinds.
///
/// Reconciliation backends that do not care about the target system (the
/// offline cache, result assembly) work against this trait.
pub trait SyncRecord {
    /// Target system and entity kind the record is written to.
    const TARGET: Target;

    /// Offline cache namespace holding this record kind.
    const CACHE_NAMESPACE: &'static str;

    /// Stable key correlating repeated deliveries of the same entity.
    fn idempotency_key(&self) -> &str;

    fn task_key(&self) -> Option<&str> {
        None
    }

    fn timestamp_utc(&self) -> &str;

    /// Normalized fields as a JSON mapping for the result record.
    fn fields_json(&self) -> Value;

    /// Fields recorded for auditability but never written.
    fn ignored_fields(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Fields written to a code-host issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(rename = "issue.title")]
    pub title: String,
    #[serde(rename = "issue.body")]
    pub body: String,
    #[serde(rename = "issue.labels")]
    pub labels: Vec<String>,
}

/// A task-tracker task normalized for the issue pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub event_type: String,
    pub task_key: String,
    pub label: String,
    pub source_id: Option<String>,
    pub timestamp_utc: String,
    pub fields: IssueFields,
    pub ignored_fields: Vec<String>,
}

impl IssueRecord {
    /// Full-text search query locating issues carrying this record's label.
    pub fn search_query(&self, owner: &str, repo: &str) -> String {
        format!("repo:{owner}/{repo} is:issue label:{}", self.label)
    }
}

impl SyncRecord for IssueRecord {
    const TARGET: Target = Target::GithubIssue;
    const CACHE_NAMESPACE: &'static str = ISSUES_BY_TASK_KEY;

    fn idempotency_key(&self) -> &str {
        &self.task_key
    }

    fn task_key(&self) -> Option<&str> {
        Some(&self.task_key)
    }

    fn timestamp_utc(&self) -> &str {
        &self.timestamp_utc
    }

    fn fields_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }

    fn ignored_fields(&self) -> Vec<String> {
        self.ignored_fields.clone()
    }
}

/// Fields describing a knowledge page built from a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeFields {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Knowledge ID")]
    pub knowledge_id: String,
    #[serde(rename = "Record Type")]
    pub record_type: String,
    #[serde(rename = "GitHub Canonical Link")]
    pub canonical_link: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Source Path")]
    pub source_path: String,
    #[serde(rename = "Last Sync")]
    pub last_sync: String,
}

impl KnowledgeFields {
    /// Field names in the order they appear on the page.
    pub const NAMES: [&'static str; 9] = [
        "Title",
        "Knowledge ID",
        "Record Type",
        "GitHub Canonical Link",
        "Summary",
        "Status",
        "Owner",
        "Source Path",
        "Last Sync",
    ];
}

/// A pull request normalized for the knowledge pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub event_type: String,
    pub canonical_link: String,
    pub repo: Option<String>,
    pub pr_number: Option<String>,
    pub task_key: Option<String>,
    pub timestamp_utc: String,
    pub fields: KnowledgeFields,
    /// Normalized fields with no destination property; filled in once the
    /// remote schema is known.
    #[serde(default)]
    pub ignored_fields: Vec<String>,
}

impl SyncRecord for KnowledgeRecord {
    const TARGET: Target = Target::NotionKnowledge;
    const CACHE_NAMESPACE: &'static str = KNOWLEDGE_BY_LINK;

    fn idempotency_key(&self) -> &str {
        &self.canonical_link
    }

    fn task_key(&self) -> Option<&str> {
        self.task_key.as_deref()
    }

    fn timestamp_utc(&self) -> &str {
        &self.timestamp_utc
    }

    fn fields_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }

    fn ignored_fields(&self) -> Vec<String> {
        self.ignored_fields.clone()
    }
}

/// Execution state of a task, mirrored from code-host activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "Issue Open")]
    IssueOpen,
    #[serde(rename = "PR Open")]
    PrOpen,
    #[serde(rename = "CI Failed")]
    CiFailed,
    #[serde(rename = "Merged")]
    Merged,
}

impl_domain_status_conversions!(ExecutionState {
    NotStarted => "Not Started",
    IssueOpen => "Issue Open",
    PrOpen => "PR Open",
    CiFailed => "CI Failed",
    Merged => "Merged",
});

impl ExecutionState {
    pub const ALL: [Self; 5] =
        [Self::NotStarted, Self::IssueOpen, Self::PrOpen, Self::CiFailed, Self::Merged];
}

/// Fields written to a task page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    #[serde(rename = "Execution State")]
    pub execution_state: ExecutionState,
    #[serde(rename = "Last Sync")]
    pub last_sync: String,
}

/// A code-host event normalized for the task-state pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub event_type: String,
    pub task_key: String,
    pub timestamp_utc: String,
    pub fields: TaskFields,
    #[serde(default)]
    pub ignored_fields: Vec<String>,
}

impl SyncRecord for TaskRecord {
    const TARGET: Target = Target::NotionTask;
    const CACHE_NAMESPACE: &'static str = TASKS_BY_TASK_KEY;

    fn idempotency_key(&self) -> &str {
        &self.task_key
    }

    fn task_key(&self) -> Option<&str> {
        Some(&self.task_key)
    }

    fn timestamp_utc(&self) -> &str {
        &self.timestamp_utc
    }

    fn fields_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }

    fn ignored_fields(&self) -> Vec<String> {
        self.ignored_fields.clone()
    }
}
