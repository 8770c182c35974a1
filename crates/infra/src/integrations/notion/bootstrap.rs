//! Schema bootstrap for the knowledge and tasks databases
//!
//! Makes sure both databases carry every property the pipelines write. Only
//! missing properties are added; existing ones are never touched, whatever
//! their type. In dry-run mode nothing is written and the report lists what
//! would have been added.

use serde::Serialize;
use serde_json::{json, Map, Value};
use taskbridge_core::{PageDatabase, RemoteError, RemoteFailure};
use taskbridge_domain::{NotionSettings, RetryPolicy, SyncMode};
use thiserror::Error;
use tracing::info;

use super::client::NotionDatabase;

const KNOWLEDGE_STATUS_OPTIONS: [&str; 4] = ["Draft", "Review", "Approved", "Published"];
const KNOWLEDGE_RECORD_TYPES: [&str; 7] =
    ["SPEC", "RUN", "Meeting", "Research", "Deliverable", "Agent", "FAQ"];
const EXECUTION_STATES: [&str; 5] = ["Not Started", "Issue Open", "PR Open", "CI Failed", "Merged"];

fn select(options: &[&str]) -> Value {
    let options: Vec<Value> = options.iter().map(|name| json!({ "name": name })).collect();
    json!({ "select": { "options": options } })
}

/// Property definitions the knowledge pipeline relies on.
pub fn knowledge_properties() -> Vec<(&'static str, Value)> {
    vec![
        ("GitHub URL", json!({ "url": {} })),
        ("Summary", json!({ "rich_text": {} })),
        ("Status", select(&KNOWLEDGE_STATUS_OPTIONS)),
        ("Knowledge ID", json!({ "rich_text": {} })),
        ("Record Type", select(&KNOWLEDGE_RECORD_TYPES)),
        ("Last Sync", json!({ "date": {} })),
        ("Source Path", json!({ "rich_text": {} })),
    ]
}

/// Property definitions the task-state pipeline relies on.
pub fn task_properties() -> Vec<(&'static str, Value)> {
    vec![
        ("Task ID", json!({ "rich_text": {} })),
        ("Execution State", select(&EXECUTION_STATES)),
        ("Last Sync", json!({ "date": {} })),
    ]
}

/// Changes made (or planned) on one database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyChanges {
    /// Property names, sorted.
    pub added: Vec<String>,
    /// Whether the schema was actually patched.
    pub updated: bool,
}

/// Successful bootstrap report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub mode: SyncMode,
    pub knowledge_db: PropertyChanges,
    pub tasks_db: PropertyChanges,
}

/// Why a bootstrap run stopped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BootstrapError {
    #[error("missing settings: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("HTTP {status}")]
    Http { status: u16, body: Option<Value> },

    #[error("{0}")]
    Failed(String),
}

impl BootstrapError {
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MissingEnv(_) => "missing_env",
            Self::Http { .. } => "notion_http_error",
            Self::Failed(_) => "bootstrap_failed",
        }
    }
}

impl From<RemoteFailure> for BootstrapError {
    fn from(failure: RemoteFailure) -> Self {
        match failure.error {
            RemoteError::Http { status, body } => Self::Http { status, body },
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Error body of a failed bootstrap.
#[derive(Serialize)]
pub struct FailureBody<'a> {
    reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_error: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Externally visible outcome, tagged by `operation` like pipeline results.
#[derive(Serialize)]
#[serde(tag = "operation")]
pub enum BootstrapOutcome<'a> {
    #[serde(rename = "ok")]
    Ok(&'a BootstrapReport),
    #[serde(rename = "error")]
    Error(FailureBody<'a>),
}

impl<'a> From<&'a Result<BootstrapReport, BootstrapError>> for BootstrapOutcome<'a> {
    fn from(result: &'a Result<BootstrapReport, BootstrapError>) -> Self {
        match result {
            Ok(report) => Self::Ok(report),
            Err(error) => {
                let mut body = FailureBody {
                    reason: error.reason(),
                    missing: None,
                    http_status: None,
                    remote_error: None,
                    detail: None,
                };
                match error {
                    BootstrapError::MissingEnv(missing) => body.missing = Some(missing.as_slice()),
                    BootstrapError::Http { status, body: remote } => {
                        body.http_status = Some(*status);
                        body.remote_error = remote.as_ref();
                    }
                    BootstrapError::Failed(detail) => body.detail = Some(detail.clone()),
                }
                Self::Error(body)
            }
        }
    }
}

/// Settings names the bootstrap needs, in reporting order.
pub fn missing_settings(settings: &NotionSettings) -> Vec<String> {
    let mut missing = settings.missing_for_knowledge();
    for name in settings.missing_for_tasks() {
        if !missing.contains(&name) {
            missing.push(name);
        }
    }
    missing
}

/// Add the properties of `required` that `database` lacks.
///
/// # Errors
/// - [`BootstrapError::Http`] when the remote rejects a call
/// - [`BootstrapError::Failed`] when the schema is not a mapping or a call
///   fails without a status
pub async fn ensure_properties(
    database: &NotionDatabase,
    required: &[(&'static str, Value)],
    dry_run: bool,
) -> Result<PropertyChanges, BootstrapError> {
    let schema = database.retrieve_schema().await?.value.ok_or_else(|| {
        BootstrapError::Failed("invalid database response: properties is not object".into())
    })?;

    let missing: Map<String, Value> = required
        .iter()
        .filter(|(name, _)| !schema.contains(name))
        .map(|(name, definition)| ((*name).to_string(), definition.clone()))
        .collect();

    let mut added: Vec<String> = missing.keys().cloned().collect();
    added.sort();

    if added.is_empty() || dry_run {
        return Ok(PropertyChanges { added, updated: false });
    }

    database.add_properties(&missing).await?;
    info!(database_id = database.database_id(), added = ?added, "database schema extended");
    Ok(PropertyChanges { added, updated: true })
}

/// Bootstrap both databases configured in `settings`.
///
/// # Errors
/// [`BootstrapError::MissingEnv`] before any network activity when the token
/// or either database id is unset; otherwise see [`ensure_properties`].
pub async fn bootstrap_schema(
    settings: &NotionSettings,
    policy: RetryPolicy,
    mode: SyncMode,
) -> Result<BootstrapReport, BootstrapError> {
    let missing = missing_settings(settings);
    if !missing.is_empty() {
        return Err(BootstrapError::MissingEnv(missing));
    }

    let connect = |database_id: &str| {
        NotionDatabase::new(settings, database_id, policy)
            .map_err(|err| BootstrapError::Failed(err.to_string()))
    };
    let knowledge = connect(&settings.knowledge_db_id)?;
    let tasks = connect(&settings.tasks_db_id)?;
    let dry_run = mode == SyncMode::DryRun;

    let knowledge_db = ensure_properties(&knowledge, &knowledge_properties(), dry_run).await?;
    let tasks_db = ensure_properties(&tasks, &task_properties(), dry_run).await?;

    Ok(BootstrapReport { mode, knowledge_db, tasks_db })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_state_lists_every_state_in_order() {
        let properties = task_properties();
        let (_, definition) =
            properties.iter().find(|(name, _)| *name == "Execution State").unwrap();
        assert_eq!(
            definition["select"]["options"],
            json!([
                {"name": "Not Started"},
                {"name": "Issue Open"},
                {"name": "PR Open"},
                {"name": "CI Failed"},
                {"name": "Merged"}
            ])
        );
    }

    #[test]
    fn missing_settings_are_reported_once_in_order() {
        let settings = NotionSettings::default();
        assert_eq!(
            missing_settings(&settings),
            ["NOTION_TOKEN", "NOTION_KNOWLEDGE_DB_ID", "NOTION_TASKS_DB_ID"]
        );
    }

    #[tokio::test]
    async fn missing_settings_fail_before_any_request() {
        let result =
            bootstrap_schema(&NotionSettings::default(), RetryPolicy::default(), SyncMode::Live)
                .await;
        assert!(
            matches!(result, Err(BootstrapError::MissingEnv(ref missing)) if missing.len() == 3)
        );
    }

    #[test]
    fn error_outcome_is_flat_and_tagged() {
        let result: Result<BootstrapReport, BootstrapError> =
            Err(BootstrapError::Http { status: 401, body: Some(json!({"code": "unauthorized"})) });
        assert_eq!(
            serde_json::to_value(BootstrapOutcome::from(&result)).unwrap(),
            json!({
                "operation": "error",
                "reason": "notion_http_error",
                "http_status": 401,
                "remote_error": {"code": "unauthorized"}
            })
        );
    }

    #[test]
    fn ok_outcome_carries_mode_and_changes() {
        let result: Result<BootstrapReport, BootstrapError> = Ok(BootstrapReport {
            mode: SyncMode::DryRun,
            knowledge_db: PropertyChanges { added: vec!["Summary".into()], updated: false },
            tasks_db: PropertyChanges::default(),
        });
        assert_eq!(
            serde_json::to_value(BootstrapOutcome::from(&result)).unwrap(),
            json!({
                "operation": "ok",
                "mode": "dry-run",
                "knowledge_db": {"added": ["Summary"], "updated": false},
                "tasks_db": {"added": [], "updated": false}
            })
        );
    }
}
