//! Shared fixtures for the infra integration tests.

use serde_json::json;
use taskbridge_core::{IssueNormalizer, KnowledgeNormalizer, Normalizer, TaskStateNormalizer};
use taskbridge_domain::{
    Event, GithubSettings, IssueRecord, KnowledgeRecord, NotionSettings, RetryPolicy, TaskRecord,
};
use wiremock::MockServer;

pub const TASK_KEY: &str = "TSK-20260101-0001";
pub const LABEL: &str = "taskkey:TSK-20260101-0001";
pub const PR_URL: &str = "https://github.com/acme/app/pull/42";
pub const KNOWLEDGE_DB: &str = "db-knowledge";
pub const TASKS_DB: &str = "db-tasks";

/// Policy with millisecond backoff so retry paths stay fast.
pub fn fast_policy(max_retries: i64) -> RetryPolicy {
    RetryPolicy::new(max_retries, 0.01, 1.0).expect("valid test policy")
}

pub fn github_settings(server: &MockServer) -> GithubSettings {
    GithubSettings {
        token: "ghp_test".into(),
        owner: "acme".into(),
        repo: "app".into(),
        api_base: server.uri(),
    }
}

pub fn notion_settings(server: &MockServer) -> NotionSettings {
    NotionSettings {
        token: "secret_test".into(),
        knowledge_db_id: KNOWLEDGE_DB.into(),
        tasks_db_id: TASKS_DB.into(),
        api_base: server.uri(),
        ..NotionSettings::default()
    }
}

pub fn issue_record() -> IssueRecord {
    let event = Event::new(
        "notion.task.created",
        json!({"task_key": TASK_KEY, "title": "Fix bug", "summary": "details"}),
    );
    IssueNormalizer.normalize(&event).expect("issue event normalizes")
}

pub fn knowledge_record() -> KnowledgeRecord {
    let event = Event::new(
        "github.pr.opened",
        json!({"pr_url": PR_URL, "pr_number": 42, "title": "Add retries", "repo": "acme/app"}),
    );
    KnowledgeNormalizer.normalize(&event).expect("knowledge event normalizes")
}

pub fn task_record(event_type: &str) -> TaskRecord {
    TaskStateNormalizer
        .normalize(&Event::new(event_type, json!({"task_key": TASK_KEY})))
        .expect("task event normalizes")
}
