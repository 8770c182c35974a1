//! Integration tests for the database schema bootstrap
//!
//! **Purpose**: Run `bootstrap_schema` against a mocked task tracker and
//! check which property definitions are planned or written.
//!
//! **Coverage:**
//! - Dry-run: missing properties reported, no schema writes
//! - Live: one PATCH per database carrying only the missing properties
//! - Complete schemas: nothing added, nothing written
//! - Remote rejection: status and body surfaced in the error outcome

#![allow(dead_code)]

mod support;

use serde_json::{json, Value};
use support::{fast_policy, notion_settings, KNOWLEDGE_DB, TASKS_DB};
use taskbridge_domain::SyncMode;
use taskbridge_infra::{bootstrap_schema, BootstrapError, BootstrapOutcome};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Helpers
// ============================================================================

async fn mount_schema(server: &MockServer, database_id: &str, properties: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/databases/{database_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"properties": properties})))
        .mount(server)
        .await;
}

fn complete_tasks_schema() -> Value {
    json!({
        "Task Name": {"type": "title"},
        "Task ID": {"type": "rich_text"},
        "Execution State": {"type": "select"},
        "Last Sync": {"type": "date"}
    })
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn dry_run_reports_missing_properties_without_writing() {
    let server = MockServer::start().await;
    mount_schema(
        &server,
        KNOWLEDGE_DB,
        json!({"Name": {"type": "title"}, "GitHub URL": {"type": "url"}}),
    )
    .await;
    mount_schema(&server, TASKS_DB, json!({"Task Name": {"type": "title"}})).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = bootstrap_schema(&notion_settings(&server), fast_policy(1), SyncMode::DryRun)
        .await
        .unwrap();

    assert_eq!(report.mode, SyncMode::DryRun);
    assert_eq!(
        report.knowledge_db.added,
        ["Knowledge ID", "Last Sync", "Record Type", "Source Path", "Status", "Summary"]
    );
    assert!(!report.knowledge_db.updated);
    assert_eq!(report.tasks_db.added, ["Execution State", "Last Sync", "Task ID"]);
    assert!(!report.tasks_db.updated);
}

#[tokio::test]
async fn live_run_patches_only_missing_properties() {
    let server = MockServer::start().await;
    mount_schema(
        &server,
        KNOWLEDGE_DB,
        json!({
            "Name": {"type": "title"},
            "GitHub URL": {"type": "url"},
            "Summary": {"type": "rich_text"},
            "Status": {"type": "select"},
            "Knowledge ID": {"type": "rich_text"},
            "Record Type": {"type": "select"},
            "Source Path": {"type": "rich_text"}
        }),
    )
    .await;
    mount_schema(&server, TASKS_DB, json!({"Task Name": {"type": "title"}})).await;
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/databases/{KNOWLEDGE_DB}")))
        .and(body_partial_json(json!({"properties": {"Last Sync": {"date": {}}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "database"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/v1/databases/{TASKS_DB}")))
        .and(body_partial_json(json!({
            "properties": {
                "Task ID": {"rich_text": {}},
                "Execution State": {"select": {"options": [
                    {"name": "Not Started"},
                    {"name": "Issue Open"},
                    {"name": "PR Open"},
                    {"name": "CI Failed"},
                    {"name": "Merged"}
                ]}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "database"})))
        .expect(1)
        .mount(&server)
        .await;

    let report = bootstrap_schema(&notion_settings(&server), fast_policy(1), SyncMode::Live)
        .await
        .unwrap();

    assert_eq!(report.knowledge_db.added, ["Last Sync"]);
    assert!(report.knowledge_db.updated);
    assert_eq!(report.tasks_db.added, ["Execution State", "Last Sync", "Task ID"]);
    assert!(report.tasks_db.updated);
}

#[tokio::test]
async fn complete_schemas_need_no_changes() {
    let server = MockServer::start().await;
    mount_schema(
        &server,
        KNOWLEDGE_DB,
        json!({
            "GitHub URL": {"type": "url"},
            "Summary": {"type": "rich_text"},
            "Status": {"type": "select"},
            "Knowledge ID": {"type": "rich_text"},
            "Record Type": {"type": "select"},
            "Last Sync": {"type": "date"},
            "Source Path": {"type": "rich_text"}
        }),
    )
    .await;
    mount_schema(&server, TASKS_DB, complete_tasks_schema()).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = bootstrap_schema(&notion_settings(&server), fast_policy(1), SyncMode::Live)
        .await
        .unwrap();

    assert!(report.knowledge_db.added.is_empty());
    assert!(!report.knowledge_db.updated);
    assert!(report.tasks_db.added.is_empty());
}

#[tokio::test]
async fn remote_rejection_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/databases/{KNOWLEDGE_DB}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"code": "object_not_found"})),
        )
        .mount(&server)
        .await;

    let result =
        bootstrap_schema(&notion_settings(&server), fast_policy(1), SyncMode::DryRun).await;

    assert!(matches!(result, Err(BootstrapError::Http { status: 404, .. })));
    assert_eq!(
        serde_json::to_value(BootstrapOutcome::from(&result)).unwrap(),
        json!({
            "operation": "error",
            "reason": "notion_http_error",
            "http_status": 404,
            "remote_error": {"code": "object_not_found"}
        })
    );
}
