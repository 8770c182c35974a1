//! Task command - mirror a merge or CI failure into the task's execution
//! state.

use std::sync::Arc;

use clap::Args;
use serde_json::json;
use taskbridge_core::{OfflineReconciler, TaskStateNormalizer, TaskStateSync};
use taskbridge_domain::{Settings, Target};
use taskbridge_infra::NotionDatabase;

use super::{
    check_config, dry_run, finish, normalize, read_event, require_live, reset_state,
    resolve_policy, Step,
};
use crate::output::Report;
use crate::{Mode, SyncArgs};

const TARGET: Target = Target::NotionTask;

/// Arguments for the task command.
#[derive(Debug, Clone, Args)]
pub struct TaskArgs {
    #[command(flatten)]
    pub sync: SyncArgs,
}

/// Execute the task command.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or a result cannot
/// be serialized.
pub async fn execute(args: TaskArgs, settings: Settings) -> anyhow::Result<Report> {
    finish(run(args, settings).await)
}

async fn run(args: TaskArgs, mut settings: Settings) -> Step<Report> {
    let TaskArgs { sync } = args;
    if let Some(api_base) = &sync.api_base {
        settings.notion.api_base.clone_from(api_base);
    }

    let policy = resolve_policy(TARGET, settings.retry, &sync.retry)?;
    reset_state(TARGET, &sync)?;

    let notion = &settings.notion;
    if sync.check_config {
        let body = json!({
            "target": TARGET,
            "operation": "config_ok",
            "notion_tasks_db_id": notion.tasks_db_id,
            "notion_api_base": notion.api_base,
            "retry_policy": policy,
        });
        return check_config(TARGET, notion.missing_for_tasks(), &body);
    }

    let event = read_event(TARGET, sync.event.as_deref())?;
    let record = normalize(&TaskStateNormalizer, &event)?;

    match sync.mode {
        Mode::DryRun => dry_run(&record, &sync.state, |record, cache| {
            OfflineReconciler.reconcile(record, cache)
        }),
        Mode::Live => {
            require_live(&record, notion.missing_for_tasks())?;
            let database = NotionDatabase::new(notion, notion.tasks_db_id.as_str(), policy)?;
            let pipeline = TaskStateSync::new(Arc::new(database), policy);
            Ok(Report::from_action(&pipeline.run(&record).await)?)
        }
    }
}
