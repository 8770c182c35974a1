//! Issue command - upsert the code-host issue for a task event.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde_json::json;
use taskbridge_core::{IssueNormalizer, IssueSync, OfflineReconciler};
use taskbridge_domain::constants::ISSUE_NUMBER_BY_TASK_KEY;
use taskbridge_domain::{Settings, Target};
use taskbridge_infra::GithubIssueTracker;

use super::{
    check_config, commit_state, dry_run, finish, load_state, normalize, read_event, require_live,
    reset_state, resolve_policy, Step,
};
use crate::output::Report;
use crate::{Mode, SyncArgs};

const TARGET: Target = Target::GithubIssue;

/// Arguments for the issue command.
#[derive(Debug, Clone, Args)]
pub struct IssueArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Live idempotency cache mapping task keys to issue numbers.
    #[arg(long, default_value = ".taskbridge/live_state.json")]
    pub live_state: PathBuf,
}

/// Execute the issue command.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or a result cannot
/// be serialized.
pub async fn execute(args: IssueArgs, settings: Settings) -> anyhow::Result<Report> {
    finish(run(args, settings).await)
}

async fn run(args: IssueArgs, mut settings: Settings) -> Step<Report> {
    let IssueArgs { sync, live_state } = args;
    if let Some(api_base) = &sync.api_base {
        settings.github.api_base.clone_from(api_base);
    }

    let policy = resolve_policy(TARGET, settings.retry, &sync.retry)?;
    reset_state(TARGET, &sync)?;

    let github = &settings.github;
    if sync.check_config {
        let body = json!({
            "target": TARGET,
            "operation": "config_ok",
            "github_owner": github.owner,
            "github_repo": github.repo,
            "github_api_base": github.api_base,
            "retry_policy": policy,
        });
        return check_config(TARGET, github.missing(), &body);
    }

    let event = read_event(TARGET, sync.event.as_deref())?;
    let record = normalize(&IssueNormalizer, &event)?;

    match sync.mode {
        Mode::DryRun => dry_run(&record, &sync.state, |record, cache| {
            OfflineReconciler.reconcile_issue(record, cache)
        }),
        Mode::Live => {
            require_live(&record, github.missing())?;
            let tracker = GithubIssueTracker::new(github, policy)?;
            let (store, mut cache) = load_state(&record, &live_state, ISSUE_NUMBER_BY_TASK_KEY)?;

            let result = IssueSync::new(Arc::new(tracker), policy).run(&record, &mut cache).await;
            commit_state(&record, &store, &cache, &result)
        }
    }
}
