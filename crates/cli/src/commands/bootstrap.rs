//! Bootstrap-schema command - add the properties the pipelines write to the
//! knowledge and tasks databases.

use clap::Args;
use serde_json::json;
use taskbridge_domain::Settings;
use taskbridge_infra::{bootstrap_schema, BootstrapOutcome};
use tracing::info;

use super::merge_policy;
use crate::output::{Report, EXIT_ERROR, EXIT_OK, EXIT_USAGE};
use crate::{Mode, RetryArgs};

/// Arguments for the bootstrap-schema command.
#[derive(Debug, Clone, Args)]
pub struct BootstrapArgs {
    /// `dry-run` reports what would be added; `live` patches the schemas.
    #[arg(long, value_enum, default_value_t = Mode::DryRun)]
    pub mode: Mode,

    /// API base URL override (for mocks and proxies).
    #[arg(long)]
    pub api_base: Option<String>,

    #[command(flatten)]
    pub retry: RetryArgs,
}

/// Execute the bootstrap-schema command.
///
/// # Errors
///
/// Returns an error if the outcome cannot be serialized.
pub async fn execute(args: BootstrapArgs, mut settings: Settings) -> anyhow::Result<Report> {
    if let Some(api_base) = &args.api_base {
        settings.notion.api_base.clone_from(api_base);
    }

    let policy = match merge_policy(settings.retry, &args.retry) {
        Ok(policy) => policy,
        Err(reason) => {
            let body = json!({ "operation": "error", "reason": reason });
            return Ok(Report::new(&body, EXIT_USAGE)?);
        }
    };

    let result = bootstrap_schema(&settings.notion, policy, args.mode.into()).await;
    match &result {
        Ok(report) => info!(
            knowledge_added = report.knowledge_db.added.len(),
            tasks_added = report.tasks_db.added.len(),
            "schema bootstrap finished"
        ),
        Err(err) => info!(reason = err.reason(), error = %err, "schema bootstrap failed"),
    }

    let code = if result.is_ok() { EXIT_OK } else { EXIT_ERROR };
    Ok(Report::new(&BootstrapOutcome::from(&result), code)?)
}
