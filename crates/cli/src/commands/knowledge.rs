//! Knowledge command - upsert the knowledge page for a pull-request event.

use std::sync::Arc;

use clap::Args;
use serde_json::json;
use taskbridge_core::{KnowledgeNormalizer, KnowledgeSync, OfflineReconciler};
use taskbridge_domain::{Settings, Target};
use taskbridge_infra::NotionDatabase;

use super::{
    check_config, dry_run, finish, normalize, read_event, require_live, reset_state,
    resolve_policy, Step,
};
use crate::output::Report;
use crate::{Mode, SyncArgs};

const TARGET: Target = Target::NotionKnowledge;

/// Arguments for the knowledge command.
#[derive(Debug, Clone, Args)]
pub struct KnowledgeArgs {
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Preferred URL property holding the canonical pull-request link.
    #[arg(long, env = "NOTION_KNOWLEDGE_LINK_PROPERTY")]
    pub knowledge_link_property: Option<String>,
}

/// Execute the knowledge command.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or a result cannot
/// be serialized.
pub async fn execute(args: KnowledgeArgs, settings: Settings) -> anyhow::Result<Report> {
    finish(run(args, settings).await)
}

async fn run(args: KnowledgeArgs, mut settings: Settings) -> Step<Report> {
    let KnowledgeArgs { sync, knowledge_link_property } = args;
    if let Some(api_base) = &sync.api_base {
        settings.notion.api_base.clone_from(api_base);
    }
    if let Some(link_property) = knowledge_link_property {
        settings.notion.knowledge_link_property = link_property;
    }

    let policy = resolve_policy(TARGET, settings.retry, &sync.retry)?;
    reset_state(TARGET, &sync)?;

    let notion = &settings.notion;
    if sync.check_config {
        let body = json!({
            "target": TARGET,
            "operation": "config_ok",
            "notion_knowledge_db_id": notion.knowledge_db_id,
            "knowledge_link_property": notion.knowledge_link_property,
            "notion_api_base": notion.api_base,
            "retry_policy": policy,
        });
        return check_config(TARGET, notion.missing_for_knowledge(), &body);
    }

    let event = read_event(TARGET, sync.event.as_deref())?;
    let record = normalize(&KnowledgeNormalizer, &event)?;

    match sync.mode {
        Mode::DryRun => dry_run(&record, &sync.state, |record, cache| {
            OfflineReconciler.reconcile(record, cache)
        }),
        Mode::Live => {
            require_live(&record, notion.missing_for_knowledge())?;
            let database = NotionDatabase::new(notion, notion.knowledge_db_id.as_str(), policy)?;
            let pipeline = KnowledgeSync::new(
                Arc::new(database),
                policy,
                notion.knowledge_link_property.as_str(),
            );
            Ok(Report::from_action(&pipeline.run(&record).await)?)
        }
    }
}
