//! Offline (dry-run) reconciliation
//!
//! The idempotency cache stands in for the remote system: a cached key
//! replays as an update, an unknown key is "created" under a simulated id,
//! and a key cached with several ids is rejected as ambiguous. No remote
//! call is made and no retries are reported.

use taskbridge_domain::constants::SIMULATED_ID_PREFIX;
use taskbridge_domain::{
    ActionResult, Applied, CacheLookup, Failure, IdempotencyCache, IssueRecord, RemoteId,
    SyncRecord, Target,
};
use tracing::debug;

/// Reconciles normalized records against an [`IdempotencyCache`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineReconciler;

impl OfflineReconciler {
    pub fn reconcile<R: SyncRecord>(
        &self,
        record: &R,
        cache: &mut IdempotencyCache,
    ) -> ActionResult {
        let key = record.idempotency_key();
        cache.ensure_namespace(R::CACHE_NAMESPACE);

        match cache.lookup(R::CACHE_NAMESPACE, key) {
            CacheLookup::Ambiguous(match_count) => {
                Failure::new(R::TARGET, key, R::TARGET.duplicate_reason())
                    .with_task_key(record.task_key())
                    .with_match_count(match_count)
                    .into()
            }
            CacheLookup::Hit(id) => {
                debug!(key, %id, "cached record found");
                ActionResult::Update(simulated(record, &id))
            }
            CacheLookup::Miss => {
                let id = RemoteId::Text(format!("{SIMULATED_ID_PREFIX}{key}"));
                cache.record(R::CACHE_NAMESPACE, key, id.clone());
                debug!(key, %id, "simulated create recorded");
                ActionResult::Create(simulated(record, &id))
            }
        }
    }

    /// Issue variant carrying the placeholder search query the live
    /// pipeline would run.
    pub fn reconcile_issue(
        &self,
        record: &IssueRecord,
        cache: &mut IdempotencyCache,
    ) -> ActionResult {
        let mut result = self.reconcile(record, cache);
        if let ActionResult::Create(applied) | ActionResult::Update(applied) = &mut result {
            applied.search_query = Some(record.search_query("<owner>", "<repo>"));
        }
        result
    }
}

fn simulated<R: SyncRecord>(record: &R, id: &RemoteId) -> Applied {
    let mut applied = Applied::new(
        R::TARGET,
        record.idempotency_key(),
        record.fields_json(),
        record.timestamp_utc(),
    )
    .with_task_key(record.task_key())
    .with_ignored_fields(record.ignored_fields());

    match R::TARGET {
        Target::GithubIssue => applied.matched_issue = Some(id.to_string()),
        Target::NotionKnowledge | Target::NotionTask => {
            applied.notion_page_id = Some(id.to_string());
        }
    }
    applied
}
