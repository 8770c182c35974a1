//! Remote matcher
//!
//! Locates remote records correlated with an idempotency key. Retries
//! consumed by every call, including failed ones, are added to the run's
//! [`RetryReport`].

use taskbridge_domain::{DatabaseSchema, MatchResult, RetryReport, RetryStage};
use tracing::debug;

use super::ports::{IssueTracker, PageDatabase, PageFilter, RemoteFailure, RemoteIssue, RemotePage};

/// Finds issues carrying `label`.
///
/// The label listing is the primary index; when it comes back empty the
/// full-text `query` is searched instead, which covers listings that lag
/// behind label changes.
pub async fn match_issues(
    tracker: &dyn IssueTracker,
    label: &str,
    query: &str,
    retry: &mut RetryReport,
) -> Result<MatchResult<RemoteIssue>, RemoteFailure> {
    let listed = tracked(tracker.list_by_label(label).await, RetryStage::List, retry)?;
    if !listed.is_empty() {
        return Ok(MatchResult::from_candidates(listed));
    }

    debug!(label, query, "label listing empty, falling back to search");
    let found = tracked(tracker.search(query).await, RetryStage::Search, retry)?;
    Ok(MatchResult::from_candidates(found))
}

/// Runs a page query and classifies the result set.
pub async fn match_pages(
    database: &dyn PageDatabase,
    filter: &PageFilter,
    retry: &mut RetryReport,
) -> Result<MatchResult<RemotePage>, RemoteFailure> {
    let pages = tracked(database.query(filter).await, RetryStage::Query, retry)?;
    Ok(MatchResult::from_candidates(pages))
}

/// Fetches the database schema; `Ok(None)` when it carries no property
/// mapping.
pub async fn fetch_schema(
    database: &dyn PageDatabase,
    retry: &mut RetryReport,
) -> Result<Option<DatabaseSchema>, RemoteFailure> {
    tracked(database.retrieve_schema().await, RetryStage::Schema, retry)
}

/// Records the retries of one call under `stage` and unwraps its value.
pub(crate) fn tracked<T>(
    result: super::ports::RemoteResult<T>,
    stage: RetryStage,
    retry: &mut RetryReport,
) -> Result<T, RemoteFailure> {
    match result {
        Ok(attempted) => {
            retry.record(stage, attempted.retries);
            Ok(attempted.value)
        }
        Err(failure) => {
            retry.record(stage, failure.retries);
            Err(failure)
        }
    }
}
