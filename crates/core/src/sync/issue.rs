//! Task -> code-host issue pipeline

use std::sync::Arc;

use taskbridge_domain::constants::ISSUE_NUMBER_BY_TASK_KEY;
use taskbridge_domain::{
    ActionResult, CacheLookup, IdempotencyCache, IssueRecord, Reason, RetryPolicy, RetryStage,
};
use tracing::{info, instrument, warn};

use super::matcher::{match_issues, tracked};
use super::ports::{IssueTracker, RemoteIssue};
use super::reconciler::{decide, Decision};
use super::RunContext;

/// Upserts one issue per task key.
///
/// The live-state cache maps task keys to issue numbers created by earlier
/// runs. It is consulted after the label lookup so that duplicate issues are
/// still rejected, and lets a run update its own issue before the search
/// index has caught up.
pub struct IssueSync {
    tracker: Arc<dyn IssueTracker>,
    policy: RetryPolicy,
}

impl IssueSync {
    pub fn new(tracker: Arc<dyn IssueTracker>, policy: RetryPolicy) -> Self {
        Self { tracker, policy }
    }

    /// Reconciles `record` with the tracker, recording created issues in
    /// `live_state`.
    #[instrument(skip_all, fields(task_key = %record.task_key))]
    pub async fn run(
        &self,
        record: &IssueRecord,
        live_state: &mut IdempotencyCache,
    ) -> ActionResult {
        let mut ctx = RunContext::new(
            record,
            self.policy,
            &[RetryStage::List, RetryStage::Search, RetryStage::Write],
        );
        let query = record.search_query(self.tracker.owner(), self.tracker.repo());

        let matches =
            match match_issues(self.tracker.as_ref(), &record.label, &query, &mut ctx.retry).await {
                Ok(matches) => matches,
                Err(failure) => {
                    return ctx
                        .remote_failure(
                            failure,
                            Reason::GithubSearchHttpError,
                            Reason::GithubSearchError,
                        )
                        .into();
                }
            };

        let decision = decide(matches);
        if let Decision::Reject { match_count } = decision {
            warn!(match_count, "multiple issues carry the task label");
            return ctx.fail(Reason::DuplicateIssueMatch).with_match_count(match_count).into();
        }

        live_state.ensure_namespace(ISSUE_NUMBER_BY_TASK_KEY);
        let mapped = match live_state.lookup(ISSUE_NUMBER_BY_TASK_KEY, &record.task_key) {
            CacheLookup::Hit(id) => id.as_number(),
            CacheLookup::Miss | CacheLookup::Ambiguous(_) => None,
        };

        if let Some(number) = mapped {
            let result = tracked(
                self.tracker.update_issue(number, &record.fields).await,
                RetryStage::Write,
                &mut ctx.retry,
            );
            match result {
                Ok(issue) => {
                    let issue = RemoteIssue { number, html_url: issue.html_url };
                    return self.applied(&ctx, record, &query, &issue, false);
                }
                Err(failure) if failure.error.is_not_found() => {
                    warn!(issue_number = number, "mapped issue no longer exists, dropping mapping");
                    live_state.invalidate(ISSUE_NUMBER_BY_TASK_KEY, &record.task_key);
                }
                Err(failure) => {
                    return ctx
                        .remote_failure(
                            failure,
                            Reason::GithubWriteHttpError,
                            Reason::GithubWriteError,
                        )
                        .into();
                }
            }
        }

        if matches!(&decision, Decision::Update(existing) if existing.number == 0) {
            warn!("matched issue carries no number");
            return ctx
                .fail(Reason::GithubWriteError)
                .with_detail("matched issue carries no number")
                .into();
        }

        let written = match decision {
            Decision::Update(existing) => tracked(
                self.tracker.update_issue(existing.number, &record.fields).await,
                RetryStage::Write,
                &mut ctx.retry,
            )
            .map(|issue| {
                (RemoteIssue { number: existing.number, html_url: issue.html_url }, false)
            }),
            _ => tracked(
                self.tracker.create_issue(&record.fields).await,
                RetryStage::Write,
                &mut ctx.retry,
            )
            .map(|issue| (issue, true)),
        };

        match written {
            Ok((issue, created)) => {
                if created && issue.number != 0 {
                    live_state.record(ISSUE_NUMBER_BY_TASK_KEY, &record.task_key, issue.number);
                }
                self.applied(&ctx, record, &query, &issue, created)
            }
            Err(failure) => ctx
                .remote_failure(failure, Reason::GithubWriteHttpError, Reason::GithubWriteError)
                .into(),
        }
    }

    fn applied(
        &self,
        ctx: &RunContext,
        record: &IssueRecord,
        query: &str,
        issue: &RemoteIssue,
        created: bool,
    ) -> ActionResult {
        let mut applied = ctx.applied(record);
        applied.search_query = Some(query.to_string());
        applied.matched_issue = Some(format!("ISSUE-{}", issue.number));
        applied.issue_number = Some(issue.number);
        applied.issue_url = Some(issue.html_url.clone().unwrap_or_default());

        info!(
            issue_number = issue.number,
            created,
            retries = ctx.retry.total(),
            "issue reconciled"
        );
        if created {
            ActionResult::Create(applied)
        } else {
            ActionResult::Update(applied)
        }
    }
}
