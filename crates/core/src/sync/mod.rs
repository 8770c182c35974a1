//! Sync pipelines
//!
//! Every pipeline runs the same sequence against its remote system:
//! (schema fetch ->) match -> decide -> write, producing exactly one
//! [`ActionResult`]. Failures at any step become `ActionResult::Error` values
//! carrying the idempotency key, a reason and the retry counters so far.

pub mod issue;
pub mod knowledge;
pub mod matcher;
pub mod offline;
pub mod ports;
pub mod reconciler;
pub mod task;

pub use issue::IssueSync;
pub use knowledge::KnowledgeSync;
pub use task::TaskStateSync;

use taskbridge_domain::{
    Applied, Failure, Reason, RetryPolicy, RetryReport, RetryStage, SyncRecord, Target,
};

use taskbridge_common::ErrorClassification;
use tracing::warn;

use self::ports::{RemoteError, RemoteFailure};

/// Bookkeeping for one live pipeline run.
#[derive(Debug, Clone)]
pub(crate) struct RunContext {
    target: Target,
    idempotency_key: String,
    task_key: Option<String>,
    pub(crate) retry: RetryReport,
}

impl RunContext {
    pub(crate) fn new<R: SyncRecord>(
        record: &R,
        policy: RetryPolicy,
        stages: &[RetryStage],
    ) -> Self {
        Self {
            target: R::TARGET,
            idempotency_key: record.idempotency_key().to_string(),
            task_key: record.task_key().map(str::to_string),
            retry: RetryReport::new(policy, stages),
        }
    }

    pub(crate) fn fail(&self, reason: Reason) -> Failure {
        Failure::new(self.target, self.idempotency_key.as_str(), reason)
            .with_task_key(self.task_key.as_deref())
            .with_retry(self.retry.clone())
    }

    /// Maps a remote failure to `http_reason` (status and parsed body
    /// attached) or `other_reason` (error text attached).
    pub(crate) fn remote_failure(
        &self,
        failure: RemoteFailure,
        http_reason: Reason,
        other_reason: Reason,
    ) -> Failure {
        warn!(
            severity = %failure.error.severity(),
            retries = failure.retries,
            error = %failure.error,
            "remote call failed"
        );
        match failure.error {
            RemoteError::Http { status, body } => {
                self.fail(http_reason).with_http_status(status).with_remote_error(body)
            }
            other => self.fail(other_reason).with_detail(other.to_string()),
        }
    }

    pub(crate) fn applied<R: SyncRecord>(&self, record: &R) -> Applied {
        let key = self.idempotency_key.as_str();
        Applied::new(self.target, key, record.fields_json(), record.timestamp_utc())
            .with_task_key(self.task_key.as_deref())
            .with_ignored_fields(record.ignored_fields())
            .with_retry(self.retry.clone())
    }
}
