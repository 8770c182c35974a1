//! Pull-request and CI events normalized into task execution states

use chrono::{DateTime, Utc};
use taskbridge_domain::constants::{EVENT_CI_FAILED, EVENT_PR_MERGED, TASK_KEY_KEYS};
use taskbridge_domain::{Event, ExecutionState, Failure, SyncRecord, TaskFields, TaskRecord};

use super::identifiers::validate_task_key;
use super::text::pick_first_non_empty;
use super::{accepted_payload, format_timestamp, Normalizer};

/// Normalizer mapping `github.pr.merged` to `Merged` and `github.ci.failed`
/// to `CI Failed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStateNormalizer;

impl Normalizer for TaskStateNormalizer {
    type Record = TaskRecord;

    fn normalize_at(&self, event: &Event, now: DateTime<Utc>) -> Result<TaskRecord, Failure> {
        let payload = accepted_payload::<TaskRecord>(event, &[EVENT_PR_MERGED, EVENT_CI_FAILED])?;

        let task_key = validate_task_key(&pick_first_non_empty(payload, &TASK_KEY_KEYS))
            .map_err(|(key, reason)| {
                let task_key = (!key.is_empty()).then_some(key.as_str());
                Failure::new(TaskRecord::TARGET, key.as_str(), reason).with_task_key(task_key)
            })?;

        let execution_state = if event.event_type == EVENT_PR_MERGED {
            ExecutionState::Merged
        } else {
            ExecutionState::CiFailed
        };
        let timestamp_utc = format_timestamp(now);

        Ok(TaskRecord {
            event_type: event.event_type.clone(),
            task_key,
            fields: TaskFields { execution_state, last_sync: timestamp_utc.clone() },
            timestamp_utc,
            ignored_fields: Vec::new(),
        })
    }
}
