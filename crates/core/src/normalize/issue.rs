//! Task-tracker task events normalized into code-host issues

use chrono::{DateTime, Utc};
use taskbridge_domain::constants::{
    DRAFT_STATUS_LABEL, IGNORED_ISSUE_FIELDS, NO_SUMMARY, TASK_EVENTS, TASK_KEY_KEYS,
    TASK_SUMMARY_KEYS, TASK_TITLE_KEYS, UNKNOWN_SOURCE, UNTITLED_TASK,
};
use taskbridge_domain::{Event, Failure, IssueFields, IssueRecord, SyncRecord};

use super::identifiers::{task_label, validate_task_key};
use super::text::{collapse_whitespace, pick_first_non_empty};
use super::{accepted_payload, format_timestamp, non_empty_or, Normalizer};

/// Normalizer for `notion.task.created` / `notion.task.updated` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueNormalizer;

impl Normalizer for IssueNormalizer {
    type Record = IssueRecord;

    fn normalize_at(&self, event: &Event, now: DateTime<Utc>) -> Result<IssueRecord, Failure> {
        let payload = accepted_payload::<IssueRecord>(event, &TASK_EVENTS)?;

        let task_key = validate_task_key(&pick_first_non_empty(payload, &TASK_KEY_KEYS))
            .map_err(|(key, reason)| {
                let task_key = (!key.is_empty()).then_some(key.as_str());
                Failure::new(IssueRecord::TARGET, key.as_str(), reason).with_task_key(task_key)
            })?;
        let label = task_label(&task_key).map_err(|reason| {
            Failure::new(IssueRecord::TARGET, task_key.as_str(), reason)
                .with_task_key(Some(&task_key))
        })?;

        let title = non_empty_or(pick_first_non_empty(payload, &TASK_TITLE_KEYS), UNTITLED_TASK);
        let summary = non_empty_or(pick_first_non_empty(payload, &TASK_SUMMARY_KEYS), NO_SUMMARY);
        let source_id = event
            .source_id
            .as_deref()
            .map(collapse_whitespace)
            .filter(|text| !text.is_empty());
        let timestamp_utc = format_timestamp(now);

        let fields = IssueFields {
            title: format!("[{task_key}] {title}"),
            body: issue_body(&task_key, source_id.as_deref(), &timestamp_utc, &summary),
            labels: vec![label.clone(), DRAFT_STATUS_LABEL.to_string()],
        };

        Ok(IssueRecord {
            event_type: event.event_type.clone(),
            task_key,
            label,
            source_id,
            timestamp_utc,
            fields,
            ignored_fields: IGNORED_ISSUE_FIELDS.iter().map(ToString::to_string).collect(),
        })
    }
}

fn issue_body(task_key: &str, source_id: Option<&str>, synced_at: &str, summary: &str) -> String {
    format!(
        "TaskKey: {task_key}\nSourceId: {}\nSyncedAtUTC: {synced_at}\n\nSummary:\n{summary}",
        source_id.unwrap_or(UNKNOWN_SOURCE)
    )
}
