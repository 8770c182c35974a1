//! Pull-request events normalized into knowledge pages

use chrono::{DateTime, Utc};
use taskbridge_domain::constants::{
    NO_SUMMARY, NO_TASK_KEY, PR_EVENTS, PR_NUMBER_KEYS, PR_OWNER_KEYS, PR_REPO_KEYS,
    PR_SUMMARY_KEYS, PR_TITLE_KEYS, PR_URL_KEYS, SOURCE_PATH_KEYS, TASK_KEY_KEYS, UNKNOWN_REPO,
    UNTITLED_PR,
};
use taskbridge_domain::{Event, Failure, KnowledgeFields, KnowledgeRecord, Reason, SyncRecord};

use super::identifiers::is_canonical_link;
use super::text::pick_first_non_empty;
use super::{accepted_payload, format_timestamp, non_empty, non_empty_or, Normalizer};

const RECORD_TYPE: &str = "RUN";
const DRAFT_STATUS: &str = "Draft";

/// Normalizer for pull-request lifecycle events.
///
/// The pull-request URL is both the idempotency key and the canonical link
/// written to the page. The task key is carried through as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeNormalizer;

impl Normalizer for KnowledgeNormalizer {
    type Record = KnowledgeRecord;

    fn normalize_at(&self, event: &Event, now: DateTime<Utc>) -> Result<KnowledgeRecord, Failure> {
        let payload = accepted_payload::<KnowledgeRecord>(event, &PR_EVENTS)?;

        let pr_url = pick_first_non_empty(payload, &PR_URL_KEYS);
        if pr_url.is_empty() {
            return Err(Failure::new(KnowledgeRecord::TARGET, "", Reason::MissingPrUrl));
        }
        if !is_canonical_link(&pr_url) {
            return Err(Failure::new(KnowledgeRecord::TARGET, "", Reason::InvalidPrUrl));
        }

        let repo = non_empty(pick_first_non_empty(payload, &PR_REPO_KEYS));
        let pr_number = non_empty(pick_first_non_empty(payload, &PR_NUMBER_KEYS));
        let task_key = non_empty(pick_first_non_empty(payload, &TASK_KEY_KEYS));
        let title = non_empty_or(pick_first_non_empty(payload, &PR_TITLE_KEYS), UNTITLED_PR);
        let summary = non_empty_or(pick_first_non_empty(payload, &PR_SUMMARY_KEYS), NO_SUMMARY);
        let timestamp_utc = format_timestamp(now);

        let fields = KnowledgeFields {
            title: match &pr_number {
                Some(number) => format!("PR #{number}: {title}"),
                None => format!("PR: {title}"),
            },
            knowledge_id: pr_number.as_ref().map(|n| format!("KNW-PR-{n}")).unwrap_or_default(),
            record_type: RECORD_TYPE.to_string(),
            canonical_link: pr_url.clone(),
            summary: format!(
                "PR Sync: {pr_url}\nRepo: {}\nTaskKey: {}\n\n{summary}",
                repo.as_deref().unwrap_or(UNKNOWN_REPO),
                task_key.as_deref().unwrap_or(NO_TASK_KEY),
            ),
            status: DRAFT_STATUS.to_string(),
            owner: pick_first_non_empty(payload, &PR_OWNER_KEYS),
            source_path: pick_first_non_empty(payload, &SOURCE_PATH_KEYS),
            last_sync: timestamp_utc.clone(),
        };

        Ok(KnowledgeRecord {
            event_type: event.event_type.clone(),
            canonical_link: pr_url,
            repo,
            pr_number,
            task_key,
            timestamp_utc,
            fields,
            ignored_fields: Vec::new(),
        })
    }
}
