//! Event normalizers
//!
//! Each pipeline has one normalizer turning a raw [`Event`] into its
//! normalized record or a [`Failure`] naming why the event was rejected.
//! Normalization is pure apart from the wall-clock sync timestamp, which
//! [`Normalizer::normalize_at`] takes explicitly.

mod identifiers;
mod issue;
mod knowledge;
mod task;
mod text;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use taskbridge_domain::constants::TIMESTAMP_FORMAT;
use taskbridge_domain::{Event, Failure, Reason, SyncRecord};

pub use identifiers::{is_canonical_link, task_label, validate_task_key};
pub use issue::IssueNormalizer;
pub use knowledge::KnowledgeNormalizer;
pub use task::TaskStateNormalizer;
pub use text::{collapse_whitespace, extract_text, pick_first_non_empty};

/// Converts inbound events into one normalized record kind.
pub trait Normalizer {
    type Record: SyncRecord;

    /// Normalizes `event` using `now` as the sync timestamp.
    fn normalize_at(&self, event: &Event, now: DateTime<Utc>) -> Result<Self::Record, Failure>;

    /// Normalizes `event` stamped with the current time.
    fn normalize(&self, event: &Event) -> Result<Self::Record, Failure> {
        self.normalize_at(event, Utc::now())
    }
}

/// Formats a sync timestamp as UTC with second precision.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Rejects events outside `allowed` and non-mapping payloads.
fn accepted_payload<'a, R: SyncRecord>(
    event: &'a Event,
    allowed: &[&str],
) -> Result<&'a Map<String, Value>, Failure> {
    if !allowed.contains(&event.event_type.as_str()) {
        return Err(Failure::new(R::TARGET, "", Reason::UnsupportedEventType));
    }
    event.payload_map().ok_or_else(|| Failure::new(R::TARGET, "", Reason::InvalidPayload))
}

fn non_empty(text: String) -> Option<String> {
    Some(text).filter(|text| !text.is_empty())
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
