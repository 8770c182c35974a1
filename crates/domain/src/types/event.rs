//! Inbound webhook-style events

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An event delivered by an upstream webhook receiver.
///
/// The envelope is deserialized leniently: a missing or non-string
/// `event_type` becomes an empty string so the normalizer can reject it with a
/// structured reason instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, deserialize_with = "string_or_none", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self { event_type: event_type.into(), payload, source_id: None }
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// The payload as a mapping, if it is one.
    pub fn payload_map(&self) -> Option<&Map<String, Value>> {
        self.payload.as_object()
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_or_none(deserializer)?.unwrap_or_default())
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        _ => None,
    })
}
