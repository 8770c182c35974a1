//! Recursive text extraction over loosely-shaped payload values
//!
//! Upstream payloads carry text as plain scalars, lists of fragments or
//! rich-text-like mappings. [`extract_text`] flattens any of these into a
//! single string with collapsed whitespace.
//!
//! Mapping precedence: `plain_text`, `name`, `text.content`, the `title`
//! and `rich_text` fragment lists (first non-empty wins), then `content`.

use serde_json::{Map, Value};

/// Joins whitespace-separated words with single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flattens a payload value into one collapsed-whitespace string.
///
/// Returns an empty string for `null` and for mappings carrying none of the
/// known text keys.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taskbridge_core::extract_text;
///
/// let value = json!([{"plain_text": "Fix "}, {"text": {"content": " login  bug"}}]);
/// assert_eq!(extract_text(&value), "Fix login bug");
/// ```
pub fn extract_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => collapse_whitespace(text),
        Value::Bool(flag) => if *flag { "True" } else { "False" }.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => join_fragments(items),
        Value::Object(map) => text_from_mapping(map),
    }
}

/// Returns the first candidate key whose value extracts to non-empty text.
pub fn pick_first_non_empty(payload: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .map(extract_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn join_fragments(items: &[Value]) -> String {
    let parts: Vec<String> =
        items.iter().map(extract_text).filter(|part| !part.is_empty()).collect();
    collapse_whitespace(&parts.join(" "))
}

fn text_from_mapping(map: &Map<String, Value>) -> String {
    if let Some(Value::String(plain)) = map.get("plain_text") {
        return collapse_whitespace(plain);
    }
    if let Some(Value::String(name)) = map.get("name") {
        return collapse_whitespace(name);
    }
    if let Some(Value::String(content)) = map.get("text").and_then(|text| text.get("content")) {
        return collapse_whitespace(content);
    }
    for key in ["title", "rich_text"] {
        if let Some(Value::Array(fragments)) = map.get(key) {
            let merged = join_fragments(fragments);
            if !merged.is_empty() {
                return merged;
            }
        }
    }
    match map.get("content") {
        Some(Value::String(content)) => collapse_whitespace(content),
        _ => String::new(),
    }
}
