//! Wire types of the code-host REST API

use serde::Deserialize;
use serde_json::Value;
use taskbridge_core::RemoteIssue;

/// Issue as returned by the listing, search, create and update endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IssueResponse {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl IssueResponse {
    /// Lenient decode: an item that does not look like an issue still counts
    /// as a match, it just carries no number.
    pub fn from_item(item: Value) -> Self {
        serde_json::from_value(item).unwrap_or_default()
    }

    /// Decode a label listing. Anything but an array lists nothing.
    pub fn from_listing(listing: Value) -> Vec<Self> {
        match listing {
            Value::Array(items) => items.into_iter().map(Self::from_item).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<IssueResponse> for RemoteIssue {
    fn from(value: IssueResponse) -> Self {
        RemoteIssue { number: value.number, html_url: value.html_url }
    }
}

/// `GET /search/issues` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}
