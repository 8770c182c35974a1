//! Local idempotency cache
//!
//! A persisted map from idempotency key to previously created remote
//! identifiers, grouped in named namespaces. It backs the offline (dry-run)
//! reconciler and the issue pipeline's create-then-update mapping.
//!
//! The cache is an explicit value handed into each run; persisting it is the
//! caller's job and happens only after a run that did not end in error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A remote record identifier as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(u64),
    Text(String),
}

impl RemoteId {
    /// Empty strings and zero carry no identity.
    fn is_present(&self) -> bool {
        match self {
            Self::Number(number) => *number != 0,
            Self::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.parse().ok(),
        }
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for RemoteId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for RemoteId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Stored value for one idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheEntry {
    One(RemoteId),
    Many(Vec<RemoteId>),
}

/// Result of consulting the cache for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Miss,
    Hit(RemoteId),
    Ambiguous(usize),
}

/// Namespaced idempotency key → remote identifier map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyCache {
    #[serde(flatten)]
    namespaces: BTreeMap<String, BTreeMap<String, CacheEntry>>,
}

impl IdempotencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cache from a loosely-shaped JSON document.
    ///
    /// Anything that is not a mapping of mappings is dropped, so a damaged
    /// state file degrades to an empty cache rather than failing the run.
    pub fn from_value(value: &Value) -> Self {
        let mut cache = Self::new();
        let Some(namespaces) = value.as_object() else {
            return cache;
        };

        for (namespace, entries) in namespaces {
            let Some(entries) = entries.as_object() else {
                continue;
            };
            let parsed = entries
                .iter()
                .filter_map(|(key, entry)| {
                    serde_json::from_value::<CacheEntry>(entry.clone())
                        .ok()
                        .map(|entry| (key.clone(), entry))
                })
                .collect();
            cache.namespaces.insert(namespace.clone(), parsed);
        }
        cache
    }

    /// Make sure a namespace exists so it is written out even when empty.
    pub fn ensure_namespace(&mut self, namespace: &str) {
        self.namespaces.entry(namespace.to_string()).or_default();
    }

    pub fn lookup(&self, namespace: &str, key: &str) -> CacheLookup {
        let Some(entry) = self.namespaces.get(namespace).and_then(|entries| entries.get(key))
        else {
            return CacheLookup::Miss;
        };

        match entry {
            CacheEntry::Many(ids) if ids.len() >= 2 => CacheLookup::Ambiguous(ids.len()),
            CacheEntry::Many(ids) => match ids.first() {
                Some(id) if id.is_present() => CacheLookup::Hit(id.clone()),
                _ => CacheLookup::Miss,
            },
            CacheEntry::One(id) if id.is_present() => CacheLookup::Hit(id.clone()),
            CacheEntry::One(_) => CacheLookup::Miss,
        }
    }

    /// Remember the identifier created for `key`.
    pub fn record(&mut self, namespace: &str, key: &str, id: impl Into<RemoteId>) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), CacheEntry::One(id.into()));
    }

    /// Forget `key` in one namespace, returning what was stored.
    pub fn invalidate(&mut self, namespace: &str, key: &str) -> Option<CacheEntry> {
        self.namespaces.get_mut(namespace).and_then(|entries| entries.remove(key))
    }

    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces.get(namespace).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.values().all(BTreeMap::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const NS: &str = "issues_by_task_key";

    #[test]
    fn record_then_lookup_hits() {
        let mut cache = IdempotencyCache::new();
        assert_eq!(cache.lookup(NS, "TSK-20260101-0001"), CacheLookup::Miss);

        cache.record(NS, "TSK-20260101-0001", "SIM-TSK-20260101-0001");
        assert_eq!(
            cache.lookup(NS, "TSK-20260101-0001"),
            CacheLookup::Hit(RemoteId::from("SIM-TSK-20260101-0001"))
        );
    }

    #[test]
    fn list_entries_follow_cardinality() {
        let cache = IdempotencyCache::from_value(&json!({
            NS: {
                "A": ["ISSUE-1", "ISSUE-2"],
                "B": ["ISSUE-3"],
                "C": [],
                "D": "",
                "E": 0
            }
        }));

        assert_eq!(cache.lookup(NS, "A"), CacheLookup::Ambiguous(2));
        assert_eq!(cache.lookup(NS, "B"), CacheLookup::Hit(RemoteId::from("ISSUE-3")));
        assert_eq!(cache.lookup(NS, "C"), CacheLookup::Miss);
        assert_eq!(cache.lookup(NS, "D"), CacheLookup::Miss);
        assert_eq!(cache.lookup(NS, "E"), CacheLookup::Miss);
    }

    #[test]
    fn invalidate_only_touches_one_namespace() {
        let mut cache = IdempotencyCache::new();
        cache.record("issue_number_by_task_key", "K", 12_u64);
        cache.record(NS, "K", "SIM-K");

        assert!(cache.invalidate("issue_number_by_task_key", "K").is_some());
        assert_eq!(cache.lookup("issue_number_by_task_key", "K"), CacheLookup::Miss);
        assert_eq!(cache.lookup(NS, "K"), CacheLookup::Hit(RemoteId::from("SIM-K")));
    }

    #[test]
    fn malformed_documents_degrade_to_empty() {
        assert!(IdempotencyCache::from_value(&json!([1, 2])).is_empty());
        let cache = IdempotencyCache::from_value(&json!({NS: "oops", "other": {"k": {"x": 1}}}));
        assert!(cache.is_empty());
    }

    #[test]
    fn serializes_namespaces_at_top_level() {
        let mut cache = IdempotencyCache::new();
        cache.ensure_namespace(NS);
        cache.record("issue_number_by_task_key", "K", 7_u64);

        assert_eq!(
            serde_json::to_value(&cache).unwrap(),
            json!({NS: {}, "issue_number_by_task_key": {"K": 7}})
        );
        assert_eq!(
            cache.lookup("issue_number_by_task_key", "K"),
            CacheLookup::Hit(RemoteId::Number(7))
        );
    }
}
