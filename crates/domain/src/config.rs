//! Settings structures
//!
//! Values consumed by the pipelines but owned by the caller: credentials,
//! database identifiers, API base overrides and the retry policy. Loading
//! them from the environment or a file lives in the infrastructure crate.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GITHUB_API_BASE, DEFAULT_KNOWLEDGE_LINK_PROPERTY, DEFAULT_NOTION_API_BASE,
};
use crate::impl_domain_status_conversions;
use crate::types::RetryPolicy;

/// How a run reaches its target system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Reconcile against the local idempotency cache only.
    #[default]
    DryRun,
    /// Reconcile against the remote API.
    Live,
}

impl_domain_status_conversions!(SyncMode {
    DryRun => "dry-run",
    Live => "live",
});

/// Code-host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    #[serde(skip_serializing)]
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub api_base: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            owner: String::new(),
            repo: String::new(),
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
        }
    }
}

impl GithubSettings {
    /// Environment variable names of required settings that are empty.
    pub fn missing(&self) -> Vec<String> {
        [("GITHUB_TOKEN", &self.token), ("GITHUB_OWNER", &self.owner), ("GITHUB_REPO", &self.repo)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

/// Knowledge/task tracker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    #[serde(skip_serializing)]
    pub token: String,
    pub knowledge_db_id: String,
    pub tasks_db_id: String,
    pub api_base: String,
    /// Preferred name of the knowledge database's link property.
    pub knowledge_link_property: String,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            knowledge_db_id: String::new(),
            tasks_db_id: String::new(),
            api_base: DEFAULT_NOTION_API_BASE.to_string(),
            knowledge_link_property: DEFAULT_KNOWLEDGE_LINK_PROPERTY.to_string(),
        }
    }
}

impl NotionSettings {
    fn missing_of(&self, database: (&str, &String)) -> Vec<String> {
        [("NOTION_TOKEN", &self.token), database]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn missing_for_knowledge(&self) -> Vec<String> {
        self.missing_of(("NOTION_KNOWLEDGE_DB_ID", &self.knowledge_db_id))
    }

    pub fn missing_for_tasks(&self) -> Vec<String> {
        self.missing_of(("NOTION_TASKS_DB_ID", &self.tasks_db_id))
    }
}

/// Complete settings for a TaskBridge process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github: GithubSettings,
    pub notion: NotionSettings,
    pub retry: RetryPolicy,
}
