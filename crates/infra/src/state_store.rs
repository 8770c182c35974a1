//! JSON state files backing the idempotency cache
//!
//! Dry-run runs keep their simulated identifiers here, and live issue runs
//! keep the task key → issue number mapping. The file is a pretty-printed
//! JSON object with sorted keys so that it diffs cleanly.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use taskbridge_domain::{IdempotencyCache, Result, TaskBridgeError};
use tracing::{debug, info};

use crate::errors::InfraError;

/// A state file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache, making sure `namespaces` exist.
    ///
    /// A missing file is an empty cache. Entries of the wrong shape are
    /// dropped rather than failing the run.
    ///
    /// # Errors
    /// `TaskBridgeError::Storage` when the file cannot be read and
    /// `TaskBridgeError::Serialization` when it is not JSON.
    pub fn load(&self, namespaces: &[&str]) -> Result<IdempotencyCache> {
        let mut cache = if self.path.exists() {
            let text = fs::read_to_string(&self.path).map_err(storage_error)?;
            let value: Value = serde_json::from_str(&text).map_err(|err| {
                let infra: InfraError = err.into();
                TaskBridgeError::from(infra)
            })?;
            IdempotencyCache::from_value(&value)
        } else {
            debug!(path = %self.path.display(), "state file absent, starting empty");
            IdempotencyCache::new()
        };

        for namespace in namespaces {
            cache.ensure_namespace(namespace);
        }
        Ok(cache)
    }

    /// Write the cache, creating parent directories as needed.
    ///
    /// # Errors
    /// `TaskBridgeError::Storage` when the file cannot be written.
    pub fn save(&self, cache: &IdempotencyCache) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }

        let mut text = serde_json::to_string_pretty(cache).map_err(|err| {
            let infra: InfraError = err.into();
            TaskBridgeError::from(infra)
        })?;
        text.push('\n');

        fs::write(&self.path, text).map_err(storage_error)?;
        debug!(path = %self.path.display(), "state file saved");
        Ok(())
    }

    /// Remove the file. Removing an absent file succeeds.
    ///
    /// # Errors
    /// `TaskBridgeError::Storage` when the file exists but cannot be removed.
    pub fn reset(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::remove_file(&self.path).map_err(storage_error)?;
        info!(path = %self.path.display(), "state file reset");
        Ok(())
    }
}

fn storage_error(err: std::io::Error) -> TaskBridgeError {
    let infra: InfraError = err.into();
    TaskBridgeError::from(infra)
}
