//! Configuration loader
//!
//! Loads TaskBridge settings from a `.env` file, environment variables and
//! an optional settings file.
//!
//! ## Loading Strategy
//! 1. `.env` in the working directory is loaded into the process
//!    environment (existing variables win)
//! 2. A settings file is read when one is found, otherwise defaults apply
//! 3. Environment variables override whatever the file set
//!
//! ## Environment Variables
//! - `GITHUB_TOKEN`, `GITHUB_OWNER`, `GITHUB_REPO`: code-host credentials
//!   and target repository
//! - `NOTION_TOKEN`, `NOTION_KNOWLEDGE_DB_ID`, `NOTION_TASKS_DB_ID`:
//!   task-tracker credentials and databases
//! - `NOTION_KNOWLEDGE_LINK_PROPERTY`: preferred knowledge link property
//! - `TASKBRIDGE_GITHUB_API_BASE`, `TASKBRIDGE_NOTION_API_BASE`: API bases
//!
//! The retry variables (`TASKBRIDGE_MAX_RETRIES` and friends) are not read
//! here: the CLI binds them to its retry flags so that both are validated
//! the same way. The settings file supplies the policy they override.
//! - `TASKBRIDGE_CONFIG`: explicit settings file path
//!
//! ## File Locations
//! Without `TASKBRIDGE_CONFIG` the loader probes, in order:
//! 1. `./taskbridge.toml` or `./taskbridge.json` (current working directory)
//! 2. `./.taskbridge/config.toml` or `./.taskbridge/config.json`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use taskbridge_domain::{Result, Settings, TaskBridgeError};

use crate::errors::InfraError;

pub const CONFIG_PATH_VAR: &str = "TASKBRIDGE_CONFIG";

/// Load settings with the full layering strategy.
///
/// # Errors
/// Returns `TaskBridgeError::Config` if:
/// - `TASKBRIDGE_CONFIG` names a file that does not exist
/// - The settings file cannot be read or parsed
pub fn load() -> Result<Settings> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
    }

    let explicit = std::env::var(CONFIG_PATH_VAR).ok().filter(|value| !value.is_empty());
    let mut settings = match explicit.map(PathBuf::from).or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => Settings::default(),
    };

    apply_env(&mut settings);
    tracing::info!("Configuration loaded");
    Ok(settings)
}

/// Defaults overridden by environment variables only.
pub fn load_from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env(&mut settings);
    settings
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// extension (`.json` or `.toml`); missing keys take their defaults.
///
/// # Errors
/// Returns `TaskBridgeError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Settings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TaskBridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TaskBridgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TaskBridgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse settings from string content, detecting the format by extension.
///
/// # Errors
/// Returns `TaskBridgeError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Settings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let parsed = match extension {
        "toml" => toml::from_str(contents).map_err(InfraError::from),
        "json" => serde_json::from_str(contents).map_err(InfraError::from),
        _ => {
            return Err(TaskBridgeError::Config(format!(
                "Unsupported config format: {}",
                extension
            )))
        }
    };

    parsed.map_err(|InfraError(err)| TaskBridgeError::Config(err.to_string()))
}

/// Probe the standard settings file locations.
///
/// # Returns
/// The first file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = [
        "taskbridge.toml",
        "taskbridge.json",
        ".taskbridge/config.toml",
        ".taskbridge/config.json",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Overlay environment variables onto `settings`.
///
/// Empty variables are treated as unset.
fn apply_env(settings: &mut Settings) {
    let github = &mut settings.github;
    override_string(&mut github.token, "GITHUB_TOKEN");
    override_string(&mut github.owner, "GITHUB_OWNER");
    override_string(&mut github.repo, "GITHUB_REPO");
    override_string(&mut github.api_base, "TASKBRIDGE_GITHUB_API_BASE");

    let notion = &mut settings.notion;
    override_string(&mut notion.token, "NOTION_TOKEN");
    override_string(&mut notion.knowledge_db_id, "NOTION_KNOWLEDGE_DB_ID");
    override_string(&mut notion.tasks_db_id, "NOTION_TASKS_DB_ID");
    override_string(&mut notion.knowledge_link_property, "NOTION_KNOWLEDGE_LINK_PROPERTY");
    override_string(&mut notion.api_base, "TASKBRIDGE_NOTION_API_BASE");
}

/// Non-empty value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn override_string(target: &mut String, key: &str) {
    if let Some(value) = env_value(key) {
        *target = value;
    }
}
