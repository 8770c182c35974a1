//! Configuration loading
//!
//! Builds [`taskbridge_domain::Settings`] from a `.env` file, environment
//! variables and an optional settings file.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths, CONFIG_PATH_VAR};
