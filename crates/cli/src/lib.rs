//! # taskbridge-cli
//!
//! Command-line interface for the TaskBridge sync pipelines.
//!
//! ## Commands
//!
//! - `taskbridge issue` - Task event -> code-host issue
//! - `taskbridge knowledge` - Pull-request event -> knowledge page
//! - `taskbridge task` - Merge/CI event -> task execution state
//! - `taskbridge bootstrap-schema` - Add missing database properties
//!
//! Every command prints one JSON result record on stdout. Logs go to stderr
//! and are filtered with `RUST_LOG` (default `warn`).
//!
//! ## Exit codes
//!
//! - `0` - create, update, `config_ok` or `ok`
//! - `1` - any error result
//! - `2` - invalid retry policy or unreadable event file

#![forbid(unsafe_code)]
// The result record is the program's output
#![allow(clippy::print_stdout)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use taskbridge_domain::SyncMode;

/// TaskBridge - idempotent task tracker / code host sync.
#[derive(Debug, Parser)]
#[command(name = "taskbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upsert the code-host issue for a task event.
    Issue(commands::issue::IssueArgs),
    /// Upsert the knowledge page for a pull-request event.
    Knowledge(commands::knowledge::KnowledgeArgs),
    /// Mirror a merge or CI failure into the task's execution state.
    Task(commands::task::TaskArgs),
    /// Add the properties the pipelines write to both databases.
    BootstrapSchema(commands::bootstrap::BootstrapArgs),
}

/// Where a run reconciles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Against the local state file only.
    #[default]
    DryRun,
    /// Against the remote API.
    Live,
}

impl From<Mode> for SyncMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::DryRun => Self::DryRun,
            Mode::Live => Self::Live,
        }
    }
}

/// Retry policy overrides. Flags win over their environment variables;
/// values set by neither come from the loaded settings.
#[derive(Debug, Clone, Default, Args)]
pub struct RetryArgs {
    /// Retries allowed per remote call after the first attempt.
    #[arg(long, env = "TASKBRIDGE_MAX_RETRIES", allow_negative_numbers = true)]
    pub max_retries: Option<i64>,

    /// Seconds slept after the first failed attempt.
    #[arg(long, env = "TASKBRIDGE_BACKOFF_BASE_SEC", allow_negative_numbers = true)]
    pub backoff_base_sec: Option<f64>,

    /// Multiplier applied to the delay after each further failure.
    #[arg(long, env = "TASKBRIDGE_BACKOFF_FACTOR", allow_negative_numbers = true)]
    pub backoff_factor: Option<f64>,
}

/// Flags shared by the three sync pipelines.
#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Input event JSON path.
    #[arg(long, required_unless_present = "check_config")]
    pub event: Option<PathBuf>,

    /// Reconciliation backend.
    #[arg(long, value_enum, default_value_t = Mode::DryRun)]
    pub mode: Mode,

    /// Dry-run state file (idempotency cache).
    #[arg(long, default_value = ".taskbridge/dry_run_state.json")]
    pub state: PathBuf,

    /// Remove the dry-run state file before processing.
    #[arg(long)]
    pub reset_state: bool,

    /// Validate live-mode configuration and exit.
    #[arg(long)]
    pub check_config: bool,

    /// API base URL override (for mocks and proxies).
    #[arg(long)]
    pub api_base: Option<String>,

    #[command(flatten)]
    pub retry: RetryArgs,
}
