//! TaskBridge CLI - the `taskbridge` binary.
//!
//! Prints one JSON result record per invocation and exits with the code the
//! record maps to.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskbridge_cli::{commands, Cli, Commands};

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout carries only the result record
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = taskbridge_infra::config::load().context("Failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    let report = runtime.block_on(async {
        match cli.command {
            Commands::Issue(args) => commands::issue::execute(args, settings).await,
            Commands::Knowledge(args) => commands::knowledge::execute(args, settings).await,
            Commands::Task(args) => commands::task::execute(args, settings).await,
            Commands::BootstrapSchema(args) => commands::bootstrap::execute(args, settings).await,
        }
    })?;

    report.print();
    Ok(report.exit_code())
}
