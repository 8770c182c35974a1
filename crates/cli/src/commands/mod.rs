//! Command implementations
//!
//! The three sync commands share one flow: resolve the retry policy, answer
//! `--check-config`, read and normalize the event, then reconcile either
//! against the dry-run state file or against the live API. Any step may stop
//! the run early with a result record of its own.

pub mod bootstrap;
pub mod issue;
pub mod knowledge;
pub mod task;

use std::fs;
use std::path::Path;

use serde_json::Value;
use taskbridge_core::Normalizer;
use taskbridge_domain::{
    ActionResult, Event, Failure, IdempotencyCache, Reason, RetryPolicy, SyncRecord, Target,
    TaskBridgeError,
};
use taskbridge_infra::StateStore;
use tracing::{debug, info};

use crate::output::{Report, EXIT_OK};
use crate::{RetryArgs, SyncArgs};

/// Why a command stopped before reaching its pipeline result.
#[derive(Debug)]
pub enum Halt {
    /// A record to print, such as a validation failure.
    Report(Report),
    /// An error outside the result-record contract.
    Fatal(TaskBridgeError),
}

impl From<Report> for Halt {
    fn from(report: Report) -> Self {
        Self::Report(report)
    }
}

impl From<TaskBridgeError> for Halt {
    fn from(err: TaskBridgeError) -> Self {
        Self::Fatal(err)
    }
}

/// Outcome of one step of a command.
pub type Step<T> = Result<T, Halt>;

fn halt(report: Result<Report, TaskBridgeError>) -> Halt {
    match report {
        Ok(report) => Halt::Report(report),
        Err(err) => Halt::Fatal(err),
    }
}

/// Collapse a command's steps into the report to print.
///
/// # Errors
/// Returns the fatal error a step stopped with.
pub fn finish(step: Step<Report>) -> anyhow::Result<Report> {
    match step {
        Ok(report) | Err(Halt::Report(report)) => Ok(report),
        Err(Halt::Fatal(err)) => Err(err.into()),
    }
}

/// Retry policy from the flags, falling back to `defaults` per value.
///
/// # Errors
/// The validation reason when a value is out of range.
pub(crate) fn merge_policy(defaults: RetryPolicy, args: &RetryArgs) -> Result<RetryPolicy, Reason> {
    RetryPolicy::new(
        args.max_retries.unwrap_or_else(|| i64::from(defaults.max_retries)),
        args.backoff_base_sec.unwrap_or(defaults.backoff_base_sec),
        args.backoff_factor.unwrap_or(defaults.backoff_factor),
    )
}

/// [`merge_policy`], rejecting invalid values with a usage report.
pub(crate) fn resolve_policy(
    target: Target,
    defaults: RetryPolicy,
    args: &RetryArgs,
) -> Step<RetryPolicy> {
    merge_policy(defaults, args)
        .map_err(|reason| halt(Report::usage(Failure::new(target, "", reason))))
}

/// Remove the dry-run state file when `--reset-state` was given.
pub(crate) fn reset_state(target: Target, args: &SyncArgs) -> Step<()> {
    if !args.reset_state {
        return Ok(());
    }
    StateStore::new(&args.state).reset().map_err(|err| {
        let failure =
            Failure::new(target, "", Reason::StateStoreError).with_detail(err.to_string());
        halt(Report::from_action(&failure.into()))
    })
}

/// `config_ok` with `body`, or `missing_live_config` naming what is unset.
pub(crate) fn check_config(target: Target, missing: Vec<String>, body: &Value) -> Step<Report> {
    if missing.is_empty() {
        return Ok(Report::new(body, EXIT_OK)?);
    }
    let failure = Failure::new(target, "", Reason::MissingLiveConfig).with_missing(missing);
    Ok(Report::from_action(&failure.into())?)
}

/// Parse the event file; anything unreadable is `invalid_event_json`.
pub(crate) fn read_event(target: Target, path: Option<&Path>) -> Step<Event> {
    let event = match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("{}: {err}", path.display()))
            .and_then(|text| serde_json::from_str::<Event>(&text).map_err(|err| err.to_string())),
        None => Err("no event file given".to_string()),
    };

    event.map_err(|detail| {
        let failure = Failure::new(target, "", Reason::InvalidEventJson).with_detail(detail);
        halt(Report::usage(failure))
    })
}

pub(crate) fn normalize<N: Normalizer>(normalizer: &N, event: &Event) -> Step<N::Record> {
    normalizer.normalize(event).map_err(|failure| halt(Report::from_action(&failure.into())))
}

/// Stop a live run whose settings are incomplete.
pub(crate) fn require_live<R: SyncRecord>(record: &R, missing: Vec<String>) -> Step<()> {
    if missing.is_empty() {
        return Ok(());
    }
    let failure = Failure::new(R::TARGET, record.idempotency_key(), Reason::MissingLiveConfig)
        .with_task_key(record.task_key())
        .with_missing(missing);
    Err(halt(Report::from_action(&failure.into())))
}

fn state_failure<R: SyncRecord>(record: &R, err: &TaskBridgeError) -> Halt {
    let failure = Failure::new(R::TARGET, record.idempotency_key(), Reason::StateStoreError)
        .with_task_key(record.task_key())
        .with_detail(err.to_string());
    halt(Report::from_action(&failure.into()))
}

/// Load `namespace` from the state file at `path`.
pub(crate) fn load_state<R: SyncRecord>(
    record: &R,
    path: &Path,
    namespace: &str,
) -> Step<(StateStore, IdempotencyCache)> {
    let store = StateStore::new(path);
    let cache = store.load(&[namespace]).map_err(|err| state_failure(record, &err))?;
    debug!(path = %path.display(), entries = cache.len(namespace), "state loaded");
    Ok((store, cache))
}

/// Persist `cache` unless the run ended in error, then report the result.
pub(crate) fn commit_state<R: SyncRecord>(
    record: &R,
    store: &StateStore,
    cache: &IdempotencyCache,
    result: &ActionResult,
) -> Step<Report> {
    if !result.is_error() {
        store.save(cache).map_err(|err| state_failure(record, &err))?;
    }
    info!(
        sync_target = %result.target(),
        operation = %result.operation(),
        key = result.idempotency_key(),
        "run finished"
    );
    Ok(Report::from_action(result)?)
}

/// Reconcile `record` against the dry-run state file.
pub(crate) fn dry_run<R, F>(record: &R, path: &Path, reconcile: F) -> Step<Report>
where
    R: SyncRecord,
    F: FnOnce(&R, &mut IdempotencyCache) -> ActionResult,
{
    let (store, mut cache) = load_state(record, path, R::CACHE_NAMESPACE)?;
    let result = reconcile(record, &mut cache);
    commit_state(record, &store, &cache, &result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_fall_back_to_settings() {
        let defaults = RetryPolicy { max_retries: 1, backoff_base_sec: 0.5, backoff_factor: 3.0 };
        let args = RetryArgs { backoff_factor: Some(1.5), ..RetryArgs::default() };

        let policy = resolve_policy(Target::NotionTask, defaults, &args).unwrap();

        assert_eq!(policy.max_retries, 1);
        assert!((policy.backoff_base_sec - 0.5).abs() < f64::EPSILON);
        assert!((policy.backoff_factor - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn non_positive_backoff_is_a_usage_error() {
        let args = RetryArgs { backoff_base_sec: Some(0.0), ..RetryArgs::default() };

        let Err(Halt::Report(report)) =
            resolve_policy(Target::NotionKnowledge, RetryPolicy::default(), &args)
        else {
            panic!("expected a usage report");
        };
        assert_eq!(report.code(), 2);
        assert_eq!(report.body()["reason"], "invalid_backoff_values");
        assert_eq!(report.body()["target"], "notion.knowledge");
    }

    #[test]
    fn missing_event_path_is_invalid_event_json() {
        let Err(Halt::Report(report)) = read_event(Target::GithubIssue, None) else {
            panic!("expected a usage report");
        };
        assert_eq!(report.body()["reason"], "invalid_event_json");
    }
}
