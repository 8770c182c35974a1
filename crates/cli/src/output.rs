//! Result records printed on stdout and the exit codes they map to.

use std::process::ExitCode;

use serde::Serialize;
use serde_json::{Map, Value};
use taskbridge_domain::{ActionResult, Failure, TaskBridgeError};

/// Exit code of create, update and `config_ok` results.
pub const EXIT_OK: u8 = 0;
/// Exit code of error results.
pub const EXIT_ERROR: u8 = 1;
/// Exit code of invalid invocations: bad retry policy or event file.
pub const EXIT_USAGE: u8 = 2;

/// One JSON record and the process exit code that goes with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    body: Value,
    code: u8,
}

impl Report {
    /// Wrap any serializable record.
    ///
    /// # Errors
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn new(body: &impl Serialize, code: u8) -> Result<Self, TaskBridgeError> {
        let body = serde_json::to_value(body)
            .map_err(|err| TaskBridgeError::Serialization(err.to_string()))?;
        Ok(Self { body: sort_keys(body), code })
    }

    /// Report for a pipeline result: exit 1 on error, 0 otherwise.
    ///
    /// # Errors
    /// Returns an error if the result cannot be represented as JSON.
    pub fn from_action(result: &ActionResult) -> Result<Self, TaskBridgeError> {
        Self::new(result, if result.is_error() { EXIT_ERROR } else { EXIT_OK })
    }

    /// Report for an invocation rejected before any work started.
    ///
    /// # Errors
    /// Returns an error if the failure cannot be represented as JSON.
    pub fn usage(failure: Failure) -> Result<Self, TaskBridgeError> {
        Self::new(&ActionResult::from(failure), EXIT_USAGE)
    }

    pub const fn body(&self) -> &Value {
        &self.body
    }

    pub const fn code(&self) -> u8 {
        self.code
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code)
    }

    /// Pretty-printed JSON with keys in lexicographic order.
    pub fn render(&self) -> String {
        // Rendering a `Value` cannot fail
        serde_json::to_string_pretty(&self.body).unwrap_or_default()
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

/// Rebuild every object with its keys sorted, whatever map ordering
/// `serde_json` was compiled with.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> =
                entries.into_iter().map(|(key, value)| (key, sort_keys(value))).collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use taskbridge_domain::{Reason, Target};

    use super::*;

    #[test]
    fn keys_are_sorted_at_every_depth() {
        let sorted = sort_keys(json!({"b": {"z": 1, "a": [{"y": 0, "x": 0}]}, "a": null}));
        assert_eq!(
            serde_json::to_string(&sorted).unwrap(),
            r#"{"a":null,"b":{"a":[{"x":0,"y":0}],"z":1}}"#
        );
    }

    #[test]
    fn error_results_exit_with_one() {
        let failure =
            Failure::new(Target::NotionTask, "TSK-20260101-0001", Reason::DuplicateTaskMatch);
        let result = ActionResult::from(failure);
        let report = Report::from_action(&result).unwrap();

        assert_eq!(report.code(), EXIT_ERROR);
        assert_eq!(report.body()["operation"], "error");
        assert_eq!(report.body()["reason"], "duplicate_task_match");
    }

    #[test]
    fn usage_failures_exit_with_two() {
        let report = Report::usage(Failure::new(Target::GithubIssue, "", Reason::InvalidMaxRetries))
            .unwrap();

        assert_eq!(report.code(), EXIT_USAGE);
        assert_eq!(report.body()["reason"], "invalid_max_retries");
        assert!(report.render().starts_with("{\n  \""));
    }
}
