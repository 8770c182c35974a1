//! Identifier format validation

use once_cell::sync::Lazy;
use regex::Regex;
use taskbridge_domain::constants::{
    TASK_KEY_PATTERN, TASK_LABEL_PATTERN, TASK_LABEL_PREFIX, URL_PATTERN,
};
use taskbridge_domain::Reason;

#[allow(clippy::expect_used)]
static TASK_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TASK_KEY_PATTERN).expect("task key pattern is valid"));

#[allow(clippy::expect_used)]
static TASK_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TASK_LABEL_PATTERN).expect("task label pattern is valid"));

#[allow(clippy::expect_used)]
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(URL_PATTERN).expect("url pattern is valid"));

/// Uppercases a raw task key and checks its format.
///
/// Empty input is `missing_task_key`; anything not shaped like
/// `TSK-YYYYMMDD-NNNN` is `invalid_task_key_format`.
pub fn validate_task_key(raw: &str) -> Result<String, (String, Reason)> {
    let key = raw.to_uppercase();
    if key.is_empty() {
        return Err((key, Reason::MissingTaskKey));
    }
    if !TASK_KEY_RE.is_match(&key) {
        return Err((key, Reason::InvalidTaskKeyFormat));
    }
    Ok(key)
}

/// Builds the issue label correlating an issue with its task.
pub fn task_label(task_key: &str) -> Result<String, Reason> {
    let label = format!("{TASK_LABEL_PREFIX}{task_key}");
    if TASK_LABEL_RE.is_match(&label) {
        Ok(label)
    } else {
        Err(Reason::InvalidTaskLabelFormat)
    }
}

pub fn is_canonical_link(url: &str) -> bool {
    URL_RE.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_keys_are_uppercased_before_matching() {
        assert_eq!(validate_task_key("tsk-20260101-0001").unwrap(), "TSK-20260101-0001");
    }

    #[test]
    fn malformed_keys_are_distinct_from_missing() {
        assert_eq!(validate_task_key("").unwrap_err().1, Reason::MissingTaskKey);
        assert_eq!(
            validate_task_key("tsk-bad").unwrap_err(),
            ("TSK-BAD".to_string(), Reason::InvalidTaskKeyFormat)
        );
        assert_eq!(
            validate_task_key("TSK-20260101-00011").unwrap_err().1,
            Reason::InvalidTaskKeyFormat
        );
    }

    #[test]
    fn labels_and_links() {
        assert_eq!(task_label("TSK-20260101-0001").unwrap(), "taskkey:TSK-20260101-0001");
        assert_eq!(task_label("TSK-1").unwrap_err(), Reason::InvalidTaskLabelFormat);
        assert!(is_canonical_link("https://github.com/o/r/pull/1"));
        assert!(is_canonical_link("http://example.test"));
        assert!(!is_canonical_link("ftp://example.test"));
        assert!(!is_canonical_link("github.com/o/r/pull/1"));
    }
}
