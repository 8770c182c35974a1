//! Domain constants
//!
//! Centralized location for event names, identifier formats, candidate key
//! lists and remote API constants.

// Identifier formats
pub const TASK_KEY_PATTERN: &str = r"^TSK-[0-9]{8}-[0-9]{4}$";
pub const TASK_LABEL_PATTERN: &str = r"^taskkey:TSK-[0-9]{8}-[0-9]{4}$";
pub const URL_PATTERN: &str = r"^https?://";
pub const TASK_LABEL_PREFIX: &str = "taskkey:";
pub const DRAFT_STATUS_LABEL: &str = "status:draft";
pub const SIMULATED_ID_PREFIX: &str = "SIM-";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// Accepted inbound events
pub const TASK_EVENTS: [&str; 2] = ["notion.task.created", "notion.task.updated"];
pub const PR_EVENTS: [&str; 4] =
    ["github.pr.opened", "github.pr.synchronize", "github.pr.reopened", "github.pr.edited"];
pub const EVENT_PR_MERGED: &str = "github.pr.merged";
pub const EVENT_CI_FAILED: &str = "github.ci.failed";

// Payload key candidates, tried in order
pub const TASK_KEY_KEYS: [&str; 3] = ["task_key", "taskKey", "TaskKey"];
pub const TASK_TITLE_KEYS: [&str; 4] = ["title", "Title", "task_title", "name"];
pub const TASK_SUMMARY_KEYS: [&str; 4] = ["summary", "Summary", "description", "Description"];
pub const PR_URL_KEYS: [&str; 4] = ["pr_url", "prUrl", "url", "html_url"];
pub const PR_REPO_KEYS: [&str; 3] = ["repo", "repository", "repo_full_name"];
pub const PR_NUMBER_KEYS: [&str; 2] = ["pr_number", "number"];
pub const PR_TITLE_KEYS: [&str; 2] = ["title", "pr_title"];
pub const PR_SUMMARY_KEYS: [&str; 3] = ["summary", "body", "description"];
pub const PR_OWNER_KEYS: [&str; 2] = ["owner", "author"];
pub const SOURCE_PATH_KEYS: [&str; 2] = ["source_path", "sourcePath"];

// Placeholders
pub const UNTITLED_TASK: &str = "(untitled task)";
pub const UNTITLED_PR: &str = "(untitled pr)";
pub const NO_SUMMARY: &str = "(no summary)";
pub const UNKNOWN_SOURCE: &str = "(unknown)";
pub const UNKNOWN_REPO: &str = "(unknown repo)";
pub const NO_TASK_KEY: &str = "(none)";
pub const TITLE_FALLBACK_MARKER: &str = "(title_fallback)";

// Fields recorded but never written
pub const IGNORED_ISSUE_FIELDS: [&str; 3] = ["priority", "due", "owner"];

// Knowledge database property candidates
pub const DEFAULT_KNOWLEDGE_LINK_PROPERTY: &str = "GitHub Canonical Link";
pub const KNOWLEDGE_TITLE_PROPERTIES: [&str; 3] = ["Title", "Name", "名前"];
pub const KNOWLEDGE_LINK_PROPERTIES: [&str; 6] = [
    "GitHub Canonical Link",
    "GitHub PR Link",
    "GitHub Issue Link",
    "GitHub Link",
    "Canonical Link",
    "URL",
];
pub const KNOWLEDGE_SUMMARY_PROPERTIES: [&str; 4] = ["Summary", "要約", "Description", "説明"];

// Task database property candidates
pub const TASK_TITLE_PROPERTIES: [&str; 4] = ["Task Name", "名前", "Name", "Title"];
pub const TASK_ID_PROPERTIES: [&str; 5] =
    ["Task ID", "TaskKey", "Task Key", "タスクID", "タスク ID"];
pub const EXECUTION_STATE_PROPERTY: &str = "Execution State";
pub const LAST_SYNC_PROPERTY: &str = "Last Sync";

// Offline cache namespaces
pub const ISSUES_BY_TASK_KEY: &str = "issues_by_task_key";
pub const KNOWLEDGE_BY_LINK: &str = "knowledge_by_link";
pub const TASKS_BY_TASK_KEY: &str = "tasks_by_task_key";
pub const ISSUE_NUMBER_BY_TASK_KEY: &str = "issue_number_by_task_key";

// Remote API constants
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com";
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const USER_AGENT: &str = concat!("taskbridge/", env!("CARGO_PKG_VERSION"));
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const ISSUE_PAGE_SIZE: u32 = 100;
pub const QUERY_PAGE_SIZE: u32 = 5;
pub const TEXT_PROPERTY_LIMIT: usize = 1900;

// Transient HTTP statuses: timeout, too early, rate limit, 5xx gateway family
pub const RETRYABLE_HTTP_STATUSES: [u16; 7] = [408, 425, 429, 500, 502, 503, 504];

// Retry defaults
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE_SEC: f64 = 1.0;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
