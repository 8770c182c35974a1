//! Domain data types

pub mod cache;
pub mod event;
pub mod matching;
pub mod record;
pub mod result;
pub mod retry;
pub mod schema;

pub use cache::{CacheEntry, CacheLookup, IdempotencyCache, RemoteId};
pub use event::Event;
pub use matching::MatchResult;
pub use record::{
    ExecutionState, IssueFields, IssueRecord, KnowledgeFields, KnowledgeRecord, SyncRecord,
    TaskFields, TaskRecord,
};
pub use result::{
    ActionResult, Applied, Diagnostics, Failure, Operation, Reason, RetryReport, RetryStage,
    Target,
};
pub use retry::RetryPolicy;
pub use schema::{DatabaseSchema, PropertyKind, SchemaProperty};
