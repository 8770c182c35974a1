//! # TaskBridge Core
//!
//! Normalization and reconciliation logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Event normalizers and the recursive text extractor
//! - Remote schema resolution
//! - Port interfaces (traits) for the issue tracker and page databases
//! - The matcher, the create/update reconciler and the three sync pipelines
//! - The offline reconciler backed by the idempotency cache
//!
//! ## Architecture Principles
//! - Only depends on `taskbridge-domain` and `taskbridge-common`
//! - No HTTP, file system or environment access
//! - All remote systems reached through traits
//! - Pipeline outcomes are values (`ActionResult`), never panics or `Err`

pub mod normalize;
pub mod schema;
pub mod sync;

pub use normalize::{
    extract_text, pick_first_non_empty, IssueNormalizer, KnowledgeNormalizer, Normalizer,
    TaskStateNormalizer,
};
pub use schema::{KnowledgeProperties, ResolvedProperty, TaskProperties};
pub use sync::offline::OfflineReconciler;
pub use sync::ports::{
    is_retryable, Attempted, FilterCondition, IssueTracker, PageDatabase, PageFilter,
    PageProperties, PropertyValue, RemoteError, RemoteFailure, RemoteIssue, RemotePage,
    RemoteResult,
};
pub use sync::reconciler::{decide, Decision};
pub use sync::{IssueSync, KnowledgeSync, TaskStateSync};
