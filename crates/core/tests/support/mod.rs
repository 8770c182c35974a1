//! Shared test helpers for `taskbridge-core` integration tests.
//!
//! In-memory implementations of the remote ports with scriptable failures
//! and retry counts, so pipeline tests can focus on behaviour instead of
//! transport.

#![allow(dead_code)]

pub mod remotes;

pub use remotes::{Call, InMemoryDatabase, InMemoryTracker, Scripted};
