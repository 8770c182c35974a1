//! HTTP client used by the remote adapters

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
