//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{remote_error, InfraError};
