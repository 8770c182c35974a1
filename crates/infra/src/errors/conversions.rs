//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use taskbridge_core::RemoteError;
use taskbridge_domain::TaskBridgeError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TaskBridgeError);

impl From<InfraError> for TaskBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TaskBridgeError> for InfraError {
    fn from(value: TaskBridgeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTaskBridgeError {
    fn into_taskbridge(self) -> TaskBridgeError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RemoteError */
/* -------------------------------------------------------------------------- */

/// Classify a transport failure so the retry policy can decide on it.
///
/// Timeouts and refused connections stay distinguishable because both are
/// retried; decode and builder failures are not.
pub fn remote_error(err: HttpError) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::Timeout(err.to_string());
    }

    if err.is_connect() {
        return RemoteError::Connect(err.to_string());
    }

    if let Some(status) = err.status() {
        return RemoteError::Http { status: status.as_u16(), body: None };
    }

    if err.is_decode() || err.is_body() {
        return RemoteError::Decode(err.to_string());
    }

    RemoteError::Transport(err.to_string())
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TaskBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoTaskBridgeError for HttpError {
    fn into_taskbridge(self) -> TaskBridgeError {
        if self.is_builder() {
            return TaskBridgeError::Config(format!("invalid HTTP client settings: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => TaskBridgeError::NotFound(message),
                400..=499 => TaskBridgeError::InvalidInput(message),
                _ => TaskBridgeError::Network(message),
            };
        }

        TaskBridgeError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_taskbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error / toml::de::Error → TaskBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoTaskBridgeError for JsonError {
    fn into_taskbridge(self) -> TaskBridgeError {
        TaskBridgeError::Serialization(format!(
            "invalid JSON at line {} column {}: {self}",
            self.line(),
            self.column()
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_taskbridge())
    }
}

impl IntoTaskBridgeError for TomlError {
    fn into_taskbridge(self) -> TaskBridgeError {
        TaskBridgeError::Serialization(format!("invalid TOML: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_taskbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → TaskBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoTaskBridgeError for IoError {
    fn into_taskbridge(self) -> TaskBridgeError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => TaskBridgeError::NotFound(self.to_string()),
            ErrorKind::PermissionDenied => {
                TaskBridgeError::Storage(format!("permission denied: {self}"))
            }
            _ => TaskBridgeError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_taskbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
