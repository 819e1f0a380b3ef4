//! Global error types for the RoomThere client.
//!
//! Every accessor returns `RtResult<T>`. Backend failures are carried
//! verbatim in `BackendError` and never translated or retried.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience type alias for Results using RtError.
pub type RtResult<T> = Result<T, RtError>;

/// Postgres error code for a unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// A failure reported by the backend, as the backend reported it.
///
/// PostgREST bodies carry `code`, `message`, `details`, and `hint`; auth
/// endpoints use `error`/`error_description` or `msg`, which are folded into
/// the same shape when parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("backend error (status {status}): {message}")]
pub struct BackendError {
    /// HTTP status code of the failed response.
    pub status: u16,
    /// Backend error code (Postgres SQLSTATE or PostgREST `PGRSTxxx`).
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl BackendError {
    /// Create a backend error with only a status and message.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// Attach a backend error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether this failure is a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        self.code.as_deref() == Some(UNIQUE_VIOLATION)
    }
}

/// Unified error type covering all error categories in RoomThere.
#[derive(Error, Debug)]
pub enum RtError {
    // -- Identity --
    /// The operation needs a signed-in caller and there is none.
    #[error("not authenticated")]
    NotAuthenticated,

    // -- Backend --
    /// The backend rejected the operation.
    #[error(transparent)]
    Backend(#[from] BackendError),

    // -- Network errors --
    /// HTTP request failed before a response was received.
    #[error("http error: {0}")]
    Http(String),

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Realtime channel error.
    #[error("realtime error: {0}")]
    Realtime(String),

    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RtError {
    /// Whether this is the "no signed-in caller" condition.
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, RtError::NotAuthenticated)
    }

    /// The backend failure carried by this error, if any.
    pub fn backend(&self) -> Option<&BackendError> {
        match self {
            RtError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RtError {
    fn from(e: serde_json::Error) -> Self {
        RtError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RtError {
    fn from(e: toml::de::Error) -> Self {
        RtError::Config(e.to_string())
    }
}
