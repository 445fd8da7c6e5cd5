//! The error type shared by the confab crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed errors for the orchestration core and its adapters.
///
/// The `Display` output is also the user-facing form: the orchestrator puts
/// it verbatim into session notices and inline error messages.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfabError {
    /// Lookup failure for a named entity.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// A call into the agent backend failed.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Filesystem operation failure.
    #[error("IO error: {message}")]
    Io { message: String },

    /// Encode or decode failure for persisted data.
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON" or "TOML"
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invariant violation; not expected during normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConfabError {
    /// Builds a `NotFound` error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Builds a `Backend` error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            message: msg.into(),
        }
    }

    /// Builds an `Io` error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io {
            message: msg.into(),
        }
    }

    /// Builds a `Config` error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Builds an `Internal` error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for `Backend`.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Returns true for `Io`.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true for `Serialization`.
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Returns true for `Config`.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for ConfabError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", e, e.kind()),
        }
    }
}

impl From<serde_json::Error> for ConfabError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: e.to_string(),
        }
    }
}

/// Plain strings become `Internal` errors.
impl From<String> for ConfabError {
    fn from(message: String) -> Self {
        Self::Internal(message)
    }
}

/// A type alias for `Result<T, ConfabError>`.
pub type Result<T> = std::result::Result<T, ConfabError>;
