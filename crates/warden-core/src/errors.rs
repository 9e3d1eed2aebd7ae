//! Unified error system for Warden
//!
//! A single error type shared by the domain types and by every external
//! collaborator (chain discovery, credential registry, stream index).

use serde::{Deserialize, Serialize};

/// Error returned by domain parsing and by every collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WardenError {
    /// A resource name, pattern, permission or hash failed to parse, or a
    /// fixture refers to something it never declares
    #[error("Invalid: {message}")]
    Invalid {
        /// What was rejected and why
        message: String,
    },

    /// A credential hash or stream id is unknown to the registry or index
    #[error("Not found: {message}")]
    NotFound {
        /// The missing key
        message: String,
    },

    /// The authorization network or credential registry could not be reached
    #[error("Network error: {message}")]
    Network {
        /// Transport failure detail
        message: String,
    },

    /// A discovery or lookup call exceeded its configured deadline
    #[error("Timed out after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Call that was abandoned
        operation: String,
        /// Deadline from the access config (0 when unknown)
        timeout_ms: u64,
    },

    /// A credential payload or fixture document could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Codec failure detail
        message: String,
    },

    /// The stream metadata store failed, or a fixture file could not be read
    #[error("Storage error: {message}")]
    Storage {
        /// Store failure detail
        message: String,
    },

    /// An I/O failure with no more specific mapping
    #[error("Internal error: {message}")]
    Internal {
        /// The I/O error text
        message: String,
    },
}

impl WardenError {
    /// Rejected input.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Unknown hash or stream.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Unreachable network or registry.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// `operation` ran past `timeout_ms`.
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Codec failure.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Metadata store or file failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Unmapped I/O failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result alias for domain and collaborator calls
pub type Result<T> = std::result::Result<T, WardenError>;

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::TimedOut => Self::timeout(err.to_string(), 0),
            _ => Self::internal(err.to_string()),
        }
    }
}
