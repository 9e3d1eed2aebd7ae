//! Access engine error taxonomy
//!
//! Only failures that would make the answer ambiguous are errors. A
//! principal with no usable chain gets an empty range set, not an error,
//! and a chain that fails to resolve is a [`ChainRejection`] that is
//! logged and absorbed.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::{StreamId, WardenError};

/// Errors surfaced to callers of the access engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Chain discovery could not be performed at all
    #[error("Chain discovery failed for {resource}: {source}")]
    DiscoveryFailed {
        /// Resource the ranges were requested for
        resource: String,
        /// Underlying collaborator error
        source: WardenError,
    },

    /// The stream-to-resource lookup failed while masking
    #[error("Resource lookup failed for stream {stream}: {source}")]
    ResourceLookupFailed {
        /// Stream whose resource could not be determined
        stream: StreamId,
        /// Underlying collaborator error
        source: WardenError,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },
}

impl AccessError {
    /// Create a discovery failure
    pub fn discovery_failed(resource: impl fmt::Display, source: WardenError) -> Self {
        Self::DiscoveryFailed {
            resource: resource.to_string(),
            source,
        }
    }

    /// Create a resource lookup failure
    pub fn resource_lookup_failed(stream: StreamId, source: WardenError) -> Self {
        Self::ResourceLookupFailed { stream, source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for access engine operations
pub type AccessResult<T> = std::result::Result<T, AccessError>;

/// Why a candidate chain was dropped during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainRejection {
    /// The registry lookup for a slot returned an error
    LookupFailed,
    /// The registry lookup for a slot exceeded its deadline
    LookupTimedOut,
    /// The registry reports a credential as revoked
    Revoked,
    /// The registry reports a credential as invalid
    Invalid,
    /// The registry reports a credential as expired and expired credentials are not accepted
    Expired,
    /// The registry payload could not be decoded into an access credential
    Undecodable,
    /// The registry payload does not hash to the requested slot hash
    HashMismatch,
    /// Hops are not linked issuer-to-receiver, or the chain does not end at the requester
    BrokenLinkage,
    /// A hop does not grant the requested permission on the requested resource
    ScopeMismatch,
    /// A slot was still unresolved after resolution
    Incomplete,
    /// Discovery produced a chain with no hops
    Empty,
}

impl ChainRejection {
    /// Stable label for logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ChainRejection::LookupFailed => "lookup_failed",
            ChainRejection::LookupTimedOut => "lookup_timed_out",
            ChainRejection::Revoked => "revoked",
            ChainRejection::Invalid => "invalid",
            ChainRejection::Expired => "expired",
            ChainRejection::Undecodable => "undecodable",
            ChainRejection::HashMismatch => "hash_mismatch",
            ChainRejection::BrokenLinkage => "broken_linkage",
            ChainRejection::ScopeMismatch => "scope_mismatch",
            ChainRejection::Incomplete => "incomplete",
            ChainRejection::Empty => "empty",
        }
    }
}

impl fmt::Display for ChainRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
