//! # Warden Access - Access-Window Engine
//!
//! **Purpose**: Decide which slices of archived data a principal may see,
//! based on when it provably held a complete delegation chain.
//!
//! # Architecture Constraints
//!
//! - YES Chain resolution against discovery and the credential registry
//! - YES Valid-range construction from resolved chains
//! - YES Masking of time-series records and metadata groups
//! - YES In-memory and fixture-backed collaborators
//! - NO signature verification (the transport's job)
//! - NO caching of chains or ranges across requests
//! - NO global logging setup (components log under an injected span)
//!
//! ## Pipeline
//!
//! ```text
//! discover_chains -> ChainResolver -> WindowBuilder -> ValidRangeSet -> ResultMasker
//! ```
//!
//! Every request runs the whole pipeline. A principal with no usable chain
//! gets an empty range set and therefore sees nothing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Credential payload codec
pub mod codec;

/// Engine configuration
pub mod config;

/// Collaborator traits
pub mod effects;

/// Access-window facade
pub mod engine;

/// Error types
pub mod errors;

/// Collaborator implementations
pub mod handlers;

/// Result masking
pub mod masker;

/// Chain resolution
pub mod resolver;

/// Valid-range construction
pub mod window;

pub use config::AccessConfig;
pub use effects::{
    CandidateStream, ChainDiscoveryEffects, CredentialRegistryEffects, RegistryEntry,
    StreamResourceEffects, ValidityState,
};
pub use engine::AccessEngine;
pub use errors::{AccessError, AccessResult, ChainRejection};
pub use masker::ResultMasker;
pub use resolver::{ChainResolver, Resolution, ResolutionReport};
pub use window::WindowBuilder;
