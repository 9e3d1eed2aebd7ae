//! # Warden Core - Domain Types for the Access-Window Engine
//!
//! **Purpose**: Define the credential, chain, record and interval types that the
//! access-window engine reasons about.
//!
//! # Architecture Constraints
//!
//! - YES Identifier newtypes, timestamps and permission sets
//! - YES Delegation credentials and chains (resolved and unresolved)
//! - YES Interval algebra (`Interval`, `IntervalSet`)
//! - YES Time-series records and metadata groups
//! - NO collaborator traits or async execution (that's `warden-access`)
//! - NO wire decoding of credential payloads (that's `warden-access::codec`)
//!
//! ## Core Concepts
//!
//! - **Credential**: a grant of a permission set on a resource pattern,
//!   valid from creation to expiry
//! - **Chain**: an ordered path of credentials ending at the requesting principal
//! - **Valid-Range Set**: the disjoint union of the windows during which a
//!   principal held a complete chain

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Delegation credentials and chains
pub mod credential;

/// Unified error type
pub mod errors;

/// Strongly typed identifiers
pub mod identifiers;

/// Closed time intervals
pub mod interval;

/// Disjoint interval sets (valid-range sets)
pub mod interval_set;

/// Permissions and permission sets
pub mod permission;

/// Time-series records and metadata groups
pub mod records;

/// Resource names and patterns
pub mod resource;

/// Timestamps
pub mod time;

pub use credential::{CandidateChain, Credential, CredentialSlot, ResolvedChain};
pub use errors::{Result, WardenError};
pub use identifiers::{CredentialHash, Principal, StreamId};
pub use interval::Interval;
pub use interval_set::{IntervalSet, ValidRangeSet};
pub use permission::{Permission, PermissionSet};
pub use records::{MetadataGroup, StreamScoped, TimeseriesRecord, Timestamped};
pub use resource::{ResourcePattern, ResourceUri};
pub use time::Timestamp;
