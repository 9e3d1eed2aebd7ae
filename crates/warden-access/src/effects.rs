//! External collaborator traits
//!
//! The engine owns no sockets, registries or stores. Everything it needs
//! from the outside world comes through these three traits:
//!
//! - `ChainDiscoveryEffects`: candidate delegation chains from the
//!   authorization network
//! - `CredentialRegistryEffects`: credential payloads by content hash
//! - `StreamResourceEffects`: which resource produced an archived stream
//!
//! Every call may suspend on network I/O; the engine bounds each one with
//! a deadline from [`AccessConfig`](crate::AccessConfig).

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warden_core::{
    CandidateChain, CredentialHash, Permission, Principal, ResourcePattern, ResourceUri, Result,
    StreamId,
};

/// Candidate chains as yielded by discovery.
pub type CandidateStream = BoxStream<'static, CandidateChain>;

/// Registry verdict on a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityState {
    /// Authentic and currently in force
    Valid,
    /// Authentic but past its expiry
    Expired,
    /// Withdrawn by its issuer
    Revoked,
    /// Not authentic or malformed
    Invalid,
}

/// A registry record for one credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Encoded credential payload
    pub payload: Vec<u8>,

    /// Registry verdict
    pub state: ValidityState,
}

/// Chain discovery provided by the authorization network.
#[async_trait]
pub trait ChainDiscoveryEffects: Send + Sync {
    /// Enumerate chains that may grant `permission` on `pattern` to `principal`.
    ///
    /// An error means no candidates could be enumerated at all.
    async fn discover_chains(
        &self,
        pattern: &ResourcePattern,
        permission: Permission,
        principal: &Principal,
    ) -> Result<CandidateStream>;
}

/// Registry lookup for credentials known only by hash.
#[async_trait]
pub trait CredentialRegistryEffects: Send + Sync {
    /// Fetch the payload and verdict for `hash`.
    async fn resolve_credential(&self, hash: &CredentialHash) -> Result<RegistryEntry>;
}

/// Stream ownership lookup provided by the metadata store.
#[async_trait]
pub trait StreamResourceEffects: Send + Sync {
    /// The resource that produced `stream`.
    async fn resource_for_stream(&self, stream: StreamId) -> Result<ResourceUri>;
}

/// Blanket implementation for Arc<T> where T: ChainDiscoveryEffects
#[async_trait]
impl<T: ChainDiscoveryEffects + ?Sized> ChainDiscoveryEffects for Arc<T> {
    async fn discover_chains(
        &self,
        pattern: &ResourcePattern,
        permission: Permission,
        principal: &Principal,
    ) -> Result<CandidateStream> {
        (**self).discover_chains(pattern, permission, principal).await
    }
}

/// Blanket implementation for Arc<T> where T: CredentialRegistryEffects
#[async_trait]
impl<T: CredentialRegistryEffects + ?Sized> CredentialRegistryEffects for Arc<T> {
    async fn resolve_credential(&self, hash: &CredentialHash) -> Result<RegistryEntry> {
        (**self).resolve_credential(hash).await
    }
}

/// Blanket implementation for Arc<T> where T: StreamResourceEffects
#[async_trait]
impl<T: StreamResourceEffects + ?Sized> StreamResourceEffects for Arc<T> {
    async fn resource_for_stream(&self, stream: StreamId) -> Result<ResourceUri> {
        (**self).resource_for_stream(stream).await
    }
}
