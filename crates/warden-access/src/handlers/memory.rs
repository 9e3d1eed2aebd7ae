//! In-memory collaborators
//!
//! Process-local implementations of the effect traits. Each handler can be
//! told to fail or to stall so failure paths are reachable without a
//! network.

use async_trait::async_trait;
use futures::stream;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use warden_core::{
    CandidateChain, Credential, CredentialHash, Permission, Principal, ResourcePattern,
    ResourceUri, Result, StreamId, WardenError,
};

use crate::codec::{content_hash, encode_credential};
use crate::effects::{
    CandidateStream, ChainDiscoveryEffects, CredentialRegistryEffects, RegistryEntry,
    StreamResourceEffects, ValidityState,
};

async fn stall(latency: Option<Duration>) {
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

#[derive(Debug, Clone)]
struct ChainRoute {
    principal: Principal,
    pattern: ResourcePattern,
    chain: CandidateChain,
}

impl ChainRoute {
    fn serves(&self, requested: &ResourcePattern, principal: &Principal) -> bool {
        if &self.principal != principal {
            return false;
        }
        match ResourceUri::new(requested.as_str()) {
            Ok(resource) => self.pattern.matches(&resource),
            Err(_) => &self.pattern == requested,
        }
    }
}

/// Chain discovery over a fixed routing table.
///
/// A query returns every registered chain for the principal whose pattern
/// covers the requested resource, in registration order. Scope and linkage
/// are left to the resolver.
#[derive(Debug, Default)]
pub struct MemoryChainDiscovery {
    routes: RwLock<Vec<ChainRoute>>,
    failure: RwLock<Option<WardenError>>,
    latency: RwLock<Option<Duration>>,
}

impl MemoryChainDiscovery {
    /// Create an empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain delivering `pattern` to `principal`.
    pub fn add_chain(&self, principal: Principal, pattern: ResourcePattern, chain: CandidateChain) {
        self.routes.write().push(ChainRoute {
            principal,
            pattern,
            chain,
        });
    }

    /// Number of registered chains.
    pub fn chain_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Make every subsequent query fail with `error`.
    pub fn fail_with(&self, error: WardenError) {
        *self.failure.write() = Some(error);
    }

    /// Undo [`fail_with`](Self::fail_with).
    pub fn clear_failure(&self) {
        *self.failure.write() = None;
    }

    /// Delay every query by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = Some(latency);
    }
}

#[async_trait]
impl ChainDiscoveryEffects for MemoryChainDiscovery {
    async fn discover_chains(
        &self,
        pattern: &ResourcePattern,
        _permission: Permission,
        principal: &Principal,
    ) -> Result<CandidateStream> {
        let latency = *self.latency.read();
        stall(latency).await;

        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }

        let chains: Vec<CandidateChain> = self
            .routes
            .read()
            .iter()
            .filter(|route| route.serves(pattern, principal))
            .map(|route| route.chain.clone())
            .collect();
        Ok(Box::pin(stream::iter(chains)))
    }
}

/// Credential registry keyed by content hash.
#[derive(Debug, Default)]
pub struct MemoryCredentialRegistry {
    entries: RwLock<HashMap<CredentialHash, RegistryEntry>>,
    unreachable: RwLock<HashSet<CredentialHash>>,
    latency: RwLock<Option<Duration>>,
    lookups: AtomicUsize,
}

impl MemoryCredentialRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and store `credential`, returning the hash it resolves under.
    pub fn register(&self, credential: &Credential, state: ValidityState) -> Result<CredentialHash> {
        let (hash, payload) = encode_credential(credential)?;
        self.entries
            .write()
            .insert(hash, RegistryEntry { payload, state });
        Ok(hash)
    }

    /// Store a raw payload under its content hash.
    pub fn insert_raw(&self, payload: Vec<u8>, state: ValidityState) -> CredentialHash {
        let hash = content_hash(&payload);
        self.entries
            .write()
            .insert(hash, RegistryEntry { payload, state });
        hash
    }

    /// Store an entry under an arbitrary hash, even one it does not hash to.
    pub fn insert_entry(&self, hash: CredentialHash, entry: RegistryEntry) {
        self.entries.write().insert(hash, entry);
    }

    /// Change the verdict for a stored credential. Returns false if unknown.
    pub fn set_state(&self, hash: &CredentialHash, state: ValidityState) -> bool {
        match self.entries.write().get_mut(hash) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    /// Make lookups of `hash` fail with a network error.
    pub fn mark_unreachable(&self, hash: CredentialHash) {
        self.unreachable.write().insert(hash);
    }

    /// Delay every lookup by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = Some(latency);
    }

    /// Number of lookups served or attempted so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CredentialRegistryEffects for MemoryCredentialRegistry {
    async fn resolve_credential(&self, hash: &CredentialHash) -> Result<RegistryEntry> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let latency = *self.latency.read();
        stall(latency).await;

        if self.unreachable.read().contains(hash) {
            return Err(WardenError::network(format!(
                "Registry unreachable for {}",
                hash.short()
            )));
        }
        self.entries
            .read()
            .get(hash)
            .cloned()
            .ok_or_else(|| WardenError::not_found(format!("Unknown credential {hash}")))
    }
}

/// Stream-to-resource index.
#[derive(Debug, Default)]
pub struct MemoryStreamIndex {
    streams: RwLock<HashMap<StreamId, ResourceUri>>,
    unreachable: RwLock<HashSet<StreamId>>,
    lookups: AtomicUsize,
}

impl MemoryStreamIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `stream` was produced by `resource`.
    pub fn insert(&self, stream: StreamId, resource: ResourceUri) {
        self.streams.write().insert(stream, resource);
    }

    /// Make lookups of `stream` fail with a storage error.
    pub fn mark_unreachable(&self, stream: StreamId) {
        self.unreachable.write().insert(stream);
    }

    /// Number of lookups served or attempted so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StreamResourceEffects for MemoryStreamIndex {
    async fn resource_for_stream(&self, stream: StreamId) -> Result<ResourceUri> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if self.unreachable.read().contains(&stream) {
            return Err(WardenError::storage(format!(
                "Metadata store unavailable for stream {stream}"
            )));
        }
        self.streams
            .read()
            .get(&stream)
            .cloned()
            .ok_or_else(|| WardenError::not_found(format!("Unknown stream {stream}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use warden_core::{CredentialSlot, Timestamp};

    fn credential() -> Credential {
        Credential {
            issuer: Principal::new("root"),
            receiver: Principal::new("alice"),
            resource: "campus/*".parse().unwrap(),
            permissions: "C".parse().unwrap(),
            created_at: Timestamp::from_nanos(0),
            expires_at: Timestamp::from_nanos(10),
        }
    }

    #[tokio::test]
    async fn test_discovery_routes_by_principal_and_pattern() {
        let discovery = MemoryChainDiscovery::new();
        let chain: CandidateChain = [CredentialSlot::resolved(credential())].into_iter().collect();
        discovery.add_chain(Principal::new("alice"), "campus/*".parse().unwrap(), chain.clone());
        discovery.add_chain(Principal::new("bob"), "campus/*".parse().unwrap(), chain);

        let requested: ResourcePattern = "campus/bldg1/temp".parse().unwrap();
        let found: Vec<_> = discovery
            .discover_chains(&requested, Permission::Read, &Principal::new("alice"))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(found.len(), 1);

        let elsewhere: ResourcePattern = "factory/line1".parse().unwrap();
        let found: Vec<_> = discovery
            .discover_chains(&elsewhere, Permission::Read, &Principal::new("alice"))
            .await
            .unwrap()
            .collect()
            .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_registry_round_trip_and_unreachable() {
        let registry = MemoryCredentialRegistry::new();
        let hash = registry.register(&credential(), ValidityState::Valid).unwrap();
        let entry = registry.resolve_credential(&hash).await.unwrap();
        assert_eq!(entry.state, ValidityState::Valid);

        assert!(registry.set_state(&hash, ValidityState::Revoked));
        assert_eq!(
            registry.resolve_credential(&hash).await.unwrap().state,
            ValidityState::Revoked
        );

        registry.mark_unreachable(hash);
        assert!(matches!(
            registry.resolve_credential(&hash).await,
            Err(WardenError::Network { .. })
        ));
        assert_eq!(registry.lookup_count(), 3);
    }

    #[tokio::test]
    async fn test_stream_index_unknown_stream() {
        let index = MemoryStreamIndex::new();
        let stream = StreamId::from_name("temp");
        assert!(matches!(
            index.resource_for_stream(stream).await,
            Err(WardenError::NotFound { .. })
        ));
        index.insert(stream, "campus/bldg1/temp".parse().unwrap());
        assert_eq!(
            index.resource_for_stream(stream).await.unwrap().as_str(),
            "campus/bldg1/temp"
        );
    }
}
