//! Chain resolution
//!
//! Turns the candidate chains yielded by discovery into fully resolved
//! chains. Chains are independent, so they are resolved concurrently, and
//! within a chain every hash-only slot is looked up concurrently. Any slot
//! that cannot be resolved drops its whole chain; siblings are unaffected.

use futures::future::try_join_all;
use futures::StreamExt;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Span;
use warden_core::{
    CandidateChain, Credential, CredentialHash, Permission, Principal, ResolvedChain,
    ResourcePattern, ResourceUri, WardenError,
};

use crate::codec::decode_access_credential;
use crate::effects::{ChainDiscoveryEffects, CredentialRegistryEffects, ValidityState};
use crate::{AccessConfig, AccessError, AccessResult, ChainRejection};

/// What a single resolution pass did, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    /// Candidate chains produced by discovery
    pub candidates: usize,

    /// Chains that resolved completely
    pub resolved: usize,

    /// Dropped chains, by cause
    pub rejected: BTreeMap<ChainRejection, usize>,
}

impl ResolutionReport {
    /// Total number of dropped chains.
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Outcome of resolving every candidate chain for one request.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Fully resolved chains, in no particular order
    pub chains: Vec<ResolvedChain>,

    /// Per-pass statistics
    pub report: ResolutionReport,
}

/// Resolves discovered chains against the credential registry.
pub struct ChainResolver {
    discovery: Arc<dyn ChainDiscoveryEffects>,
    registry: Arc<dyn CredentialRegistryEffects>,
    config: AccessConfig,
    span: Span,
}

impl ChainResolver {
    /// Create a resolver over the given collaborators. Fails if `config` is invalid.
    pub fn new(
        discovery: Arc<dyn ChainDiscoveryEffects>,
        registry: Arc<dyn CredentialRegistryEffects>,
        config: AccessConfig,
    ) -> AccessResult<Self> {
        config.validate()?;
        Ok(Self {
            discovery,
            registry,
            config,
            span: tracing::debug_span!("chain_resolver"),
        })
    }

    /// Emit events under `span` instead of the default component span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Discover and resolve every chain granting `permission` on `resource`
    /// to `principal`.
    ///
    /// Fails only when discovery itself fails or times out. An empty result
    /// means no access.
    pub async fn resolve(
        &self,
        resource: &ResourceUri,
        permission: Permission,
        principal: &Principal,
    ) -> AccessResult<Resolution> {
        let candidates = self.discover(resource, permission, principal).await?;

        let mut resolution = Resolution {
            chains: Vec::with_capacity(candidates.len()),
            report: ResolutionReport {
                candidates: candidates.len(),
                ..ResolutionReport::default()
            },
        };

        let outcomes: Vec<(usize, Result<ResolvedChain, ChainRejection>)> =
            futures::stream::iter(candidates.into_iter().enumerate())
                .map(|(idx, chain)| async move {
                    (idx, self.resolve_chain(chain, resource, permission, principal).await)
                })
                .buffer_unordered(self.config.max_concurrent_chains)
                .collect()
                .await;

        for (idx, outcome) in outcomes {
            match outcome {
                Ok(chain) => resolution.chains.push(chain),
                Err(rejection) => {
                    tracing::warn!(
                        parent: &self.span,
                        chain = idx,
                        %resource,
                        %principal,
                        reason = %rejection,
                        "Dropping delegation chain"
                    );
                    *resolution.report.rejected.entry(rejection).or_default() += 1;
                }
            }
        }
        resolution.report.resolved = resolution.chains.len();

        tracing::debug!(
            parent: &self.span,
            %resource,
            %principal,
            %permission,
            candidates = resolution.report.candidates,
            resolved = resolution.report.resolved,
            rejected = resolution.report.rejected_total(),
            "Chain resolution complete"
        );
        Ok(resolution)
    }

    /// Run discovery to completion under the discovery deadline.
    async fn discover(
        &self,
        resource: &ResourceUri,
        permission: Permission,
        principal: &Principal,
    ) -> AccessResult<Vec<CandidateChain>> {
        let pattern = ResourcePattern::from(resource.clone());
        let call = async {
            let stream = self
                .discovery
                .discover_chains(&pattern, permission, principal)
                .await?;
            Ok::<_, WardenError>(stream.collect::<Vec<_>>().await)
        };

        match tokio::time::timeout(self.config.discovery_timeout(), call).await {
            Ok(Ok(candidates)) => Ok(candidates),
            Ok(Err(e)) => Err(AccessError::discovery_failed(resource, e)),
            Err(_) => Err(AccessError::discovery_failed(
                resource,
                WardenError::timeout("chain discovery", self.config.discovery_timeout_ms),
            )),
        }
    }

    async fn resolve_chain(
        &self,
        mut chain: CandidateChain,
        resource: &ResourceUri,
        permission: Permission,
        principal: &Principal,
    ) -> Result<ResolvedChain, ChainRejection> {
        if chain.is_empty() {
            return Err(ChainRejection::Empty);
        }

        let lookups = chain.pending().into_iter().map(|(idx, hash)| async move {
            self.lookup(&hash).await.map(|credential| (idx, credential))
        });
        for (idx, credential) in try_join_all(lookups).await? {
            chain.fill(idx, credential);
        }

        let resolved = chain
            .into_resolved()
            .map_err(|_| ChainRejection::Incomplete)?;

        if resolved.first_broken_link().is_some() || !resolved.ends_at(principal) {
            return Err(ChainRejection::BrokenLinkage);
        }
        if !resolved
            .credentials()
            .iter()
            .all(|credential| credential.grants(resource, permission))
        {
            return Err(ChainRejection::ScopeMismatch);
        }
        Ok(resolved)
    }

    /// Resolve one hash-only slot under the lookup deadline.
    async fn lookup(&self, hash: &CredentialHash) -> Result<Credential, ChainRejection> {
        let entry = match tokio::time::timeout(
            self.config.lookup_timeout(),
            self.registry.resolve_credential(hash),
        )
        .await
        {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                tracing::warn!(
                    parent: &self.span,
                    hash = %hash.short(),
                    error = %e,
                    "Credential lookup failed"
                );
                return Err(ChainRejection::LookupFailed);
            }
            Err(_) => {
                tracing::warn!(
                    parent: &self.span,
                    hash = %hash.short(),
                    timeout_ms = self.config.lookup_timeout_ms,
                    "Credential lookup timed out"
                );
                return Err(ChainRejection::LookupTimedOut);
            }
        };

        match entry.state {
            ValidityState::Valid => {}
            ValidityState::Expired if self.config.accept_expired => {}
            ValidityState::Expired => return Err(ChainRejection::Expired),
            ValidityState::Revoked => return Err(ChainRejection::Revoked),
            ValidityState::Invalid => return Err(ChainRejection::Invalid),
        }

        decode_access_credential(hash, &entry.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_credential, CredentialPayload};
    use crate::effects::RegistryEntry;
    use crate::handlers::memory::{MemoryChainDiscovery, MemoryCredentialRegistry};
    use warden_core::{CredentialSlot, Timestamp};

    fn credential(issuer: &str, receiver: &str, resource: &str) -> Credential {
        Credential {
            issuer: Principal::new(issuer),
            receiver: Principal::new(receiver),
            resource: resource.parse().unwrap(),
            permissions: "C".parse().unwrap(),
            created_at: Timestamp::from_nanos(100),
            expires_at: Timestamp::from_nanos(200),
        }
    }

    fn resource() -> ResourceUri {
        "campus/bldg1/temp".parse().unwrap()
    }

    fn resolver(
        discovery: &Arc<MemoryChainDiscovery>,
        registry: &Arc<MemoryCredentialRegistry>,
    ) -> ChainResolver {
        ChainResolver::new(discovery.clone(), registry.clone(), AccessConfig::default()).unwrap()
    }

    fn alice() -> Principal {
        Principal::new("alice")
    }

    #[tokio::test]
    async fn test_resolves_hash_only_slots() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let root = registry
            .register(&credential("root", "bob", "campus/*"), ValidityState::Valid)
            .unwrap();
        let hop = registry
            .register(&credential("bob", "alice", "campus/bldg1/*"), ValidityState::Valid)
            .unwrap();
        discovery.add_chain(
            alice(),
            "campus/*".parse().unwrap(),
            [CredentialSlot::unresolved(root), CredentialSlot::unresolved(hop)]
                .into_iter()
                .collect(),
        );

        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert_eq!(resolution.chains.len(), 1);
        assert_eq!(resolution.chains[0].len(), 2);
        assert_eq!(registry.lookup_count(), 2);
        assert_eq!(resolution.report.rejected_total(), 0);
    }

    #[tokio::test]
    async fn test_inline_slots_skip_registry() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        discovery.add_chain(
            alice(),
            "campus/*".parse().unwrap(),
            [CredentialSlot::resolved(credential("root", "alice", "campus/*"))]
                .into_iter()
                .collect(),
        );

        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert_eq!(resolution.chains.len(), 1);
        assert_eq!(registry.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_revoked_credential_drops_only_its_chain() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let revoked = registry
            .register(&credential("root", "alice", "campus/*"), ValidityState::Revoked)
            .unwrap();
        let good = registry
            .register(&credential("ops", "alice", "campus/*"), ValidityState::Valid)
            .unwrap();
        for hash in [revoked, good] {
            discovery.add_chain(
                alice(),
                "campus/*".parse().unwrap(),
                [CredentialSlot::unresolved(hash)].into_iter().collect(),
            );
        }

        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert_eq!(resolution.chains.len(), 1);
        assert_eq!(resolution.report.rejected.get(&ChainRejection::Revoked), Some(&1));
    }

    #[tokio::test]
    async fn test_unreachable_registry_drops_chain_without_error() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let hash = registry
            .register(&credential("root", "alice", "campus/*"), ValidityState::Valid)
            .unwrap();
        registry.mark_unreachable(hash);
        discovery.add_chain(
            alice(),
            "campus/*".parse().unwrap(),
            [CredentialSlot::unresolved(hash)].into_iter().collect(),
        );

        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert!(resolution.chains.is_empty());
        assert_eq!(
            resolution.report.rejected.get(&ChainRejection::LookupFailed),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_expired_state_respects_config() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let hash = registry
            .register(&credential("root", "alice", "campus/*"), ValidityState::Expired)
            .unwrap();
        discovery.add_chain(
            alice(),
            "campus/*".parse().unwrap(),
            [CredentialSlot::unresolved(hash)].into_iter().collect(),
        );

        let accepting = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert_eq!(accepting.chains.len(), 1);

        let strict = ChainResolver::new(
            discovery.clone(),
            registry.clone(),
            AccessConfig {
                accept_expired: false,
                ..AccessConfig::default()
            },
        )
        .unwrap()
        .resolve(&resource(), Permission::Consume, &alice())
        .await
        .unwrap();
        assert!(strict.chains.is_empty());
        assert_eq!(strict.report.rejected.get(&ChainRejection::Expired), Some(&1));
    }

    #[tokio::test]
    async fn test_structural_checks() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let pattern: ResourcePattern = "campus/*".parse().unwrap();

        // root -> bob, then carol -> alice: hops do not link
        discovery.add_chain(
            alice(),
            pattern.clone(),
            [
                CredentialSlot::resolved(credential("root", "bob", "campus/*")),
                CredentialSlot::resolved(credential("carol", "alice", "campus/*")),
            ]
            .into_iter()
            .collect(),
        );
        // ends at bob, not alice
        discovery.add_chain(
            alice(),
            pattern.clone(),
            [CredentialSlot::resolved(credential("root", "bob", "campus/*"))]
                .into_iter()
                .collect(),
        );
        // granted on another building
        discovery.add_chain(
            alice(),
            pattern.clone(),
            [CredentialSlot::resolved(credential("root", "alice", "campus/bldg2/*"))]
                .into_iter()
                .collect(),
        );
        discovery.add_chain(alice(), pattern, CandidateChain::default());

        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert!(resolution.chains.is_empty());
        assert_eq!(resolution.report.candidates, 4);
        assert_eq!(
            resolution.report.rejected.get(&ChainRejection::BrokenLinkage),
            Some(&2)
        );
        assert_eq!(
            resolution.report.rejected.get(&ChainRejection::ScopeMismatch),
            Some(&1)
        );
        assert_eq!(resolution.report.rejected.get(&ChainRejection::Empty), Some(&1));
    }

    #[tokio::test]
    async fn test_discovery_failure_is_an_error() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        discovery.fail_with(WardenError::network("authorization network unreachable"));

        let err = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::DiscoveryFailed { .. }));

        discovery.clear_failure();
        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert_eq!(resolution.report, ResolutionReport::default());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = ChainResolver::new(
            Arc::new(MemoryChainDiscovery::new()),
            Arc::new(MemoryCredentialRegistry::new()),
            AccessConfig {
                max_concurrent_chains: 0,
                ..AccessConfig::default()
            },
        );
        assert!(matches!(result, Err(AccessError::Config { .. })));
    }

    #[tokio::test]
    async fn test_bad_payloads_drop_only_their_chains() {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let pattern: ResourcePattern = "campus/*".parse().unwrap();

        // valid payload filed under a hash it does not hash to
        let (_, payload) = encode_credential(&credential("root", "alice", "campus/*")).unwrap();
        let misfiled = CredentialHash::from_bytes([9; 32]);
        registry.insert_entry(
            misfiled,
            RegistryEntry {
                payload,
                state: ValidityState::Valid,
            },
        );
        let garbage = registry.insert_raw(b"not a credential".to_vec(), ValidityState::Valid);
        let app_grant = registry.insert_raw(
            CredentialPayload::Permission {
                issuer: Principal::new("root"),
                receiver: alice(),
                grants: BTreeMap::from([("dashboard".to_string(), "view".to_string())]),
                created_at: Timestamp::from_nanos(0),
                expires_at: Timestamp::from_nanos(500),
            }
            .encode()
            .unwrap(),
            ValidityState::Valid,
        );
        let good = registry
            .register(&credential("ops", "alice", "campus/*"), ValidityState::Valid)
            .unwrap();
        for hash in [misfiled, garbage, app_grant, good] {
            discovery.add_chain(
                alice(),
                pattern.clone(),
                [CredentialSlot::unresolved(hash)].into_iter().collect(),
            );
        }

        let resolution = resolver(&discovery, &registry)
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();
        assert_eq!(resolution.chains.len(), 1);
        assert_eq!(resolution.chains[0].credentials()[0].issuer, Principal::new("ops"));
        assert_eq!(
            resolution.report.rejected.get(&ChainRejection::HashMismatch),
            Some(&1)
        );
        assert_eq!(
            resolution.report.rejected.get(&ChainRejection::Undecodable),
            Some(&2)
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rejections_logged_under_injected_span() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let hash = registry
            .register(&credential("root", "alice", "campus/*"), ValidityState::Revoked)
            .unwrap();
        discovery.add_chain(
            alice(),
            "campus/*".parse().unwrap(),
            [CredentialSlot::unresolved(hash)].into_iter().collect(),
        );

        resolver(&discovery, &registry)
            .with_span(tracing::info_span!("read_request", request_id = 42))
            .resolve(&resource(), Permission::Consume, &alice())
            .await
            .unwrap();

        let output = String::from_utf8(log.0.lock().clone()).unwrap();
        assert!(output.contains("Dropping delegation chain"), "{output}");
        assert!(output.contains("read_request{request_id=42}"), "{output}");
        assert!(output.contains("reason=revoked"), "{output}");
    }
}
