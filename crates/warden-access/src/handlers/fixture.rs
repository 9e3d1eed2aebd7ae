//! Fixture worlds
//!
//! A TOML description of credentials, delegation chains and streams,
//! turned into a populated set of in-memory collaborators.
//!
//! ```toml
//! [[credentials]]
//! id = "root-alice"
//! issuer = "root"
//! receiver = "alice"
//! resource = "campus/*"
//! permissions = ["can-consume"]
//! created_at = 100
//! expires_at = 200
//!
//! [[chains]]
//! principal = "alice"
//! resource = "campus/*"
//! hops = ["root-alice"]
//!
//! [[streams]]
//! name = "bldg1-temp"
//! resource = "campus/bldg1/temp"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use warden_core::{
    CandidateChain, Credential, CredentialHash, CredentialSlot, PermissionSet, Principal,
    ResourcePattern, ResourceUri, Result, StreamId, Timestamp, WardenError,
};

use super::memory::{MemoryChainDiscovery, MemoryCredentialRegistry, MemoryStreamIndex};
use crate::effects::ValidityState;

fn default_state() -> ValidityState {
    ValidityState::Valid
}

/// A credential and how the registry treats it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCredential {
    /// Name used by chains to refer to this credential
    pub id: String,
    /// Granting principal
    pub issuer: Principal,
    /// Receiving principal
    pub receiver: Principal,
    /// Resources covered
    pub resource: ResourcePattern,
    /// Permissions granted
    pub permissions: PermissionSet,
    /// Creation time, in nanoseconds
    pub created_at: Timestamp,
    /// Expiry time, in nanoseconds
    pub expires_at: Timestamp,
    /// Registry verdict
    #[serde(default = "default_state")]
    pub state: ValidityState,
    /// Whether registry lookups for this credential fail
    #[serde(default)]
    pub unreachable: bool,
}

impl FixtureCredential {
    fn credential(&self) -> Credential {
        Credential {
            issuer: self.issuer.clone(),
            receiver: self.receiver.clone(),
            resource: self.resource.clone(),
            permissions: self.permissions,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// A chain discovery will report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureChain {
    /// Principal the chain delivers to
    pub principal: Principal,
    /// Pattern the chain is discovered under
    pub resource: ResourcePattern,
    /// Credential ids, root first
    pub hops: Vec<String>,
    /// Carry full credentials instead of hashes
    #[serde(default)]
    pub inline: bool,
}

/// A named stream and the resource that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureStream {
    /// Stream name; the stream id is derived from it
    pub name: String,
    /// Producing resource
    pub resource: ResourceUri,
    /// Whether the stream's resource lookup fails
    #[serde(default)]
    pub unreachable: bool,
}

/// A complete fixture description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureWorld {
    /// Known credentials
    pub credentials: Vec<FixtureCredential>,
    /// Discoverable chains
    pub chains: Vec<FixtureChain>,
    /// Archived streams
    pub streams: Vec<FixtureStream>,
}

/// In-memory collaborators populated from a [`FixtureWorld`].
#[derive(Debug, Clone)]
pub struct FixtureHandlers {
    /// Chain discovery
    pub discovery: Arc<MemoryChainDiscovery>,
    /// Credential registry
    pub registry: Arc<MemoryCredentialRegistry>,
    /// Stream index
    pub streams: Arc<MemoryStreamIndex>,
}

impl FixtureWorld {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WardenError::serialization(format!("Invalid fixture: {e}")))
    }

    /// Load a fixture from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WardenError::storage(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Id of the stream called `name`, if the fixture declares it.
    pub fn stream_id(&self, name: &str) -> Option<StreamId> {
        self.streams
            .iter()
            .any(|stream| stream.name == name)
            .then(|| StreamId::from_name(name))
    }

    /// Name of the stream with id `id`, if the fixture declares it.
    pub fn stream_name(&self, id: StreamId) -> Option<&str> {
        self.streams
            .iter()
            .find(|stream| StreamId::from_name(&stream.name) == id)
            .map(|stream| stream.name.as_str())
    }

    /// Populate in-memory collaborators.
    ///
    /// Fails on duplicate credential ids and on chains naming unknown ones.
    pub fn build(&self) -> Result<FixtureHandlers> {
        let discovery = Arc::new(MemoryChainDiscovery::new());
        let registry = Arc::new(MemoryCredentialRegistry::new());
        let streams = Arc::new(MemoryStreamIndex::new());

        let mut known: HashMap<&str, (Credential, CredentialHash)> = HashMap::new();
        for entry in &self.credentials {
            let credential = entry.credential();
            let hash = registry.register(&credential, entry.state)?;
            if entry.unreachable {
                registry.mark_unreachable(hash);
            }
            if known.insert(&entry.id, (credential, hash)).is_some() {
                return Err(WardenError::invalid(format!(
                    "Duplicate credential id '{}'",
                    entry.id
                )));
            }
        }

        for chain in &self.chains {
            let slots = chain
                .hops
                .iter()
                .map(|id| {
                    let (credential, hash) = known.get(id.as_str()).ok_or_else(|| {
                        WardenError::invalid(format!("Chain references unknown credential '{id}'"))
                    })?;
                    Ok(if chain.inline {
                        CredentialSlot::resolved(credential.clone())
                    } else {
                        CredentialSlot::unresolved(*hash)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            discovery.add_chain(
                chain.principal.clone(),
                chain.resource.clone(),
                CandidateChain::new(slots),
            );
        }

        for stream in &self.streams {
            let id = StreamId::from_name(&stream.name);
            streams.insert(id, stream.resource.clone());
            if stream.unreachable {
                streams.mark_unreachable(id);
            }
        }

        Ok(FixtureHandlers {
            discovery,
            registry,
            streams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{ChainDiscoveryEffects, StreamResourceEffects};
    use futures::StreamExt;
    use warden_core::Permission;

    const WORLD: &str = r#"
[[credentials]]
id = "root-bob"
issuer = "root"
receiver = "bob"
resource = "campus/*"
permissions = ["can-consume", "read"]
created_at = 100
expires_at = 200

[[credentials]]
id = "bob-alice"
issuer = "bob"
receiver = "alice"
resource = "campus/bldg1/*"
permissions = ["read"]
created_at = 150
expires_at = 300
state = "expired"

[[chains]]
principal = "alice"
resource = "campus/*"
hops = ["root-bob", "bob-alice"]

[[streams]]
name = "bldg1-temp"
resource = "campus/bldg1/temp"
"#;

    #[tokio::test]
    async fn test_world_builds_handlers() {
        let world = FixtureWorld::from_toml_str(WORLD).unwrap();
        assert_eq!(world.credentials[1].state, ValidityState::Expired);

        let handlers = world.build().unwrap();
        assert_eq!(handlers.discovery.chain_count(), 1);

        let chains: Vec<_> = handlers
            .discovery
            .discover_chains(
                &"campus/bldg1/temp".parse().unwrap(),
                Permission::Read,
                &Principal::new("alice"),
            )
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].pending().len(), 2);

        let stream = world.stream_id("bldg1-temp").unwrap();
        assert_eq!(world.stream_name(stream), Some("bldg1-temp"));
        assert_eq!(
            handlers.streams.resource_for_stream(stream).await.unwrap().as_str(),
            "campus/bldg1/temp"
        );
        assert!(world.stream_id("missing").is_none());
    }

    #[test]
    fn test_unknown_hop_rejected() {
        let world = FixtureWorld::from_toml_str(
            r#"
[[chains]]
principal = "alice"
resource = "campus/*"
hops = ["nobody"]
"#,
        )
        .unwrap();
        assert!(matches!(world.build(), Err(WardenError::Invalid { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.toml");
        std::fs::write(&path, WORLD).unwrap();
        let world = FixtureWorld::load_from_file(&path).unwrap();
        assert_eq!(world.chains.len(), 1);
        assert!(FixtureWorld::load_from_file(&dir.path().join("absent.toml")).is_err());
    }
}
