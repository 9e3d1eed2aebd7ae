//! Delegation credentials and chains.

use serde::{Deserialize, Serialize};

use crate::{
    CredentialHash, Interval, Permission, PermissionSet, Principal, ResourcePattern, ResourceUri,
    Timestamp,
};

/// A grant of a permission set on a resource pattern from one principal to another.
///
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Principal granting the permissions
    pub issuer: Principal,

    /// Principal receiving the permissions
    pub receiver: Principal,

    /// Resources the grant applies to
    pub resource: ResourcePattern,

    /// Operation classes granted
    pub permissions: PermissionSet,

    /// When the grant was created
    pub created_at: Timestamp,

    /// When the grant stops being valid
    pub expires_at: Timestamp,
}

impl Credential {
    /// The period this credential was valid, `[created_at, expires_at]`.
    ///
    /// `None` when expiry precedes creation: such a credential covers no time.
    pub fn validity_window(&self) -> Option<Interval> {
        Interval::new(self.created_at, self.expires_at)
    }

    /// Whether this credential grants `permission` on `resource`.
    pub fn grants(&self, resource: &ResourceUri, permission: Permission) -> bool {
        self.permissions.grants(permission) && self.resource.matches(resource)
    }
}

/// One hop of a discovered chain: either inline or known only by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum CredentialSlot {
    /// Full credential supplied by discovery
    Resolved {
        /// The credential
        credential: Credential,
    },
    /// Only the content hash is known; a registry lookup is required
    Unresolved {
        /// Hash to resolve
        hash: CredentialHash,
    },
}

impl CredentialSlot {
    /// Inline slot.
    pub fn resolved(credential: Credential) -> Self {
        Self::Resolved { credential }
    }

    /// Hash-only slot.
    pub fn unresolved(hash: CredentialHash) -> Self {
        Self::Unresolved { hash }
    }

    /// Hash still awaiting resolution, if any.
    pub fn pending_hash(&self) -> Option<CredentialHash> {
        match self {
            Self::Resolved { .. } => None,
            Self::Unresolved { hash } => Some(*hash),
        }
    }
}

/// A chain as produced by discovery: root authority first, requester last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateChain {
    slots: Vec<CredentialSlot>,
}

impl CandidateChain {
    /// Build a chain from its slots.
    pub fn new(slots: Vec<CredentialSlot>) -> Self {
        Self { slots }
    }

    /// Slots in hop order.
    pub fn slots(&self) -> &[CredentialSlot] {
        &self.slots
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the chain has no hops.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether every slot is already resolved.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|slot| slot.pending_hash().is_none())
    }

    /// `(hop index, hash)` for every unresolved slot.
    pub fn pending(&self) -> Vec<(usize, CredentialHash)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.pending_hash().map(|hash| (idx, hash)))
            .collect()
    }

    /// Fill the slot at `idx` with a resolved credential.
    pub fn fill(&mut self, idx: usize, credential: Credential) {
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = CredentialSlot::resolved(credential);
        }
    }

    /// Convert into a resolved chain; gives the chain back if any slot is pending.
    pub fn into_resolved(self) -> Result<ResolvedChain, CandidateChain> {
        if self.is_empty() || !self.is_complete() {
            return Err(self);
        }
        let credentials = self
            .slots
            .into_iter()
            .filter_map(|slot| match slot {
                CredentialSlot::Resolved { credential } => Some(credential),
                CredentialSlot::Unresolved { .. } => None,
            })
            .collect();
        Ok(ResolvedChain { credentials })
    }
}

impl FromIterator<CredentialSlot> for CandidateChain {
    fn from_iter<I: IntoIterator<Item = CredentialSlot>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A chain whose every hop is a resolved credential. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChain {
    credentials: Vec<Credential>,
}

impl ResolvedChain {
    /// Credentials in hop order.
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Index of the first hop whose receiver is not the next hop's issuer,
    /// or `None` if every hop links to the next.
    pub fn first_broken_link(&self) -> Option<usize> {
        self.credentials
            .windows(2)
            .position(|pair| pair[0].receiver != pair[1].issuer)
    }

    /// Whether the final hop delegates to `principal`.
    pub fn ends_at(&self, principal: &Principal) -> bool {
        self.credentials
            .last()
            .is_some_and(|last| &last.receiver == principal)
    }
}
