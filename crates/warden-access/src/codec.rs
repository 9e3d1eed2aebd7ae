//! Credential payload codec
//!
//! Registry payloads arrive as opaque CBOR blobs. Decoding happens here and
//! nowhere else: each payload kind has an explicit schema, and only the
//! `access` kind yields a credential the engine can reason about.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use warden_core::{Credential, CredentialHash, Principal, Result, Timestamp, WardenError};

use crate::ChainRejection;

/// Schema version written for access grants.
pub const ACCESS_SCHEMA_VERSION: u8 = 1;

/// Tagged credential payload as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialPayload {
    /// Grant of resource permissions; contributes access windows
    Access {
        /// Payload schema version
        version: u8,
        /// The grant itself
        credential: Credential,
    },
    /// Application-level permission grant; never contributes access windows
    Permission {
        /// Principal granting the permission
        issuer: Principal,
        /// Principal receiving the permission
        receiver: Principal,
        /// Application-defined key/value grants
        grants: BTreeMap<String, String>,
        /// When the grant was created
        created_at: Timestamp,
        /// When the grant stops being valid
        expires_at: Timestamp,
    },
}

impl CredentialPayload {
    /// Wrap a credential as a current-version access payload.
    pub fn access(credential: Credential) -> Self {
        Self::Access {
            version: ACCESS_SCHEMA_VERSION,
            credential,
        }
    }

    /// Encode to CBOR.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_cbor::to_vec(self)
            .map_err(|e| WardenError::serialization(format!("Failed to encode credential: {e}")))
    }

    /// Decode from CBOR.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_cbor::from_slice(bytes)
            .map_err(|e| WardenError::serialization(format!("Failed to decode credential: {e}")))
    }
}

/// Content hash of an encoded payload.
pub fn content_hash(payload: &[u8]) -> CredentialHash {
    CredentialHash::from_bytes(*blake3::hash(payload).as_bytes())
}

/// Encode a credential and compute the hash it is registered under.
pub fn encode_credential(credential: &Credential) -> Result<(CredentialHash, Vec<u8>)> {
    let payload = CredentialPayload::access(credential.clone()).encode()?;
    Ok((content_hash(&payload), payload))
}

/// Turn a registry payload fetched for `expected` into an access credential.
///
/// The payload must hash to `expected`, decode, and be an access grant of a
/// known schema version.
pub fn decode_access_credential(
    expected: &CredentialHash,
    payload: &[u8],
) -> std::result::Result<Credential, ChainRejection> {
    if &content_hash(payload) != expected {
        return Err(ChainRejection::HashMismatch);
    }
    match CredentialPayload::decode(payload) {
        Ok(CredentialPayload::Access {
            version: ACCESS_SCHEMA_VERSION,
            credential,
        }) => Ok(credential),
        Ok(_) | Err(_) => Err(ChainRejection::Undecodable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            issuer: Principal::new("root"),
            receiver: Principal::new("alice"),
            resource: "campus/bldg1/*".parse().unwrap(),
            permissions: "C".parse().unwrap(),
            created_at: Timestamp::from_nanos(100),
            expires_at: Timestamp::from_nanos(200),
        }
    }

    #[test]
    fn test_access_payload_decodes() {
        let (hash, payload) = encode_credential(&credential()).unwrap();
        assert_eq!(decode_access_credential(&hash, &payload), Ok(credential()));
    }

    #[test]
    fn test_hash_mismatch() {
        let (_, payload) = encode_credential(&credential()).unwrap();
        let wrong = CredentialHash::from_bytes([0; 32]);
        assert_eq!(
            decode_access_credential(&wrong, &payload),
            Err(ChainRejection::HashMismatch)
        );
    }

    #[test]
    fn test_permission_payload_is_not_an_access_grant() {
        let payload = CredentialPayload::Permission {
            issuer: Principal::new("root"),
            receiver: Principal::new("alice"),
            grants: BTreeMap::from([("dashboard".to_string(), "view".to_string())]),
            created_at: Timestamp::from_nanos(0),
            expires_at: Timestamp::from_nanos(10),
        }
        .encode()
        .unwrap();
        assert_eq!(
            decode_access_credential(&content_hash(&payload), &payload),
            Err(ChainRejection::Undecodable)
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let payload = CredentialPayload::Access {
            version: 9,
            credential: credential(),
        }
        .encode()
        .unwrap();
        assert_eq!(
            decode_access_credential(&content_hash(&payload), &payload),
            Err(ChainRejection::Undecodable)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let payload = b"not cbor at all".to_vec();
        assert_eq!(
            decode_access_credential(&content_hash(&payload), &payload),
            Err(ChainRejection::Undecodable)
        );
    }
}
