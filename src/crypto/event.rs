//! Signed authorization events
//!
//! A key migration is only submitted together with a structured event,
//! signed by the current admin key, naming the new public key. The store
//! verifies the signature server-side; this module builds the unsigned
//! event, and sanity-checks the shape of what the signing agent returns
//! before anything touches the network.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::crypto::pubkey::AdminPubkey;

/// Event kind for admin authorization events
pub const AUTH_EVENT_KIND: u16 = 22242;

/// Tag name identifying the authorized action
pub const ACTION_TAG: &str = "action";

/// Action value for an admin key migration
pub const MIGRATION_ACTION: &str = "admin_key_migration";

/// Tag name carrying the migration target key
pub const NEW_PUBKEY_TAG: &str = "new_pubkey";

/// Length of a hex-encoded schnorr signature
const SIG_HEX_LEN: usize = 128;

/// Authorization event shape error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventShapeError {
    /// Event kind differs from [`AUTH_EVENT_KIND`]
    #[error("unexpected event kind {0}")]
    WrongKind(u16),

    /// The action tag is missing or names a different action
    #[error("event does not authorize an admin key migration")]
    WrongAction,

    /// The new-pubkey tag is missing or names a different key
    #[error("event authorizes key {found:?}, expected {expected}")]
    TargetMismatch {
        expected: String,
        found: Option<String>,
    },

    /// Signature field is not a plausible hex signature
    #[error("malformed signature")]
    MalformedSignature,

    /// The id field does not match the canonical event hash
    #[error("event id does not match its contents")]
    IdMismatch,
}

/// An authorization event before signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub kind: u16,
    pub created_at: i64,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl UnsignedEvent {
    /// Build the unsigned authorization event for a key migration
    pub fn migration_authorization(new_pubkey: &AdminPubkey) -> Self {
        Self {
            kind: AUTH_EVENT_KIND,
            created_at: Utc::now().timestamp(),
            tags: vec![
                vec![ACTION_TAG.to_string(), MIGRATION_ACTION.to_string()],
                vec![NEW_PUBKEY_TAG.to_string(), new_pubkey.to_hex()],
            ],
            content: String::new(),
        }
    }
}

/// An authorization event as returned by the signing agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAuthorizationEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

impl SignedAuthorizationEvent {
    /// Value of the first tag with the given name, if any
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().map(String::as_str) == Some(name))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }

    /// Check the event authorizes migrating to `expected` and is internally
    /// consistent
    ///
    /// The store re-verifies the signature itself; this check exists so a
    /// confused or malicious agent response fails closed here, before any
    /// network write.
    pub fn verify_shape(&self, expected: &AdminPubkey) -> Result<(), EventShapeError> {
        if self.kind != AUTH_EVENT_KIND {
            return Err(EventShapeError::WrongKind(self.kind));
        }

        if self.tag_value(ACTION_TAG) != Some(MIGRATION_ACTION) {
            return Err(EventShapeError::WrongAction);
        }

        let expected_hex = expected.to_hex();
        let found = self.tag_value(NEW_PUBKEY_TAG);
        if found != Some(expected_hex.as_str()) {
            return Err(EventShapeError::TargetMismatch {
                expected: expected_hex,
                found: found.map(str::to_string),
            });
        }

        if self.sig.len() != SIG_HEX_LEN || !self.sig.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EventShapeError::MalformedSignature);
        }

        let computed = event_id(&self.pubkey, self.created_at, self.kind, &self.tags, &self.content);
        if computed != self.id {
            return Err(EventShapeError::IdMismatch);
        }

        Ok(())
    }
}

/// Canonical event id: SHA-256 over the serialized
/// `[0, pubkey, created_at, kind, tags, content]` array, hex encoded
pub fn event_id(
    pubkey: &str,
    created_at: i64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> String {
    let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]);
    // Serializing a value built from strings and integers cannot fail.
    let bytes = serde_json::to_vec(&canonical).unwrap();

    hex::encode(Sha256::digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET_HEX: &str = "7e7e9c42a91bfef19fa929e5fda1b72e0ebc1a4c1141673e2794234d86addf4e";
    const SIGNER_HEX: &str = "84dee6e676e5bb67b4ad4e042cf70cbd8681155db535942fcc6a0533858a7240";

    fn target() -> AdminPubkey {
        AdminPubkey::parse(TARGET_HEX).unwrap()
    }

    fn signed(unsigned: &UnsignedEvent) -> SignedAuthorizationEvent {
        SignedAuthorizationEvent {
            id: event_id(
                SIGNER_HEX,
                unsigned.created_at,
                unsigned.kind,
                &unsigned.tags,
                &unsigned.content,
            ),
            pubkey: SIGNER_HEX.to_string(),
            created_at: unsigned.created_at,
            kind: unsigned.kind,
            tags: unsigned.tags.clone(),
            content: unsigned.content.clone(),
            sig: "ab".repeat(64),
        }
    }

    #[test]
    fn test_migration_authorization_shape() {
        let event = UnsignedEvent::migration_authorization(&target());

        assert_eq!(event.kind, AUTH_EVENT_KIND);
        assert_eq!(event.content, "");
        assert_eq!(
            event.tags,
            vec![
                vec!["action".to_string(), "admin_key_migration".to_string()],
                vec!["new_pubkey".to_string(), TARGET_HEX.to_string()],
            ]
        );
    }

    #[test]
    fn test_verify_shape_accepts_well_formed_event() {
        let unsigned = UnsignedEvent::migration_authorization(&target());
        let event = signed(&unsigned);

        assert_eq!(event.verify_shape(&target()), Ok(()));
    }

    #[test]
    fn test_verify_shape_rejects_wrong_target() {
        let other = AdminPubkey::parse(SIGNER_HEX).unwrap();
        let unsigned = UnsignedEvent::migration_authorization(&other);
        let event = signed(&unsigned);

        assert!(matches!(
            event.verify_shape(&target()),
            Err(EventShapeError::TargetMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_shape_rejects_tampered_tags() {
        let unsigned = UnsignedEvent::migration_authorization(&target());
        let mut event = signed(&unsigned);
        // Tamper after signing: id no longer matches the contents
        event.tags.push(vec!["extra".to_string(), "tag".to_string()]);

        assert_eq!(event.verify_shape(&target()), Err(EventShapeError::IdMismatch));
    }

    #[test]
    fn test_verify_shape_rejects_bad_signature_field() {
        let unsigned = UnsignedEvent::migration_authorization(&target());
        let mut event = signed(&unsigned);
        event.sig = "not-a-signature".to_string();

        assert_eq!(
            event.verify_shape(&target()),
            Err(EventShapeError::MalformedSignature)
        );
    }

    #[test]
    fn test_verify_shape_rejects_wrong_kind() {
        let unsigned = UnsignedEvent::migration_authorization(&target());
        let mut event = signed(&unsigned);
        event.kind = 1;
        event.id = event_id(&event.pubkey, event.created_at, event.kind, &event.tags, &event.content);

        assert_eq!(event.verify_shape(&target()), Err(EventShapeError::WrongKind(1)));
    }

    #[test]
    fn test_event_id_is_stable() {
        let a = event_id(SIGNER_HEX, 1700000000, AUTH_EVENT_KIND, &[], "");
        let b = event_id(SIGNER_HEX, 1700000000, AUTH_EVENT_KIND, &[], "");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let c = event_id(SIGNER_HEX, 1700000001, AUTH_EVENT_KIND, &[], "");
        assert_ne!(a, c);
    }
}
