//! Encrypted record store interface
//!
//! This module defines the wire-level record types exchanged with the
//! service's encrypted record store, and the client-side contract of its
//! two migration RPCs: `prepare` (read-only snapshot) and `execute`
//! (atomic re-encryption under a new admin key). The store's persistence
//! and atomicity are the server's responsibility; everything here is the
//! shape the client depends on.

pub mod http;

use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::event::SignedAuthorizationEvent;
use crate::crypto::pubkey::AdminPubkey;

pub use http::HttpRecordStore;

/// Record store error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a usable response
    #[error("record store request failed: {0}")]
    Transport(String),

    /// The store answered with an error status
    #[error("record store returned {status}: {message}")]
    Rpc { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("malformed record store response: {0}")]
    Response(String),
}

/// A ciphertext/ephemeral-key pairing violation
///
/// Raised when a record carries one half of an encrypted field without the
/// other; the record is structurally damaged and nothing further may be
/// decrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingViolation;

/// Resolve an encrypted field into its ciphertext/ephemeral-key pair
///
/// Empty strings count as absent. Both halves present yields the pair,
/// both absent yields `None`, and a lone half is a [`PairingViolation`].
fn paired<'a>(
    ciphertext: &'a Option<String>,
    ephemeral_pubkey: &'a Option<String>,
) -> Result<Option<(&'a str, &'a str)>, PairingViolation> {
    let ciphertext = ciphertext.as_deref().filter(|v| !v.is_empty());
    let ephemeral_pubkey = ephemeral_pubkey.as_deref().filter(|v| !v.is_empty());

    match (ciphertext, ephemeral_pubkey) {
        (Some(ct), Some(ek)) => Ok(Some((ct, ek))),
        (None, None) => Ok(None),
        _ => Err(PairingViolation),
    }
}

/// A user row as stored, PII encrypted to the current admin key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedUserRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_pubkey_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_pubkey_name: Option<String>,
}

impl EncryptedUserRecord {
    /// The encrypted email field, pairing-checked
    pub fn email(&self) -> Result<Option<(&str, &str)>, PairingViolation> {
        paired(&self.encrypted_email, &self.ephemeral_pubkey_email)
    }

    /// The encrypted name field, pairing-checked
    pub fn name(&self) -> Result<Option<(&str, &str)>, PairingViolation> {
        paired(&self.encrypted_name, &self.ephemeral_pubkey_name)
    }
}

/// An arbitrary encrypted form-field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFieldValueRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_pubkey: Option<String>,
}

impl EncryptedFieldValueRecord {
    /// The encrypted value, pairing-checked
    pub fn value(&self) -> Result<Option<(&str, &str)>, PairingViolation> {
        paired(&self.encrypted_value, &self.ephemeral_pubkey)
    }
}

/// Immutable snapshot returned by `prepare` for one migration attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPrepareResponse {
    /// The admin key all records are currently encrypted to
    pub admin_pubkey: AdminPubkey,

    pub user_count: usize,
    pub field_value_count: usize,

    pub users: Vec<EncryptedUserRecord>,
    pub field_values: Vec<EncryptedFieldValueRecord>,
}

impl MigrationPrepareResponse {
    /// Check the snapshot's declared counts against its contents
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.user_count != self.users.len() {
            return Err(StoreError::Response(format!(
                "snapshot declares {} users but contains {}",
                self.user_count,
                self.users.len()
            )));
        }

        if self.field_value_count != self.field_values.len() {
            return Err(StoreError::Response(format!(
                "snapshot declares {} field values but contains {}",
                self.field_value_count,
                self.field_values.len()
            )));
        }

        Ok(())
    }
}

/// Transient, memory-only plaintext for one user row
///
/// Never persisted client-side; plaintext is zeroized on drop and redacted
/// from debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DecryptedUserRecord {
    #[zeroize(skip)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl fmt::Debug for DecryptedUserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedUserRecord")
            .field("id", &self.id)
            .field("email", &self.email.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Transient, memory-only plaintext for one form-field value
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DecryptedFieldValueRecord {
    #[zeroize(skip)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Debug for DecryptedFieldValueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedFieldValueRecord")
            .field("id", &self.id)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outcome returned by `execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub message: String,
    pub users_migrated: usize,
    pub field_values_migrated: usize,
}

/// Client contract of the server-side encrypted record store
///
/// `prepare` must be read-only and repeatable. `execute` must verify the
/// authorization event against the current admin key and apply all writes
/// atomically; the client never retries or splits a submission.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EncryptedRecordStore: Send + Sync {
    /// Fetch the encrypted snapshot for one migration attempt
    async fn prepare(&self) -> Result<MigrationPrepareResponse, StoreError>;

    /// Submit the decrypted snapshot for atomic re-encryption under
    /// `new_pubkey`
    async fn execute(
        &self,
        new_pubkey: AdminPubkey,
        users: Vec<DecryptedUserRecord>,
        field_values: Vec<DecryptedFieldValueRecord>,
        authorization: SignedAuthorizationEvent,
    ) -> Result<MigrationResult, StoreError>;
}
