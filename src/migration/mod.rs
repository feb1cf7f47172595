//! Admin key migration protocol
//!
//! Rotating the admin identity means re-encrypting every piece of user PII
//! currently encrypted to the old admin key, with the private key holder's
//! signing agent as the only party able to decrypt. This module owns the
//! protocol: an explicit state machine ([`state::MigrationState`]) with a
//! pure transition function, and a [`coordinator::MigrationCoordinator`]
//! that drives the prepare, decrypt-all, sign, submit sequence against
//! the injected signer and record store.
//!
//! Every failure after `prepare` is fail-closed: nothing is submitted
//! unless every record decrypted and a well-formed authorization was
//! signed, and the server applies the submission atomically or not at all.

pub mod coordinator;
pub mod state;

use thiserror::Error;

// Re-exports
pub use coordinator::MigrationCoordinator;
pub use state::{MigrationEvent, MigrationState, ProgressPhase};

/// Migration protocol error
///
/// Each variant corresponds to one stage of the protocol. `Prerequisite`
/// and `Validation` can only occur before any decryption has happened; all
/// other kinds occur mid-protocol and guarantee no network write occurred
/// (`Submit` being the failure of the write itself, which the store applies
/// atomically or not at all).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    /// Signing agent missing or lacking a capability; blocks entry
    #[error("{0}")]
    Prerequisite(String),

    /// Malformed or duplicate target key
    #[error("invalid target public key: {0}")]
    Validation(String),

    /// The prepare RPC failed
    #[error("failed to load the migration snapshot: {0}")]
    Fetch(String),

    /// A record carries a ciphertext without its ephemeral key companion
    #[error("record {id}: encrypted {field} has no paired ephemeral key")]
    Integrity { id: String, field: &'static str },

    /// The signing agent declined or failed to decrypt a field
    #[error("record {id}: {field} could not be decrypted")]
    Decrypt { id: String, field: &'static str },

    /// No signer at signing time, or the signature was declined/malformed
    #[error("authorization signing failed: {0}")]
    Signing(String),

    /// The execute RPC failed
    #[error("migration submit failed: {0}")]
    Submit(String),
}

/// Coarse classification of a [`MigrationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationErrorKind {
    Prerequisite,
    Validation,
    Fetch,
    Integrity,
    Decrypt,
    Signing,
    Submit,
}

impl MigrationError {
    /// The error's kind
    pub fn kind(&self) -> MigrationErrorKind {
        match self {
            Self::Prerequisite(_) => MigrationErrorKind::Prerequisite,
            Self::Validation(_) => MigrationErrorKind::Validation,
            Self::Fetch(_) => MigrationErrorKind::Fetch,
            Self::Integrity { .. } => MigrationErrorKind::Integrity,
            Self::Decrypt { .. } => MigrationErrorKind::Decrypt,
            Self::Signing(_) => MigrationErrorKind::Signing,
            Self::Submit(_) => MigrationErrorKind::Submit,
        }
    }
}
