//! Cryptographic identity module
//!
//! This module covers the client-side cryptographic surface of the admin
//! console: public key parsing and normalization, the external signing
//! agent interface, per-field decryption, and the signed authorization
//! event submitted with a key migration.
//!
//! The private key never exists in this process. All decryption and
//! signing is delegated to an external signing agent behind the
//! [`ExternalSigner`] trait.

pub mod cipher;
pub mod event;
pub mod pubkey;
pub mod signer;

// Re-exports
pub use cipher::FieldCipher;
pub use event::{SignedAuthorizationEvent, UnsignedEvent, AUTH_EVENT_KIND};
pub use pubkey::{AdminPubkey, PubkeyParseError};
pub use signer::{ExternalSigner, SignerCapabilities, SignerError};
