//! External signing agent interface
//!
//! The admin's private key lives in an external signing agent (in
//! production, a browser extension). This module defines the
//! capability-probed trait the rest of the crate depends on, so the agent
//! is an injected dependency rather than ambient global state, and a test
//! double can stand in for it.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::crypto::event::{SignedAuthorizationEvent, UnsignedEvent};

/// Signing agent error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// No signing agent is available
    #[error("signing agent is not available")]
    Unavailable,

    /// The key holder declined the request in the agent's own UI
    #[error("request was declined in the signing agent")]
    Declined,

    /// The agent failed for some other reason
    #[error("signing agent failure: {0}")]
    Agent(String),
}

/// External signing agent
///
/// Both probe methods are synchronous and must be cheap; they are evaluated
/// once before the migration flow opens, and a failed probe blocks the flow
/// entirely. The async methods may prompt the key holder interactively and
/// therefore have no timeout imposed here.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    /// Whether a signing agent is detected at all
    fn is_present(&self) -> bool;

    /// Whether the agent advertises the asymmetric decryption capability
    /// used for encrypted PII fields
    fn supports_decryption(&self) -> bool;

    /// Decrypt a ciphertext encrypted to the admin key
    ///
    /// `Ok(None)` means the agent declined or failed to produce a
    /// plaintext; callers treat it exactly like an error.
    async fn decrypt(
        &self,
        ciphertext: &str,
        ephemeral_pubkey: &str,
    ) -> Result<Option<String>, SignerError>;

    /// Sign an authorization event with the admin's private key
    async fn sign_event(
        &self,
        event: UnsignedEvent,
    ) -> Result<SignedAuthorizationEvent, SignerError>;
}

/// Result of probing a signing agent's capabilities
///
/// Captured once per migration attempt, before any state is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerCapabilities {
    /// Agent detected
    pub present: bool,

    /// Agent supports field decryption
    pub decryption: bool,
}

impl SignerCapabilities {
    /// Probe a signer once, synchronously
    pub fn probe(signer: &dyn ExternalSigner) -> Self {
        let present = signer.is_present();
        let decryption = present && signer.supports_decryption();

        Self { present, decryption }
    }

    /// Whether the migration flow may open at all
    pub fn sufficient(&self) -> bool {
        self.present && self.decryption
    }

    /// Remediation message for a failed probe, if any
    pub fn missing_capability(&self) -> Option<&'static str> {
        if !self.present {
            Some("no signing extension detected; install and unlock it, then reload")
        } else if !self.decryption {
            Some("the signing extension does not support decryption; update it to a version that does")
        } else {
            None
        }
    }
}
