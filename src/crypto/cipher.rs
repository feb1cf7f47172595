//! Per-field decryption
//!
//! [`FieldCipher`] decrypts one ciphertext/ephemeral-key pair at a time by
//! delegating to the external signing agent. It has no side effects beyond
//! the agent's own interactive prompt, and it never sees a record: pairing
//! integrity is the caller's responsibility and is checked before this
//! module is ever invoked.

use std::sync::Arc;

use crate::crypto::signer::{ExternalSigner, SignerError};

/// Decrypts individual encrypted field values via the signing agent
#[derive(Clone)]
pub struct FieldCipher {
    signer: Arc<dyn ExternalSigner>,
}

impl FieldCipher {
    /// Create a field cipher over a signing agent
    pub fn new(signer: Arc<dyn ExternalSigner>) -> Self {
        Self { signer }
    }

    /// Decrypt one ciphertext with its paired ephemeral public key
    ///
    /// `Ok(None)` means the agent declined or could not decrypt; callers
    /// must treat that exactly like `Err` and abort the whole run.
    pub async fn decrypt(
        &self,
        ciphertext: &str,
        ephemeral_pubkey: &str,
    ) -> Result<Option<String>, SignerError> {
        self.signer.decrypt(ciphertext, ephemeral_pubkey).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::MockExternalSigner;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_decrypt_delegates_to_signer() {
        let mut signer = MockExternalSigner::new();
        signer
            .expect_decrypt()
            .with(eq("ct"), eq("ek"))
            .times(1)
            .returning(|_, _| Ok(Some("plaintext".to_string())));

        let cipher = FieldCipher::new(Arc::new(signer));
        let result = cipher.decrypt("ct", "ek").await.unwrap();

        assert_eq!(result.as_deref(), Some("plaintext"));
    }

    #[tokio::test]
    async fn test_decrypt_surfaces_decline_as_none() {
        let mut signer = MockExternalSigner::new();
        signer.expect_decrypt().returning(|_, _| Ok(None));

        let cipher = FieldCipher::new(Arc::new(signer));
        assert_eq!(cipher.decrypt("ct", "ek").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_decrypt_surfaces_agent_errors() {
        let mut signer = MockExternalSigner::new();
        signer
            .expect_decrypt()
            .returning(|_, _| Err(SignerError::Agent("boom".to_string())));

        let cipher = FieldCipher::new(Arc::new(signer));
        assert!(cipher.decrypt("ct", "ek").await.is_err());
    }
}
