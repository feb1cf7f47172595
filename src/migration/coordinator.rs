//! Migration coordinator
//!
//! Drives the admin key migration protocol: probe the signing agent, fetch
//! the encrypted snapshot, decrypt every record in memory, obtain a signed
//! authorization, and submit the whole batch for atomic re-encryption.
//! The coordinator owns the state machine and performs the effects; its
//! dependencies (signer, record store) are injected so the protocol can be
//! exercised entirely against test doubles.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::crypto::cipher::FieldCipher;
use crate::crypto::event::UnsignedEvent;
use crate::crypto::pubkey::AdminPubkey;
use crate::crypto::signer::{ExternalSigner, SignerCapabilities};
use crate::migration::state::{MigrationEvent, MigrationState, ProgressPhase};
use crate::migration::MigrationError;
use crate::store::{
    DecryptedFieldValueRecord, DecryptedUserRecord, EncryptedFieldValueRecord,
    EncryptedRecordStore, EncryptedUserRecord, MigrationPrepareResponse, MigrationResult,
};

/// Sequences one admin key migration attempt at a time
///
/// All methods take `&self`; the coordinator is shared with the rendering
/// layer behind an `Arc`. The state mutex is only ever held for a single
/// transition, never across an await point. The run lock makes the
/// execute phase single-flight: a second confirm while one is running
/// returns immediately without touching the state machine.
pub struct MigrationCoordinator {
    signer: Arc<dyn ExternalSigner>,
    store: Arc<dyn EncryptedRecordStore>,
    cipher: FieldCipher,
    state: Mutex<MigrationState>,
    run_lock: AsyncMutex<()>,
    attempt: Mutex<Option<Uuid>>,
}

impl MigrationCoordinator {
    /// Create a coordinator over a signing agent and record store
    pub fn new(signer: Arc<dyn ExternalSigner>, store: Arc<dyn EncryptedRecordStore>) -> Self {
        let cipher = FieldCipher::new(Arc::clone(&signer));

        Self {
            signer,
            store,
            cipher,
            state: Mutex::new(MigrationState::Closed),
            run_lock: AsyncMutex::new(()),
            attempt: Mutex::new(None),
        }
    }

    /// Current state, for rendering
    pub fn state(&self) -> MigrationState {
        self.state.lock().unwrap().clone()
    }

    /// Open the migration flow
    ///
    /// Probes the signing agent once, synchronously, before anything is
    /// shown; a failed probe lands in `Error` and the input state is never
    /// entered.
    pub fn open(&self) -> MigrationState {
        let capabilities = SignerCapabilities::probe(self.signer.as_ref());

        let attempt = Uuid::new_v4();
        *self.attempt.lock().unwrap() = Some(attempt);
        info!(
            "migration attempt {}: opening (signer present: {}, decryption: {})",
            attempt, capabilities.present, capabilities.decryption
        );

        self.dispatch(MigrationEvent::Open { capabilities })
    }

    /// Submit a candidate target key from the input state
    ///
    /// Validates and normalizes the key, then fetches the snapshot. A
    /// malformed key or a target equal to the current admin key is
    /// terminal.
    pub async fn submit(&self, input: &str) -> MigrationState {
        if !matches!(self.state(), MigrationState::Input) {
            return self.state();
        }

        let target = match AdminPubkey::parse(input) {
            Ok(target) => target,
            Err(e) => {
                warn!("migration: rejected target key: {}", e);
                return self.dispatch(MigrationEvent::Failed {
                    error: MigrationError::Validation(e.to_string()),
                });
            }
        };

        self.dispatch(MigrationEvent::Submit);

        match self.store.prepare().await {
            Ok(snapshot) => {
                debug!(
                    "migration: snapshot holds {} users and {} field values",
                    snapshot.user_count, snapshot.field_value_count
                );
                self.dispatch(MigrationEvent::PrepareLoaded { target, snapshot })
            }
            Err(e) => self.dispatch(MigrationEvent::Failed {
                error: MigrationError::Fetch(e.to_string()),
            }),
        }
    }

    /// Confirm the loaded snapshot and run the migration
    ///
    /// Single-flight: if an attempt is already executing, this returns the
    /// current state without re-entering the protocol. The lock is
    /// released on every exit path.
    ///
    /// Decryption is strictly sequential, users before field values and
    /// array order within each, so a failure is attributed to one specific
    /// record. Nothing is submitted unless every record decrypted and the
    /// signed authorization checks out.
    pub async fn confirm(&self) -> MigrationState {
        let Ok(_guard) = self.run_lock.try_lock() else {
            debug!("migration: confirm ignored, an attempt is already executing");
            return self.state();
        };

        let (target, snapshot) = match self.state() {
            MigrationState::Confirm { target, snapshot } => (target, snapshot),
            other => return other,
        };

        self.dispatch(MigrationEvent::Confirm);

        match self.run_attempt(target, snapshot).await {
            Ok(result) => {
                info!(
                    "migration: committed, {} users and {} field values re-encrypted",
                    result.users_migrated, result.field_values_migrated
                );
                self.dispatch(MigrationEvent::Executed { result })
            }
            Err(error) => {
                warn!("migration: attempt failed: {}", error);
                self.dispatch(MigrationEvent::Failed { error })
            }
        }
    }

    /// Close the flow
    ///
    /// Refused while an attempt is executing; otherwise resets all
    /// transient state.
    pub fn close(&self) -> MigrationState {
        let state = self.dispatch(MigrationEvent::Close);

        if matches!(state, MigrationState::Closed) {
            if let Some(attempt) = self.attempt.lock().unwrap().take() {
                debug!("migration attempt {}: closed", attempt);
            }
        }

        state
    }

    /// Apply one event under the state lock
    fn dispatch(&self, event: MigrationEvent) -> MigrationState {
        let mut state = self.state.lock().unwrap();
        let previous = std::mem::replace(&mut *state, MigrationState::Closed);
        *state = previous.apply(event);

        debug!("migration state: {}", state_label(&state));
        state.clone()
    }

    async fn run_attempt(
        &self,
        target: AdminPubkey,
        snapshot: MigrationPrepareResponse,
    ) -> Result<MigrationResult, MigrationError> {
        // Plaintext only ever lives in these two buffers; both zeroize on
        // drop, whether the attempt commits or fails.
        let users = self.decrypt_users(&snapshot.users).await?;
        let field_values = self.decrypt_field_values(&snapshot.field_values).await?;

        self.dispatch(MigrationEvent::Phase(ProgressPhase::Signing));

        if !self.signer.is_present() {
            return Err(MigrationError::Signing(
                "signing agent is no longer available".to_string(),
            ));
        }

        let unsigned = UnsignedEvent::migration_authorization(&target);
        let signed = self
            .signer
            .sign_event(unsigned)
            .await
            .map_err(|e| MigrationError::Signing(e.to_string()))?;
        signed
            .verify_shape(&target)
            .map_err(|e| MigrationError::Signing(e.to_string()))?;

        self.dispatch(MigrationEvent::Phase(ProgressPhase::Submitting));

        self.store
            .execute(target, users, field_values, signed)
            .await
            .map_err(|e| MigrationError::Submit(e.to_string()))
    }

    async fn decrypt_users(
        &self,
        records: &[EncryptedUserRecord],
    ) -> Result<Vec<DecryptedUserRecord>, MigrationError> {
        let mut decrypted = Vec::with_capacity(records.len());

        for record in records {
            // Both pairings are checked before any decryption of the
            // record is attempted.
            let email_pair = record.email().map_err(|_| MigrationError::Integrity {
                id: record.id.clone(),
                field: "email",
            })?;
            let name_pair = record.name().map_err(|_| MigrationError::Integrity {
                id: record.id.clone(),
                field: "name",
            })?;

            let email = self.decrypt_field(&record.id, "email", email_pair).await?;
            let name = self.decrypt_field(&record.id, "name", name_pair).await?;

            decrypted.push(DecryptedUserRecord {
                id: record.id.clone(),
                email,
                name,
            });
        }

        Ok(decrypted)
    }

    async fn decrypt_field_values(
        &self,
        records: &[EncryptedFieldValueRecord],
    ) -> Result<Vec<DecryptedFieldValueRecord>, MigrationError> {
        let mut decrypted = Vec::with_capacity(records.len());

        for record in records {
            let pair = record.value().map_err(|_| MigrationError::Integrity {
                id: record.id.clone(),
                field: "value",
            })?;

            let value = self.decrypt_field(&record.id, "value", pair).await?;

            decrypted.push(DecryptedFieldValueRecord {
                id: record.id.clone(),
                value,
            });
        }

        Ok(decrypted)
    }

    /// Decrypt one present field; a decline or agent failure aborts the
    /// attempt
    async fn decrypt_field(
        &self,
        id: &str,
        field: &'static str,
        pair: Option<(&str, &str)>,
    ) -> Result<Option<String>, MigrationError> {
        let Some((ciphertext, ephemeral_pubkey)) = pair else {
            return Ok(None);
        };

        match self.cipher.decrypt(ciphertext, ephemeral_pubkey).await {
            Ok(Some(plaintext)) => Ok(Some(plaintext)),
            Ok(None) | Err(_) => Err(MigrationError::Decrypt {
                id: id.to_string(),
                field,
            }),
        }
    }
}

fn state_label(state: &MigrationState) -> &'static str {
    match state {
        MigrationState::Closed => "closed",
        MigrationState::Input => "input",
        MigrationState::Confirm { .. } => "confirm",
        MigrationState::Progress {
            phase: ProgressPhase::Preparing,
        } => "progress/preparing",
        MigrationState::Progress {
            phase: ProgressPhase::Decrypting,
        } => "progress/decrypting",
        MigrationState::Progress {
            phase: ProgressPhase::Signing,
        } => "progress/signing",
        MigrationState::Progress {
            phase: ProgressPhase::Submitting,
        } => "progress/submitting",
        MigrationState::Complete { .. } => "complete",
        MigrationState::Error { .. } => "error",
    }
}
