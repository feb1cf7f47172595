//! Migration state machine
//!
//! The protocol's modal flow is an explicit finite-state type plus a pure
//! transition function. The coordinator performs the effects (RPCs,
//! decryption, signing) and feeds the outcomes back in as events; a UI is
//! a renderer of [`MigrationState`] and owns none of the protocol logic.
//!
//! Transition rules worth calling out:
//!
//! * Opening probes the signing agent first; a failed probe goes straight
//!   to `Error`, and `Input` is never shown.
//! * A malformed target key routes to `Error`, not back to `Input`. That
//!   matches the deployed behavior; if product ever wants re-entry
//!   instead, [`MigrationState::apply`] is the one place to change it.
//! * `Close` is refused while in `Progress` so a running attempt cannot be
//!   abandoned; it is accepted in every other state and resets everything.
//! * Unmatched state/event pairs leave the state unchanged.

use crate::crypto::pubkey::AdminPubkey;
use crate::crypto::signer::SignerCapabilities;
use crate::migration::MigrationError;
use crate::store::{MigrationPrepareResponse, MigrationResult};

/// Phase of a running migration attempt, for rendering only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Fetching the encrypted snapshot
    Preparing,
    /// Decrypting the snapshot in memory
    Decrypting,
    /// Waiting for the signing agent to authorize the new key
    Signing,
    /// Submitting the re-encryption request
    Submitting,
}

/// State of the migration modal flow
///
/// `Closed` is the idle state outside the modal. All per-attempt data
/// lives inside the variants, so returning to `Closed` is a full reset by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationState {
    /// No migration in progress
    Closed,

    /// Waiting for the operator to enter a target key
    Input,

    /// Snapshot loaded; waiting for the operator to confirm
    Confirm {
        target: AdminPubkey,
        snapshot: MigrationPrepareResponse,
    },

    /// An attempt is running; closing is refused
    Progress { phase: ProgressPhase },

    /// The migration committed
    Complete { result: MigrationResult },

    /// The attempt failed; only a full reset is offered
    Error { error: MigrationError },
}

/// One protocol event
///
/// Operator actions (`Open`, `Submit`, `Confirm`, `Close`) and effect
/// outcomes (`PrepareLoaded`, `Phase`, `Executed`, `Failed`).
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    /// The operator opened the migration flow; carries the probe result
    Open { capabilities: SignerCapabilities },

    /// The operator submitted a syntactically valid target key
    Submit,

    /// The prepare RPC returned a snapshot for the given target
    PrepareLoaded {
        target: AdminPubkey,
        snapshot: MigrationPrepareResponse,
    },

    /// The operator confirmed the loaded snapshot
    Confirm,

    /// The running attempt advanced to a new phase
    Phase(ProgressPhase),

    /// The execute RPC committed
    Executed { result: MigrationResult },

    /// Some step failed
    Failed { error: MigrationError },

    /// The operator closed the flow
    Close,
}

impl MigrationState {
    /// Apply one event, producing the next state
    ///
    /// Total and pure: unmatched combinations return the state unchanged.
    pub fn apply(self, event: MigrationEvent) -> MigrationState {
        use MigrationEvent as E;
        use MigrationState as S;

        match (self, event) {
            // Opening probes capabilities; a failed probe bypasses Input.
            (S::Closed, E::Open { capabilities }) => match capabilities.missing_capability() {
                None => S::Input,
                Some(message) => S::Error {
                    error: MigrationError::Prerequisite(message.to_string()),
                },
            },

            (S::Input, E::Submit) => S::Progress {
                phase: ProgressPhase::Preparing,
            },

            // The same-key guard lives in the transition so no caller can
            // skip it.
            (S::Progress { .. }, E::PrepareLoaded { target, snapshot }) => {
                if target == snapshot.admin_pubkey {
                    S::Error {
                        error: MigrationError::Validation(
                            "the new admin key must be different from the current one".to_string(),
                        ),
                    }
                } else {
                    S::Confirm { target, snapshot }
                }
            }

            (S::Confirm { .. }, E::Confirm) => S::Progress {
                phase: ProgressPhase::Decrypting,
            },

            (S::Progress { .. }, E::Phase(phase)) => S::Progress { phase },

            (S::Progress { .. }, E::Executed { result }) => S::Complete { result },

            // Failures are accepted from any non-terminal, non-closed state
            // so validation can fail out of Input as well.
            (S::Input, E::Failed { error })
            | (S::Confirm { .. }, E::Failed { error })
            | (S::Progress { .. }, E::Failed { error }) => S::Error { error },

            // Close is refused mid-attempt, accepted everywhere else.
            (state @ S::Progress { .. }, E::Close) => state,
            (_, E::Close) => S::Closed,

            (state, _) => state,
        }
    }

    /// Whether the flow currently refuses to close
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Progress { .. })
    }
}
