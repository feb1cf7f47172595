//! Sanctum Admin: key migration client for the Sanctum hosted service
//!
//! This library implements the admin console's one genuinely delicate
//! subsystem: rotating the administrator's cryptographic identity while
//! re-encrypting every piece of user PII that was encrypted to the old
//! admin public key. The private key lives exclusively in an external
//! signing agent; no plaintext ever exists server-side, and no
//! partial-migration state is permitted.
//!
//! # Main Features
//!
//! - Explicit migration state machine with fail-closed semantics
//! - Capability-probed external signing agent interface
//! - In-memory-only field decryption with zeroized plaintext buffers
//! - CSRF-protected transport for all state-changing API calls
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sanctum_admin::config::AdminConfig;
//! use sanctum_admin::migration::{MigrationCoordinator, MigrationState};
//! use sanctum_admin::store::HttpRecordStore;
//! use sanctum_admin::transport::SecureTransport;
//! # use sanctum_admin::crypto::ExternalSigner;
//!
//! # async fn run(signer: Arc<dyn ExternalSigner>) -> sanctum_admin::Result<()> {
//! let config = AdminConfig::default();
//! let transport = Arc::new(SecureTransport::new(&config)?);
//! let store = Arc::new(HttpRecordStore::new(transport));
//!
//! let coordinator = MigrationCoordinator::new(signer, store);
//!
//! coordinator.open();
//! coordinator.submit("npub1...").await;
//! if let MigrationState::Confirm { snapshot, .. } = coordinator.state() {
//!     println!("about to migrate {} users", snapshot.user_count);
//!     coordinator.confirm().await;
//! }
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod crypto;
pub mod migration;
pub mod store;
pub mod transport;

// Re-export commonly used structures and functions for convenience
pub use common::{AdminError, Result};
pub use crypto::{AdminPubkey, ExternalSigner, FieldCipher};
pub use migration::{MigrationCoordinator, MigrationState};
pub use store::{EncryptedRecordStore, HttpRecordStore};
pub use transport::SecureTransport;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
