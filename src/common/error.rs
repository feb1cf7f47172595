//! Error handling module
//!
//! This module defines the crate-level error type and result alias used
//! throughout the application. Protocol-specific failures have their own
//! taxonomy in [`crate::migration::MigrationError`]; everything here is the
//! ambient plumbing those errors ride on.

use thiserror::Error;
use std::io;

use crate::migration::MigrationError;
use crate::store::StoreError;

/// Sanctum admin error type
#[derive(Error, Debug)]
pub enum AdminError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record store error
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Migration protocol error
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;
