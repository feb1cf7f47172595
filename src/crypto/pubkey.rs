//! Admin public key parsing and normalization
//!
//! The input boundary accepts two encodings of the 32-byte admin public
//! key: 64-character hex, or the bech32 `npub` form. Both normalize to the
//! same canonical value, so every comparison, signature tag, and wire field
//! in the rest of the crate operates on [`AdminPubkey`] and never on raw
//! user input.

use std::fmt;
use std::str::FromStr;

use bech32::FromBase32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a canonical hex-encoded public key
pub const PUBKEY_HEX_LEN: usize = 64;

/// Human-readable part of the bech32 public key encoding
const PUBKEY_HRP: &str = "npub";

/// Public key parse error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PubkeyParseError {
    /// Input is neither 64 hex characters nor an `npub` string
    #[error("expected a 64-character hex key or an npub string, got {0} characters")]
    Length(usize),

    /// Hex form contained a non-hex character
    #[error("invalid hex character in public key")]
    InvalidHex,

    /// Bech32 decoding failed
    #[error("invalid npub encoding: {0}")]
    InvalidBech32(String),

    /// Bech32 string has the wrong human-readable part
    #[error("expected an npub key, got prefix {0:?}")]
    WrongPrefix(String),

    /// Decoded key is not 32 bytes
    #[error("decoded public key is {0} bytes, expected 32")]
    WrongLength(usize),
}

/// A normalized admin public key
///
/// Always holds exactly 32 bytes; its canonical text form is 64 lowercase
/// hex characters. Normalization is idempotent: parsing the display form of
/// any `AdminPubkey` yields the same value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdminPubkey([u8; 32]);

impl AdminPubkey {
    /// Parse a public key from either accepted encoding
    ///
    /// Surrounding whitespace is ignored. Hex input is accepted in any
    /// case; the result always normalizes to lowercase.
    pub fn parse(input: &str) -> Result<Self, PubkeyParseError> {
        let input = input.trim();

        if input.to_ascii_lowercase().starts_with("npub1") {
            return Self::parse_bech32(input);
        }

        Self::parse_hex(input)
    }

    /// Canonical 64-character lowercase hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn parse_hex(input: &str) -> Result<Self, PubkeyParseError> {
        if input.len() != PUBKEY_HEX_LEN {
            return Err(PubkeyParseError::Length(input.len()));
        }

        let bytes = hex::decode(input).map_err(|_| PubkeyParseError::InvalidHex)?;

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    fn parse_bech32(input: &str) -> Result<Self, PubkeyParseError> {
        let (hrp, data, _variant) = bech32::decode(input)
            .map_err(|e| PubkeyParseError::InvalidBech32(e.to_string()))?;

        if hrp != PUBKEY_HRP {
            return Err(PubkeyParseError::WrongPrefix(hrp));
        }

        let bytes = Vec::<u8>::from_base32(&data)
            .map_err(|e| PubkeyParseError::InvalidBech32(e.to_string()))?;

        if bytes.len() != 32 {
            return Err(PubkeyParseError::WrongLength(bytes.len()));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }
}

impl FromStr for AdminPubkey {
    type Err = PubkeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AdminPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AdminPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdminPubkey({})", self.to_hex())
    }
}

impl TryFrom<String> for AdminPubkey {
    type Error = PubkeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AdminPubkey> for String {
    fn from(value: AdminPubkey) -> Self {
        value.to_hex()
    }
}
