// SPDX-FileCopyrightText: © 2026 Lucky Kat Studios
// SPDX-License-Identifier: AGPL-3.0-or-later

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a wallet public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Expected {PUBLIC_KEY_LENGTH} key bytes, got {0}")]
    Length(usize),

    #[error("Invalid base58: {0}")]
    Encoding(String),
}

/// A wallet public key, held as raw bytes and rendered as base58.
///
/// Key material handed over by the external wallet is copied and revalidated
/// into this type; the adapter never holds onto the wallet's own
/// representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; PUBLIC_KEY_LENGTH]);

impl PublicKey {
    pub fn new(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Copy and validate raw key bytes reported by the wallet.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::Length(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0
    }

    pub fn to_base58(self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base58())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// An opaque serialized transaction, forwarded to the wallet untouched.
///
/// The adapter never inspects or re-signs transaction payloads; it only
/// shuttles them to the external signer and back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction(Vec<u8>);

impl Transaction {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self(payload.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_roundtrip() {
        let key = PublicKey::new([42u8; PUBLIC_KEY_LENGTH]);
        let parsed: PublicKey = key.to_base58().parse().unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn rejects_short_key_bytes() {
        assert_eq!(
            PublicKey::from_bytes(&[1u8; 31]),
            Err(KeyError::Length(31))
        );
    }

    #[test]
    fn rejects_long_key_bytes() {
        assert_eq!(
            PublicKey::from_bytes(&[1u8; 33]),
            Err(KeyError::Length(33))
        );
    }

    #[test]
    fn rejects_non_base58_text() {
        let err = "not-base58-0OIl".parse::<PublicKey>().unwrap_err();
        assert!(matches!(err, KeyError::Encoding(_)));
    }

    #[test]
    fn transaction_preserves_payload() {
        let tx = Transaction::new(&b"payload"[..]);
        assert_eq!(tx.as_bytes(), b"payload");
        assert_eq!(tx.into_bytes(), b"payload".to_vec());
    }
}
