//! Ed25519 key types and tagged channel-key encoding.
//!
//! This module provides the key types used by the ledger:
//!
//! - [`PublicKey`]: a 32-byte ed25519 verifying key
//! - [`SecretKey`]: a 32-byte ed25519 signing key
//! - [`Signature`]: a 64-byte ed25519 signature
//!
//! On the wire, channel keys are 33 bytes: a one-byte curve tag followed by
//! the raw key. Ed25519 keys carry the [`ED25519_TAG`] prefix and are the
//! single recognized key type; [`key_type`] rejects everything else so a
//! malformed tag can never pin an unverifiable key on a channel.
//!
//! # Example
//!
//! ```
//! use rill_crypto::{key_type, KeyType, SecretKey};
//!
//! let secret = SecretKey::generate();
//! let tagged = secret.public_key().to_tagged_bytes();
//! assert_eq!(key_type(&tagged), Some(KeyType::Ed25519));
//! ```

use crate::error::CryptoError;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;

/// Curve tag prefixing ed25519 keys in their 33-byte wire form.
pub const ED25519_TAG: u8 = 0xED;

/// Recognized key curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
}

/// Classify tagged public key material by its curve tag.
///
/// Returns `None` for the wrong length or an unknown tag.
pub fn key_type(tagged: &[u8]) -> Option<KeyType> {
    if tagged.len() != 33 {
        return None;
    }
    match tagged[0] {
        ED25519_TAG => Some(KeyType::Ed25519),
        _ => None,
    }
}

/// An ed25519 public key (verifying key).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Creates a public key from raw 32-byte ed25519 key material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the bytes do not
    /// represent a valid point on the curve.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let key = VerifyingKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(key))
    }

    /// Creates a public key from its 33-byte tagged wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownKeyType`] for a bad tag or length, or
    /// [`CryptoError::InvalidPublicKey`] for an invalid curve point.
    pub fn from_tagged_bytes(tagged: &[u8]) -> Result<Self, CryptoError> {
        match key_type(tagged) {
            Some(KeyType::Ed25519) => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&tagged[1..]);
                Self::from_bytes(&bytes)
            }
            None => Err(CryptoError::UnknownKeyType),
        }
    }

    /// Returns the raw 32-byte key material.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Returns the 33-byte tagged wire form.
    pub fn to_tagged_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(33);
        out.push(ED25519_TAG);
        out.extend_from_slice(self.as_bytes());
        out
    }

    /// Verifies a signature over a message.
    ///
    /// Uses strict verification, which rejects the non-canonical signature
    /// encodings a plain verify would accept. Replicated validation must
    /// agree bit-for-bit on which signatures pass.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignature`] if verification fails.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.0
            .verify_strict(message, &sig)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.as_bytes()))
    }
}

/// An ed25519 secret key (signing key).
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl SecretKey {
    /// Generates a fresh random keypair.
    pub fn generate() -> Self {
        Self(SigningKey::generate(&mut OsRng))
    }

    /// Creates a secret key from raw 32-byte seed material.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(bytes))
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Signs a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        write!(f, "SecretKey(..)")
    }
}

/// A 64-byte ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Creates a signature from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignature`] if the slice is not
    /// exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 64 {
            return Err(CryptoError::InvalidSignature);
        }
        let mut arr = [0u8; 64];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}
