//! Crypto error types.

use thiserror::Error;

/// Errors from key handling and signature verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Bytes do not encode a valid public key.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Bytes do not encode a valid secret key.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,

    /// Key material carries an unknown curve tag.
    #[error("unknown key type")]
    UnknownKeyType,
}
