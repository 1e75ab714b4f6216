//! Key material and signature verification for the rill ledger.
//!
//! Channel claims are authorized off-ledger by a signature from the key
//! pinned on the channel. This crate supplies the key types, the tagged
//! wire encoding, and strict verification; message construction lives with
//! the transactors.

mod error;
mod keys;

pub use error::CryptoError;
pub use keys::{key_type, KeyType, PublicKey, SecretKey, Signature, ED25519_TAG};
