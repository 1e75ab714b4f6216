//! Ledger-state transactors for the rill ledger.
//!
//! This crate implements the deterministic state-transition core of an
//! account-based, consensus-replicated ledger: unidirectional payment
//! channels (create, fund, claim) and per-account WASM hooks (install,
//! state storage, sandboxed execution). Every transactor reads a proposed
//! transaction, validates it against an immutable view of the ledger, and
//! mutates the ledger atomically only if every precondition and
//! post-invariant holds. Replicas applying the same transactions to the
//! same pre-state produce byte-identical post-states.
//!
//! # Structure
//!
//! - [`envelope`] - typed transactions and their flag bits
//! - [`state`] - ledger entries, the apply view, directories, trust lines
//! - [`operations`] - the four transactors, one module per kind
//! - [`hooks`] - the WASM sandbox, host API, and state commit protocol
//! - [`auth`] - off-ledger claim authorization messages
//! - [`apply`] - the three-phase framework and commit discipline
//!
//! # Example
//!
//! ```ignore
//! use rill_tx::{apply_transaction, HookRuntime, Ledger};
//!
//! let mut ledger: Ledger = /* seeded elsewhere */;
//! let hooks = HookRuntime::new(ledger.hook_params);
//! let applied = apply_transaction(&mut ledger, &tx, &hooks);
//! assert!(applied.code.is_success());
//! ```

pub mod apply;
pub mod auth;
pub mod envelope;
mod error;
pub mod hooks;
pub mod operations;
mod result;
pub mod state;

pub use apply::{apply_transaction, Applied};
pub use auth::{claim_authorization_message, sign_claim, verify_claim_signature};
pub use envelope::{
    ChannelClaim, ChannelCreate, ChannelFund, SetHook, Transaction, TxBody, TxType,
    TF_CHANNEL_CLAIM_MASK, TF_CLOSE, TF_RENEW, TF_UNIVERSAL_MASK,
};
pub use error::TxError;
pub use hooks::{ExitType, HookOutcome, HookRuntime};
pub use result::{ResultClass, ResultCode};
pub use state::{ApplyView, Ledger, LedgerInfo};

/// Result type alias for fallible crate internals.
pub type Result<T> = std::result::Result<T, TxError>;
