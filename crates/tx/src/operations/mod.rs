//! Transactor dispatch.
//!
//! Each transaction kind implements the three phases as free functions;
//! this module routes a transaction to its kind's implementation. Only
//! `apply` may stage mutations.

use rill_common::FeatureSet;

use crate::envelope::{Transaction, TxBody};
use crate::result::ResultCode;
use crate::state::ApplyView;

pub mod channel_claim;
pub mod channel_close;
pub mod channel_create;
pub mod channel_fund;
pub mod set_hook;

pub use channel_close::close_channel;

/// Stateless validation. May not read ledger state.
pub fn preflight(tx: &Transaction, features: &FeatureSet) -> ResultCode {
    match &tx.body {
        TxBody::ChannelCreate(op) => channel_create::preflight(tx, op, features),
        TxBody::ChannelFund(op) => channel_fund::preflight(tx, op, features),
        TxBody::ChannelClaim(op) => channel_claim::preflight(tx, op, features),
        TxBody::SetHook(op) => set_hook::preflight(tx, op, features),
    }
}

/// State validation without mutation. The framework discards anything a
/// preclaim stages, so dry-run helpers may be called freely.
pub fn preclaim(tx: &Transaction, view: &mut ApplyView) -> ResultCode {
    match &tx.body {
        TxBody::ChannelCreate(op) => channel_create::preclaim(tx, op, view),
        TxBody::ChannelFund(op) => channel_fund::preclaim(tx, op, view),
        TxBody::ChannelClaim(op) => channel_claim::preclaim(tx, op, view),
        TxBody::SetHook(op) => set_hook::preclaim(tx, op, view),
    }
}

/// The mutating phase.
pub fn apply(tx: &Transaction, view: &mut ApplyView) -> ResultCode {
    match &tx.body {
        TxBody::ChannelCreate(op) => channel_create::apply(tx, op, view),
        TxBody::ChannelFund(op) => channel_fund::apply(tx, op, view),
        TxBody::ChannelClaim(op) => channel_claim::apply(tx, op, view),
        TxBody::SetHook(op) => set_hook::apply(tx, op, view),
    }
}
