//! Channel claims, renewal, and close requests.
//!
//! The recipient redeems a signed off-ledger claim to collect up to the
//! authorized cumulative balance; the owner may deliver directly without a
//! signature. `TF_RENEW` (owner only) clears a scheduled expiration;
//! `TF_CLOSE` closes immediately for the recipient or a drained channel,
//! and otherwise schedules the close one settle delay out.

use rill_common::{Feature, FeatureSet};
use rill_crypto::key_type;

use super::channel_close::{close_channel, expired};
use crate::auth::verify_claim_signature;
use crate::envelope::{ChannelClaim, Transaction, TF_CHANNEL_CLAIM_MASK, TF_CLOSE, TF_RENEW};
use crate::result::ResultCode;
use crate::state::{
    transfer_locked_balance, ApplyView, RunMode, ACCOUNT_DEPOSIT_AUTH, ACCOUNT_DISALLOW_NATIVE,
};

pub fn preflight(tx: &Transaction, op: &ChannelClaim, features: &FeatureSet) -> ResultCode {
    if let Some(balance) = &op.balance {
        if !balance.is_native() && !features.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::MalformedAmount;
        }
        if !balance.is_positive() {
            return ResultCode::MalformedAmount;
        }
    }

    if let Some(amount) = &op.amount {
        if !amount.is_native() && !features.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::MalformedAmount;
        }
        if !amount.is_positive() {
            return ResultCode::MalformedAmount;
        }
    }

    if let (Some(balance), Some(amount)) = (&op.balance, &op.amount) {
        if balance.asset != amount.asset {
            return ResultCode::MalformedAmount;
        }
        if balance.value > amount.value {
            return ResultCode::MalformedAmount;
        }
    }

    if features.enabled(Feature::StrictTransactionFlags) && tx.flags & TF_CHANNEL_CLAIM_MASK != 0 {
        return ResultCode::InvalidFlags;
    }
    if tx.flags & TF_CLOSE != 0 && tx.flags & TF_RENEW != 0 {
        return ResultCode::Malformed;
    }

    if let Some(signature) = &op.signature {
        // The signature is not needed when the owner claims, but a present
        // one must check out.
        let (Some(public_key), Some(balance)) = (&op.public_key, &op.balance) else {
            return ResultCode::Malformed;
        };
        let authorized = op.amount.as_ref().unwrap_or(balance);
        if balance.value > authorized.value {
            return ResultCode::MalformedAmount;
        }
        if key_type(public_key).is_none() {
            return ResultCode::Malformed;
        }
        if !verify_claim_signature(public_key, &op.channel, authorized, signature) {
            return ResultCode::BadSignature;
        }
    }

    ResultCode::Success
}

pub fn preclaim(_tx: &Transaction, op: &ChannelClaim, view: &mut ApplyView) -> ResultCode {
    if view.channel(&op.channel).is_none() {
        return ResultCode::NoTarget;
    }
    ResultCode::Success
}

pub fn apply(tx: &Transaction, op: &ChannelClaim, view: &mut ApplyView) -> ResultCode {
    let Some(mut chan) = view.channel(&op.channel) else {
        return ResultCode::NoTarget;
    };

    let close_time = view.info().parent_close_time;
    if expired(&chan, close_time) {
        return close_channel(view, &op.channel, &chan);
    }

    let src = chan.owner;
    let dst = chan.destination;
    if tx.account != src && tx.account != dst {
        return ResultCode::NoPermission;
    }

    if let Some(req_balance) = &op.balance {
        if tx.account == dst && op.signature.is_none() {
            return ResultCode::BadSignature;
        }
        if op.signature.is_some() {
            // The signing key must be the one pinned at creation.
            if op.public_key.as_deref() != Some(chan.public_key.as_slice()) {
                return ResultCode::BadSigner;
            }
        }

        if req_balance.asset != chan.amount.asset {
            return ResultCode::MalformedAmount;
        }
        if req_balance.value > chan.amount.value {
            return ResultCode::UnfundedPayment;
        }
        if req_balance.value <= chan.balance.value {
            // Nothing requested.
            return ResultCode::UnfundedPayment;
        }

        let Some(mut sled) = view.account(&dst) else {
            return ResultCode::NoDestination;
        };

        let deposit_auth = view.enabled(Feature::DepositAuthorization);
        if !deposit_auth && tx.account == src && sled.flags & ACCOUNT_DISALLOW_NATIVE != 0 {
            return ResultCode::NoTarget;
        }
        if deposit_auth && sled.flags & ACCOUNT_DEPOSIT_AUTH != 0 && tx.account != dst {
            // Only a preauthorized depositor may push funds in.
            let preauth = rill_common::keylet::deposit_preauth(&dst, &tx.account);
            if !view.exists(&preauth) {
                return ResultCode::NoPermission;
            }
        }

        let Some(delta) = req_balance.checked_sub(&chan.balance) else {
            return ResultCode::Internal;
        };

        if delta.is_native() {
            let Some(balance) = sled.balance.checked_add(delta.value) else {
                return ResultCode::Internal;
            };
            sled.balance = balance;
            view.put_account(sled);
        } else {
            // No ledger modification has happened yet, so the transfer
            // needs no dry run.
            if !view.enabled(Feature::IssuedTokenChannels) {
                return ResultCode::Internal;
            }
            let code =
                transfer_locked_balance(view, &tx.account, &src, &dst, &delta, RunMode::WetRun);
            tracing::trace!(%code, "claim transfer wet run");
            if !code.is_success() {
                return code;
            }
        }

        chan.balance = *req_balance;
        view.put_channel(&op.channel, chan.clone());
    }

    if tx.flags & TF_RENEW != 0 {
        if src != tx.account {
            return ResultCode::NoPermission;
        }
        chan.expiration = None;
        view.put_channel(&op.channel, chan.clone());
    }

    if tx.flags & TF_CLOSE != 0 {
        // Close immediately if the receiver asks, or the channel is dry.
        if dst == tx.account || chan.balance == chan.amount {
            return close_channel(view, &op.channel, &chan);
        }

        let settle_expiration = close_time + chan.settle_delay as u64;
        if chan.expiration.map(|t| t > settle_expiration).unwrap_or(true) {
            chan.expiration = Some(settle_expiration);
            view.put_channel(&op.channel, chan);
        }
    }

    ResultCode::Success
}
