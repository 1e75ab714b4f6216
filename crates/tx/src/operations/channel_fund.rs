//! Channel funding and expiration extension.
//!
//! Only the owner may add funds or extend the close time. Any fund attempt
//! that touches a lapsed channel closes it instead, whoever sent it.

use rill_common::{Feature, FeatureSet};

use super::channel_close::{close_channel, expired};
use crate::envelope::{ChannelFund, Transaction, TF_UNIVERSAL_MASK};
use crate::result::ResultCode;
use crate::state::{adjust_locked_balance, ApplyView, RunMode};

pub fn preflight(tx: &Transaction, op: &ChannelFund, features: &FeatureSet) -> ResultCode {
    if features.enabled(Feature::StrictTransactionFlags) && tx.flags & TF_UNIVERSAL_MASK != 0 {
        return ResultCode::InvalidFlags;
    }

    if !op.amount.is_native() {
        if !features.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::MalformedAmount;
        }
        if op.amount.asset.is_fake_native() {
            return ResultCode::MalformedCurrency;
        }
        if Some(&tx.account) == op.amount.asset.issuer() {
            return ResultCode::DestinationIsSource;
        }
    }

    if !op.amount.is_positive() {
        return ResultCode::MalformedAmount;
    }

    ResultCode::Success
}

pub fn preclaim(_tx: &Transaction, op: &ChannelFund, view: &mut ApplyView) -> ResultCode {
    if view.channel(&op.channel).is_none() {
        return ResultCode::NoEntry;
    }
    ResultCode::Success
}

pub fn apply(tx: &Transaction, op: &ChannelFund, view: &mut ApplyView) -> ResultCode {
    let Some(mut chan) = view.channel(&op.channel) else {
        return ResultCode::NoEntry;
    };

    // The channel's asset is fixed for life.
    if op.amount.asset != chan.amount.asset {
        return ResultCode::MalformedAmount;
    }

    // Anything staged after this dry run can trust the wet run to land.
    if !op.amount.is_native() && view.enabled(Feature::IssuedTokenChannels) {
        let code = adjust_locked_balance(view, &chan.owner, &op.amount, 1, RunMode::DryRun);
        tracing::trace!(%code, "fund lock dry run");
        if !code.is_success() {
            return code;
        }
    }

    let close_time = view.info().parent_close_time;
    if expired(&chan, close_time) {
        return close_channel(view, &op.channel, &chan);
    }

    if chan.owner != tx.account {
        // Only the owner can add funds or extend.
        return ResultCode::NoPermission;
    }

    if let Some(extend) = op.expiration {
        let mut min_expiration = close_time + chan.settle_delay as u64;
        if let Some(current) = chan.expiration {
            // An already-advertised earlier close becomes the floor.
            if current < min_expiration {
                min_expiration = current;
            }
        }
        if extend < min_expiration {
            return ResultCode::MalformedExpiration;
        }
        chan.expiration = Some(extend);
        view.put_channel(&op.channel, chan.clone());
    }

    let Some(mut sle) = view.account(&tx.account) else {
        return ResultCode::Internal;
    };

    // Do not allow adding funds if the destination is gone.
    if view.account(&chan.destination).is_none() {
        return ResultCode::NoDestination;
    }

    let reserve = view.fees().account_reserve(sle.owner_count);
    if sle.balance < reserve {
        return ResultCode::InsufficientReserve;
    }

    if op.amount.is_native() {
        if sle.balance < reserve + op.amount.value {
            return ResultCode::Unfunded;
        }
        sle.balance -= op.amount.value;
        view.put_account(sle);
    } else {
        if !view.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::Internal;
        }
        let code = adjust_locked_balance(view, &chan.owner, &op.amount, 1, RunMode::WetRun);
        tracing::trace!(%code, "fund lock wet run");
        if !code.is_success() {
            return ResultCode::Internal;
        }
    }

    let Some(amount) = chan.amount.checked_add(&op.amount) else {
        return ResultCode::Internal;
    };
    chan.amount = amount;
    view.put_channel(&op.channel, chan);

    ResultCode::Success
}
