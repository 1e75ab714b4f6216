//! Closing a payment channel.
//!
//! Close is reached three ways: the expiration sweep on any touch after
//! `cancel_after` or `expiration`, an owner close of a drained channel, and
//! a destination close. Whatever the path, the unspent remainder goes back
//! to the owner, both directory references disappear, and the entry is
//! erased. Either all of that happens or none of it: the issued-token
//! refund is dry-run before the first mutation.

use rill_common::{Amount, EntryType, Feature, Hash256, Keylet};

use crate::result::ResultCode;
use crate::state::{adjust_locked_balance, dir_remove, ApplyView, ChannelEntry, RunMode};

/// Close the channel at `key`, refunding `amount - balance` to the owner.
pub fn close_channel(view: &mut ApplyView, key: &Hash256, chan: &ChannelEntry) -> ResultCode {
    let Some(remaining) = chan.amount.checked_sub(&chan.balance) else {
        return ResultCode::Internal;
    };
    let refund = Amount {
        value: -remaining.value,
        asset: remaining.asset,
    };

    if !remaining.is_native() {
        if !view.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::Internal;
        }
        let code = adjust_locked_balance(view, &chan.owner, &refund, -1, RunMode::DryRun);
        tracing::trace!(%code, "close refund dry run");
        if !code.is_success() {
            return code;
        }
    }

    if !dir_remove(view, &chan.owner, chan.owner_node, key) {
        tracing::error!(owner = %chan.owner, channel = %key, "channel missing from owner directory");
        return ResultCode::BadLedger;
    }
    if let Some(node) = chan.destination_node {
        if view.enabled(Feature::RecipientChannelDirectory)
            && !dir_remove(view, &chan.destination, node, key)
        {
            tracing::error!(
                destination = %chan.destination,
                channel = %key,
                "channel missing from destination directory"
            );
            return ResultCode::BadLedger;
        }
    }

    if remaining.is_native() {
        let Some(mut sle) = view.account(&chan.owner) else {
            return ResultCode::Internal;
        };
        let Some(balance) = sle.balance.checked_add(remaining.value) else {
            return ResultCode::Internal;
        };
        sle.balance = balance;
        sle.owner_count = sle.owner_count.saturating_sub(1);
        view.put_account(sle);
    } else {
        let code = adjust_locked_balance(view, &chan.owner, &refund, -1, RunMode::WetRun);
        tracing::trace!(%code, "close refund wet run");
        if !code.is_success() {
            return code;
        }
        let Some(mut sle) = view.account(&chan.owner) else {
            return ResultCode::Internal;
        };
        sle.owner_count = sle.owner_count.saturating_sub(1);
        view.put_account(sle);
    }

    view.erase(&Keylet::from_key(EntryType::Channel, *key));
    ResultCode::Success
}

/// Whether the channel must be closed by the expiration sweep as of
/// `close_time`.
pub fn expired(chan: &ChannelEntry, close_time: u64) -> bool {
    let cancelled = chan
        .cancel_after
        .map(|t| close_time >= t)
        .unwrap_or(false);
    let lapsed = chan.expiration.map(|t| close_time >= t).unwrap_or(false);
    cancelled || lapsed
}
