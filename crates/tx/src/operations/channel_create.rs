//! Channel creation.
//!
//! Creates a unidirectional channel from the sender to the destination,
//! sequestering the funded amount: native funds move out of the owner's
//! balance into the channel entry, issued tokens are locked on the owner's
//! trust line. The channel entry is registered in the owner's directory
//! and, when the recipient-directory amendment is active, in the
//! destination's.

use rill_common::{keylet, Feature, FeatureSet};
use rill_crypto::key_type;

use crate::envelope::{ChannelCreate, Transaction, TF_UNIVERSAL_MASK};
use crate::result::ResultCode;
use crate::state::{
    adjust_locked_balance, dir_insert, transfer_allowed, ApplyView, ChannelEntry, RunMode,
    ACCOUNT_DISALLOW_NATIVE, ACCOUNT_REQUIRE_DEST_TAG,
};

pub fn preflight(tx: &Transaction, op: &ChannelCreate, features: &FeatureSet) -> ResultCode {
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
            tracing::trace!("cannot fund a channel with the sender's own tokens");
            return ResultCode::DestinationIsSource;
        }
    }

    if !op.amount.is_positive() {
        return ResultCode::MalformedAmount;
    }
    if tx.account == op.destination {
        return ResultCode::DestinationIsSource;
    }
    if key_type(&op.public_key).is_none() {
        return ResultCode::Malformed;
    }

    ResultCode::Success
}

pub fn preclaim(tx: &Transaction, op: &ChannelCreate, view: &mut ApplyView) -> ResultCode {
    let Some(sle) = view.account(&tx.account) else {
        return ResultCode::NoAccount;
    };

    let reserve = view.fees().account_reserve(sle.owner_count + 1);
    if sle.balance < reserve {
        return ResultCode::InsufficientReserve;
    }

    if op.amount.is_native() {
        if sle.balance < reserve + op.amount.value {
            return ResultCode::Unfunded;
        }
    } else {
        if !view.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::Internal;
        }

        // Any bar to a channel existing between these accounts for this
        // asset?
        let code = transfer_allowed(view, &tx.account, &op.destination, &op.amount.asset);
        tracing::trace!(%code, "create transfer_allowed");
        if !code.is_success() {
            return code;
        }

        // Can the amount actually be locked?
        let code = adjust_locked_balance(view, &tx.account, &op.amount, 1, RunMode::DryRun);
        tracing::trace!(%code, "create lock dry run");
        if !code.is_success() {
            return code;
        }
    }

    let Some(sled) = view.account(&op.destination) else {
        return ResultCode::NoDestination;
    };
    if sled.flags & ACCOUNT_REQUIRE_DEST_TAG != 0 && op.destination_tag.is_none() {
        return ResultCode::DestinationTagRequired;
    }
    // Honoring the disallow-native flag predates deposit authorization;
    // the amendment retires it.
    if !view.enabled(Feature::DepositAuthorization) && sled.flags & ACCOUNT_DISALLOW_NATIVE != 0 {
        return ResultCode::NoTarget;
    }

    ResultCode::Success
}

pub fn apply(tx: &Transaction, op: &ChannelCreate, view: &mut ApplyView) -> ResultCode {
    let Some(mut sle) = view.account(&tx.account) else {
        return ResultCode::Internal;
    };

    let chan_keylet = keylet::channel(&tx.account, &op.destination, tx.sequence);

    let Some(owner_node) = dir_insert(view, &tx.account, chan_keylet.key) else {
        return ResultCode::DirectoryFull;
    };
    let mut destination_node = None;
    if view.enabled(Feature::RecipientChannelDirectory) {
        let Some(page) = dir_insert(view, &op.destination, chan_keylet.key) else {
            return ResultCode::DirectoryFull;
        };
        destination_node = Some(page);
    }

    view.put_channel(
        &chan_keylet.key,
        ChannelEntry {
            owner: tx.account,
            destination: op.destination,
            amount: op.amount,
            balance: op.amount.zeroed(),
            settle_delay: op.settle_delay,
            public_key: op.public_key.clone(),
            cancel_after: op.cancel_after,
            expiration: None,
            source_tag: op.source_tag,
            destination_tag: op.destination_tag,
            owner_node,
            destination_node,
        },
    );

    if op.amount.is_native() {
        let Some(balance) = sle.balance.checked_sub(op.amount.value) else {
            return ResultCode::Internal;
        };
        sle.balance = balance;
    } else {
        if !view.enabled(Feature::IssuedTokenChannels) {
            return ResultCode::Internal;
        }
        let rill_common::Asset::Issued { currency, issuer } = &op.amount.asset else {
            return ResultCode::Internal;
        };
        if view.trust_line(&tx.account, issuer, currency).is_none() {
            return ResultCode::UnfundedPayment;
        }
        let code = adjust_locked_balance(view, &tx.account, &op.amount, 1, RunMode::WetRun);
        tracing::trace!(%code, "create lock wet run");
        if !code.is_success() {
            // The dry run in preclaim vouched for this.
            return ResultCode::Internal;
        }
        // The lock may have touched the owner count.
        sle = match view.account(&tx.account) {
            Some(account) => account,
            None => return ResultCode::Internal,
        };
    }

    sle.owner_count += 1;
    view.put_account(sle);

    ResultCode::Success
}
