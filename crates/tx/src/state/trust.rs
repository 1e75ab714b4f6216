//! Locked-balance accounting on trust lines.
//!
//! Issued-token channels never hold tokens themselves: the funded amount is
//! sequestered on the owner's trust line as `locked_balance`, and claims
//! move locked tokens to the destination's line. Everything here comes in
//! two run modes: a dry run computes the exact status a wet run would
//! return, with no observable mutation, so callers can order side effects
//! safely.

use rill_common::{AccountId, Amount, Asset};

use super::entries::{ACCOUNT_REQUIRE_AUTH, LINE_AUTHORIZED, LINE_FROZEN};
use super::view::ApplyView;
use crate::result::ResultCode;

/// Whether a trust-line operation may mutate the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Compute the terminal status only; leave the view untouched.
    DryRun,
    /// Commit the adjustment.
    WetRun,
}

/// Adjust the locked balance on `holder`'s line by `delta`.
///
/// A positive delta sequesters available balance; a negative delta releases
/// a prior lock. When the line's locked balance transitions between zero
/// and non-zero, the holder's owner count moves by `owner_delta` (the
/// locked-balance tracking becomes, or stops being, reserve-bearing), with
/// the reserve checked before any increase.
pub fn adjust_locked_balance(
    view: &mut ApplyView,
    holder: &AccountId,
    amount: &Amount,
    owner_delta: i32,
    mode: RunMode,
) -> ResultCode {
    let Asset::Issued { currency, issuer } = &amount.asset else {
        return ResultCode::Internal;
    };
    let delta = amount.value;

    let Some(mut line) = view.trust_line(holder, issuer, currency) else {
        return ResultCode::NoLine;
    };
    if line.flags & LINE_FROZEN != 0 {
        return ResultCode::Frozen;
    }

    let Some(new_locked) = line.locked_balance.checked_add(delta) else {
        return ResultCode::Internal;
    };
    if new_locked < 0 {
        // Releasing more than was ever locked.
        return ResultCode::BadLedger;
    }
    if delta > 0 && delta > line.available() {
        return ResultCode::UnfundedPayment;
    }

    // The locked-balance tracking is reserve-bearing while non-zero.
    let was_locked = line.locked_balance != 0;
    let now_locked = new_locked != 0;
    let count_delta = if was_locked != now_locked { owner_delta } else { 0 };

    let Some(mut account) = view.account(holder) else {
        return ResultCode::Internal;
    };
    if count_delta > 0 {
        let new_count = account.owner_count.saturating_add(count_delta as u32);
        if account.balance < view.fees().account_reserve(new_count) {
            return ResultCode::InsufficientReserve;
        }
    }

    if mode == RunMode::DryRun {
        return ResultCode::Success;
    }

    line.locked_balance = new_locked;
    view.put_trust_line(line);

    if count_delta != 0 {
        account.owner_count = if count_delta > 0 {
            account.owner_count.saturating_add(count_delta as u32)
        } else {
            account.owner_count.saturating_sub((-count_delta) as u32)
        };
        view.put_account(account);
    }

    tracing::trace!(holder = %holder, delta, "adjusted locked balance");
    ResultCode::Success
}

/// Check for any bar to moving `asset` from `src` to `dst`.
///
/// Read-only by construction; used by channel creation before anything is
/// staged.
pub fn transfer_allowed(
    view: &ApplyView,
    src: &AccountId,
    dst: &AccountId,
    asset: &Asset,
) -> ResultCode {
    let Asset::Issued { currency, issuer } = asset else {
        return ResultCode::Internal;
    };

    let Some(issuer_account) = view.account(issuer) else {
        return ResultCode::NoEntry;
    };
    let auth_required = issuer_account.flags & ACCOUNT_REQUIRE_AUTH != 0;

    for party in [src, dst] {
        let Some(line) = view.trust_line(party, issuer, currency) else {
            return ResultCode::NoLine;
        };
        if line.flags & LINE_FROZEN != 0 {
            return ResultCode::Frozen;
        }
        if auth_required && line.flags & LINE_AUTHORIZED == 0 {
            return ResultCode::NotAuthorized;
        }
    }
    ResultCode::Success
}

/// Move `amount` of locked tokens from `src`'s line to `dst`'s line.
///
/// `actor` is the account performing the claim; recorded for tracing only.
/// The source must hold at least `amount` locked; the destination's limit
/// must accommodate the credit.
pub fn transfer_locked_balance(
    view: &mut ApplyView,
    actor: &AccountId,
    src: &AccountId,
    dst: &AccountId,
    amount: &Amount,
    mode: RunMode,
) -> ResultCode {
    let Asset::Issued { currency, issuer } = &amount.asset else {
        return ResultCode::Internal;
    };
    let value = amount.value;
    if value <= 0 {
        return ResultCode::Internal;
    }

    let Some(mut src_line) = view.trust_line(src, issuer, currency) else {
        return ResultCode::NoLine;
    };
    let Some(mut dst_line) = view.trust_line(dst, issuer, currency) else {
        return ResultCode::NoLine;
    };
    if src_line.flags & LINE_FROZEN != 0 || dst_line.flags & LINE_FROZEN != 0 {
        return ResultCode::Frozen;
    }
    if src_line.locked_balance < value {
        return ResultCode::UnfundedPayment;
    }
    let Some(new_dst_balance) = dst_line.balance.checked_add(value) else {
        return ResultCode::LineFull;
    };
    if new_dst_balance > dst_line.limit {
        return ResultCode::LineFull;
    }

    if mode == RunMode::DryRun {
        return ResultCode::Success;
    }

    src_line.balance -= value;
    src_line.locked_balance -= value;
    let fully_released = src_line.locked_balance == 0;
    dst_line.balance = new_dst_balance;
    view.put_trust_line(src_line);
    view.put_trust_line(dst_line);

    if fully_released {
        // The locked-balance tracking stops being reserve-bearing.
        let Some(mut account) = view.account(src) else {
            return ResultCode::Internal;
        };
        account.owner_count = account.owner_count.saturating_sub(1);
        view.put_account(account);
    }

    tracing::trace!(actor = %actor, src = %src, dst = %dst, value, "transferred locked balance");
    ResultCode::Success
}
