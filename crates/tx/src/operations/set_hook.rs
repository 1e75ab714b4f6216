//! Hook installation, replacement, removal, and state teardown.
//!
//! The hook code blob is charged against the owner's reserve in units of
//! five maximum-size state blobs. Replacing a hook preserves its state
//! count; removing the code leaves state behind, and a later empty install
//! with no hook present tears that state down in bulk.

use rill_common::{fees::hook_state_owner_units, keylet, FeatureSet};

use crate::envelope::{SetHook, Transaction, TF_UNIVERSAL_MASK};
use crate::result::ResultCode;
use crate::state::{
    dir_insert, dir_remove, owned_entries, ApplyView, HookEntry, LedgerEntry,
};

pub fn preflight(tx: &Transaction, op: &SetHook, features: &FeatureSet) -> ResultCode {
    if features.enabled(rill_common::Feature::StrictTransactionFlags)
        && tx.flags & TF_UNIVERSAL_MASK != 0
    {
        return ResultCode::InvalidFlags;
    }

    // A syntactically invalid module can never run; refuse it up front.
    if !op.create_code.is_empty()
        && wasmparser::validate(&op.create_code).is_err()
    {
        tracing::trace!("refusing to install an invalid module");
        return ResultCode::Malformed;
    }

    ResultCode::Success
}

pub fn preclaim(_tx: &Transaction, _op: &SetHook, _view: &mut ApplyView) -> ResultCode {
    ResultCode::Success
}

pub fn apply(tx: &Transaction, op: &SetHook, view: &mut ApplyView) -> ResultCode {
    let account = tx.account;
    let hook_keylet = keylet::hook(&account);

    // This may be a create or a replace. The old hook goes first either
    // way; that may reduce the reserve, so it happens before checking it.
    let old_hook = view.hook(&account);
    let state_count = old_hook.as_ref().map(|h| h.state_count).unwrap_or(0);
    let previous_units = old_hook.as_ref().map(|h| h.reserve_count).unwrap_or(0);
    let new_units = view.hook_params().code_reserve_units(op.create_code.len());

    if op.create_code.is_empty() && old_hook.is_none() {
        // Nothing installed and nothing to install: destroy whatever state
        // a previously removed hook left behind.
        return destroy_hook_state(view, tx);
    }

    if let Some(old) = old_hook {
        if !dir_remove(view, &account, old.owner_node, &hook_keylet.key) {
            return ResultCode::BadLedger;
        }
        view.erase(&hook_keylet);
    }

    let Some(mut sle) = view.account(&account) else {
        return ResultCode::Internal;
    };

    let added = new_units as i64 - previous_units as i64;
    let projected = (sle.owner_count as i64 + added).max(0) as u32;
    if sle.balance < view.fees().account_reserve(projected) {
        return ResultCode::InsufficientReserve;
    }

    if !op.create_code.is_empty() {
        let Some(page) = dir_insert(view, &account, hook_keylet.key) else {
            return ResultCode::DirectoryFull;
        };
        view.put_hook(HookEntry {
            account,
            create_code: op.create_code.clone(),
            hook_on: op.hook_on,
            // Surviving state stays attributed to the replacement.
            state_count,
            reserve_count: new_units,
            data_max_size: view.hook_params().data_max_size,
            owner_node: page,
        });
        tracing::debug!(account = %account, code_len = op.create_code.len(), "hook installed");
    }

    sle.owner_count = projected;
    view.put_account(sle);
    ResultCode::Success
}

/// Erase every hook state entry the account owns, releasing the
/// owner-count allotment the entries consumed.
fn destroy_hook_state(view: &mut ApplyView, tx: &Transaction) -> ResultCode {
    let account = tx.account;
    let mut removed: u32 = 0;

    // Snapshot the directory before erasing anything; removal of the entry
    // in hand cannot invalidate the walk.
    for key in owned_entries(view, &account) {
        let Some(entry) = view.get(&key) else {
            tracing::error!(account = %account, entry = %key, "directory references missing entry");
            return ResultCode::BadLedger;
        };
        let LedgerEntry::HookState(state) = entry else {
            continue;
        };
        let hint = state.owner_node;
        let state_keylet = keylet::hook_state(&account, &state.key);
        if !dir_remove(view, &account, hint, &state_keylet.key) {
            return ResultCode::BadLedger;
        }
        view.erase(&state_keylet);
        removed += 1;
    }

    if removed > 0 {
        let Some(mut sle) = view.account(&account) else {
            return ResultCode::Internal;
        };
        sle.owner_count = sle
            .owner_count
            .saturating_sub(hook_state_owner_units(removed));
        view.put_account(sle);
        tracing::debug!(account = %account, removed, "hook state torn down");
    }
    ResultCode::Success
}
