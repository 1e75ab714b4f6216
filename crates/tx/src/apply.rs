//! Transaction application.
//!
//! One transaction at a time, in consensus order, against a single mutable
//! view; every replica must land on the byte-identical post-state. The
//! framework owns the envelope-level concerns so transactors never see
//! them: payer existence, sequence, fee, and the commit discipline per
//! result class. Transactors stage mutations into the view; the framework
//! either commits them, trims them back to the fee, or drops them.
//!
//! After a successful apply, hooks installed on the implicated accounts
//! run in the sandbox and may veto the transaction before anything is
//! committed.

use crate::envelope::Transaction;
use crate::error::TxError;
use crate::hooks::{commit_changes, ExitType, HookRuntime};
use crate::operations;
use crate::result::{ResultClass, ResultCode};
use crate::state::{ApplyView, Changes, Ledger};

/// Outcome of applying one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub code: ResultCode,
    /// Fee actually charged; zero when nothing was committed.
    pub fee_charged: i64,
}

/// Apply `tx` to `ledger`.
///
/// Success commits all staged changes; claim-class failures commit the fee
/// and sequence alone; everything else leaves the ledger untouched.
pub fn apply_transaction(ledger: &mut Ledger, tx: &Transaction, hooks: &HookRuntime) -> Applied {
    let code = operations::preflight(tx, &ledger.features);
    if !code.is_success() {
        tracing::debug!(%code, "preflight failed");
        return Applied {
            code,
            fee_charged: 0,
        };
    }

    let (code, fee_charged, changes) = execute(ledger, tx, hooks);
    if let Some(changes) = changes {
        ledger.apply(changes);
    }
    tracing::debug!(%code, fee_charged, "transaction applied");
    Applied { code, fee_charged }
}

fn execute(
    ledger: &Ledger,
    tx: &Transaction,
    hooks: &HookRuntime,
) -> (ResultCode, i64, Option<Changes>) {
    let mut view = ApplyView::new(ledger);

    let Some(mut payer) = view.account(&tx.account) else {
        return (ResultCode::NoAccount, 0, None);
    };
    if tx.sequence != payer.sequence + 1 {
        return (ResultCode::BadSequence, 0, None);
    }
    if tx.fee < view.fees().base_fee || payer.balance < tx.fee {
        return (ResultCode::InsufficientFee, 0, None);
    }

    payer.balance -= tx.fee;
    payer.sequence = tx.sequence;
    view.put_account(payer);
    let fee_only = view.snapshot();

    // Preclaim must not mutate; anything it stages is discarded.
    let guard = view.snapshot();
    let code = operations::preclaim(tx, &mut view);
    view.restore(guard);
    if !code.is_success() {
        return finish(code, tx.fee, view, fee_only);
    }

    let mut code = operations::apply(tx, &mut view);
    if code.is_success() {
        code = run_hooks(&mut view, tx, hooks);
    }
    finish(code, tx.fee, view, fee_only)
}

fn finish(
    code: ResultCode,
    fee: i64,
    mut view: ApplyView<'_>,
    fee_only: crate::state::Snapshot,
) -> (ResultCode, i64, Option<Changes>) {
    match code.class() {
        ResultClass::Success => (code, fee, Some(view.into_changes())),
        ResultClass::Claim => {
            // Included and charged, but with no other effect.
            view.restore(fee_only);
            (code, fee, Some(view.into_changes()))
        }
        ResultClass::Malformed | ResultClass::Fatal | ResultClass::Retry => (code, 0, None),
    }
}

/// Run the hooks selected by this transaction on the implicated accounts:
/// the sender, then the destination named in the envelope.
fn run_hooks(view: &mut ApplyView, tx: &Transaction, hooks: &HookRuntime) -> ResultCode {
    let mut accounts = vec![tx.account];
    if let Some(dst) = tx.static_destination() {
        if *dst != tx.account {
            accounts.push(*dst);
        }
    }

    for account in accounts {
        let Some(hook) = view.hook(&account) else {
            continue;
        };
        if hook.hook_on & tx.tx_type().hook_bit() == 0 {
            continue;
        }

        let outcome =
            match hooks.execute(view, &account, &hook.create_code, hook.data_max_size) {
                Ok(outcome) => outcome,
                Err(TxError::HookLoad(msg)) => {
                    tracing::warn!(account = %account, msg, "installed hook failed to load");
                    return ResultCode::Malformed;
                }
                Err(err) => {
                    tracing::error!(account = %account, %err, "hook engine failure");
                    return ResultCode::Internal;
                }
            };

        match outcome.exit_type {
            ExitType::Accept => {
                let code = commit_changes(view, &account, &outcome.buffer);
                if !code.is_success() {
                    return code;
                }
            }
            ExitType::Reject | ExitType::Rollback => {
                tracing::debug!(
                    account = %account,
                    exit_type = ?outcome.exit_type,
                    exit_code = outcome.exit_code,
                    reason = %String::from_utf8_lossy(&outcome.reason),
                    "hook vetoed transaction"
                );
                return ResultCode::NoAuthorization;
            }
        }
    }
    ResultCode::Success
}
