//! The hook change buffer and the state commit protocol.
//!
//! Hooks never touch the ledger directly. Reads and writes go through a
//! per-invocation buffer keyed by state key; only entries marked modified
//! are committed, and only when the hook accepted. The buffer is a
//! `BTreeMap`, so commit order is ascending key order on every replica.

use std::collections::BTreeMap;

use rill_common::{fees::hook_state_owner_units, keylet, AccountId, Hash256};

use crate::result::ResultCode;
use crate::state::{dir_insert, dir_remove, owned_entries, ApplyView, HookStateEntry, LedgerEntry};

/// One buffered state entry. Empty data on a modified entry stages a
/// deletion; unmodified entries are cached reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedState {
    pub modified: bool,
    pub data: Vec<u8>,
}

/// Per-invocation staged state, keyed by state key.
#[derive(Debug, Default)]
pub struct ChangeBuffer {
    entries: BTreeMap<Hash256, BufferedState>,
}

impl ChangeBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer pre-populated with every hook state entry `account` owns,
    /// all unmodified. Reads during the invocation are then served without
    /// touching the view.
    pub fn load(view: &ApplyView, account: &AccountId) -> Self {
        let mut entries = BTreeMap::new();
        for key in owned_entries(view, account) {
            if let Some(LedgerEntry::HookState(state)) = view.get(&key) {
                entries.insert(
                    state.key,
                    BufferedState {
                        modified: false,
                        data: state.data.clone(),
                    },
                );
            }
        }
        Self { entries }
    }

    /// The live value under `key`, if any. A staged deletion reads as
    /// absent.
    pub fn get(&self, key: &Hash256) -> Option<&[u8]> {
        let entry = self.entries.get(key)?;
        if entry.data.is_empty() {
            return None;
        }
        Some(&entry.data)
    }

    /// Stage `data` under `key`. Empty data stages a deletion.
    pub fn stage(&mut self, key: Hash256, data: Vec<u8>) {
        self.entries.insert(
            key,
            BufferedState {
                modified: true,
                data,
            },
        );
    }

    /// Modified entries in ascending key order.
    pub fn modified(&self) -> impl Iterator<Item = (&Hash256, &BufferedState)> {
        self.entries.iter().filter(|(_, entry)| entry.modified)
    }

    /// Number of buffered entries, cached reads included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Commit every modified buffer entry to the ledger, in ascending key
/// order.
///
/// The first non-success code aborts the commit; the caller owns snapshot
/// and restore around the whole hook execution.
pub fn commit_changes(
    view: &mut ApplyView,
    account: &AccountId,
    buffer: &ChangeBuffer,
) -> ResultCode {
    for (key, entry) in buffer.modified() {
        let code = set_hook_state(view, account, key, &entry.data);
        if !code.is_success() {
            return code;
        }
    }
    ResultCode::Success
}

/// Write one state entry: insert, replace, or (for empty data) delete,
/// with directory registration, state-count and owner-count bookkeeping.
pub fn set_hook_state(
    view: &mut ApplyView,
    account: &AccountId,
    key: &Hash256,
    data: &[u8],
) -> ResultCode {
    let Some(mut sle) = view.account(account) else {
        return ResultCode::Internal;
    };
    let Some(mut hook) = view.hook(account) else {
        return ResultCode::Internal;
    };
    if data.len() as u32 > hook.data_max_size {
        // The host API refuses oversized writes before they are staged.
        return ResultCode::Internal;
    }

    let state_count = hook.state_count;
    let old_units = hook_state_owner_units(state_count);
    let state_keylet = keylet::hook_state(account, key);
    let old_state = view.hook_state(account, key);

    if data.is_empty() {
        // Deletion. Removing a non-existent entry is a successful no-op.
        let Some(old_state) = old_state else {
            return ResultCode::Success;
        };
        if !dir_remove(view, account, old_state.owner_node, &state_keylet.key) {
            return ResultCode::BadLedger;
        }
        view.erase(&state_keylet);

        let new_count = state_count.saturating_sub(1);
        if hook_state_owner_units(new_count) < old_units {
            sle.owner_count = sle.owner_count.saturating_sub(1);
            view.put_account(sle);
        }
        hook.state_count = new_count;
        view.put_hook(hook);
        return ResultCode::Success;
    }

    if let Some(mut old_state) = old_state {
        // Plain blob replacement; directory and counts are untouched.
        old_state.data = data.to_vec();
        view.put_hook_state(old_state);
        return ResultCode::Success;
    }

    let new_count = state_count + 1;
    if hook_state_owner_units(new_count) > old_units {
        // This entry starts a new allotment; charge an owner-count unit.
        let new_owner_count = sle.owner_count + 1;
        if sle.balance < view.fees().account_reserve(new_owner_count) {
            return ResultCode::InsufficientReserve;
        }
        sle.owner_count = new_owner_count;
        view.put_account(sle);
    }

    let Some(page) = dir_insert(view, account, state_keylet.key) else {
        return ResultCode::DirectoryFull;
    };
    view.put_hook_state(HookStateEntry {
        account: *account,
        key: *key,
        data: data.to_vec(),
        owner_node: page,
    });
    hook.state_count = new_count;
    view.put_hook(hook);

    tracing::trace!(account = %account, key = %key, len = data.len(), "hook state written");
    ResultCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::view::{Ledger, LedgerInfo};
    use crate::state::{AccountEntry, HookEntry};
    use rill_common::{FeatureSet, FeeSchedule, HookParams};

    fn acc(seed: u8) -> AccountId {
        AccountId([seed; 20])
    }

    fn state_key(seed: u8) -> Hash256 {
        Hash256::hash(&[b's', seed])
    }

    fn test_ledger() -> Ledger {
        Ledger::new(
            LedgerInfo {
                sequence: 1,
                parent_close_time: 0,
            },
            FeeSchedule::default(),
            FeatureSet::all(),
            HookParams::default(),
        )
    }

    fn seed_hooked_account(view: &mut ApplyView, seed: u8, balance: i64) {
        let account = acc(seed);
        view.put_account(AccountEntry {
            id: account,
            balance,
            sequence: 0,
            owner_count: 0,
            flags: 0,
        });
        view.put_hook(HookEntry {
            account,
            create_code: vec![0],
            hook_on: 0,
            state_count: 0,
            reserve_count: 1,
            data_max_size: 128,
            owner_node: 0,
        });
    }

    #[test]
    fn test_insert_read_delete_round_trip() {
        let ledger = test_ledger();
        let mut view = ApplyView::new(&ledger);
        seed_hooked_account(&mut view, 1, 10_000_000);
        let account = acc(1);

        let code = set_hook_state(&mut view, &account, &state_key(1), b"hello");
        assert_eq!(code, ResultCode::Success);
        assert_eq!(
            view.hook_state(&account, &state_key(1)).unwrap().data,
            b"hello"
        );
        assert_eq!(view.hook(&account).unwrap().state_count, 1);
        // First entry starts the first allotment.
        assert_eq!(view.account(&account).unwrap().owner_count, 1);

        let code = set_hook_state(&mut view, &account, &state_key(1), b"");
        assert_eq!(code, ResultCode::Success);
        assert!(view.hook_state(&account, &state_key(1)).is_none());
        assert_eq!(view.hook(&account).unwrap().state_count, 0);
        assert_eq!(view.account(&account).unwrap().owner_count, 0);
    }

    #[test]
    fn test_replacement_keeps_counts() {
        let ledger = test_ledger();
        let mut view = ApplyView::new(&ledger);
        seed_hooked_account(&mut view, 1, 10_000_000);
        let account = acc(1);

        set_hook_state(&mut view, &account, &state_key(1), b"one");
        let owner_count = view.account(&account).unwrap().owner_count;

        let code = set_hook_state(&mut view, &account, &state_key(1), b"two");
        assert_eq!(code, ResultCode::Success);
        assert_eq!(
            view.hook_state(&account, &state_key(1)).unwrap().data,
            b"two"
        );
        assert_eq!(view.hook(&account).unwrap().state_count, 1);
        assert_eq!(view.account(&account).unwrap().owner_count, owner_count);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let ledger = test_ledger();
        let mut view = ApplyView::new(&ledger);
        seed_hooked_account(&mut view, 1, 10_000_000);

        let code = set_hook_state(&mut view, &acc(1), &state_key(9), b"");
        assert_eq!(code, ResultCode::Success);
    }

    #[test]
    fn test_allotment_boundary_charges_reserve() {
        let ledger = test_ledger();
        let mut view = ApplyView::new(&ledger);
        // Reserve for one owned entry is 200_000; this account can afford
        // the first allotment but not a second.
        seed_hooked_account(&mut view, 1, 250_000);
        let account = acc(1);

        // Entries 1..=8 fit in one allotment unit.
        for i in 0..8 {
            let code = set_hook_state(&mut view, &account, &state_key(i), b"x");
            assert_eq!(code, ResultCode::Success);
        }
        assert_eq!(view.account(&account).unwrap().owner_count, 1);

        // The ninth entry starts a new allotment the balance cannot cover.
        let code = set_hook_state(&mut view, &account, &state_key(8), b"x");
        assert_eq!(code, ResultCode::InsufficientReserve);
        assert_eq!(view.hook(&account).unwrap().state_count, 8);
    }

    #[test]
    fn test_buffer_reads_and_staged_deletion() {
        let mut buffer = ChangeBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.get(&state_key(1)).is_none());

        buffer.stage(state_key(1), b"data".to_vec());
        assert_eq!(buffer.get(&state_key(1)).unwrap(), b"data");

        buffer.stage(state_key(1), Vec::new());
        assert!(buffer.get(&state_key(1)).is_none());
        assert_eq!(buffer.modified().count(), 1);
    }

    #[test]
    fn test_commit_is_ordered_and_applies_only_modified() {
        let ledger = test_ledger();
        let mut view = ApplyView::new(&ledger);
        seed_hooked_account(&mut view, 1, 10_000_000);
        let account = acc(1);

        let mut buffer = ChangeBuffer::new();
        buffer.stage(state_key(2), b"two".to_vec());
        buffer.stage(state_key(1), b"one".to_vec());
        // A cached read must not be written back.
        buffer.entries.insert(
            state_key(3),
            BufferedState {
                modified: false,
                data: b"cached".to_vec(),
            },
        );

        let code = commit_changes(&mut view, &account, &buffer);
        assert_eq!(code, ResultCode::Success);
        assert!(view.hook_state(&account, &state_key(1)).is_some());
        assert!(view.hook_state(&account, &state_key(2)).is_some());
        assert!(view.hook_state(&account, &state_key(3)).is_none());
        assert_eq!(view.hook(&account).unwrap().state_count, 2);
    }

    #[test]
    fn test_load_preloads_existing_state() {
        let ledger = test_ledger();
        let mut view = ApplyView::new(&ledger);
        seed_hooked_account(&mut view, 1, 10_000_000);
        let account = acc(1);
        set_hook_state(&mut view, &account, &state_key(1), b"persisted");

        let buffer = ChangeBuffer::load(&view, &account);
        assert_eq!(buffer.get(&state_key(1)).unwrap(), b"persisted");
        assert_eq!(buffer.modified().count(), 0);
    }
}
