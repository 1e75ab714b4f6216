//! Ledger state for transaction execution.

pub mod directory;
pub mod entries;
pub mod trust;
pub mod view;

pub use directory::{dir_insert, dir_is_empty, dir_remove, owned_entries, DIR_NODE_CAPACITY};
pub use entries::{
    AccountEntry, ChannelEntry, DepositPreauthEntry, DirectoryNode, HookEntry, HookStateEntry,
    LedgerEntry, TrustLineEntry, ACCOUNT_DEPOSIT_AUTH, ACCOUNT_DISALLOW_NATIVE,
    ACCOUNT_REQUIRE_AUTH, ACCOUNT_REQUIRE_DEST_TAG, LINE_AUTHORIZED, LINE_FROZEN,
};
pub use trust::{adjust_locked_balance, transfer_allowed, transfer_locked_balance, RunMode};
pub use view::{ApplyView, Changes, Ledger, LedgerInfo, Snapshot};
