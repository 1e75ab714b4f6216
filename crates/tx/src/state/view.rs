//! The ledger and the per-transaction apply view.
//!
//! [`Ledger`] is the committed state plus the consensus parameters a
//! transactor may consult. [`ApplyView`] is an in-memory overlay over a
//! ledger: all mutations land in the overlay, which is either turned into a
//! change set and committed, or simply dropped. Reads see the overlay first,
//! then the base, so a transactor always observes its own prior writes.
//!
//! Per-entry mutation is read-modify-write: typed getters return owned
//! copies and `put_*` stores them back. Two live mutable borrows of the
//! same entry cannot exist.

use std::collections::BTreeMap;

use rill_common::{
    keylet, AccountId, Currency, Feature, FeatureSet, FeeSchedule, Hash256, HookParams, Keylet,
};

use super::entries::{
    AccountEntry, ChannelEntry, DirectoryNode, HookEntry, HookStateEntry, LedgerEntry,
    TrustLineEntry,
};

/// Header information shared by every read in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerInfo {
    /// Sequence of the ledger being built.
    pub sequence: u32,
    /// Close time of the parent ledger. The only time source transactors
    /// and hooks may observe.
    pub parent_close_time: u64,
}

/// Committed ledger state plus consensus parameters.
///
/// Equality is byte-for-byte over every entry; replicas applying the same
/// transactions to equal ledgers must stay equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub info: LedgerInfo,
    pub fees: FeeSchedule,
    pub features: FeatureSet,
    pub hook_params: HookParams,
    entries: BTreeMap<Hash256, LedgerEntry>,
}

impl Ledger {
    /// Create an empty ledger with the given parameters.
    pub fn new(
        info: LedgerInfo,
        fees: FeeSchedule,
        features: FeatureSet,
        hook_params: HookParams,
    ) -> Self {
        Self {
            info,
            fees,
            features,
            hook_params,
            entries: BTreeMap::new(),
        }
    }

    /// Get an entry by raw key.
    pub fn get(&self, key: &Hash256) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Insert or replace an entry. Seeding and commit path.
    pub fn put(&mut self, key: Hash256, entry: LedgerEntry) {
        self.entries.insert(key, entry);
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &Hash256) {
        self.entries.remove(key);
    }

    /// Number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Apply a change set produced by [`ApplyView::into_changes`].
    pub fn apply(&mut self, changes: Changes) {
        for (key, change) in changes.0 {
            match change {
                Some(entry) => {
                    self.entries.insert(key, entry);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// The account entry for `id`, if present.
    pub fn account(&self, id: &AccountId) -> Option<&AccountEntry> {
        self.get(&keylet::account(id).key)?.as_account()
    }

    /// The channel entry at `key`, if present.
    pub fn channel(&self, key: &Hash256) -> Option<&ChannelEntry> {
        self.get(key)?.as_channel()
    }

    /// The hook installed on `account`, if any.
    pub fn hook(&self, account: &AccountId) -> Option<&HookEntry> {
        self.get(&keylet::hook(account).key)?.as_hook()
    }

    /// The hook state entry of `account` under `state_key`, if present.
    pub fn hook_state(&self, account: &AccountId, state_key: &Hash256) -> Option<&HookStateEntry> {
        self.get(&keylet::hook_state(account, state_key).key)?
            .as_hook_state()
    }

    /// The trust line `holder` has towards `issuer`, if present.
    pub fn trust_line(
        &self,
        holder: &AccountId,
        issuer: &AccountId,
        currency: &Currency,
    ) -> Option<&TrustLineEntry> {
        self.get(&keylet::line(holder, issuer, currency).key)?
            .as_trust_line()
    }
}

/// The change set extracted from an apply view. `None` marks a deletion.
pub struct Changes(BTreeMap<Hash256, Option<LedgerEntry>>);

impl Changes {
    /// Whether the change set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A restorable copy of the overlay.
pub struct Snapshot(BTreeMap<Hash256, Option<LedgerEntry>>);

/// Mutable overlay over a [`Ledger`] for one transaction.
pub struct ApplyView<'a> {
    ledger: &'a Ledger,
    overlay: BTreeMap<Hash256, Option<LedgerEntry>>,
}

impl<'a> ApplyView<'a> {
    /// Open a view over `ledger`.
    pub fn new(ledger: &'a Ledger) -> Self {
        Self {
            ledger,
            overlay: BTreeMap::new(),
        }
    }

    /// Header info of the ledger under construction.
    pub fn info(&self) -> &LedgerInfo {
        &self.ledger.info
    }

    /// The fee and reserve schedule.
    pub fn fees(&self) -> &FeeSchedule {
        &self.ledger.fees
    }

    /// Hook resource parameters.
    pub fn hook_params(&self) -> &HookParams {
        &self.ledger.hook_params
    }

    /// Whether an amendment is active.
    pub fn enabled(&self, feature: Feature) -> bool {
        self.ledger.features.enabled(feature)
    }

    /// Get an entry by raw key, overlay first.
    pub fn get(&self, key: &Hash256) -> Option<&LedgerEntry> {
        match self.overlay.get(key) {
            Some(Some(entry)) => Some(entry),
            Some(None) => None,
            None => self.ledger.get(key),
        }
    }

    /// Read a copy of the entry at `keylet`, checking the type tag.
    pub fn read(&self, keylet: &Keylet) -> Option<LedgerEntry> {
        let entry = self.get(&keylet.key)?;
        if entry.entry_type() != keylet.entry_type {
            tracing::warn!(?keylet, found = ?entry.entry_type(), "entry type mismatch");
            return None;
        }
        Some(entry.clone())
    }

    /// Whether an entry exists at `keylet`.
    pub fn exists(&self, keylet: &Keylet) -> bool {
        self.read(keylet).is_some()
    }

    /// Insert or replace the entry at `keylet`.
    pub fn insert(&mut self, keylet: &Keylet, entry: LedgerEntry) {
        self.overlay.insert(keylet.key, Some(entry));
    }

    /// Store a modified entry back. Same operation as [`Self::insert`];
    /// named separately so call sites read as what they do.
    pub fn update(&mut self, keylet: &Keylet, entry: LedgerEntry) {
        self.overlay.insert(keylet.key, Some(entry));
    }

    /// Erase the entry at `keylet`.
    pub fn erase(&mut self, keylet: &Keylet) {
        self.overlay.insert(keylet.key, None);
    }

    /// Snapshot the overlay for later restore.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.overlay.clone())
    }

    /// Discard changes made since `snapshot` was taken.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.overlay = snapshot.0;
    }

    /// Extract the accumulated changes, consuming the view.
    pub fn into_changes(self) -> Changes {
        Changes(self.overlay)
    }

    // Typed accessors. Getters return owned copies; `put_*` stores back.

    /// The account entry for `id`.
    pub fn account(&self, id: &AccountId) -> Option<AccountEntry> {
        self.get(&keylet::account(id).key)?.as_account().cloned()
    }

    /// Store an account entry.
    pub fn put_account(&mut self, entry: AccountEntry) {
        let keylet = keylet::account(&entry.id);
        self.insert(&keylet, LedgerEntry::Account(entry));
    }

    /// The channel entry at `key`.
    pub fn channel(&self, key: &Hash256) -> Option<ChannelEntry> {
        self.get(key)?.as_channel().cloned()
    }

    /// Store a channel entry under `key`.
    pub fn put_channel(&mut self, key: &Hash256, entry: ChannelEntry) {
        self.overlay.insert(*key, Some(LedgerEntry::Channel(entry)));
    }

    /// The hook installed on `account`.
    pub fn hook(&self, account: &AccountId) -> Option<HookEntry> {
        self.get(&keylet::hook(account).key)?.as_hook().cloned()
    }

    /// Store a hook entry.
    pub fn put_hook(&mut self, entry: HookEntry) {
        let keylet = keylet::hook(&entry.account);
        self.insert(&keylet, LedgerEntry::Hook(entry));
    }

    /// The hook state entry of `account` under `state_key`.
    pub fn hook_state(&self, account: &AccountId, state_key: &Hash256) -> Option<HookStateEntry> {
        self.get(&keylet::hook_state(account, state_key).key)?
            .as_hook_state()
            .cloned()
    }

    /// Store a hook state entry.
    pub fn put_hook_state(&mut self, entry: HookStateEntry) {
        let keylet = keylet::hook_state(&entry.account, &entry.key);
        self.insert(&keylet, LedgerEntry::HookState(entry));
    }

    /// The trust line `holder` has towards `issuer`.
    pub fn trust_line(
        &self,
        holder: &AccountId,
        issuer: &AccountId,
        currency: &Currency,
    ) -> Option<TrustLineEntry> {
        self.get(&keylet::line(holder, issuer, currency).key)?
            .as_trust_line()
            .cloned()
    }

    /// Store a trust line entry.
    pub fn put_trust_line(&mut self, entry: TrustLineEntry) {
        let keylet = keylet::line(&entry.account, &entry.issuer, &entry.currency);
        self.insert(&keylet, LedgerEntry::TrustLine(entry));
    }

    /// The directory node at `index` of the directory rooted at `root`.
    pub fn directory_node(&self, root: &Hash256, index: u64) -> Option<DirectoryNode> {
        self.get(&keylet::dir_page(root, index).key)?
            .as_directory()
            .cloned()
    }

    /// Store a directory node.
    pub fn put_directory_node(&mut self, node: DirectoryNode) {
        let keylet = keylet::dir_page(&node.root, node.index);
        self.insert(&keylet, LedgerEntry::Directory(node));
    }
}
