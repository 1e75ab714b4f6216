//! Typed ledger entries.
//!
//! Entries live in a flat keylet-addressed space; cross-entity references
//! are by keylet. Owned entries carry the page hint (`owner_node`) returned
//! by their directory insert so removal is O(1).

use rill_common::{AccountId, Amount, Currency, EntryType, Hash256};

/// Destinations with this flag require a destination tag on inbound
/// channels.
pub const ACCOUNT_REQUIRE_DEST_TAG: u32 = 0x0001;
/// Destinations with this flag refuse native-currency deposits. Only
/// honored while deposit authorization is disabled.
pub const ACCOUNT_DISALLOW_NATIVE: u32 = 0x0002;
/// Destinations with this flag require deposit authorization.
pub const ACCOUNT_DEPOSIT_AUTH: u32 = 0x0004;
/// Issuers with this flag must authorize trust lines before they carry
/// balance.
pub const ACCOUNT_REQUIRE_AUTH: u32 = 0x0008;

/// The issuer has authorized this trust line.
pub const LINE_AUTHORIZED: u32 = 0x0001;
/// The line is frozen; balances may not move.
pub const LINE_FROZEN: u32 = 0x0002;

/// An account root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    pub id: AccountId,
    /// Native balance in drops. Must cover the reserve at `owner_count`.
    pub balance: i64,
    /// Last consumed transaction sequence.
    pub sequence: u32,
    /// Count of reserve-bearing entries this account owns.
    pub owner_count: u32,
    /// `ACCOUNT_*` flag bits.
    pub flags: u32,
}

/// A unidirectional payment channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub owner: AccountId,
    pub destination: AccountId,
    /// Total funded. The asset is fixed for the channel's life.
    pub amount: Amount,
    /// Cumulative amount delivered; never exceeds `amount`, never
    /// decreases.
    pub balance: Amount,
    /// Seconds between an owner close request and the actual close.
    pub settle_delay: u32,
    /// Tagged key authorized to sign claims.
    pub public_key: Vec<u8>,
    /// Hard close time set at creation.
    pub cancel_after: Option<u64>,
    /// Scheduled close time, set by owner close or fund.
    pub expiration: Option<u64>,
    pub source_tag: Option<u32>,
    pub destination_tag: Option<u32>,
    /// Page hint in the owner's directory.
    pub owner_node: u64,
    /// Page hint in the destination's directory, when registered there.
    pub destination_node: Option<u64>,
}

/// The hook installed on an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEntry {
    pub account: AccountId,
    /// The WASM module.
    pub create_code: Vec<u8>,
    /// Bitmask of transaction types that trigger the hook.
    pub hook_on: u64,
    /// Number of hook state entries this account owns.
    pub state_count: u32,
    /// Reserve units charged for the code blob.
    pub reserve_count: u32,
    /// Maximum state blob size, frozen at install time.
    pub data_max_size: u32,
    /// Page hint in the owner's directory.
    pub owner_node: u64,
}

/// A hook-owned state blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookStateEntry {
    pub account: AccountId,
    pub key: Hash256,
    /// Non-empty; at most the hook's `data_max_size`.
    pub data: Vec<u8>,
    /// Page hint in the owner's directory.
    pub owner_node: u64,
}

/// A trust line from a holder towards an issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustLineEntry {
    pub account: AccountId,
    pub issuer: AccountId,
    pub currency: Currency,
    /// Tokens held.
    pub balance: i64,
    /// Portion of `balance` sequestered by channels. Only the trust-line
    /// engine may move it.
    pub locked_balance: i64,
    /// Maximum balance the holder accepts.
    pub limit: i64,
    /// `LINE_*` flag bits.
    pub flags: u32,
}

impl TrustLineEntry {
    /// Balance not sequestered by locks.
    pub fn available(&self) -> i64 {
        self.balance - self.locked_balance
    }
}

/// One page of an owner directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub owner: AccountId,
    /// Keylet key of page 0.
    pub root: Hash256,
    /// This page's index; the `owner_node` hint of referenced entries.
    pub index: u64,
    /// Referenced keylets, insertion-ordered within the page.
    pub entries: Vec<Hash256>,
    /// Number of allocated pages; meaningful on page 0 only.
    pub page_count: u64,
}

/// A deposit preauthorization granted by `account` to `authorized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPreauthEntry {
    pub account: AccountId,
    pub authorized: AccountId,
    /// Page hint in the granting account's directory.
    pub owner_node: u64,
}

/// Any ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEntry {
    Account(AccountEntry),
    Channel(ChannelEntry),
    Hook(HookEntry),
    HookState(HookStateEntry),
    TrustLine(TrustLineEntry),
    Directory(DirectoryNode),
    DepositPreauth(DepositPreauthEntry),
}

impl LedgerEntry {
    /// The entry type tag.
    pub fn entry_type(&self) -> EntryType {
        match self {
            LedgerEntry::Account(_) => EntryType::Account,
            LedgerEntry::Channel(_) => EntryType::Channel,
            LedgerEntry::Hook(_) => EntryType::Hook,
            LedgerEntry::HookState(_) => EntryType::HookState,
            LedgerEntry::TrustLine(_) => EntryType::TrustLine,
            LedgerEntry::Directory(_) => EntryType::Directory,
            LedgerEntry::DepositPreauth(_) => EntryType::DepositPreauth,
        }
    }

    pub fn as_account(&self) -> Option<&AccountEntry> {
        match self {
            LedgerEntry::Account(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&ChannelEntry> {
        match self {
            LedgerEntry::Channel(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&HookEntry> {
        match self {
            LedgerEntry::Hook(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_hook_state(&self) -> Option<&HookStateEntry> {
        match self {
            LedgerEntry::HookState(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_trust_line(&self) -> Option<&TrustLineEntry> {
        match self {
            LedgerEntry::TrustLine(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            LedgerEntry::Directory(e) => Some(e),
            _ => None,
        }
    }
}
