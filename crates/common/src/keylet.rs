//! Typed ledger entry addresses.
//!
//! Every ledger entry lives in a flat key space addressed by a keylet: a
//! 256-bit hash tagged with the expected entry type. Keylets are derived
//! deterministically from the identifying fields of the entry, so any
//! replica computes the same address for the same entity.

use crate::amount::Currency;
use crate::types::{AccountId, Hash256};

/// Ledger entry type tags.
///
/// The discriminants are part of the deterministic keylet derivation and
/// must never be reordered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u16)]
pub enum EntryType {
    Account = 0x0061,
    Channel = 0x0078,
    Hook = 0x0048,
    HookState = 0x0076,
    TrustLine = 0x0072,
    Directory = 0x004f,
    DepositPreauth = 0x0070,
}

impl EntryType {
    fn tag(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

/// A typed 256-bit ledger entry address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Keylet {
    pub entry_type: EntryType,
    pub key: Hash256,
}

impl Keylet {
    /// A keylet with an externally supplied key, e.g. a channel id taken
    /// from a transaction.
    pub fn from_key(entry_type: EntryType, key: Hash256) -> Self {
        Self { entry_type, key }
    }
}

fn derive(entry_type: EntryType, parts: &[&[u8]]) -> Keylet {
    let tag = entry_type.tag();
    let mut all: Vec<&[u8]> = Vec::with_capacity(parts.len() + 1);
    all.push(&tag);
    all.extend_from_slice(parts);
    Keylet {
        entry_type,
        key: Hash256::hash_parts(&all),
    }
}

/// The account root entry for `id`.
pub fn account(id: &AccountId) -> Keylet {
    derive(EntryType::Account, &[id.as_bytes()])
}

/// The payment channel created by `owner` towards `destination` with the
/// given transaction sequence.
pub fn channel(owner: &AccountId, destination: &AccountId, sequence: u32) -> Keylet {
    derive(
        EntryType::Channel,
        &[
            owner.as_bytes(),
            destination.as_bytes(),
            &sequence.to_be_bytes(),
        ],
    )
}

/// The hook installed on `account`.
pub fn hook(account: &AccountId) -> Keylet {
    derive(EntryType::Hook, &[account.as_bytes()])
}

/// The hook state entry of `account` under `key`.
pub fn hook_state(account: &AccountId, key: &Hash256) -> Keylet {
    derive(EntryType::HookState, &[account.as_bytes(), key.as_bytes()])
}

/// The trust line `holder` has towards `issuer` for `currency`.
pub fn line(holder: &AccountId, issuer: &AccountId, currency: &Currency) -> Keylet {
    derive(
        EntryType::TrustLine,
        &[holder.as_bytes(), issuer.as_bytes(), currency.as_bytes()],
    )
}

/// The root node of `account`'s owner directory.
pub fn owner_dir(account: &AccountId) -> Keylet {
    derive(EntryType::Directory, &[account.as_bytes()])
}

/// Page `index` of the directory rooted at `root`. Page 0 is the root node
/// itself.
pub fn dir_page(root: &Hash256, index: u64) -> Keylet {
    if index == 0 {
        return Keylet {
            entry_type: EntryType::Directory,
            key: *root,
        };
    }
    derive(
        EntryType::Directory,
        &[root.as_bytes(), &index.to_be_bytes()],
    )
}

/// The deposit preauthorization `account` granted to `authorized`.
pub fn deposit_preauth(account: &AccountId, authorized: &AccountId) -> Keylet {
    derive(
        EntryType::DepositPreauth,
        &[account.as_bytes(), authorized.as_bytes()],
    )
}
