//! Owner directories.
//!
//! Every entry an account owns is referenced exactly once from the
//! account's directory. Directories are paged: node 0 is the root and
//! carries the page count; inserts return the page index, which the owned
//! entry stores as its `owner_node` hint so removal goes straight to the
//! right page.

use rill_common::{keylet, AccountId, Hash256};

use super::entries::DirectoryNode;
use super::view::ApplyView;

/// Keylets per directory node.
pub const DIR_NODE_CAPACITY: usize = 32;
/// Maximum pages per directory. Past this an insert fails with a full
/// directory.
pub const DIR_MAX_PAGES: u64 = 1_024;

/// Insert `key` into `owner`'s directory. Returns the page hint.
///
/// `None` means the directory cannot take another entry.
pub fn dir_insert(view: &mut ApplyView, owner: &AccountId, key: Hash256) -> Option<u64> {
    let root = keylet::owner_dir(owner);

    let Some(mut root_node) = view.directory_node(&root.key, 0) else {
        // First entry: allocate the root node.
        view.put_directory_node(DirectoryNode {
            owner: *owner,
            root: root.key,
            index: 0,
            entries: vec![key],
            page_count: 1,
        });
        return Some(0);
    };

    // First page with space wins.
    for index in 0..root_node.page_count {
        let mut node = if index == 0 {
            root_node.clone()
        } else {
            view.directory_node(&root.key, index)?
        };
        if node.entries.len() < DIR_NODE_CAPACITY {
            node.entries.push(key);
            view.put_directory_node(node);
            return Some(index);
        }
    }

    // All pages full: allocate a new one.
    let index = root_node.page_count;
    if index >= DIR_MAX_PAGES {
        tracing::warn!(owner = %owner, "owner directory full");
        return None;
    }
    root_node.page_count = index + 1;
    view.put_directory_node(root_node);
    view.put_directory_node(DirectoryNode {
        owner: *owner,
        root: root.key,
        index,
        entries: vec![key],
        page_count: 0,
    });
    Some(index)
}

/// Remove `key` from `owner`'s directory using the page `hint`.
///
/// Returns false if the hint does not lead to the key; that is a ledger
/// inconsistency the caller must surface.
pub fn dir_remove(view: &mut ApplyView, owner: &AccountId, hint: u64, key: &Hash256) -> bool {
    let root = keylet::owner_dir(owner);
    let Some(mut node) = view.directory_node(&root.key, hint) else {
        return false;
    };
    let Some(position) = node.entries.iter().position(|entry| entry == key) else {
        return false;
    };
    node.entries.remove(position);
    view.put_directory_node(node);

    // Erase the whole directory once no page references anything.
    if dir_is_empty(view, owner) {
        let Some(root_node) = view.directory_node(&root.key, 0) else {
            return true;
        };
        for index in 0..root_node.page_count {
            view.erase(&keylet::dir_page(&root.key, index));
        }
    }
    true
}

/// Whether `owner`'s directory references nothing.
pub fn dir_is_empty(view: &ApplyView, owner: &AccountId) -> bool {
    let root = keylet::owner_dir(owner);
    let Some(root_node) = view.directory_node(&root.key, 0) else {
        return true;
    };
    if !root_node.entries.is_empty() {
        return false;
    }
    for index in 1..root_node.page_count {
        if let Some(node) = view.directory_node(&root.key, index) {
            if !node.entries.is_empty() {
                return false;
            }
        }
    }
    true
}

/// Snapshot every keylet referenced by `owner`'s directory, in page order.
///
/// Callers may erase entries (including the one in hand) while walking the
/// snapshot; the walk cannot be invalidated by removals.
pub fn owned_entries(view: &ApplyView, owner: &AccountId) -> Vec<Hash256> {
    let root = keylet::owner_dir(owner);
    let Some(root_node) = view.directory_node(&root.key, 0) else {
        return Vec::new();
    };
    let mut out = root_node.entries.clone();
    for index in 1..root_node.page_count {
        if let Some(node) = view.directory_node(&root.key, index) {
            out.extend_from_slice(&node.entries);
        }
    }
    out
}
