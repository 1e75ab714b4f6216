//! Common types and utilities for the rill ledger.
//!
//! This crate provides shared types used across all rill crates. It is
//! designed to be dependency-light and contains pure data types and helpers
//! with no I/O or side effects, making it suitable as a foundation for the
//! rest of the workspace.
//!
//! # Overview
//!
//! - [`types`] - Core types like [`Hash256`] and [`AccountId`]
//! - [`amount`] - Native and issued-token amounts with checked arithmetic
//! - [`keylet`] - Typed 256-bit ledger entry addresses
//! - [`protocol`] - Amendment (feature) gating
//! - [`fees`] - Fee and reserve schedule, hook resource parameters
//! - [`error`] - Common error types and the [`Result`] type alias
//!
//! # Example
//!
//! ```rust
//! use rill_common::{keylet, AccountId};
//!
//! let owner = AccountId([7u8; 20]);
//! let dir = keylet::owner_dir(&owner);
//! println!("owner directory lives at {}", dir.key);
//! ```

pub mod amount;
pub mod error;
pub mod fees;
pub mod keylet;
pub mod protocol;
pub mod types;

pub use amount::{Amount, Asset, Currency};
pub use error::{Error, Result};
pub use fees::{FeeSchedule, HookParams};
pub use keylet::{EntryType, Keylet};
pub use protocol::{Feature, FeatureSet};
pub use types::{AccountId, Hash256};
