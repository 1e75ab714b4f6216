//! Amounts and assets.
//!
//! The ledger's native unit is the drop. Issued tokens are identified by a
//! currency code plus the issuing account; holdings live on trust lines.
//! Every amount carries its asset so that channel balances can never change
//! currency mid-life.

use crate::types::AccountId;
use std::fmt;

/// 20-byte currency code.
///
/// Short ASCII codes ("USD") are right-aligned in a zeroed field. The
/// all-zero code is reserved for the native currency; an issued asset
/// carrying it is malformed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Currency(pub [u8; 20]);

impl Currency {
    /// The native currency code (all zeroes).
    pub const NATIVE: Self = Self([0u8; 20]);

    /// Build a currency from a short ASCII code.
    pub fn from_code(code: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        let len = code.len().min(20);
        bytes[20 - len..].copy_from_slice(&code[..len]);
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the native currency code.
    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            let trimmed: Vec<u8> = self.0.iter().copied().filter(|b| *b != 0).collect();
            match std::str::from_utf8(&trimmed) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "{}", hex::encode(self.0)),
            }
        }
    }
}

/// An asset: the native currency or a token issued by an account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Asset {
    /// The native currency, denominated in drops.
    Native,
    /// A token issued by `issuer` under `currency`.
    Issued {
        currency: Currency,
        issuer: AccountId,
    },
}

impl Asset {
    /// Whether this is the native asset.
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// The issuing account for issued assets.
    pub fn issuer(&self) -> Option<&AccountId> {
        match self {
            Asset::Native => None,
            Asset::Issued { issuer, .. } => Some(issuer),
        }
    }

    /// The currency code for issued assets.
    pub fn currency(&self) -> Option<&Currency> {
        match self {
            Asset::Native => None,
            Asset::Issued { currency, .. } => Some(currency),
        }
    }

    /// An issued asset carrying the native currency code is malformed.
    pub fn is_fake_native(&self) -> bool {
        match self {
            Asset::Native => false,
            Asset::Issued { currency, .. } => currency.is_native(),
        }
    }
}

/// A value in a specific asset.
///
/// Native values are drops; issued values use the same fixed-point i64.
/// Arithmetic is checked and asset-preserving: combining amounts of
/// different assets is an error at the call site, not a silent coercion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Amount {
    pub value: i64,
    pub asset: Asset,
}

impl Amount {
    /// A native amount of the given drops.
    pub fn drops(value: i64) -> Self {
        Self {
            value,
            asset: Asset::Native,
        }
    }

    /// An issued-token amount.
    pub fn issued(value: i64, currency: Currency, issuer: AccountId) -> Self {
        Self {
            value,
            asset: Asset::Issued { currency, issuer },
        }
    }

    /// The zero amount in the same asset.
    pub fn zeroed(&self) -> Self {
        Self {
            value: 0,
            asset: self.asset,
        }
    }

    /// Whether the amount is in the native asset.
    pub fn is_native(&self) -> bool {
        self.asset.is_native()
    }

    /// Whether the value is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    /// Checked addition. `None` on overflow or asset mismatch.
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        if self.asset != other.asset {
            return None;
        }
        Some(Amount {
            value: self.value.checked_add(other.value)?,
            asset: self.asset,
        })
    }

    /// Checked subtraction. `None` on overflow or asset mismatch.
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.asset != other.asset {
            return None;
        }
        Some(Amount {
            value: self.value.checked_sub(other.value)?,
            asset: self.asset,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.asset {
            Asset::Native => write!(f, "{} drops", self.value),
            Asset::Issued { currency, issuer } => {
                write!(f, "{} {:?}/{}", self.value, currency, issuer)
            }
        }
    }
}
