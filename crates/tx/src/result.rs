//! Terminal transaction statuses.
//!
//! Every transactor phase produces a [`ResultCode`]. Codes are grouped into
//! classes that decide what, if anything, is committed: only `Success`
//! commits state changes, `Claim` commits the fee alone, and the remaining
//! classes commit nothing. The first non-success code wins; there is no
//! local recovery inside a transactor.

use std::fmt;

/// Terminal status of a transactor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// The transaction applied in full.
    Success,

    // Claim class: the transaction is included and charged its fee, but has
    // no other effect.
    /// The payer cannot meet the reserve after the owner-count change.
    InsufficientReserve,
    /// The payer cannot cover reserve plus the funded amount.
    Unfunded,
    /// Nothing claimable: balance out of range, or locked funds short.
    UnfundedPayment,
    /// The destination account does not exist.
    NoDestination,
    /// The destination refuses this kind of deposit.
    NoTarget,
    /// The destination requires a destination tag.
    DestinationTagRequired,
    /// The sender is not allowed to perform this operation.
    NoPermission,
    /// The referenced ledger entry does not exist.
    NoEntry,
    /// The owner directory cannot take another entry.
    DirectoryFull,
    /// No trust line exists for the issued asset.
    NoLine,
    /// The trust line is not authorized by the issuer.
    NotAuthorized,
    /// The trust line is frozen.
    Frozen,
    /// The receiving trust line cannot hold the additional balance.
    LineFull,
    /// A hook on an implicated account vetoed the transaction.
    NoAuthorization,

    // Malformed class: static validation failed; the transaction is not
    // included in the ledger.
    /// Amount missing, non-positive, or in an illegal asset.
    MalformedAmount,
    /// Issued asset carrying the native currency code.
    MalformedCurrency,
    /// Sender and destination (or issuer) are the same account.
    DestinationIsSource,
    /// Undefined or mutually exclusive flag bits.
    InvalidFlags,
    /// Requested expiration violates the settle-delay floor.
    MalformedExpiration,
    /// The claim signature does not verify.
    BadSignature,
    /// The provided public key is not the channel's pinned key.
    BadSigner,
    /// Any other static validation failure.
    Malformed,

    // Fatal class: an invariant the ledger relies on is broken.
    /// A required entry vanished mid-apply, or a feature the code path
    /// assumes is missing.
    Internal,
    /// Directory bookkeeping is inconsistent with the entries it indexes.
    BadLedger,

    // Retry class: preconditions may hold later; nothing is committed.
    /// The paying account does not exist.
    NoAccount,
    /// The transaction sequence is not the account's next sequence.
    BadSequence,
    /// The fee offered does not meet the minimum.
    InsufficientFee,
}

/// Commit classes for [`ResultCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    /// Commit all staged changes.
    Success,
    /// Commit the fee, nothing else.
    Claim,
    /// Commit nothing; the transaction is not included.
    Malformed,
    /// Commit nothing; abort apply loudly.
    Fatal,
    /// Commit nothing; the transaction may apply later.
    Retry,
}

impl ResultCode {
    /// The commit class of this code.
    pub fn class(&self) -> ResultClass {
        use ResultCode::*;
        match self {
            Success => ResultClass::Success,
            InsufficientReserve | Unfunded | UnfundedPayment | NoDestination | NoTarget
            | DestinationTagRequired | NoPermission | NoEntry | DirectoryFull | NoLine
            | NotAuthorized | Frozen | LineFull | NoAuthorization => ResultClass::Claim,
            MalformedAmount | MalformedCurrency | DestinationIsSource | InvalidFlags
            | MalformedExpiration | BadSignature | BadSigner | Malformed => ResultClass::Malformed,
            Internal | BadLedger => ResultClass::Fatal,
            NoAccount | BadSequence | InsufficientFee => ResultClass::Retry,
        }
    }

    /// Whether this is the success code.
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Success)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
