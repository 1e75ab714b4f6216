//! Transaction envelope types.
//!
//! A [`Transaction`] is the typed view over a signed envelope after the
//! protocol layer has checked the outer signature. Fields are per-kind; the
//! transactors only ever see the typed body for their own kind.

use rill_common::{AccountId, Amount, Hash256};

/// Flag bit requesting that the channel be closed.
pub const TF_CLOSE: u32 = 0x0000_0001;
/// Flag bit requesting that the channel's expiration be cleared.
pub const TF_RENEW: u32 = 0x0000_0002;
/// Bits reserved for universal flags. None are defined, so any bit outside
/// the low byte is invalid when strict flag checking is active.
pub const TF_UNIVERSAL_MASK: u32 = 0xFFFF_FF00;
/// Bits that are not valid on a channel claim.
pub const TF_CHANNEL_CLAIM_MASK: u32 = !(TF_CLOSE | TF_RENEW);

/// Transaction type codes. The discriminants select bits in a hook's
/// `hook_on` mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TxType {
    ChannelCreate = 13,
    ChannelFund = 14,
    ChannelClaim = 15,
    SetHook = 22,
}

impl TxType {
    /// The `hook_on` bit selecting this transaction type.
    pub fn hook_bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

/// Create a unidirectional payment channel.
#[derive(Debug, Clone)]
pub struct ChannelCreate {
    /// The recipient at the end of the channel.
    pub destination: AccountId,
    /// Funds to deposit in the channel immediately.
    pub amount: Amount,
    /// Seconds everyone but the recipient must wait for a superior claim.
    pub settle_delay: u32,
    /// Tagged key that will sign claims against the channel.
    pub public_key: Vec<u8>,
    /// Any transaction touching the channel after this time closes it.
    pub cancel_after: Option<u64>,
    /// Sender-side bookkeeping tag.
    pub source_tag: Option<u32>,
    /// Recipient-side bookkeeping tag.
    pub destination_tag: Option<u32>,
}

/// Add funds to an existing channel; owner only.
#[derive(Debug, Clone)]
pub struct ChannelFund {
    /// The channel id.
    pub channel: Hash256,
    /// Funds to add.
    pub amount: Amount,
    /// New close time; must satisfy the settle-delay floor.
    pub expiration: Option<u64>,
}

/// Place a claim against a channel, and/or close or renew it.
#[derive(Debug, Clone)]
pub struct ChannelClaim {
    /// The channel id.
    pub channel: Hash256,
    /// New cumulative amount delivered. Absent when only closing/renewing.
    pub balance: Option<Amount>,
    /// Amount the signature authorizes; defaults to `balance`.
    pub amount: Option<Amount>,
    /// Authorization for `balance`, signed by the channel key.
    pub signature: Option<Vec<u8>>,
    /// Key that made the signature; required alongside it.
    pub public_key: Option<Vec<u8>>,
}

/// Install, replace, or remove the hook on the sending account. Empty code
/// with no installed hook tears down the account's leftover hook state.
#[derive(Debug, Clone)]
pub struct SetHook {
    /// WASM module to install; empty means delete.
    pub create_code: Vec<u8>,
    /// Bitmask of transaction types that trigger the hook.
    pub hook_on: u64,
}

/// The per-kind payload of a transaction.
#[derive(Debug, Clone)]
pub enum TxBody {
    ChannelCreate(ChannelCreate),
    ChannelFund(ChannelFund),
    ChannelClaim(ChannelClaim),
    SetHook(SetHook),
}

/// A transaction after envelope-level checks.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// The paying (and sending) account.
    pub account: AccountId,
    /// Must be the account's next sequence number.
    pub sequence: u32,
    /// Fee offered, in drops.
    pub fee: i64,
    /// Kind-specific flag bits.
    pub flags: u32,
    /// The typed payload.
    pub body: TxBody,
}

impl Transaction {
    /// The transaction type code.
    pub fn tx_type(&self) -> TxType {
        match &self.body {
            TxBody::ChannelCreate(_) => TxType::ChannelCreate,
            TxBody::ChannelFund(_) => TxType::ChannelFund,
            TxBody::ChannelClaim(_) => TxType::ChannelClaim,
            TxBody::SetHook(_) => TxType::SetHook,
        }
    }

    /// The destination named directly in the envelope, if any.
    pub fn static_destination(&self) -> Option<&AccountId> {
        match &self.body {
            TxBody::ChannelCreate(op) => Some(&op.destination),
            _ => None,
        }
    }
}
