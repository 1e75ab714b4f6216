//! Host-API status codes and exit types.

/// A pointer/length pair reaches outside the guest's linear memory.
pub const OUT_OF_BOUNDS: i64 = -1;
/// The host could not serve the call; a bug, not guest error.
pub const INTERNAL_ERROR: i64 = -2;
/// A state blob exceeds the hook's maximum size.
pub const TOO_BIG: i64 = -3;
/// An argument is too short to be meaningful.
pub const TOO_SMALL: i64 = -4;
/// The requested state entry does not exist.
pub const DOESNT_EXIST: i64 = -5;

/// How a hook invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitType {
    /// Commit the change buffer; the transaction proceeds.
    Accept,
    /// Discard the buffer; the transaction fails.
    Reject,
    /// Discard the buffer; the transaction fails. Also the outcome when the
    /// guest returns without choosing, traps, or runs out of fuel.
    Rollback,
}
