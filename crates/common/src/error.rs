//! Common error types.

use thiserror::Error;

/// Errors shared across the workspace.
#[derive(Debug, Error)]
pub enum Error {
    /// A value failed to parse or was out of range.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Arithmetic overflow in amount or reserve math.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// Internal invariant violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
