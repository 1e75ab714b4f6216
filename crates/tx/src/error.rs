//! Error types for transaction processing.
//!
//! Terminal transaction statuses are [`crate::ResultCode`] values, not Rust
//! errors. [`TxError`] covers the conditions that are bugs or environment
//! failures rather than outcomes: a hook module that cannot be loaded, or a
//! broken internal invariant.

use thiserror::Error;

/// Errors that can occur during transaction processing.
#[derive(Debug, Error)]
pub enum TxError {
    /// The hook module failed to load or link.
    #[error("hook load failed: {0}")]
    HookLoad(String),

    /// The WASM engine refused a runtime operation.
    #[error("hook engine error: {0}")]
    HookEngine(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_load_display() {
        let err = TxError::HookLoad("bad import".to_string());
        let display = format!("{}", err);
        assert!(display.contains("hook load failed"));
        assert!(display.contains("bad import"));
    }

    #[test]
    fn test_internal_display() {
        let err = TxError::Internal("unexpected state".to_string());
        assert!(format!("{}", err).contains("internal error"));
    }
}
