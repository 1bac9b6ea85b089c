//! Storage error types

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Write attempted through a frozen snapshot handle
    #[error("write to read-only snapshot view")]
    ReadOnlySnapshot,

    /// Stored value failed to decode
    #[error("value decoding failed: {0}")]
    Decode(String),

    /// Account balance too low for a debit
    #[error("insufficient balance for {address}: have {have}, need {need}")]
    InsufficientBalance {
        /// Debited account
        address: Address,
        /// Current balance
        have: U256,
        /// Requested debit
        need: U256,
    },

    /// Account balance would exceed U256::MAX
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),

    /// Backend-specific failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
