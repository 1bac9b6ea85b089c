//! Raw key-value state storage trait.
//!
//! The DPOS engine persists its records through this interface; the
//! surrounding state-transition engine decides what actually backs it
//! (a state trie, a database, or [`InMemoryState`](crate::InMemoryState)
//! in tests). Keys are opaque byte strings scoped by the caller.
//!
//! Transactionality is the engine's responsibility: when a transaction
//! reverts, the engine discards every write it made through this trait.
//! The DPOS engine additionally orders each method as validate-then-write,
//! so a failed call never leaves partial writes behind.

use crate::error::Result;

/// Flat key-value store for contract state.
///
/// Implementations use interior mutability; handles are shared across
/// threads behind `Arc`.
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, overwriting any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove the value stored under `key`. Removing a missing key is a
    /// no-op.
    fn delete(&self, key: &[u8]) -> Result<()>;
}
