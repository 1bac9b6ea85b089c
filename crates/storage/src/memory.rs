//! In-memory implementations of [`StateStore`] and [`BalanceLedger`].
//!
//! These backends are primarily for testing and development. Production
//! deployments plug the engine's trie-backed state in instead.
//!
//! # Concurrency Safety
//!
//! 1. **Single-Lock Principle**: live state and its historical snapshots
//!    are grouped under one lock, so snapshotting is atomic with respect
//!    to concurrent writes.
//!
//! 2. **Minimal Lock Duration**: values are cloned before returning so the
//!    lock is released quickly.
//!
//! # Snapshots
//!
//! [`InMemoryState::snapshot`] freezes the current live state under a
//! block number. [`InMemoryState::at_block`] returns a read-only handle
//! serving the most recent snapshot at or below the requested block,
//! which is how tests model the delayed eligibility view.

use crate::error::{Result, StorageError};
use crate::ledger::BalanceLedger;
use crate::state::StateStore;
use alloy_primitives::{Address, U256};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type KvMap = HashMap<Vec<u8>, Vec<u8>>;

struct StateInner {
    /// Live, mutable state.
    live: KvMap,
    /// Frozen copies of the live state, indexed by block number.
    snapshots: BTreeMap<u64, KvMap>,
}

impl StateInner {
    fn new() -> Self {
        Self {
            live: HashMap::new(),
            snapshots: BTreeMap::new(),
        }
    }
}

/// In-memory state store with block-indexed snapshots.
///
/// Cloning produces another handle onto the same underlying state.
pub struct InMemoryState {
    inner: Arc<RwLock<StateInner>>,
    /// When set, this handle is a read-only view at the given block.
    view: Option<u64>,
}

impl InMemoryState {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StateInner::new())),
            view: None,
        }
    }

    /// Freeze the current live state as the snapshot for `block`.
    ///
    /// Re-snapshotting the same block replaces the previous copy.
    pub fn snapshot(&self, block: u64) {
        let mut inner = self.inner.write();
        let frozen = inner.live.clone();
        inner.snapshots.insert(block, frozen);
    }

    /// Read-only handle onto the most recent snapshot at or below `block`.
    ///
    /// If no snapshot exists that far back the handle reads as empty,
    /// matching a chain that had no state at that height.
    pub fn at_block(&self, block: u64) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            view: Some(block),
        }
    }

    /// Handle onto the live state.
    pub fn latest(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            view: None,
        }
    }

    /// Number of live entries (for tests).
    pub fn len(&self) -> usize {
        self.inner.read().live.len()
    }

    /// True when the live state holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryState {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            view: self.view,
        }
    }
}

impl StateStore for InMemoryState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.read();
        match self.view {
            Some(block) => {
                let snapshot = inner.snapshots.range(..=block).next_back();
                Ok(snapshot.and_then(|(_, kv)| kv.get(key).cloned()))
            }
            None => Ok(inner.live.get(key).cloned()),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.view.is_some() {
            return Err(StorageError::ReadOnlySnapshot);
        }
        self.inner.write().live.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        if self.view.is_some() {
            return Err(StorageError::ReadOnlySnapshot);
        }
        self.inner.write().live.remove(key);
        Ok(())
    }
}

/// In-memory account balance ledger.
///
/// Cloning produces another handle onto the same balances.
#[derive(Clone)]
pub struct InMemoryLedger {
    balances: Arc<RwLock<HashMap<Address, U256>>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Overwrite the balance of `address` (test setup helper).
    pub fn set_balance(&self, address: Address, amount: U256) {
        self.balances.write().insert(address, amount);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceLedger for InMemoryLedger {
    fn balance(&self, address: &Address) -> Result<U256> {
        Ok(self
            .balances
            .read()
            .get(address)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    fn add_balance(&self, address: &Address, amount: U256) -> Result<()> {
        let mut balances = self.balances.write();
        let entry = balances.entry(*address).or_insert(U256::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or(StorageError::BalanceOverflow(*address))?;
        Ok(())
    }

    fn sub_balance(&self, address: &Address, amount: U256) -> Result<()> {
        let mut balances = self.balances.write();
        let entry = balances.entry(*address).or_insert(U256::ZERO);
        *entry = entry
            .checked_sub(amount)
            .ok_or(StorageError::InsufficientBalance {
                address: *address,
                have: *entry,
                need: amount,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let state = InMemoryState::new();
        state.put(b"k", b"v").unwrap();
        assert_eq!(state.get(b"k").unwrap(), Some(b"v".to_vec()));

        state.delete(b"k").unwrap();
        assert_eq!(state.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_delete_missing_key_is_noop() {
        let state = InMemoryState::new();
        assert!(state.delete(b"missing").is_ok());
    }

    #[test]
    fn test_clone_shares_state() {
        let state = InMemoryState::new();
        let handle = state.clone();
        state.put(b"k", b"v").unwrap();
        assert_eq!(handle.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_snapshot_view_is_frozen() {
        let state = InMemoryState::new();
        state.put(b"k", b"old").unwrap();
        state.snapshot(10);

        state.put(b"k", b"new").unwrap();

        let view = state.at_block(10);
        assert_eq!(view.get(b"k").unwrap(), Some(b"old".to_vec()));
        assert_eq!(state.get(b"k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_snapshot_view_resolves_most_recent() {
        let state = InMemoryState::new();
        state.put(b"k", b"a").unwrap();
        state.snapshot(5);
        state.put(b"k", b"b").unwrap();
        state.snapshot(8);

        // Block 7 sees the snapshot taken at block 5.
        assert_eq!(state.at_block(7).get(b"k").unwrap(), Some(b"a".to_vec()));
        assert_eq!(state.at_block(9).get(b"k").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_view_before_first_snapshot_is_empty() {
        let state = InMemoryState::new();
        state.put(b"k", b"v").unwrap();
        state.snapshot(10);

        assert_eq!(state.at_block(3).get(b"k").unwrap(), None);
    }

    #[test]
    fn test_view_rejects_writes() {
        let state = InMemoryState::new();
        state.snapshot(1);
        let view = state.at_block(1);

        assert!(matches!(
            view.put(b"k", b"v"),
            Err(StorageError::ReadOnlySnapshot)
        ));
        assert!(matches!(
            view.delete(b"k"),
            Err(StorageError::ReadOnlySnapshot)
        ));
    }

    #[test]
    fn test_ledger_add_sub() {
        let ledger = InMemoryLedger::new();
        let acc = Address::repeat_byte(0x01);

        ledger.add_balance(&acc, U256::from(100)).unwrap();
        ledger.sub_balance(&acc, U256::from(40)).unwrap();
        assert_eq!(ledger.balance(&acc).unwrap(), U256::from(60));
    }

    #[test]
    fn test_ledger_insufficient_balance() {
        let ledger = InMemoryLedger::new();
        let acc = Address::repeat_byte(0x02);
        ledger.set_balance(acc, U256::from(10));

        let err = ledger.sub_balance(&acc, U256::from(11)).unwrap_err();
        assert!(matches!(err, StorageError::InsufficientBalance { .. }));
        // Balance unchanged after the failed debit.
        assert_eq!(ledger.balance(&acc).unwrap(), U256::from(10));
    }

    #[test]
    fn test_ledger_overflow() {
        let ledger = InMemoryLedger::new();
        let acc = Address::repeat_byte(0x03);
        ledger.set_balance(acc, U256::MAX);

        let err = ledger.add_balance(&acc, U256::from(1)).unwrap_err();
        assert!(matches!(err, StorageError::BalanceOverflow(_)));
    }
}
