//! Iterable address sets with O(1) membership and stable paging.
//!
//! A set keeps three record families under its base key: a count, a dense
//! array indexed `0..count`, and a 1-based position per member (0 or absent
//! means not a member). Removal swap-deletes with the last element, so
//! iteration order is insertion order disturbed only by removals, and that
//! is exactly the order the batched getters page through.

use crate::storage::KeyedStorage;
use alloy_primitives::Address;
use lattice_storage::{Result, StateStore};

const COUNT_TAG: u8 = 0x00;
const ELEMENT_TAG: u8 = 0x01;
const POSITION_TAG: u8 = 0x02;

/// An address set stored under a fixed base key.
#[derive(Debug)]
pub struct IterableAddressSet<S> {
    storage: KeyedStorage<S>,
    base: Vec<u8>,
}

impl<S: StateStore> IterableAddressSet<S> {
    /// Open the set stored under `base`. The set materializes on first
    /// insert; an untouched base reads as empty.
    pub fn new(storage: KeyedStorage<S>, base: Vec<u8>) -> Self {
        Self { storage, base }
    }

    fn sub_key(&self, tag: u8, suffix: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.base.len() + 1 + suffix.len());
        key.extend_from_slice(&self.base);
        key.push(tag);
        key.extend_from_slice(suffix);
        key
    }

    fn count_key(&self) -> Vec<u8> {
        self.sub_key(COUNT_TAG, &[])
    }

    fn element_key(&self, index: u64) -> Vec<u8> {
        self.sub_key(ELEMENT_TAG, &index.to_be_bytes())
    }

    fn position_key(&self, account: &Address) -> Vec<u8> {
        self.sub_key(POSITION_TAG, account.as_slice())
    }

    fn position(&self, account: &Address) -> Result<Option<u64>> {
        self.storage.get(&self.position_key(account))
    }

    fn expect_element(&self, index: u64) -> Result<Address> {
        match self.storage.get(&self.element_key(index))? {
            Some(account) => Ok(account),
            None => panic!("dpos: iterable set element {index} missing"),
        }
    }

    /// Number of members.
    pub fn get_count(&self) -> Result<u64> {
        Ok(self.storage.get(&self.count_key())?.unwrap_or(0))
    }

    /// Whether `account` is a member.
    pub fn account_exists(&self, account: &Address) -> Result<bool> {
        Ok(self.position(account)?.is_some())
    }

    /// Add a member. Panics if it is already present: callers guard with
    /// their own existence checks, a duplicate here is state corruption.
    pub fn create_account(&self, account: &Address) -> Result<()> {
        if self.position(account)?.is_some() {
            panic!("dpos: account {account} already in iterable set");
        }
        let count = self.get_count()?;
        self.storage.put(&self.element_key(count), account)?;
        self.storage.put(&self.position_key(account), &(count + 1))?;
        self.storage.put(&self.count_key(), &(count + 1))?;
        Ok(())
    }

    /// Remove a member by swapping the last element into its slot.
    /// Panics if it is not present.
    pub fn remove_account(&self, account: &Address) -> Result<()> {
        let Some(position) = self.position(account)? else {
            panic!("dpos: removing unknown account {account} from iterable set");
        };
        let count = self.get_count()?;
        assert!(count > 0, "dpos: iterable set count desync");

        let index = position - 1;
        let last_index = count - 1;
        if index != last_index {
            let last = self.expect_element(last_index)?;
            self.storage.put(&self.element_key(index), &last)?;
            self.storage.put(&self.position_key(&last), &position)?;
        }
        self.storage.delete(&self.element_key(last_index))?;
        self.storage.delete(&self.position_key(account))?;
        if last_index == 0 {
            self.storage.delete(&self.count_key())?;
        } else {
            self.storage.put(&self.count_key(), &last_index)?;
        }
        Ok(())
    }

    /// Return page `batch` of the members plus an end flag.
    ///
    /// The flag is true when this page exhausts the set; a batch past the
    /// end yields an empty page with the flag set.
    pub fn get_accounts(&self, batch: u32, page_size: u32) -> Result<(Vec<Address>, bool)> {
        let count = self.get_count()?;
        let start = u64::from(batch) * u64::from(page_size);
        if start >= count {
            return Ok((Vec::new(), true));
        }
        let end = (start + u64::from(page_size)).min(count);
        let mut accounts = Vec::with_capacity((end - start) as usize);
        for index in start..end {
            accounts.push(self.expect_element(index)?);
        }
        Ok((accounts, end >= count))
    }
}
