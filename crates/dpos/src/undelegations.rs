//! Pending undelegations, v1 and v2.
//!
//! A v1 undelegation is keyed by (delegator, validator): only one can be
//! pending per pair. V2 undelegations are keyed by a per-delegator id
//! handed out from a counter that never resets, so several withdrawals
//! from the same validator can mature independently and ids are strictly
//! increasing over a delegator's lifetime. Both kinds coexist while
//! pre-existing v1 records drain after the v2 switch.

use crate::iterable_set::IterableAddressSet;
use crate::storage::{Field, KeyedStorage};
use alloy_primitives::{Address, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use lattice_storage::{Result, StateStore};

/// First id handed out to a delegator's v2 undelegations.
pub const FIRST_UNDELEGATION_ID: u64 = 1;

const COUNT_TAG: u8 = 0x00;
const ELEMENT_TAG: u8 = 0x01;
const POSITION_TAG: u8 = 0x02;

/// A pending v1 withdrawal, keyed by (delegator, validator).
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct UndelegationV1 {
    /// Amount scheduled for withdrawal.
    pub amount: U256,
    /// First block at which confirmation is allowed.
    pub block: u64,
}

/// A pending v2 withdrawal, keyed by (delegator, id).
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct UndelegationV2 {
    /// Validator the stake is withdrawn from.
    pub validator: Address,
    /// Amount scheduled for withdrawal.
    pub amount: U256,
    /// First block at which confirmation is allowed.
    pub block: u64,
    /// Per-delegator id of this withdrawal.
    pub undelegation_id: u64,
}

/// Dense list of live u64 ids, same shape as [`IterableAddressSet`].
#[derive(Debug)]
struct IdList<S> {
    storage: KeyedStorage<S>,
    base: Vec<u8>,
}

impl<S: StateStore> IdList<S> {
    fn new(storage: KeyedStorage<S>, base: Vec<u8>) -> Self {
        Self { storage, base }
    }

    fn sub_key(&self, tag: u8, suffix: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.base.len() + 1 + suffix.len());
        key.extend_from_slice(&self.base);
        key.push(tag);
        key.extend_from_slice(suffix);
        key
    }

    fn count(&self) -> Result<u64> {
        Ok(self.storage.get(&self.sub_key(COUNT_TAG, &[]))?.unwrap_or(0))
    }

    fn position(&self, id: u64) -> Result<Option<u64>> {
        self.storage
            .get(&self.sub_key(POSITION_TAG, &id.to_be_bytes()))
    }

    fn expect_element(&self, index: u64) -> Result<u64> {
        match self
            .storage
            .get(&self.sub_key(ELEMENT_TAG, &index.to_be_bytes()))?
        {
            Some(id) => Ok(id),
            None => panic!("dpos: undelegation id list element {index} missing"),
        }
    }

    fn add(&self, id: u64) -> Result<()> {
        if self.position(id)?.is_some() {
            panic!("dpos: undelegation id {id} already tracked");
        }
        let count = self.count()?;
        self.storage
            .put(&self.sub_key(ELEMENT_TAG, &count.to_be_bytes()), &id)?;
        self.storage
            .put(&self.sub_key(POSITION_TAG, &id.to_be_bytes()), &(count + 1))?;
        self.storage.put(&self.sub_key(COUNT_TAG, &[]), &(count + 1))
    }

    fn remove(&self, id: u64) -> Result<()> {
        let Some(position) = self.position(id)? else {
            panic!("dpos: removing untracked undelegation id {id}");
        };
        let count = self.count()?;
        assert!(count > 0, "dpos: undelegation id list count desync");

        let index = position - 1;
        let last_index = count - 1;
        if index != last_index {
            let last = self.expect_element(last_index)?;
            self.storage
                .put(&self.sub_key(ELEMENT_TAG, &index.to_be_bytes()), &last)?;
            self.storage
                .put(&self.sub_key(POSITION_TAG, &last.to_be_bytes()), &position)?;
        }
        self.storage
            .delete(&self.sub_key(ELEMENT_TAG, &last_index.to_be_bytes()))?;
        self.storage
            .delete(&self.sub_key(POSITION_TAG, &id.to_be_bytes()))?;
        if last_index == 0 {
            self.storage.delete(&self.sub_key(COUNT_TAG, &[]))
        } else {
            self.storage.put(&self.sub_key(COUNT_TAG, &[]), &last_index)
        }
    }

    fn page(&self, batch: u32, page_size: u32) -> Result<(Vec<u64>, bool)> {
        let count = self.count()?;
        let start = u64::from(batch) * u64::from(page_size);
        if start >= count {
            return Ok((Vec::new(), true));
        }
        let end = (start + u64::from(page_size)).min(count);
        let mut ids = Vec::with_capacity((end - start) as usize);
        for index in start..end {
            ids.push(self.expect_element(index)?);
        }
        Ok((ids, end >= count))
    }
}

/// Registry of pending undelegations of both kinds.
#[derive(Debug)]
pub struct UndelegationRegistry<S> {
    storage: KeyedStorage<S>,
}

impl<S: StateStore> UndelegationRegistry<S> {
    pub fn new(storage: KeyedStorage<S>) -> Self {
        Self { storage }
    }

    fn v1_key(&self, delegator: &Address, validator: &Address) -> Vec<u8> {
        self.storage.key(
            Field::UndelegationsV1,
            &[delegator.as_slice(), validator.as_slice()],
        )
    }

    fn v1_set(&self, delegator: &Address) -> IterableAddressSet<S> {
        let base = self
            .storage
            .key(Field::UndelegationsV1Set, &[delegator.as_slice()]);
        IterableAddressSet::new(self.storage.clone(), base)
    }

    fn v2_key(&self, delegator: &Address, id: u64) -> Vec<u8> {
        self.storage.key(
            Field::UndelegationsV2,
            &[delegator.as_slice(), &id.to_be_bytes()],
        )
    }

    fn id_list(&self, delegator: &Address) -> IdList<S> {
        let base = self
            .storage
            .key(Field::UndelegationsV2Ids, &[delegator.as_slice()]);
        IdList::new(self.storage.clone(), base)
    }

    fn next_id_key(&self, delegator: &Address) -> Vec<u8> {
        self.storage
            .key(Field::UndelegationsV2NextId, &[delegator.as_slice()])
    }

    // ------------------------------------------------------------------
    // V1
    // ------------------------------------------------------------------

    /// The pending v1 undelegation for the pair, if any.
    pub fn get_undelegation_v1(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<UndelegationV1>> {
        self.storage.get(&self.v1_key(delegator, validator))
    }

    /// Whether the pair has a pending v1 undelegation.
    pub fn undelegation_v1_exists(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<bool> {
        Ok(self.get_undelegation_v1(delegator, validator)?.is_some())
    }

    /// Record a v1 undelegation. Panics if the pair already has one.
    pub fn create_undelegation_v1(
        &self,
        delegator: &Address,
        validator: &Address,
        undelegation: &UndelegationV1,
    ) -> Result<()> {
        if self.undelegation_v1_exists(delegator, validator)? {
            panic!("dpos: v1 undelegation {delegator} -> {validator} already exists");
        }
        self.storage
            .put(&self.v1_key(delegator, validator), undelegation)?;
        self.v1_set(delegator).create_account(validator)?;
        Ok(())
    }

    /// Drop a v1 undelegation. Panics if the pair has none.
    pub fn remove_undelegation_v1(&self, delegator: &Address, validator: &Address) -> Result<()> {
        if !self.undelegation_v1_exists(delegator, validator)? {
            panic!("dpos: removing unknown v1 undelegation {delegator} -> {validator}");
        }
        self.storage.delete(&self.v1_key(delegator, validator))?;
        self.v1_set(delegator).remove_account(validator)?;
        Ok(())
    }

    /// Number of pending v1 undelegations of a delegator.
    pub fn get_undelegations_v1_count(&self, delegator: &Address) -> Result<u64> {
        self.v1_set(delegator).get_count()
    }

    /// Page through the validators a delegator has v1 undelegations with.
    pub fn get_undelegation_v1_validators(
        &self,
        delegator: &Address,
        batch: u32,
        page_size: u32,
    ) -> Result<(Vec<Address>, bool)> {
        self.v1_set(delegator).get_accounts(batch, page_size)
    }

    // ------------------------------------------------------------------
    // V2
    // ------------------------------------------------------------------

    /// Record a v2 undelegation under a freshly allocated id.
    ///
    /// The id counter only ever moves forward, so ids stay unique even
    /// after earlier withdrawals are confirmed or canceled.
    pub fn create_undelegation_v2(
        &self,
        delegator: &Address,
        validator: &Address,
        amount: U256,
        block: u64,
    ) -> Result<u64> {
        let id = self
            .storage
            .get(&self.next_id_key(delegator))?
            .unwrap_or(FIRST_UNDELEGATION_ID);
        let undelegation = UndelegationV2 {
            validator: *validator,
            amount,
            block,
            undelegation_id: id,
        };
        self.storage.put(&self.v2_key(delegator, id), &undelegation)?;
        self.id_list(delegator).add(id)?;
        self.storage.put(&self.next_id_key(delegator), &(id + 1))?;
        Ok(id)
    }

    /// The v2 undelegation with the given id, if it is still pending.
    pub fn get_undelegation_v2(
        &self,
        delegator: &Address,
        id: u64,
    ) -> Result<Option<UndelegationV2>> {
        self.storage.get(&self.v2_key(delegator, id))
    }

    /// Drop a v2 undelegation. Panics if the id is not pending.
    pub fn remove_undelegation_v2(&self, delegator: &Address, id: u64) -> Result<()> {
        if self.get_undelegation_v2(delegator, id)?.is_none() {
            panic!("dpos: removing unknown v2 undelegation {delegator} id {id}");
        }
        self.storage.delete(&self.v2_key(delegator, id))?;
        self.id_list(delegator).remove(id)?;
        Ok(())
    }

    /// Number of pending v2 undelegations of a delegator.
    pub fn get_undelegations_v2_count(&self, delegator: &Address) -> Result<u64> {
        self.id_list(delegator).count()
    }

    /// Page through a delegator's pending v2 undelegation ids.
    pub fn get_undelegation_v2_ids(
        &self,
        delegator: &Address,
        batch: u32,
        page_size: u32,
    ) -> Result<(Vec<u64>, bool)> {
        self.id_list(delegator).page(batch, page_size)
    }
}
