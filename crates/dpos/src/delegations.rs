//! Delegation records with lazy reward accrual.
//!
//! Rewards are not pushed to delegations at distribution time. Instead each
//! validator carries a cumulative rewards-per-stake accumulator and every
//! delegation checkpoints against it; the difference times the stake is the
//! reward accrued since the last touch. Settling realizes that amount and
//! advances the checkpoint, which is why every stake mutation settles
//! first.

use crate::iterable_set::IterableAddressSet;
use crate::storage::{Field, KeyedStorage};
use crate::validators::Validator;
use alloy_primitives::{Address, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use lattice_storage::{Result, StateStore};
use once_cell::sync::Lazy;

/// Fixed-point scale of the per-stake reward accumulator (`1e30`).
pub static REWARDS_PER_STAKE_PRECISION: Lazy<U256> = Lazy::new(|| U256::from(10u128.pow(30)));

/// One delegator's stake towards one validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Delegation {
    /// Delegated amount.
    pub stake: U256,
    /// Rewards realized by past settlements and not yet claimed.
    pub rewards: U256,
    /// Accumulator value at the last settlement.
    pub rewards_per_stake_checkpoint: U256,
    /// Block of the last settlement or stake change.
    pub last_updated: u64,
}

impl Delegation {
    /// New delegation checkpointed at the validator's current accumulator,
    /// so it accrues only rewards distributed after this point.
    pub fn new(stake: U256, validator: &Validator, block: u64) -> Self {
        Self {
            stake,
            rewards: U256::ZERO,
            rewards_per_stake_checkpoint: validator.rewards_per_stake,
            last_updated: block,
        }
    }

    /// Rewards accrued since the last settlement, not yet realized.
    pub fn pending_rewards(&self, validator: &Validator) -> U256 {
        let delta = validator
            .rewards_per_stake
            .saturating_sub(self.rewards_per_stake_checkpoint);
        delta * self.stake / *REWARDS_PER_STAKE_PRECISION
    }

    /// Realize pending rewards and advance the checkpoint.
    ///
    /// Must run before any stake change: rewards accrued under the old
    /// stake would otherwise be recomputed against the new one.
    pub fn settle(&mut self, validator: &Validator, block: u64) {
        self.rewards += self.pending_rewards(validator);
        self.rewards_per_stake_checkpoint = validator.rewards_per_stake;
        self.last_updated = block;
    }
}

/// Registry of delegations, indexed per delegator.
#[derive(Debug)]
pub struct DelegationRegistry<S> {
    storage: KeyedStorage<S>,
}

impl<S: StateStore> DelegationRegistry<S> {
    pub fn new(storage: KeyedStorage<S>) -> Self {
        Self { storage }
    }

    fn delegation_key(&self, delegator: &Address, validator: &Address) -> Vec<u8> {
        self.storage.key(
            Field::Delegations,
            &[delegator.as_slice(), validator.as_slice()],
        )
    }

    fn validators_set(&self, delegator: &Address) -> IterableAddressSet<S> {
        let base = self
            .storage
            .key(Field::DelegatorValidatorsSet, &[delegator.as_slice()]);
        IterableAddressSet::new(self.storage.clone(), base)
    }

    /// The delegation from `delegator` to `validator`.
    pub fn get_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<Delegation>> {
        self.storage.get(&self.delegation_key(delegator, validator))
    }

    /// Whether a delegation exists between the pair.
    pub fn delegation_exists(&self, delegator: &Address, validator: &Address) -> Result<bool> {
        Ok(self.get_delegation(delegator, validator)?.is_some())
    }

    /// Record a new delegation. Panics if the pair already has one.
    pub fn create_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
        delegation: &Delegation,
    ) -> Result<()> {
        if self.delegation_exists(delegator, validator)? {
            panic!("dpos: delegation {delegator} -> {validator} already exists");
        }
        self.storage
            .put(&self.delegation_key(delegator, validator), delegation)?;
        self.validators_set(delegator).create_account(validator)?;
        Ok(())
    }

    /// Rewrite an existing delegation. Panics if the pair has none.
    pub fn modify_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
        delegation: &Delegation,
    ) -> Result<()> {
        if !self.delegation_exists(delegator, validator)? {
            panic!("dpos: modifying unknown delegation {delegator} -> {validator}");
        }
        self.storage
            .put(&self.delegation_key(delegator, validator), delegation)
    }

    /// Remove a delegation and drop the pair from the delegator's index.
    /// Panics if the pair has none.
    pub fn remove_delegation(&self, delegator: &Address, validator: &Address) -> Result<()> {
        if !self.delegation_exists(delegator, validator)? {
            panic!("dpos: removing unknown delegation {delegator} -> {validator}");
        }
        self.storage
            .delete(&self.delegation_key(delegator, validator))?;
        self.validators_set(delegator).remove_account(validator)?;
        Ok(())
    }

    /// Number of validators the delegator has delegations with.
    pub fn get_delegations_count(&self, delegator: &Address) -> Result<u64> {
        self.validators_set(delegator).get_count()
    }

    /// Page through the validators the delegator has delegations with.
    pub fn get_delegator_validators_addresses(
        &self,
        delegator: &Address,
        batch: u32,
        page_size: u32,
    ) -> Result<(Vec<Address>, bool)> {
        self.validators_set(delegator).get_accounts(batch, page_size)
    }
}
