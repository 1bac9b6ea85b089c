//! Delayed-state eligibility reads.
//!
//! Consensus asks "who may vote, and with what weight" against state that
//! is `delegation_delay` blocks behind the head, so every node resolves
//! the same answer regardless of in-flight delegations. The reader wraps
//! whatever state handle the engine hands it (a historical snapshot in
//! production) and exposes only the eligibility surface.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use lattice_storage::StateStore;
use lattice_types::DposConfig;

use crate::contract::DPOS_CONTRACT_ADDRESS;
use crate::error::Result;
use crate::storage::{Aggregates, KeyedStorage};
use crate::validators::ValidatorRegistry;

/// Read-only eligibility view over a (typically delayed) state handle.
#[derive(Debug)]
pub struct DposReader<S> {
    config: DposConfig,
    validators: ValidatorRegistry<S>,
    aggregates: Aggregates<S>,
}

impl<S: StateStore> DposReader<S> {
    /// Build a reader over `store`.
    pub fn new(config: DposConfig, store: Arc<S>) -> Self {
        let storage = KeyedStorage::new(DPOS_CONTRACT_ADDRESS, store);
        Self {
            validators: ValidatorRegistry::new(storage.clone()),
            aggregates: Aggregates::new(storage),
            config,
        }
    }

    /// Total vote weight across all eligible validators.
    pub fn total_eligible_votes_count(&self) -> Result<u64> {
        Ok(self.aggregates.total_eligible_votes()?)
    }

    /// Vote weight of a single validator. Zero for unknown validators and
    /// for stakes below the eligibility threshold.
    pub fn get_eligible_votes_count(&self, validator: &Address) -> Result<u64> {
        match self.validators.get_validator(validator)? {
            Some(v) => Ok(self.config.eligible_vote_count(&v.total_stake)),
            None => Ok(0),
        }
    }

    /// Whether `validator` currently holds at least the eligibility
    /// threshold.
    pub fn is_eligible(&self, validator: &Address) -> Result<bool> {
        match self.validators.get_validator(validator)? {
            Some(v) => Ok(v.total_stake >= self.config.eligibility_balance_threshold),
            None => Ok(false),
        }
    }

    /// Total stake delegated across all validators.
    pub fn total_amount_delegated(&self) -> Result<U256> {
        Ok(self.aggregates.total_delegated()?)
    }
}
