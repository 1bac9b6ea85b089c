//! Validator records and the registry over them.

use crate::iterable_set::IterableAddressSet;
use crate::storage::{Field, KeyedStorage};
use alloy_primitives::{Address, Bytes, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use lattice_storage::{Result, StateStore};

/// Maximum validator description length in bytes.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Maximum validator endpoint length in bytes.
pub const MAX_ENDPOINT_LENGTH: usize = 50;

/// Required VRF public key length in bytes.
pub const VRF_KEY_LENGTH: usize = 32;

/// Frequently-written validator state.
///
/// Split from [`ValidatorInfo`] so stake and reward updates rewrite a small
/// record while the rarely-touched metadata stays in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Validator {
    /// Sum of all delegations towards this validator.
    pub total_stake: U256,
    /// Commission rewards claimable by the owner.
    pub commission_rewards_pool: U256,
    /// Cumulative rewards per unit of stake, fixed-point scaled by
    /// [`crate::delegations::REWARDS_PER_STAKE_PRECISION`]. Monotonically
    /// non-decreasing; delegations checkpoint against it to accrue lazily.
    pub rewards_per_stake: U256,
    /// Commission in basis points.
    pub commission: u16,
    /// Block of the last commission change, for the cooldown check.
    pub last_commission_change: u64,
    /// Number of pending undelegations from this validator.
    pub undelegations_count: u16,
}

impl Validator {
    /// Fresh validator with no stake, registered at `block`.
    pub fn new(commission: u16, block: u64) -> Self {
        Self {
            commission,
            last_commission_change: block,
            ..Default::default()
        }
    }
}

/// Rarely-written validator metadata.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct ValidatorInfo {
    /// Account allowed to change commission and metadata, and the
    /// recipient of commission rewards.
    pub owner: Address,
    /// VRF public key used by consensus.
    pub vrf_key: Bytes,
    /// Short human-readable description.
    pub description: String,
    /// Website or RPC endpoint.
    pub endpoint: String,
}

/// Registry of all validators, their metadata and ownership indexes.
#[derive(Debug)]
pub struct ValidatorRegistry<S> {
    storage: KeyedStorage<S>,
}

impl<S: StateStore> ValidatorRegistry<S> {
    pub fn new(storage: KeyedStorage<S>) -> Self {
        Self { storage }
    }

    fn validator_key(&self, validator: &Address) -> Vec<u8> {
        self.storage.key(Field::Validators, &[validator.as_slice()])
    }

    fn info_key(&self, validator: &Address) -> Vec<u8> {
        self.storage
            .key(Field::ValidatorsInfo, &[validator.as_slice()])
    }

    fn registered_set(&self) -> IterableAddressSet<S> {
        let base = self.storage.key(Field::ValidatorsSet, &[]);
        IterableAddressSet::new(self.storage.clone(), base)
    }

    fn owner_set(&self, owner: &Address) -> IterableAddressSet<S> {
        let base = self
            .storage
            .key(Field::OwnerValidatorsSet, &[owner.as_slice()]);
        IterableAddressSet::new(self.storage.clone(), base)
    }

    /// Stake and reward state of a validator.
    pub fn get_validator(&self, validator: &Address) -> Result<Option<Validator>> {
        self.storage.get(&self.validator_key(validator))
    }

    /// Metadata of a validator.
    pub fn get_validator_info(&self, validator: &Address) -> Result<Option<ValidatorInfo>> {
        self.storage.get(&self.info_key(validator))
    }

    /// Whether a validator is registered.
    pub fn validator_exists(&self, validator: &Address) -> Result<bool> {
        Ok(self.get_validator(validator)?.is_some())
    }

    /// Whether `account` owns `validator`. False for unknown validators.
    pub fn check_validator_owner(&self, account: &Address, validator: &Address) -> Result<bool> {
        Ok(self
            .get_validator_info(validator)?
            .is_some_and(|info| info.owner == *account))
    }

    /// Register a new validator. Panics on a duplicate address: callers
    /// check existence first, a duplicate here is state corruption.
    pub fn create_validator(
        &self,
        address: &Address,
        validator: &Validator,
        info: &ValidatorInfo,
    ) -> Result<()> {
        if self.validator_exists(address)? {
            panic!("dpos: validator {address} already exists");
        }
        self.storage.put(&self.validator_key(address), validator)?;
        self.storage.put(&self.info_key(address), info)?;
        self.registered_set().create_account(address)?;
        self.owner_set(&info.owner).create_account(address)?;
        Ok(())
    }

    /// Rewrite a validator's stake and reward state. Panics if unknown.
    pub fn modify_validator(&self, address: &Address, validator: &Validator) -> Result<()> {
        if !self.validator_exists(address)? {
            panic!("dpos: modifying unknown validator {address}");
        }
        self.storage.put(&self.validator_key(address), validator)
    }

    /// Rewrite a validator's metadata. Panics if unknown.
    pub fn modify_validator_info(&self, address: &Address, info: &ValidatorInfo) -> Result<()> {
        if self.get_validator_info(address)?.is_none() {
            panic!("dpos: modifying info of unknown validator {address}");
        }
        self.storage.put(&self.info_key(address), info)
    }

    /// Remove a validator and drop it from both indexes. Panics if unknown.
    pub fn delete_validator(&self, address: &Address) -> Result<()> {
        let Some(info) = self.get_validator_info(address)? else {
            panic!("dpos: deleting unknown validator {address}");
        };
        self.storage.delete(&self.validator_key(address))?;
        self.storage.delete(&self.info_key(address))?;
        self.registered_set().remove_account(address)?;
        self.owner_set(&info.owner).remove_account(address)?;
        Ok(())
    }

    /// Number of registered validators.
    pub fn get_validators_count(&self) -> Result<u64> {
        self.registered_set().get_count()
    }

    /// Page through all validator addresses.
    pub fn get_validators_addresses(
        &self,
        batch: u32,
        page_size: u32,
    ) -> Result<(Vec<Address>, bool)> {
        self.registered_set().get_accounts(batch, page_size)
    }

    /// Page through the validator addresses owned by `owner`.
    pub fn get_owner_validators_addresses(
        &self,
        owner: &Address,
        batch: u32,
        page_size: u32,
    ) -> Result<(Vec<Address>, bool)> {
        self.owner_set(owner).get_accounts(batch, page_size)
    }
}
