//! Keyed access to the contract's slice of the state store.
//!
//! Every record lives under a key of the form
//! `contract address (20 bytes) ++ field tag (1 byte) ++ components`,
//! where components are raw address bytes, big-endian u64 ids or set
//! bookkeeping suffixes. Values are RLP-encoded. The layout is part of
//! consensus: changing a tag or an encoding forks the chain.

use alloy_primitives::{Address, U256};
use alloy_rlp::{Decodable, Encodable};
use lattice_storage::{Result, StateStore};
use std::sync::Arc;

/// Field tags separating the contract's record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Field {
    /// Validator stake and reward state, keyed by validator address.
    Validators = 0x00,
    /// Validator metadata, keyed by validator address.
    ValidatorsInfo = 0x01,
    /// Iterable set of all validator addresses.
    ValidatorsSet = 0x02,
    /// Iterable set of validator addresses per owner.
    OwnerValidatorsSet = 0x03,
    /// Delegation records, keyed by delegator ++ validator.
    Delegations = 0x04,
    /// Iterable set of validators a delegator has delegations with.
    DelegatorValidatorsSet = 0x05,
    /// V1 undelegation records, keyed by delegator ++ validator.
    UndelegationsV1 = 0x06,
    /// Iterable set of validators a delegator has v1 undelegations with.
    UndelegationsV1Set = 0x07,
    /// V2 undelegation records, keyed by delegator ++ id.
    UndelegationsV2 = 0x08,
    /// Iterable list of live v2 undelegation ids per delegator.
    UndelegationsV2Ids = 0x09,
    /// Next v2 undelegation id per delegator.
    UndelegationsV2NextId = 0x0a,
    /// Total amount delegated across all validators.
    TotalDelegated = 0x0b,
    /// Total vote count across all eligible validators.
    TotalEligibleVotes = 0x0c,
    /// Cumulative minted rewards since genesis.
    GeneratedRewards = 0x0d,
    /// Whether the redelegation corrections have been replayed.
    RedelegationsFixApplied = 0x0e,
}

/// RLP-typed view over a [`StateStore`], scoped to one contract address.
#[derive(Debug)]
pub struct KeyedStorage<S> {
    address: Address,
    store: Arc<S>,
}

impl<S> Clone for KeyedStorage<S> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: StateStore> KeyedStorage<S> {
    /// Create a view scoped to `address`.
    pub fn new(address: Address, store: Arc<S>) -> Self {
        Self { address, store }
    }

    /// Build a storage key from a field tag and key components.
    pub(crate) fn key(&self, field: Field, parts: &[&[u8]]) -> Vec<u8> {
        let suffix_len: usize = parts.iter().map(|p| p.len()).sum();
        let mut key = Vec::with_capacity(21 + suffix_len);
        key.extend_from_slice(self.address.as_slice());
        key.push(field as u8);
        for part in parts {
            key.extend_from_slice(part);
        }
        key
    }

    /// Read and decode a record, `None` when the key is absent.
    pub fn get<T: Decodable>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => {
                let mut buf = bytes.as_slice();
                let value = T::decode(&mut buf)
                    .map_err(|err| lattice_storage::StorageError::Decode(err.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Encode and write a record.
    pub fn put<T: Encodable>(&self, key: &[u8], value: &T) -> Result<()> {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        self.store.put(key, &buf)
    }

    /// Remove a record. Removing an absent key is a no-op.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.store.delete(key)
    }
}

/// Contract-global counters kept alongside the per-account records.
#[derive(Debug)]
pub(crate) struct Aggregates<S> {
    storage: KeyedStorage<S>,
}

impl<S> Clone for Aggregates<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: StateStore> Aggregates<S> {
    pub fn new(storage: KeyedStorage<S>) -> Self {
        Self { storage }
    }

    /// Sum of all delegated stake, zero before the first delegation.
    pub fn total_delegated(&self) -> Result<U256> {
        let key = self.storage.key(Field::TotalDelegated, &[]);
        Ok(self.storage.get(&key)?.unwrap_or(U256::ZERO))
    }

    pub fn set_total_delegated(&self, value: &U256) -> Result<()> {
        let key = self.storage.key(Field::TotalDelegated, &[]);
        self.storage.put(&key, value)
    }

    /// Vote count across all eligible validators.
    pub fn total_eligible_votes(&self) -> Result<u64> {
        let key = self.storage.key(Field::TotalEligibleVotes, &[]);
        Ok(self.storage.get(&key)?.unwrap_or(0))
    }

    pub fn set_total_eligible_votes(&self, value: u64) -> Result<()> {
        let key = self.storage.key(Field::TotalEligibleVotes, &[]);
        self.storage.put(&key, &value)
    }

    /// Minted rewards since genesis, `None` until first written.
    ///
    /// The distinction between "never written" and zero matters: the
    /// counter is seeded from configuration the first time supply tracking
    /// runs, not from zero.
    pub fn generated_rewards(&self) -> Result<Option<U256>> {
        let key = self.storage.key(Field::GeneratedRewards, &[]);
        self.storage.get(&key)
    }

    pub fn set_generated_rewards(&self, value: &U256) -> Result<()> {
        let key = self.storage.key(Field::GeneratedRewards, &[]);
        self.storage.put(&key, value)
    }

    /// Whether the one-shot redelegation corrections already ran.
    pub fn redelegations_fix_applied(&self) -> Result<bool> {
        let key = self.storage.key(Field::RedelegationsFixApplied, &[]);
        Ok(self.storage.get(&key)?.unwrap_or(false))
    }

    pub fn set_redelegations_fix_applied(&self) -> Result<()> {
        let key = self.storage.key(Field::RedelegationsFixApplied, &[]);
        self.storage.put(&key, &true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_storage::InMemoryState;

    fn keyed() -> KeyedStorage<InMemoryState> {
        KeyedStorage::new(Address::with_last_byte(0x42), Arc::new(InMemoryState::new()))
    }

    #[test]
    fn keys_carry_address_tag_and_parts() {
        let storage = keyed();
        let validator = Address::with_last_byte(9);
        let key = storage.key(Field::Validators, &[validator.as_slice()]);

        assert_eq!(key.len(), 20 + 1 + 20);
        assert_eq!(&key[..20], Address::with_last_byte(0x42).as_slice());
        assert_eq!(key[20], Field::Validators as u8);
        assert_eq!(&key[21..], validator.as_slice());
    }

    #[test]
    fn record_round_trip() {
        let storage = keyed();
        let key = storage.key(Field::TotalDelegated, &[]);

        assert_eq!(storage.get::<U256>(&key).unwrap(), None);
        storage.put(&key, &U256::from(1234u64)).unwrap();
        assert_eq!(
            storage.get::<U256>(&key).unwrap(),
            Some(U256::from(1234u64))
        );
        storage.delete(&key).unwrap();
        assert_eq!(storage.get::<U256>(&key).unwrap(), None);
    }

    #[test]
    fn aggregates_default_to_empty() {
        let aggregates = Aggregates::new(keyed());

        assert_eq!(aggregates.total_delegated().unwrap(), U256::ZERO);
        assert_eq!(aggregates.total_eligible_votes().unwrap(), 0);
        assert_eq!(aggregates.generated_rewards().unwrap(), None);
        assert!(!aggregates.redelegations_fix_applied().unwrap());

        aggregates.set_total_delegated(&U256::from(7u64)).unwrap();
        aggregates.set_total_eligible_votes(3).unwrap();
        aggregates.set_generated_rewards(&U256::ZERO).unwrap();
        aggregates.set_redelegations_fix_applied().unwrap();

        assert_eq!(aggregates.total_delegated().unwrap(), U256::from(7u64));
        assert_eq!(aggregates.total_eligible_votes().unwrap(), 3);
        assert_eq!(aggregates.generated_rewards().unwrap(), Some(U256::ZERO));
        assert!(aggregates.redelegations_fix_applied().unwrap());
    }
}
