//! Per-block rewards statistics handed over by the consensus layer.
//!
//! For every finalized block the consensus layer aggregates, per validator,
//! how many DAG blocks it proposed, the weight of its included votes and
//! the transaction fees its blocks earned. The DPOS engine turns these
//! statistics into minted rewards.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-validator share of a block's consensus work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorStats {
    /// Number of DAG blocks this validator proposed.
    pub dag_blocks_count: u64,
    /// Weight of this validator's votes included in the block.
    pub vote_weight: u64,
    /// Transaction fees collected by this validator's blocks.
    pub fees_rewards: U256,
}

/// Aggregated consensus statistics for one finalized block.
///
/// The validator map is ordered so that reward distribution iterates
/// deterministically on every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsStats {
    /// Author of the finalized block.
    pub block_author: Address,
    /// Per-validator statistics.
    pub validators: BTreeMap<Address, ValidatorStats>,
    /// Total DAG blocks across all validators.
    pub total_dag_blocks_count: u64,
    /// Total included vote weight.
    pub total_votes_weight: u64,
    /// Maximum achievable vote weight for this block (full committee).
    pub max_votes_weight: u64,
}

impl RewardsStats {
    /// Create empty statistics for a block authored by `block_author`.
    pub fn new(block_author: Address) -> Self {
        Self {
            block_author,
            ..Default::default()
        }
    }

    /// Record `count` DAG blocks proposed by `validator`, updating totals.
    pub fn add_dag_blocks(&mut self, validator: Address, count: u64) -> &mut Self {
        self.validators.entry(validator).or_default().dag_blocks_count += count;
        self.total_dag_blocks_count += count;
        self
    }

    /// Record an included vote of `weight` from `validator`, updating totals.
    pub fn add_vote(&mut self, validator: Address, weight: u64) -> &mut Self {
        self.validators.entry(validator).or_default().vote_weight += weight;
        self.total_votes_weight += weight;
        self
    }

    /// Record transaction fees earned by `validator`'s blocks.
    pub fn add_fees(&mut self, validator: Address, fees: U256) -> &mut Self {
        self.validators.entry(validator).or_default().fees_rewards += fees;
        self
    }

    /// True when the block carried no countable consensus work.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate_totals() {
        let author = Address::repeat_byte(0x01);
        let voter = Address::repeat_byte(0x02);

        let mut stats = RewardsStats::new(author);
        stats.add_dag_blocks(author, 3);
        stats.add_vote(author, 10);
        stats.add_vote(voter, 15);
        stats.add_fees(author, U256::from(500));

        assert_eq!(stats.total_dag_blocks_count, 3);
        assert_eq!(stats.total_votes_weight, 25);
        assert_eq!(stats.validators[&author].dag_blocks_count, 3);
        assert_eq!(stats.validators[&voter].vote_weight, 15);
        assert_eq!(stats.validators[&author].fees_rewards, U256::from(500));
    }

    #[test]
    fn test_stats_iteration_is_ordered() {
        let mut stats = RewardsStats::new(Address::repeat_byte(0x09));
        stats.add_vote(Address::repeat_byte(0x03), 1);
        stats.add_vote(Address::repeat_byte(0x01), 1);
        stats.add_vote(Address::repeat_byte(0x02), 1);

        let order: Vec<Address> = stats.validators.keys().copied().collect();
        assert_eq!(
            order,
            vec![
                Address::repeat_byte(0x01),
                Address::repeat_byte(0x02),
                Address::repeat_byte(0x03),
            ],
            "validator iteration must be address-ordered for determinism"
        );
    }
}
