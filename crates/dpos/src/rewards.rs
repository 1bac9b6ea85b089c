//! Reward split arithmetic for block distribution.
//!
//! A block's minted reward splits three ways: a DAG-proposer portion paid
//! pro rata to proposed DAG blocks, an author bonus tied to how many votes
//! beyond the required threshold the author packed into the block, and a
//! voter portion for everything else. The splits here are pure arithmetic;
//! crediting them to validators happens in the contract.

use alloy_primitives::U256;
use lattice_types::{DposConfig, MAX_COMMISSION};

/// The three destinations a block's minted reward splits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRewardParts {
    /// Shared by DAG block proposers pro rata to proposed blocks.
    pub dag_reward: U256,
    /// Shared by voters pro rata to included vote weight.
    pub vote_reward: U256,
    /// Reserved for the block author's vote-inclusion bonus.
    pub bonus_reward: U256,
}

/// Split a block reward by the configured percentages.
///
/// The voter portion is the exact remainder after the DAG and bonus cuts,
/// so the three parts always sum to the input.
pub fn split_block_reward(config: &DposConfig, block_reward: U256) -> BlockRewardParts {
    let dag_reward = block_reward * U256::from(config.dag_proposers_reward) / U256::from(100u64);
    let bonus_reward =
        block_reward * U256::from(config.max_block_author_reward) / U256::from(100u64);
    let vote_reward = block_reward - dag_reward - bonus_reward;
    BlockRewardParts {
        dag_reward,
        vote_reward,
        bonus_reward,
    }
}

/// Minimum vote weight a block needs to have been finalized: two thirds of
/// the committee weight plus one, measured against the larger of the
/// theoretical maximum and the weight actually observed.
pub fn vote_threshold(max_votes_weight: u64, total_votes_weight: u64) -> u64 {
    let base = u128::from(max_votes_weight.max(total_votes_weight));
    (base * 2 / 3 + 1) as u64
}

/// Bonus actually earned by the block author.
///
/// The author is paid for votes included beyond the finalization
/// threshold, scaled over the beyond-threshold weight that was available.
/// An author who packs every available vote earns the full bonus; one who
/// includes only the bare threshold earns nothing.
pub fn author_reward(bonus_reward: U256, total_votes_weight: u64, max_votes_weight: u64) -> U256 {
    let threshold = vote_threshold(max_votes_weight, total_votes_weight);
    if total_votes_weight <= threshold || max_votes_weight <= threshold {
        return U256::ZERO;
    }
    let reward = bonus_reward * U256::from(total_votes_weight - threshold)
        / U256::from(max_votes_weight - threshold);
    reward.min(bonus_reward)
}

/// Split a validator's reward into the commission cut and the delegator
/// remainder.
pub fn commission_split(reward: U256, commission: u16) -> (U256, U256) {
    let commission_part = reward * U256::from(commission) / U256::from(MAX_COMMISSION);
    (commission_part, reward - commission_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DposConfig {
        let mut config = DposConfig::default();
        config.dag_proposers_reward = 50;
        config.max_block_author_reward = 10;
        config
    }

    #[test]
    fn split_follows_the_percentages_and_conserves() {
        let parts = split_block_reward(&config(), U256::from(1_000u64));
        assert_eq!(parts.dag_reward, U256::from(500u64));
        assert_eq!(parts.bonus_reward, U256::from(100u64));
        assert_eq!(parts.vote_reward, U256::from(400u64));

        // Rounding loss lands in the vote portion, never outside the total.
        let odd = split_block_reward(&config(), U256::from(999u64));
        assert_eq!(
            odd.dag_reward + odd.vote_reward + odd.bonus_reward,
            U256::from(999u64)
        );
    }

    #[test]
    fn threshold_is_two_thirds_plus_one() {
        assert_eq!(vote_threshold(100, 80), 67);
        assert_eq!(vote_threshold(100, 100), 67);
        // Observed weight above the committee maximum raises the bar.
        assert_eq!(vote_threshold(100, 120), 81);
        assert_eq!(vote_threshold(0, 0), 1);
    }

    #[test]
    fn author_with_threshold_votes_earns_nothing() {
        let bonus = U256::from(100u64);
        assert_eq!(author_reward(bonus, 67, 100), U256::ZERO);
        assert_eq!(author_reward(bonus, 50, 100), U256::ZERO);
        // Degenerate committee: max equals the threshold.
        assert_eq!(author_reward(bonus, 0, 0), U256::ZERO);
    }

    #[test]
    fn author_with_every_vote_earns_the_full_bonus() {
        let bonus = U256::from(100u64);
        assert_eq!(author_reward(bonus, 100, 100), bonus);
    }

    #[test]
    fn author_reward_scales_between_threshold_and_max() {
        let bonus = U256::from(330u64);
        // threshold 67; (80 - 67) / (100 - 67) of the bonus.
        assert_eq!(author_reward(bonus, 80, 100), U256::from(130u64));
    }

    #[test]
    fn author_reward_is_clamped_at_the_bonus() {
        let bonus = U256::from(100u64);
        // Observed weight above max would scale past 1 without the clamp.
        assert_eq!(author_reward(bonus, 120, 100), bonus);
    }

    #[test]
    fn commission_split_conserves() {
        let (commission, delegators) = commission_split(U256::from(1_000u64), 2_500);
        assert_eq!(commission, U256::from(250u64));
        assert_eq!(delegators, U256::from(750u64));

        let (all, none) = commission_split(U256::from(1_000u64), MAX_COMMISSION);
        assert_eq!(all, U256::from(1_000u64));
        assert_eq!(none, U256::ZERO);
    }
}
