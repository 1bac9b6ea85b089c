//! Per-block reward amounts.
//!
//! Two regimes. Until Aspen part two, minting follows a fixed annual yield
//! over the delegated stake. Afterwards the yield adapts to the remaining
//! supply gap, so minting slows down as the total supply approaches the
//! configured ceiling and stops once it is reached.

use alloy_primitives::U256;
use lattice_types::DposConfig;

/// Fixed-point scale of the dynamic yield fraction.
pub const YIELD_FRACTION_PRECISION: u64 = 1_000_000;

/// Annual yield as a fraction of [`YIELD_FRACTION_PRECISION`], derived
/// from how far the current supply sits below the ceiling.
///
/// `(max_supply - total_supply) * PRECISION / total_supply`, zero once the
/// ceiling is reached.
pub fn dynamic_yield(max_supply: U256, total_supply: U256) -> U256 {
    if total_supply.is_zero() {
        return U256::ZERO;
    }
    let supply_gap = max_supply.saturating_sub(total_supply);
    supply_gap * U256::from(YIELD_FRACTION_PRECISION) / total_supply
}

/// Amount minted for one block, given the stake and supply at that block.
///
/// Multiplication before division throughout; the sub-wei remainder is
/// simply not minted.
pub fn block_reward(
    config: &DposConfig,
    block: u64,
    total_delegated: U256,
    total_supply: U256,
) -> U256 {
    let blocks_per_year = U256::from(config.blocks_per_year);
    if config.hardforks.is_aspen_hardfork_part_two(block) {
        let yield_fraction = dynamic_yield(config.hardforks.aspen_hf.max_supply, total_supply);
        total_delegated * yield_fraction / (U256::from(YIELD_FRACTION_PRECISION) * blocks_per_year)
    } else {
        total_delegated * U256::from(config.yield_percentage)
            / (U256::from(100u64) * blocks_per_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * U256::from(10u128.pow(18))
    }

    #[test]
    fn dynamic_yield_anchor_point() {
        // 10B supply against a 12B cap: a 2B gap is a 20% yield.
        let yield_fraction = dynamic_yield(tokens(12_000_000_000), tokens(10_000_000_000));
        assert_eq!(yield_fraction, U256::from(200_000u64));
    }

    #[test]
    fn dynamic_yield_stops_at_the_ceiling() {
        let max = tokens(12_000_000_000);
        assert_eq!(dynamic_yield(max, max), U256::ZERO);
        assert_eq!(dynamic_yield(max, max + tokens(1)), U256::ZERO);
        assert_eq!(dynamic_yield(max, U256::ZERO), U256::ZERO);
    }

    #[test]
    fn fixed_curve_before_aspen_part_two() {
        let mut config = DposConfig::default();
        config.blocks_per_year = 100;
        config.yield_percentage = 20;
        config.hardforks.aspen_hf.block_num_part_two = 1_000;

        // 1,000,000 * 20 / (100 * 100)
        let reward = block_reward(&config, 999, U256::from(1_000_000u64), tokens(10_000_000_000));
        assert_eq!(reward, U256::from(2_000u64));
    }

    #[test]
    fn dynamic_curve_after_aspen_part_two() {
        let mut config = DposConfig::default();
        config.blocks_per_year = 100;
        config.hardforks.aspen_hf.block_num_part_two = 1_000;

        // Yield 200_000 at the anchor supply; 1e27 * 200_000 / (1e6 * 100).
        let reward = block_reward(
            &config,
            1_000,
            tokens(1_000_000_000),
            tokens(10_000_000_000),
        );
        assert_eq!(reward, U256::from(2u64) * U256::from(10u128.pow(24)));
    }

    #[test]
    fn no_stake_mints_nothing() {
        let config = DposConfig::default();
        assert_eq!(
            block_reward(&config, 0, U256::ZERO, tokens(10_000_000_000)),
            U256::ZERO
        );
    }
}
