//! DPOS chain configuration.
//!
//! Defines the staking parameters, the hardfork schedule and the genesis
//! validator set. Configurations are loaded from the chain's JSON genesis
//! file; large integers (U256) are encoded as hex strings to avoid
//! precision loss.
//!
//! # Example
//!
//! ```json
//! {
//!   "eligibility_balance_threshold": "0xd3c21bcecceda1000000",
//!   "vote_eligibility_balance_step": "0x3635c9adc5dea00000",
//!   "hardforks": { "magnolia_hf": { "block_num": 0 }, ... },
//!   "initial_validators": [...]
//! }
//! ```

use crate::BlockNum;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum commission value, in basis points (10000 == 100%).
pub const MAX_COMMISSION: u16 = 10_000;

/// Top-level DPOS configuration.
///
/// All stake amounts are in wei-denominated native tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DposConfig {
    /// Minimum total stake a validator needs to be considered eligible.
    pub eligibility_balance_threshold: U256,

    /// Stake amount backing a single consensus vote.
    pub vote_eligibility_balance_step: U256,

    /// Hard cap on a single validator's total stake.
    pub validator_maximum_stake: U256,

    /// Minimum amount for a new delegation relationship.
    pub minimum_deposit: U256,

    /// Maximum share of the block reward paid to the block author as a
    /// vote-inclusion bonus, in percent.
    pub max_block_author_reward: u16,

    /// Share of the block reward assigned to DAG block proposers, in percent.
    /// The remainder (minus the author bonus) goes to voters.
    pub dag_proposers_reward: u16,

    /// Maximum commission change per adjustment, in basis points.
    pub commission_change_delta: u16,

    /// Minimum number of blocks between two commission changes.
    pub commission_change_frequency: u32,

    /// Number of blocks after which delegation changes become visible to
    /// the eligibility view used by consensus.
    pub delegation_delay: u32,

    /// Number of blocks an undelegation stays locked before it can be
    /// confirmed.
    pub delegation_locking_period: u32,

    /// Expected number of blocks produced per year; denominator of the
    /// per-block yield.
    pub blocks_per_year: u32,

    /// Fixed annual yield in percent, used until the dynamic yield curve
    /// activates (Aspen part two).
    pub yield_percentage: u16,

    /// Token supply at genesis, before any rewards were minted.
    pub initial_total_supply: U256,

    /// Validators present from block zero.
    #[serde(default)]
    pub initial_validators: Vec<GenesisValidator>,

    /// Hardfork activation schedule.
    #[serde(default)]
    pub hardforks: HardforksConfig,
}

fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u128.pow(18))
}

impl Default for DposConfig {
    fn default() -> Self {
        Self {
            eligibility_balance_threshold: tokens(1_000_000),
            vote_eligibility_balance_step: tokens(1_000),
            validator_maximum_stake: tokens(10_000_000),
            minimum_deposit: tokens(1_000),
            max_block_author_reward: 10,
            dag_proposers_reward: 50,
            commission_change_delta: 500,
            commission_change_frequency: 43_200,
            delegation_delay: 5,
            delegation_locking_period: 302_400,
            blocks_per_year: 15_768_000,
            yield_percentage: 20,
            initial_total_supply: tokens(10_000_000_000),
            initial_validators: Vec::new(),
            hardforks: HardforksConfig::default(),
        }
    }
}

impl DposConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Number of consensus votes a stake of `stake` is worth.
    ///
    /// Zero below the eligibility threshold, otherwise
    /// `stake / vote_eligibility_balance_step` (saturating at `u64::MAX`).
    pub fn eligible_vote_count(&self, stake: &U256) -> u64 {
        if *stake < self.eligibility_balance_threshold
            || self.vote_eligibility_balance_step.is_zero()
        {
            return 0;
        }
        let votes = *stake / self.vote_eligibility_balance_step;
        u64::try_from(votes).unwrap_or(u64::MAX)
    }

    /// Validate parameter consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vote_eligibility_balance_step.is_zero() {
            return Err(ConfigError::Validation(
                "vote_eligibility_balance_step cannot be zero".into(),
            ));
        }
        if self.blocks_per_year == 0 {
            return Err(ConfigError::Validation(
                "blocks_per_year cannot be zero".into(),
            ));
        }
        if self.yield_percentage > 100 {
            return Err(ConfigError::Validation(
                "yield_percentage cannot exceed 100".into(),
            ));
        }
        if u32::from(self.dag_proposers_reward) + u32::from(self.max_block_author_reward) > 100 {
            return Err(ConfigError::Validation(
                "dag_proposers_reward + max_block_author_reward cannot exceed 100".into(),
            ));
        }
        if self.commission_change_delta > MAX_COMMISSION {
            return Err(ConfigError::Validation(
                "commission_change_delta cannot exceed 10000 basis points".into(),
            ));
        }
        if self.minimum_deposit.is_zero() {
            return Err(ConfigError::Validation(
                "minimum_deposit cannot be zero".into(),
            ));
        }
        if self.validator_maximum_stake < self.minimum_deposit {
            return Err(ConfigError::Validation(
                "validator_maximum_stake below minimum_deposit".into(),
            ));
        }
        for (i, v) in self.initial_validators.iter().enumerate() {
            if v.commission > MAX_COMMISSION {
                return Err(ConfigError::Validation(format!(
                    "initial validator {} commission exceeds 10000 basis points",
                    i
                )));
            }
            if v.delegations.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "initial validator {} has no delegations",
                    i
                )));
            }
            let total: U256 = v.delegations.values().copied().sum();
            if total > self.validator_maximum_stake {
                return Err(ConfigError::Validation(format!(
                    "initial validator {} stake exceeds validator_maximum_stake",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Validator present in the genesis state.
///
/// Genesis validators skip the ownership-proof check performed by
/// `registerValidator`; the genesis file is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisValidator {
    /// Validator address (consensus identity).
    pub address: Address,

    /// Owner account controlling commission and info updates.
    pub owner: Address,

    /// VRF public key used for DAG block proposal sortition.
    pub vrf_key: Bytes,

    /// Commission in basis points.
    pub commission: u16,

    /// Public endpoint, e.g. "host:port".
    #[serde(default)]
    pub endpoint: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Initial delegations: delegator address to staked amount.
    pub delegations: BTreeMap<Address, U256>,
}

impl GenesisValidator {
    /// Sum of all initial delegations to this validator.
    pub fn total_stake(&self) -> U256 {
        self.delegations.values().copied().sum()
    }
}

/// Historical redelegation correction entry.
///
/// Replayed once at the `fix_redelegate_block_num` boundary to credit
/// rewards lost to the pre-fix redelegation accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedelegationEntry {
    /// Affected delegator.
    pub delegator: Address,
    /// Validator the delegation points at.
    pub validator: Address,
    /// Reward amount to credit.
    pub amount: U256,
}

/// Hardfork activation schedule.
///
/// Each block number gates one behavioral branch; a fork set to zero is
/// active from genesis and `u64::MAX` disables it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardforksConfig {
    /// Activation of the corrected redelegation reward settlement.
    pub fix_redelegate_block_num: BlockNum,

    /// Correction entries replayed once at the fix-redelegate boundary.
    #[serde(default)]
    pub redelegations: Vec<RedelegationEntry>,

    /// Magnolia: undelegation-aware validator existence.
    pub magnolia_hf: MagnoliaHfConfig,

    /// Aspen: supply tracking (part one) and dynamic yield (part two).
    pub aspen_hf: AspenHfConfig,

    /// Cornus: multiple concurrent undelegations per pair.
    pub cornus_hf: CornusHfConfig,
}

impl Default for HardforksConfig {
    fn default() -> Self {
        Self {
            fix_redelegate_block_num: 0,
            redelegations: Vec::new(),
            magnolia_hf: MagnoliaHfConfig { block_num: 0 },
            aspen_hf: AspenHfConfig {
                block_num_part_one: 0,
                block_num_part_two: 0,
                max_supply: tokens(12_000_000_000),
                generated_rewards: U256::ZERO,
            },
            cornus_hf: CornusHfConfig {
                block_num: 0,
                delegation_locking_period: 302_400,
            },
        }
    }
}

impl HardforksConfig {
    /// Whether the Magnolia rules apply at `block`.
    pub fn is_magnolia_hardfork(&self, block: BlockNum) -> bool {
        block >= self.magnolia_hf.block_num
    }

    /// Whether reward-supply tracking is active at `block`.
    pub fn is_aspen_hardfork_part_one(&self, block: BlockNum) -> bool {
        block >= self.aspen_hf.block_num_part_one
    }

    /// Whether the dynamic yield curve is active at `block`.
    pub fn is_aspen_hardfork_part_two(&self, block: BlockNum) -> bool {
        block >= self.aspen_hf.block_num_part_two
    }

    /// Whether the Cornus undelegation rules apply at `block`.
    pub fn is_cornus_hardfork(&self, block: BlockNum) -> bool {
        block >= self.cornus_hf.block_num
    }

    /// Whether the corrected redelegation settlement applies at `block`.
    pub fn is_fix_redelegate_hardfork(&self, block: BlockNum) -> bool {
        block >= self.fix_redelegate_block_num
    }
}

/// Magnolia hardfork parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagnoliaHfConfig {
    /// Activation block.
    pub block_num: BlockNum,
}

/// Aspen hardfork parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AspenHfConfig {
    /// Activation of minted-reward supply tracking.
    pub block_num_part_one: BlockNum,
    /// Activation of the dynamic yield curve.
    pub block_num_part_two: BlockNum,
    /// Token supply ceiling the yield curve converges towards.
    pub max_supply: U256,
    /// Rewards minted before part one activated, precomputed off-chain and
    /// used to seed the on-chain supply counter.
    pub generated_rewards: U256,
}

/// Cornus hardfork parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CornusHfConfig {
    /// Activation block.
    pub block_num: BlockNum,
    /// Locking period applied to undelegations requested after activation.
    pub delegation_locking_period: u32,
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// JSON serialization error.
    #[error("config serialize error: {0}")]
    Serialize(String),
    /// Inconsistent parameter combination.
    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_genesis_validator() -> GenesisValidator {
        let mut delegations = BTreeMap::new();
        delegations.insert(Address::repeat_byte(0x11), tokens(5_000));
        GenesisValidator {
            address: Address::repeat_byte(0x01),
            owner: Address::repeat_byte(0x11),
            vrf_key: Bytes::from(vec![0xaa; 32]),
            commission: 1_000,
            endpoint: "boot0.lattice.example:10002".to_string(),
            description: "genesis validator".to_string(),
            delegations,
        }
    }

    #[test]
    fn test_default_config_validates() {
        assert!(DposConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_json_round_trip() {
        let mut config = DposConfig::default();
        config.initial_validators.push(sample_genesis_validator());
        let json = config.to_json().unwrap();
        let parsed = DposConfig::from_json(&json).unwrap();
        assert_eq!(
            parsed.eligibility_balance_threshold,
            config.eligibility_balance_threshold
        );
        assert_eq!(parsed.initial_validators.len(), 1);
        assert_eq!(
            parsed.initial_validators[0].total_stake(),
            tokens(5_000),
            "genesis delegations survive the round trip"
        );
    }

    #[test]
    fn test_eligible_vote_count_below_threshold() {
        let config = DposConfig::default();
        assert_eq!(config.eligible_vote_count(&tokens(999_999)), 0);
    }

    #[test]
    fn test_eligible_vote_count_at_threshold() {
        let config = DposConfig::default();
        // 1,000,000 tokens at a 1,000-token step
        assert_eq!(config.eligible_vote_count(&tokens(1_000_000)), 1_000);
    }

    #[test]
    fn test_eligible_vote_count_rounds_down() {
        let config = DposConfig::default();
        let stake = tokens(1_000_000) + tokens(1_500);
        assert_eq!(config.eligible_vote_count(&stake), 1_001);
    }

    #[test]
    fn test_validation_rejects_zero_step() {
        let mut config = DposConfig::default();
        config.vote_eligibility_balance_step = U256::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_reward_split_overflow() {
        let mut config = DposConfig::default();
        config.dag_proposers_reward = 60;
        config.max_block_author_reward = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_overweight_genesis_validator() {
        let mut config = DposConfig::default();
        let mut validator = sample_genesis_validator();
        validator
            .delegations
            .insert(Address::repeat_byte(0x22), config.validator_maximum_stake);
        config.initial_validators.push(validator);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hardfork_gating() {
        let mut hf = HardforksConfig::default();
        hf.magnolia_hf.block_num = 100;
        assert!(!hf.is_magnolia_hardfork(99));
        assert!(hf.is_magnolia_hardfork(100));
        assert!(hf.is_magnolia_hardfork(101));
    }

    #[test]
    fn test_disabled_hardfork() {
        let mut hf = HardforksConfig::default();
        hf.cornus_hf.block_num = u64::MAX;
        assert!(!hf.is_cornus_hardfork(u64::MAX - 1));
    }
}
