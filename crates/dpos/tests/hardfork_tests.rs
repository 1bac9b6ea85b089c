//! Integration tests for hardfork-gated behavior.
//!
//! Every fork in the schedule flips one branch at one block number. These
//! tests pin both sides of each boundary:
//! - Magnolia: undelegation-aware validator existence
//! - Cornus: the v1 to v2 undelegation switchover and the shorter
//!   locking period
//! - The redelegation settlement fix and its one-shot correction replay
//! - Aspen part one: when minted rewards start counting into the supply

use std::sync::Arc;

use alloy_primitives::{keccak256, Address, U256};
use alloy_sol_types::{Revert, SolCall, SolError, SolEvent};
use k256::ecdsa::SigningKey;
use lattice_dpos::proof::address_of;
use lattice_dpos::{CallOutput, DposContract, IDpos, DPOS_CONTRACT_ADDRESS};
use lattice_storage::{BalanceLedger, InMemoryLedger, InMemoryState};
use lattice_types::{DposConfig, RedelegationEntry, RewardsStats};

const GAS_LIMIT: u64 = 100_000_000;

struct Harness {
    contract: DposContract<InMemoryState, InMemoryLedger>,
    ledger: Arc<InMemoryLedger>,
}

impl Harness {
    fn new(config: DposConfig) -> Self {
        let state = Arc::new(InMemoryState::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let contract = DposContract::new(config, state.clone(), state, ledger.clone());
        Self { contract, ledger }
    }

    fn call(&self, caller: Address, value: u64, block: u64, input: Vec<u8>) -> CallOutput {
        self.ledger
            .add_balance(&DPOS_CONTRACT_ADDRESS, U256::from(value))
            .unwrap();
        self.contract
            .run(&input, GAS_LIMIT, caller, U256::from(value), block)
            .unwrap()
    }

    fn call_ok(&self, caller: Address, value: u64, block: u64, input: Vec<u8>) -> CallOutput {
        let output = self.call(caller, value, block, input);
        assert!(!output.reverted, "unexpected revert: {}", reason(&output));
        output
    }

    fn register(&self, owner: Address, stake: u64, block: u64) -> Address {
        let key = SigningKey::random(&mut rand::thread_rng());
        let (validator, input) = registration_call(owner, &key);
        self.call_ok(owner, stake, block, input);
        validator
    }

    fn delegate(&self, delegator: Address, validator: Address, amount: u64, block: u64) {
        self.call_ok(
            delegator,
            amount,
            block,
            IDpos::delegateCall { validator }.abi_encode(),
        );
    }

    fn undelegate(&self, delegator: Address, validator: Address, amount: u64, block: u64) {
        self.call_ok(
            delegator,
            0,
            block,
            IDpos::undelegateCall {
                validator,
                amount: U256::from(amount),
            }
            .abi_encode(),
        );
    }

    fn distribute(&self, block: u64, stats: &RewardsStats) -> U256 {
        self.contract.distribute_rewards(block, stats).unwrap()
    }

    /// Pending rewards of `delegator` towards `validator` per the getters.
    fn pending(&self, delegator: Address, validator: Address, block: u64) -> U256 {
        let output = self.call_ok(
            delegator,
            0,
            block,
            IDpos::getDelegationsCall {
                delegator,
                batch: 0,
            }
            .abi_encode(),
        );
        let ret = IDpos::getDelegationsCall::abi_decode_returns(&output.bytes, true).unwrap();
        ret.delegations
            .iter()
            .find(|d| d.account == validator)
            .map(|d| d.delegation.rewards)
            .unwrap_or_default()
    }

    fn balance(&self, account: Address) -> U256 {
        self.ledger.balance(&account).unwrap()
    }
}

fn reason(output: &CallOutput) -> String {
    assert!(output.reverted, "expected a revert");
    Revert::abi_decode(&output.bytes, true).unwrap().reason
}

/// Build a registerValidator call signed by `key`, returning the validator
/// address it registers.
fn registration_call(owner: Address, key: &SigningKey) -> (Address, Vec<u8>) {
    let validator = address_of(key.verifying_key());
    let digest = keccak256(owner.as_slice());
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
    let mut proof = signature.to_bytes().to_vec();
    proof.push(recovery_id.to_byte());
    let input = IDpos::registerValidatorCall {
        validator,
        proof: proof.into(),
        vrf_key: vec![0x11u8; 32].into(),
        commission: 0,
        description: String::new(),
        endpoint: String::new(),
    }
    .abi_encode();
    (validator, input)
}

fn base_config() -> DposConfig {
    let mut config = DposConfig::default();
    config.eligibility_balance_threshold = U256::from(1_000u64);
    config.vote_eligibility_balance_step = U256::from(1_000u64);
    config.validator_maximum_stake = U256::from(10_000_000u64);
    config.minimum_deposit = U256::from(1_000u64);
    config.delegation_locking_period = 100;
    config.blocks_per_year = 100;
    config.yield_percentage = 20;
    config.dag_proposers_reward = 50;
    config.max_block_author_reward = 10;
    config.initial_total_supply = U256::from(1_000_000u64);
    config.hardforks.aspen_hf.block_num_part_one = u64::MAX;
    config.hardforks.aspen_hf.block_num_part_two = u64::MAX;
    config.hardforks.cornus_hf.block_num = u64::MAX;
    config.hardforks.cornus_hf.delegation_locking_period = 50;
    config
}

fn account(seed: u8) -> Address {
    Address::repeat_byte(seed)
}

/// Stats attributing the whole block to one validator.
fn solo_stats(validator: Address) -> RewardsStats {
    let mut stats = RewardsStats::new(validator);
    stats.add_dag_blocks(validator, 1);
    stats.add_vote(validator, 100);
    stats.max_votes_weight = 100;
    stats
}

// ============================================================================
// Magnolia
// ============================================================================

#[test]
fn magnolia_keeps_zero_stake_validators_with_pending_undelegations() {
    let mut config = base_config();
    config.hardforks.magnolia_hf.block_num = 50;
    let harness = Harness::new(config);
    let owner_a = account(0x42);
    let owner_b = account(0x43);
    let a = harness.register(owner_a, 5_000, 1);
    let b = harness.register(owner_b, 5_000, 1);

    // Before the fork a fully-undelegated validator is deleted even
    // though the withdrawal is still pending.
    harness.undelegate(owner_a, a, 5_000, 10);
    let output = harness.call(owner_a, 0, 11, IDpos::getValidatorCall { validator: a }.abi_encode());
    assert_eq!(reason(&output), "Validator does not exist");

    // The undelegation record outlives the validator and reports that.
    let output = harness.call_ok(
        owner_a,
        0,
        11,
        IDpos::getUndelegationsCall {
            delegator: owner_a,
            batch: 0,
        }
        .abi_encode(),
    );
    let ret = IDpos::getUndelegationsCall::abi_decode_returns(&output.bytes, true).unwrap();
    assert_eq!(ret.undelegations.len(), 1);
    assert!(!ret.undelegations[0].validator_exists);

    // Cancelling needs the validator back; confirming does not.
    let output = harness.call(
        owner_a,
        0,
        12,
        IDpos::cancelUndelegateCall { validator: a }.abi_encode(),
    );
    assert_eq!(reason(&output), "Validator does not exist");
    harness.call_ok(
        owner_a,
        0,
        110,
        IDpos::confirmUndelegateCall { validator: a }.abi_encode(),
    );
    assert_eq!(harness.balance(owner_a), U256::from(5_000u64));

    // After the fork the pending undelegation keeps the validator alive.
    harness.undelegate(owner_b, b, 5_000, 60);
    let output = harness.call_ok(owner_b, 0, 61, IDpos::getValidatorCall { validator: b }.abi_encode());
    let info = IDpos::getValidatorCall::abi_decode_returns(&output.bytes, true)
        .unwrap()
        .validator_info;
    assert_eq!(info.total_stake, U256::ZERO);
    assert_eq!(info.undelegations_count, 1);

    // Which also means the undelegation can still be cancelled.
    harness.call_ok(
        owner_b,
        0,
        62,
        IDpos::cancelUndelegateCall { validator: b }.abi_encode(),
    );
    let output = harness.call_ok(owner_b, 0, 63, IDpos::getValidatorCall { validator: b }.abi_encode());
    let info = IDpos::getValidatorCall::abi_decode_returns(&output.bytes, true)
        .unwrap()
        .validator_info;
    assert_eq!(info.total_stake, U256::from(5_000u64));
    assert_eq!(info.undelegations_count, 0);
}

// ============================================================================
// Cornus
// ============================================================================

#[test]
fn cornus_switches_the_undelegation_scheme_at_the_boundary() {
    let mut config = base_config();
    config.hardforks.cornus_hf.block_num = 100;
    let harness = Harness::new(config);
    let owner = account(0x42);
    let delegator = account(0x43);
    let validator = harness.register(owner, 10_000, 1);
    harness.delegate(delegator, validator, 5_000, 2);

    let v1 = |amount: u64| {
        IDpos::undelegateCall {
            validator,
            amount: U256::from(amount),
        }
        .abi_encode()
    };
    let v2 = |amount: u64| {
        IDpos::undelegateV2Call {
            validator,
            amount: U256::from(amount),
        }
        .abi_encode()
    };

    // Before the fork only v1 exists.
    let output = harness.call(owner, 0, 99, v2(1_000));
    assert_eq!(reason(&output), "Method is not supported");
    harness.call_ok(owner, 0, 99, v1(1_000));
    harness.call_ok(delegator, 0, 99, v1(1_000));

    // From the fork block on it is the other way around.
    let output = harness.call(owner, 0, 100, v1(1_000));
    assert_eq!(reason(&output), "Method is not supported");
    let output = harness.call_ok(owner, 0, 100, v2(1_000));
    let id = IDpos::undelegateV2Call::abi_decode_returns(&output.bytes, true)
        .unwrap()
        .undelegation_id;
    assert_eq!(id, 1);

    // The v1 record from block 99 keeps its 100-block lock; the v2 one
    // uses the shorter post-Cornus period.
    let output = harness.call_ok(
        owner,
        0,
        101,
        IDpos::getUndelegationsCall {
            delegator: owner,
            batch: 0,
        }
        .abi_encode(),
    );
    let ret = IDpos::getUndelegationsCall::abi_decode_returns(&output.bytes, true).unwrap();
    assert_eq!(ret.undelegations.len(), 1);
    assert_eq!(ret.undelegations[0].block, 199);

    let output = harness.call_ok(
        owner,
        0,
        101,
        IDpos::getUndelegationsV2Call {
            delegator: owner,
            batch: 0,
        }
        .abi_encode(),
    );
    let ret = IDpos::getUndelegationsV2Call::abi_decode_returns(&output.bytes, true).unwrap();
    assert_eq!(ret.undelegations_v2.len(), 1);
    assert_eq!(ret.undelegations_v2[0].undelegation_data.block, 150);

    // The v2 record confirms at its own unlock height, while the v1 one
    // is still locked; old v1 records stay cancelable across the fork.
    harness.call_ok(
        owner,
        0,
        150,
        IDpos::confirmUndelegateV2Call {
            validator,
            undelegation_id: 1,
        }
        .abi_encode(),
    );
    assert_eq!(harness.balance(owner), U256::from(1_000u64));
    harness.call_ok(
        delegator,
        0,
        150,
        IDpos::cancelUndelegateCall { validator }.abi_encode(),
    );

    let output = harness.call(
        owner,
        0,
        198,
        IDpos::confirmUndelegateCall { validator }.abi_encode(),
    );
    assert_eq!(reason(&output), "Undelegation is not yet unlocked");
    harness.call_ok(
        owner,
        0,
        199,
        IDpos::confirmUndelegateCall { validator }.abi_encode(),
    );
    assert_eq!(harness.balance(owner), U256::from(2_000u64));
}

// ============================================================================
// Redelegation settlement fix
// ============================================================================

/// Two validators with a shared delegator and one block of rewards
/// accrued on the destination before the redelegation.
fn redelegate_fixture(config: DposConfig) -> (Harness, Address, Address, Address) {
    let harness = Harness::new(config);
    let delegator = account(0x44);
    let a = harness.register(account(0x42), 10_000, 1);
    let b = harness.register(account(0x43), 10_000, 1);
    harness.delegate(delegator, a, 10_000, 2);
    harness.delegate(delegator, b, 10_000, 2);

    // One solo block for `b`: 40_000 staked mints 80, all of it on `b`,
    // so the delegator's half is 40.
    harness.distribute(3, &solo_stats(b));
    assert_eq!(harness.pending(delegator, b, 4), U256::from(40u64));
    (harness, delegator, a, b)
}

#[test]
fn redelegate_before_the_fix_inflates_pending_rewards() {
    let mut config = base_config();
    config.hardforks.fix_redelegate_block_num = u64::MAX;
    let (harness, delegator, a, b) = redelegate_fixture(config);

    // The historical code topped up the destination without settling it
    // first, so the enlarged stake multiplies into the old accumulator
    // delta: the pending 40 doubles along with the stake.
    harness.call_ok(
        delegator,
        0,
        5,
        IDpos::reDelegateCall {
            validator_from: a,
            validator_to: b,
            amount: U256::from(10_000u64),
        }
        .abi_encode(),
    );
    assert_eq!(harness.pending(delegator, b, 6), U256::from(80u64));
}

#[test]
fn redelegate_after_the_fix_settles_the_destination_first() {
    let mut config = base_config();
    config.hardforks.fix_redelegate_block_num = 0;
    let (harness, delegator, a, b) = redelegate_fixture(config);

    harness.call_ok(
        delegator,
        0,
        5,
        IDpos::reDelegateCall {
            validator_from: a,
            validator_to: b,
            amount: U256::from(10_000u64),
        }
        .abi_encode(),
    );
    assert_eq!(harness.pending(delegator, b, 6), U256::from(40u64));
}

#[test]
fn corrections_replay_exactly_once_at_the_fix_block() {
    let owner = account(0x42);
    let delegator = account(0x43);
    let ghost = account(0x99);
    let key = SigningKey::random(&mut rand::thread_rng());
    let (validator, register_input) = registration_call(owner, &key);

    // The correction list references one live delegation and one that no
    // longer exists.
    let mut config = base_config();
    config.hardforks.fix_redelegate_block_num = 10;
    config.hardforks.redelegations = vec![
        RedelegationEntry {
            delegator,
            validator,
            amount: U256::from(25u64),
        },
        RedelegationEntry {
            delegator: ghost,
            validator,
            amount: U256::from(99u64),
        },
    ];
    let harness = Harness::new(config);
    harness.call_ok(owner, 10_000, 1, register_input);
    harness.delegate(delegator, validator, 5_000, 2);

    // Before the fix block nothing is credited.
    harness.distribute(9, &RewardsStats::new(Address::ZERO));
    assert_eq!(harness.pending(delegator, validator, 9), U256::ZERO);

    // At the boundary the live entry is credited and the ghost skipped.
    harness.distribute(10, &RewardsStats::new(Address::ZERO));
    assert_eq!(harness.pending(delegator, validator, 10), U256::from(25u64));

    // Replaying does not double-credit.
    harness.distribute(11, &RewardsStats::new(Address::ZERO));
    assert_eq!(harness.pending(delegator, validator, 11), U256::from(25u64));

    // The credit is backed and claimable.
    let output = harness.call_ok(
        delegator,
        0,
        12,
        IDpos::claimRewardsCall { validator }.abi_encode(),
    );
    let event = IDpos::RewardsClaimed::decode_log_data(&output.logs[0].data, true).unwrap();
    assert_eq!(event.amount, U256::from(25u64));
    assert_eq!(harness.balance(delegator), U256::from(25u64));
}

// ============================================================================
// Aspen part one
// ============================================================================

#[test]
fn supply_tracking_starts_at_part_one() {
    let mut config = base_config();
    config.hardforks.aspen_hf.block_num_part_one = 5;
    config.hardforks.aspen_hf.block_num_part_two = 0;
    config.hardforks.aspen_hf.max_supply = U256::from(1_100_000u64);
    config.blocks_per_year = 1;
    let harness = Harness::new(config);
    let owner = account(0x42);
    let validator = harness.register(owner, 100_000, 1);

    // Until part one, minted rewards do not count into the supply, so
    // the 10% gap yield repeats.
    assert_eq!(harness.distribute(2, &solo_stats(validator)), U256::from(10_000u64));
    assert_eq!(harness.distribute(3, &solo_stats(validator)), U256::from(10_000u64));

    // The first tracked block still sees the untracked supply; the one
    // after it mints against the recorded growth.
    assert_eq!(harness.distribute(5, &solo_stats(validator)), U256::from(10_000u64));
    assert_eq!(harness.distribute(6, &solo_stats(validator)), U256::from(8_910u64));
}

#[test]
fn generated_rewards_seed_counts_prior_minting() {
    let mut config = base_config();
    config.hardforks.aspen_hf.block_num_part_one = 0;
    config.hardforks.aspen_hf.block_num_part_two = 0;
    config.hardforks.aspen_hf.max_supply = U256::from(1_100_000u64);
    config.hardforks.aspen_hf.generated_rewards = U256::from(10_000u64);
    config.blocks_per_year = 1;
    let harness = Harness::new(config);
    let owner = account(0x42);
    let validator = harness.register(owner, 100_000, 1);

    // The seed stands in for pre-fork minting history: the very first
    // distribution already runs against a 1_010_000 supply.
    assert_eq!(harness.distribute(2, &solo_stats(validator)), U256::from(8_910u64));
}
