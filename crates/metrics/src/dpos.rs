//! DPOS precompile metrics.

use once_cell::sync::Lazy;
use prometheus::{Counter, Gauge, Registry};

// Validator lifecycle
pub static DPOS_VALIDATORS_REGISTERED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "lattice_dpos_validators_registered_total",
        "Total validators registered",
    )
    .expect("metric can be created")
});

pub static DPOS_VALIDATORS_DELETED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "lattice_dpos_validators_deleted_total",
        "Total validators removed after their stake, rewards and undelegations drained",
    )
    .expect("metric can be created")
});

// Delegation flow
pub static DPOS_DELEGATIONS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "lattice_dpos_delegations_total",
        "Total delegate calls applied",
    )
    .expect("metric can be created")
});

pub static DPOS_UNDELEGATIONS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "lattice_dpos_undelegations_total",
        "Total undelegation requests created (V1 and V2)",
    )
    .expect("metric can be created")
});

pub static DPOS_TOTAL_STAKE: Lazy<Gauge> = Lazy::new(|| {
    Gauge::new(
        "lattice_dpos_total_stake",
        "Current total delegated stake in whole tokens",
    )
    .expect("metric can be created")
});

// Rewards
pub static DPOS_REWARD_DISTRIBUTIONS: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "lattice_dpos_reward_distributions_total",
        "Total per-block reward distributions executed",
    )
    .expect("metric can be created")
});

pub static DPOS_REWARDS_CLAIMED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "lattice_dpos_rewards_claimed_total",
        "Total reward claim payouts (delegator and commission)",
    )
    .expect("metric can be created")
});

/// Register all DPOS metrics on `registry`.
pub fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(DPOS_VALIDATORS_REGISTERED.clone()))
        .ok();
    registry
        .register(Box::new(DPOS_VALIDATORS_DELETED.clone()))
        .ok();
    registry.register(Box::new(DPOS_DELEGATIONS.clone())).ok();
    registry.register(Box::new(DPOS_UNDELEGATIONS.clone())).ok();
    registry.register(Box::new(DPOS_TOTAL_STAKE.clone())).ok();
    registry
        .register(Box::new(DPOS_REWARD_DISTRIBUTIONS.clone()))
        .ok();
    registry
        .register(Box::new(DPOS_REWARDS_CLAIMED.clone()))
        .ok();
}
