//! Core types for the Lattice DPOS engine.
//!
//! This crate provides the chain-level configuration (DPOS parameters,
//! hardfork schedule, genesis validators) and the consensus-facing value
//! types (per-block rewards statistics) shared by the execution and
//! consensus layers.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod rewards;

pub use config::{
    AspenHfConfig, ConfigError, CornusHfConfig, DposConfig, GenesisValidator, HardforksConfig,
    MagnoliaHfConfig, RedelegationEntry, MAX_COMMISSION,
};
pub use rewards::{RewardsStats, ValidatorStats};

/// Block number on the final chain.
pub type BlockNum = u64;
