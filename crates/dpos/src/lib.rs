//! Lattice DPOS Precompile
//!
//! This crate implements the delegated-proof-of-stake registry that the
//! Lattice execution engine mounts as a precompiled contract at address
//! `0x0000000000000000000000000000000000000100`. Validators register with a
//! key-ownership proof, token holders delegate and undelegate stake, and
//! block rewards accrue to delegations through a per-validator reward
//! accumulator.
//!
//! # Architecture
//!
//! The engine drives the contract through three entry points:
//! 1. [`DposContract::apply_genesis`] installs the configured validator set
//! 2. [`DposContract::run`] executes ABI calls addressed to the contract
//! 3. [`DposContract::distribute_rewards`] mints block rewards from
//!    consensus participation statistics
//!
//! Consensus reads vote eligibility through [`DposReader`], which answers
//! from a state handle lagged by `delegation_delay` blocks so every node
//! resolves identical weights.
//!
//! # Key Features
//!
//! - **Full ABI surface**: typed `sol!` interface, selector dispatch, EVM
//!   revert reasons and event logs on the call output
//! - **Two undelegation schemes**: the legacy one-pending-per-pair records
//!   and id-keyed v2 records, switched over at the Cornus hardfork
//! - **Lazy reward accounting**: O(1) per-delegation settlement against a
//!   per-validator `rewards_per_stake` accumulator
//! - **Hardfork replay**: historical quirks (validator deletion rules, the
//!   redelegation settlement bug) are reproduced exactly so old blocks
//!   replay to identical state
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_dpos::{DposContract, DPOS_CONTRACT_ADDRESS};
//! use lattice_storage::{InMemoryLedger, InMemoryState};
//! use lattice_types::DposConfig;
//! use std::sync::Arc;
//!
//! let state = Arc::new(InMemoryState::new());
//! let ledger = Arc::new(InMemoryLedger::new());
//! let contract = DposContract::new(
//!     DposConfig::default(),
//!     state.clone(),
//!     Arc::new(state.at_block(delayed_block)),
//!     ledger,
//! );
//! contract.apply_genesis()?;
//!
//! let output = contract.run(&calldata, gas_limit, caller, value, block)?;
//! println!("gas used: {}", output.gas_used);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod abi;
pub mod contract;
mod delegations;
pub mod error;
pub mod events;
pub mod gas;
mod iterable_set;
pub mod proof;
pub mod reader;
mod rewards;
mod storage;
mod undelegations;
mod validators;
mod yield_curve;

// Re-export main types for convenience
pub use abi::IDpos;
pub use contract::{CallOutput, DposContract, DPOS_CONTRACT_ADDRESS};
pub use error::{DposError, Result};
pub use events::LogEntry;
pub use reader::DposReader;

// Re-export commonly used external types
pub use alloy_primitives::{Address, Bytes, B256, U256};
