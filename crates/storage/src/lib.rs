//! Storage layer for the Lattice DPOS engine
//!
//! This crate defines the two interfaces the DPOS precompile consumes
//! from the surrounding state-transition engine:
//!
//! - [`StateStore`]: flat key-value contract state (backed by the state
//!   trie in production)
//! - [`BalanceLedger`]: native-token account balances (payouts, claims
//!   and reward minting)
//!
//! # Architecture
//!
//! Trait-based abstractions keep the DPOS engine independent of any
//! concrete database:
//! - [`InMemoryState`]: in-memory state with block-indexed snapshots, for
//!   tests and development
//! - [`InMemoryLedger`]: in-memory balance ledger
//!
//! # Usage
//!
//! ```ignore
//! use lattice_storage::{InMemoryState, StateStore};
//!
//! let state = InMemoryState::new();
//! state.put(b"key", b"value")?;
//! state.snapshot(10);
//! let view = state.at_block(10); // read-only historical handle
//! ```

pub mod error;
pub mod ledger;
pub mod memory;
pub mod state;

pub use error::{Result, StorageError};
pub use ledger::BalanceLedger;
pub use memory::{InMemoryLedger, InMemoryState};
pub use state::StateStore;
