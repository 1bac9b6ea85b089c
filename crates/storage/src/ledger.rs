//! Account balance ledger trait.
//!
//! Undelegation payouts, reward claims and reward minting move native
//! tokens between accounts. The DPOS engine never owns account balances
//! itself; it asks the execution engine through this interface.

use crate::error::Result;
use alloy_primitives::{Address, U256};

/// Native-token balance operations on arbitrary accounts.
pub trait BalanceLedger: Send + Sync {
    /// Current balance of `address`.
    fn balance(&self, address: &Address) -> Result<U256>;

    /// Credit `amount` to `address`.
    ///
    /// Fails with [`StorageError::BalanceOverflow`](crate::StorageError)
    /// if the balance would exceed `U256::MAX`.
    fn add_balance(&self, address: &Address, amount: U256) -> Result<()>;

    /// Debit `amount` from `address`.
    ///
    /// Fails with
    /// [`StorageError::InsufficientBalance`](crate::StorageError) if the
    /// balance is too low.
    fn sub_balance(&self, address: &Address, amount: U256) -> Result<()>;
}
