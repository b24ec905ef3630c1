// Ledger Operations Trait
// External balance authority, separate from the account/object store. The
// host routes these calls to its fungible-token module.

use crate::error::LedgerError;
use crate::types::Address;

/// Balance mutations delegated to the host's token module
pub trait LedgerOps {
    /// Remove `amount` from the balance of `address`. Fails with
    /// `LedgerError::InsufficientFunds` when the balance cannot cover it.
    fn debit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError>;

    /// Add `amount` to the balance of `address`. Used by the executor solely
    /// as the compensating action when a step after the debit fails.
    fn credit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError>;
}
