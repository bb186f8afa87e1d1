//! The ledger seam the settlement contract writes through.

use tandem_protocol::crypto::Address;

use crate::token::TokenError;

/// Balance storage the settlement contract can rewrite.
///
/// Implementations must make [`overwrite_balances`](Ledger::overwrite_balances)
/// atomic: on error, no balance has changed.
pub trait Ledger {
    /// Current balance of `account`; zero for unknown accounts.
    fn balance_of(&self, account: &Address) -> u128;

    /// Set both accounts to the given balances.
    ///
    /// Fails if the accounts are the same or the new balances do not sum to
    /// the old ones, since either would change total supply.
    fn overwrite_balances(&mut self, updates: [(Address, u128); 2]) -> Result<(), TokenError>;
}
