//! # ERC-20 Token
//!
//! A plain fungible token: the whole supply is minted to the deployer, and
//! balances move by direct transfer or by an approved spender. This is the
//! ledger a Tandem channel settles into.
//!
//! ## Rules
//!
//! - **Fixed supply**: there is no mint or burn after deployment. Every
//!   operation, settlement included, preserves `total_supply`.
//! - **Allowances overwrite**: `approve` sets the allowance, it does not add
//!   to it.
//! - **Checked arithmetic**: no balance ever wraps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tandem_protocol::crypto::Address;
use thiserror::Error;

use crate::ledger::Ledger;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during token operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The source account does not hold enough tokens.
    #[error("insufficient balance: {account} has {balance}, tried to move {amount}")]
    InsufficientBalance {
        /// The account being debited.
        account: Address,
        /// Its current balance.
        balance: u128,
        /// Amount requested.
        amount: u128,
    },

    /// The spender has not been approved for this much.
    #[error("insufficient allowance: {spender} may move {allowance} for {owner}, tried {amount}")]
    InsufficientAllowance {
        /// Account whose tokens would move.
        owner: Address,
        /// Account attempting the move.
        spender: Address,
        /// Remaining allowance.
        allowance: u128,
        /// Amount requested.
        amount: u128,
    },

    /// A credit would exceed the balance range.
    #[error("overflow: crediting {amount} exceeds the balance range")]
    Overflow {
        /// The amount that was attempted.
        amount: u128,
    },

    /// A balance rewrite would change total supply.
    #[error("supply mismatch: accounts held {before:?}, rewrite assigns {after:?}")]
    SupplyMismatch {
        /// Combined balance before the rewrite. `None` if it overflows.
        before: Option<u128>,
        /// Combined balance the rewrite would assign. `None` if it overflows.
        after: Option<u128>,
    },

    /// A balance rewrite named the same account twice.
    #[error("duplicate account in balance rewrite: {0}")]
    DuplicateAccount(Address),
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An in-memory ERC-20 style token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Token {
    /// The deployer; received the initial supply.
    owner: Address,
    /// Fixed at deployment.
    total_supply: u128,
    /// Per-account balances. Absent means zero.
    balances: BTreeMap<Address, u128>,
    /// `owner -> (spender -> remaining allowance)`.
    allowances: BTreeMap<Address, BTreeMap<Address, u128>>,
}

impl Erc20Token {
    /// Deploy a token and credit the whole `initial_supply` to `owner`.
    pub fn deploy(owner: Address, initial_supply: u128) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(owner, initial_supply);
        tracing::info!(%owner, initial_supply = %initial_supply, "token deployed");
        Self {
            owner,
            total_supply: initial_supply,
            balances,
            allowances: BTreeMap::new(),
        }
    }

    /// The deploying account.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Total tokens in existence.
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Balance of `account`, or 0.
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Remaining amount `spender` may move on behalf of `owner`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Move `amount` from `from` to `to`, authorized by `from` itself.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientBalance`] if `from` holds less than
    /// `amount`, and [`TokenError::Overflow`] if `to` cannot be credited.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        self.move_balance(from, to, amount)?;
        tracing::debug!(%from, %to, amount = %amount, "token transfer");
        Ok(())
    }

    /// Set how much `spender` may move on behalf of `owner`.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, amount);
        tracing::debug!(%owner, %spender, amount = %amount, "allowance set");
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InsufficientAllowance`] before looking at
    /// balances if the allowance is too small. Otherwise as
    /// [`transfer`](Self::transfer). Allowance is only consumed on success.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                allowance,
                amount,
            });
        }

        self.move_balance(from, to, amount)?;
        self.approve(from, spender, allowance - amount);
        tracing::debug!(%spender, %from, %to, amount = %amount, "delegated token transfer");
        Ok(())
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: *from,
                balance: from_balance,
                amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow { amount })?;

        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, to_balance);
        Ok(())
    }
}

impl Ledger for Erc20Token {
    fn balance_of(&self, account: &Address) -> u128 {
        Erc20Token::balance_of(self, account)
    }

    fn overwrite_balances(&mut self, updates: [(Address, u128); 2]) -> Result<(), TokenError> {
        let [(first, first_balance), (second, second_balance)] = updates;
        if first == second {
            return Err(TokenError::DuplicateAccount(first));
        }

        // A reloaded deployment is not guaranteed to respect total_supply,
        // so an overflowing sum is a mismatch rather than a clamp.
        let before = self.balance_of(&first).checked_add(self.balance_of(&second));
        let after = first_balance.checked_add(second_balance);
        if before.is_none() || after != before {
            return Err(TokenError::SupplyMismatch { before, after });
        }

        self.balances.insert(first, first_balance);
        self.balances.insert(second, second_balance);
        Ok(())
    }
}
