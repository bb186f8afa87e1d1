// Copyright (c) 2026 Tandem Contributors. MIT License.
// See LICENSE for details.

//! # Tandem Settlement Contracts
//!
//! The on-ledger half of a Tandem channel. Receipts are built and signed
//! off the ledger by `tandem-protocol`; this crate is where the last one
//! lands:
//!
//! - **Token**: an ERC-20 style balance ledger. It holds the funds both
//!   participants trade against and knows nothing about channels.
//! - **Ledger**: the narrow trait the settlement contract needs from a
//!   ledger: read a balance, overwrite two balances without changing the
//!   supply.
//! - **State Channel**: the settlement verifier. It recovers both signers,
//!   checks that the receipt conserves the participants' combined balance,
//!   and rewrites their ledger balances in one step.
//!
//! ## Design Principles
//!
//! 1. Every monetary operation uses checked arithmetic.
//! 2. Settlement is all or nothing. A rejected call leaves the ledger
//!    exactly as it was.
//! 3. Every public type is serializable (serde) so a deployment can be
//!    persisted and reloaded.

pub mod ledger;
pub mod state_channel;
pub mod token;
