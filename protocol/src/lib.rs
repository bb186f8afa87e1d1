// Copyright (c) 2026 Tandem Contributors. MIT License.
// See LICENSE for details.

//! # Tandem Protocol Core Library
//!
//! Two parties, one shared ledger, and a lot of transfers they would rather
//! not pay to record one at a time. Tandem lets them trade a token balance
//! back and forth off the ledger by exchanging *receipts*: balance snapshots
//! that both parties sign. Only the last receipt ever touches the ledger.
//!
//! ## Architecture
//!
//! - **crypto**: canonical balance encoding, Keccak-256, recoverable
//!   secp256k1 signatures, and address recovery. This is the wire contract
//!   shared with the settlement verifier; change it and settlement breaks.
//! - **channel**: receipts, the builder that proposes the next receipt,
//!   and the approver that counter-signs it.
//! - **config**: protocol constants.
//!
//! ## Flow
//!
//! ```text
//!   build (sender signs) ──► approve (counterparty signs) ──► authorized
//!                                                              │
//!                         ┌────────────────────────────────────┤
//!                         ▼                                    ▼
//!              prior receipt for the next build        settlement on the ledger
//! ```
//!
//! ## What this crate does not do
//!
//! There is no dispute window and no challenge game. Both parties must
//! cooperate to authorize a receipt. A counterparty that stops answering
//! leaves the channel stuck at its last authorized receipt, and that is
//! accepted, not mitigated.

pub mod channel;
pub mod config;
pub mod crypto;
