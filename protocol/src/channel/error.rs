//! Error types for receipt construction and approval.
//!
//! Builder and approver failures are local and synchronous. When one of
//! these is returned, no receipt was produced and the input receipt is
//! exactly as it was.

use thiserror::Error;

use super::types::{ReceiptState, Role};
use crate::crypto::{Address, EncodingError, SignatureError};

/// Errors that can occur while building or approving a receipt.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Input could not be canonically encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The prior receipt is missing at least one participant's message or
    /// signature and cannot anchor the next receipt.
    #[error("stale receipt: prior receipt at nonce {nonce} is {state}, not authorized")]
    StaleReceipt {
        /// Nonce of the rejected prior receipt.
        nonce: u64,
        /// How far the prior receipt got.
        state: ReceiptState,
    },

    /// The address occupies neither participant slot of the channel.
    #[error("unknown participant: {0} is not part of this channel")]
    UnknownParticipant(Address),

    /// The transfer exceeds what the sender holds in the channel.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Sender's current channel balance.
        available: u128,
        /// Transfer value.
        requested: u128,
    },

    /// Opening a channel without a prior receipt needs both balances.
    #[error("no prior receipt and no opening balances supplied")]
    MissingOpeningBalances,

    /// A credit, or the channel total, would not fit the balance type.
    #[error("balance overflow: {balance} + {credit} exceeds the balance range")]
    BalanceOverflow {
        /// Balance before the credit.
        balance: u128,
        /// Amount that would have been added.
        credit: u128,
    },

    /// The nonce space of this channel is exhausted.
    #[error("nonce overflow after {0}")]
    NonceOverflow(u64),

    /// The supplied key does not sign for the supplied address.
    #[error("key mismatch: key signs for {actual}, expected {expected}")]
    KeyMismatch {
        /// The address the caller claimed.
        expected: Address,
        /// The address the key actually belongs to.
        actual: Address,
    },

    /// Sender and target are the same participant.
    #[error("self transfer: {0} cannot pay itself through a channel")]
    SelfTransfer(Address),

    /// A signature slot does not cover this receipt's balance tuple or
    /// does not recover to the participant holding the slot.
    #[error("invalid signature in the {0} slot")]
    InvalidSignature(Role),

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    Signing(#[from] SignatureError),
}
