//! # Canonical Balance Encoding
//!
//! The message both participants sign, and the message the settlement
//! verifier recomputes, is the Keccak-256 digest of a *tightly packed*,
//! *typed* field list:
//!
//! ```text
//!   offset  size  type      field
//!   ------  ----  --------  --------------------
//!        0    32  uint256   participant1Balance   (big-endian, left-padded)
//!       32    32  uint256   participant2Balance   (big-endian, left-padded)
//!       64    20  address   participant1
//!       84    20  address   participant2
//! ```
//!
//! This is Solidity's `abi.encodePacked(uint, uint, address, address)`. The
//! order and the per-field types are the protocol. Swapping two fields,
//! or encoding a balance as anything narrower than 32 bytes, produces a
//! different digest and every signature stops verifying.

use alloy_primitives::U256;
use alloy_sol_types::SolValue;
use thiserror::Error;

use super::address::Address;
use super::hash::{keccak256, Digest};
use crate::config::CANONICAL_ENCODING_LENGTH;

/// Errors produced when input cannot be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A balance is negative, not a decimal integer, or too large for the
    /// balance type.
    #[error("balance is not representable as an unsigned integer: {0:?}")]
    UnrepresentableBalance(String),

    /// An address is not 20 bytes of hex.
    #[error("malformed address: {0:?}")]
    MalformedAddress(String),

    /// A digest is not 32 bytes of hex.
    #[error("malformed message digest: {0:?}")]
    MalformedDigest(String),

    /// Signature bytes are the wrong length or carry an invalid component.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}

/// Pack the balance tuple in canonical order.
pub fn encode_balance_tuple(
    participant1_balance: u128,
    participant2_balance: u128,
    participant1: &Address,
    participant2: &Address,
) -> Vec<u8> {
    let encoded = (
        U256::from(participant1_balance),
        U256::from(participant2_balance),
        participant1.to_alloy(),
        participant2.to_alloy(),
    )
        .abi_encode_packed();
    debug_assert_eq!(encoded.len(), CANONICAL_ENCODING_LENGTH);
    encoded
}

/// The digest every receipt signature is made over.
pub fn balance_message(
    participant1_balance: u128,
    participant2_balance: u128,
    participant1: &Address,
    participant2: &Address,
) -> Digest {
    keccak256(&encode_balance_tuple(
        participant1_balance,
        participant2_balance,
        participant1,
        participant2,
    ))
}

/// Parse a decimal balance as it arrives from transport or the command line.
///
/// Rejects signs, fractions, whitespace and anything that does not fit the
/// balance type with [`EncodingError::UnrepresentableBalance`].
pub fn parse_balance(s: &str) -> Result<u128, EncodingError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodingError::UnrepresentableBalance(s.to_string()));
    }
    s.parse::<u128>()
        .map_err(|_| EncodingError::UnrepresentableBalance(s.to_string()))
}
