//! # Participant Addresses
//!
//! An [`Address`] is the 20-byte identity that names a channel participant:
//! the last 20 bytes of the Keccak-256 hash of the uncompressed secp256k1
//! public key (without its `0x04` tag byte). It is what signature recovery
//! returns and what the ledger keys balances by.
//!
//! Textual form is `0x` plus 40 hex digits. Parsing is case-insensitive;
//! display uses the EIP-55 mixed-case checksum so a typo in a copied address
//! is visible to a human even though the protocol never relies on it.

use k256::ecdsa::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::encoding::EncodingError;
use super::hash::keccak256;
use crate::config::ADDRESS_LENGTH;

/// A 20-byte participant identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive the address of a secp256k1 public key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the SEC1 0x04 tag; hash the 64-byte X ‖ Y body.
        let digest = keccak256(&point.as_bytes()[1..]);
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(&digest.as_bytes()[32 - ADDRESS_LENGTH..]);
        Self(out)
    }

    /// Build from a byte slice that must be exactly 20 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        let arr: [u8; ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| EncodingError::MalformedAddress(hex::encode(bytes)))?;
        Ok(Self(arr))
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// EIP-55 checksummed representation, `0x`-prefixed.
    pub fn to_checksum(&self) -> String {
        self.to_alloy().to_checksum(None)
    }

    /// The same 20 bytes as an `alloy` address, for ABI encoding.
    pub fn to_alloy(&self) -> alloy_primitives::Address {
        alloy_primitives::Address::new(self.0)
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if body.len() != 2 * ADDRESS_LENGTH {
            return Err(EncodingError::MalformedAddress(s.to_string()));
        }
        let bytes = hex::decode(body).map_err(|_| EncodingError::MalformedAddress(s.to_string()))?;
        Self::from_slice(&bytes).map_err(|_| EncodingError::MalformedAddress(s.to_string()))
    }
}

impl TryFrom<String> for Address {
    type Error = EncodingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.to_checksum()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip55_reference_vectors() {
        // Vectors from the EIP-55 specification.
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr: Address = expected.to_lowercase().parse().unwrap();
            assert_eq!(addr.to_checksum(), expected);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        let a: Address = "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED".parse().unwrap();
        let b: Address = "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        for bad in ["", "0x", "0x1234", "0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed", "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed00"] {
            assert!(
                matches!(bad.parse::<Address>(), Err(EncodingError::MalformedAddress(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn serde_uses_checksum_string() {
        let addr: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
