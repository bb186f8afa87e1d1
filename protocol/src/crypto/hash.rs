//! # Hashing Utilities
//!
//! One hash function, on purpose. Receipts are hashed with Keccak-256 (the
//! pre-standard SHA-3 variant, not FIPS-202 SHA3-256) because the settlement
//! verifier recomputes the digest with exactly that function. Mixing the two
//! is a classic interop bug: same family, different padding, different output.

use serde::{Deserialize, Serialize};
use sha3::{Digest as _, Keccak256};
use std::fmt;

use super::encoding::EncodingError;
use crate::config::DIGEST_LENGTH;

/// A 32-byte Keccak-256 digest.
///
/// Used as the `message` half of every receipt signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest([u8; DIGEST_LENGTH]);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a hex digest, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| EncodingError::MalformedDigest(s.to_string()))?;
        let arr: [u8; DIGEST_LENGTH] = bytes
            .try_into()
            .map_err(|_| EncodingError::MalformedDigest(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Digest {
    type Error = EncodingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.to_hex()
    }
}

/// Compute the Keccak-256 hash of the input data.
///
/// # Example
///
/// ```
/// use tandem_protocol::crypto::keccak256;
///
/// let digest = keccak256(b"");
/// assert_eq!(
///     digest.to_hex(),
///     "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> Digest {
    Digest(Keccak256::digest(data).into())
}
