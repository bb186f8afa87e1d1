//! # Key Management
//!
//! secp256k1 keypairs for channel participants.
//!
//! Every participant is identified by an [`Address`] and owns exactly one
//! signing key for it. The protocol never persists keys; custody belongs to
//! whoever calls it. This module only makes the key usable and keeps it out
//! of places it should not end up (debug output, serde, logs).

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use super::address::Address;
use crate::config::SECRET_KEY_LENGTH;

/// Errors that can occur while loading key material.
///
/// Deliberately terse: error text should never echo key bytes back.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key: not a 32-byte non-zero scalar below the curve order")]
    InvalidSecretKey,
}

/// A participant's signing key together with its derived address.
///
/// `ChannelKeypair` intentionally does NOT implement `Serialize`. Exporting
/// a private key should be an explicit call to
/// [`secret_key_bytes`](Self::secret_key_bytes), not a side effect of
/// dumping a struct to JSON.
///
/// # Examples
///
/// ```
/// use tandem_protocol::crypto::ChannelKeypair;
///
/// let kp = ChannelKeypair::generate();
/// let again = ChannelKeypair::from_bytes(&kp.secret_key_bytes()).unwrap();
/// assert_eq!(kp.address(), again.address());
/// ```
#[derive(Clone)]
pub struct ChannelKeypair {
    signing_key: SigningKey,
    address: Address,
}

impl ChannelKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Load a keypair from a raw 32-byte secret scalar.
    pub fn from_bytes(secret: &[u8; SECRET_KEY_LENGTH]) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_slice(secret).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Load a keypair from hex, with or without a `0x` prefix.
    ///
    /// Meant for devnet tooling and tests. Real deployments keep keys in
    /// whatever custody system they already trust.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let stripped = hex_str.trim().strip_prefix("0x").unwrap_or(hex_str.trim());
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&arr)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = Address::from_verifying_key(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// The address this key signs for.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Exports the raw secret scalar. Handle with care; never log it.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes().into()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for ChannelKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelKeypair")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}
