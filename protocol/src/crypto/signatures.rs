//! # Recoverable Signatures
//!
//! Receipt authorization uses secp256k1 ECDSA with a recovery id, so the
//! verifier needs only `(message, signature)` to learn *who* signed. It then
//! compares that address to the participant slot the signature sits in.
//!
//! Wire format is 65 bytes: `r ‖ s ‖ v` with `v ∈ {27, 28}`. The digest is
//! signed as-is (no personal-message prefix), nonces follow RFC 6979, and
//! `s` is always normalized to the lower half of the curve order. High-`s`
//! signatures are rejected on the way in, which closes the usual ECDSA
//! malleability hole: one (key, message) pair has exactly one valid encoding.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::address::Address;
use super::encoding::{balance_message, parse_balance, EncodingError};
use super::hash::Digest;
use super::keys::ChannelKeypair;
use crate::config::{RECOVERY_ID_OFFSET, SIGNATURE_LENGTH};

/// Errors during signing or recovery.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("signing failed")]
    SigningFailed,

    #[error("public key recovery failed")]
    RecoveryFailed,
}

// ---------------------------------------------------------------------------
// RecoverableSignature
// ---------------------------------------------------------------------------

/// 65-byte `r ‖ s ‖ v` signature. Always structurally valid once constructed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecoverableSignature([u8; SIGNATURE_LENGTH]);

impl RecoverableSignature {
    /// Validate and wrap raw signature bytes.
    ///
    /// Checks the length, that `v` is 27 or 28, that `r` and `s` are valid
    /// non-zero scalars, and that `s` is low.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            EncodingError::MalformedSignature(format!(
                "expected {SIGNATURE_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        let sig = Self(arr);
        sig.components()?;
        Ok(sig)
    }

    /// Parse `0x`-prefixed (or bare) hex.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)
            .map_err(|_| EncodingError::MalformedSignature("not valid hex".to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// `v`, either 27 or 28.
    pub fn v(&self) -> u8 {
        self.0[SIGNATURE_LENGTH - 1]
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    fn from_parts(signature: &EcdsaSignature, recovery_id: RecoveryId) -> Self {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..SIGNATURE_LENGTH - 1].copy_from_slice(&signature.to_bytes());
        out[SIGNATURE_LENGTH - 1] = recovery_id.to_byte() + RECOVERY_ID_OFFSET;
        Self(out)
    }

    fn components(&self) -> Result<(EcdsaSignature, RecoveryId), EncodingError> {
        let v = self.v();
        let recovery_id = v
            .checked_sub(RECOVERY_ID_OFFSET)
            .filter(|id| *id <= 1)
            .and_then(RecoveryId::from_byte)
            .ok_or_else(|| EncodingError::MalformedSignature(format!("invalid v value {v}")))?;
        let signature = EcdsaSignature::from_slice(&self.0[..SIGNATURE_LENGTH - 1])
            .map_err(|_| EncodingError::MalformedSignature("r or s out of range".to_string()))?;
        if signature.normalize_s().is_some() {
            return Err(EncodingError::MalformedSignature("non-canonical high s".to_string()));
        }
        Ok((signature, recovery_id))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for RecoverableSignature {
    type Error = EncodingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<RecoverableSignature> for String {
    fn from(s: RecoverableSignature) -> Self {
        s.to_hex()
    }
}

// ---------------------------------------------------------------------------
// Signature (message + signature bytes)
// ---------------------------------------------------------------------------

/// A signature slot as carried on a receipt: the digest that was signed and
/// the recoverable signature over it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The 32-byte digest that was signed.
    pub message: Digest,
    /// `r ‖ s ‖ v` over `message`.
    pub signature_bytes: RecoverableSignature,
}

impl Signature {
    /// Recover the address that produced this signature.
    pub fn signer(&self) -> Result<Address, SignatureError> {
        recover(&self.message, &self.signature_bytes)
    }

    /// `true` iff this signature is over `expected_message` and recovers to
    /// `expected_signer`. Never errors; a malformed signature is just a no.
    pub fn is_valid_for(&self, expected_message: &Digest, expected_signer: &Address) -> bool {
        self.message == *expected_message
            && self
                .signer()
                .map(|signer| signer == *expected_signer)
                .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Sign a 32-byte digest directly.
pub fn sign_digest(
    keypair: &ChannelKeypair,
    message: &Digest,
) -> Result<RecoverableSignature, SignatureError> {
    let (mut signature, mut recovery_id) = keypair
        .signing_key()
        .sign_prehash_recoverable(message.as_bytes())
        .map_err(|_| SignatureError::SigningFailed)?;

    // Flipping s mirrors R across the x-axis, so the y-parity flips with it.
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    Ok(RecoverableSignature::from_parts(&signature, recovery_id))
}

/// Sign a balance tuple: encode it canonically, hash it, sign the digest.
///
/// # Example
///
/// ```
/// use tandem_protocol::crypto::{recover, sign, ChannelKeypair};
///
/// let alice = ChannelKeypair::generate();
/// let bob = ChannelKeypair::generate();
/// let sig = sign((20_000, 80_000), (&alice.address(), &bob.address()), &alice).unwrap();
///
/// assert_eq!(recover(&sig.message, &sig.signature_bytes).unwrap(), alice.address());
/// ```
pub fn sign(
    balances: (u128, u128),
    participants: (&Address, &Address),
    keypair: &ChannelKeypair,
) -> Result<Signature, SignatureError> {
    let message = balance_message(balances.0, balances.1, participants.0, participants.1);
    let signature_bytes = sign_digest(keypair, &message)?;
    Ok(Signature {
        message,
        signature_bytes,
    })
}

/// Sign a balance tuple given in textual form, as it arrives from a
/// transport or the command line.
///
/// Fails with [`EncodingError`] before touching the key if any balance is
/// not an unsigned integer or any address is malformed.
pub fn sign_text(
    balances: (&str, &str),
    participants: (&str, &str),
    keypair: &ChannelKeypair,
) -> Result<Signature, SignatureError> {
    let b1 = parse_balance(balances.0)?;
    let b2 = parse_balance(balances.1)?;
    let p1: Address = participants.0.parse()?;
    let p2: Address = participants.1.parse()?;
    sign((b1, b2), (&p1, &p2), keypair)
}

/// Recover the signer's address from a digest and a recoverable signature.
pub fn recover(message: &Digest, signature: &RecoverableSignature) -> Result<Address, SignatureError> {
    let (sig, recovery_id) = signature.components()?;
    let key = VerifyingKey::recover_from_prehash(message.as_bytes(), &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(Address::from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::keccak256;

    #[test]
    fn sign_and_recover() {
        let kp = ChannelKeypair::generate();
        let other = ChannelKeypair::generate();
        let sig = sign((1, 2), (&kp.address(), &other.address()), &kp).unwrap();
        assert_eq!(sig.signer().unwrap(), kp.address());
    }

    #[test]
    fn deterministic_signatures() {
        // RFC 6979: same key + same digest = same signature.
        let kp = ChannelKeypair::generate();
        let digest = keccak256(b"determinism");
        assert_eq!(sign_digest(&kp, &digest).unwrap(), sign_digest(&kp, &digest).unwrap());
    }

    #[test]
    fn v_is_27_or_28() {
        for i in 0..16u8 {
            let kp = ChannelKeypair::generate();
            let sig = sign_digest(&kp, &keccak256(&[i])).unwrap();
            assert!(sig.v() == 27 || sig.v() == 28);
        }
    }

    #[test]
    fn recovery_over_different_digest_yields_different_address() {
        let kp = ChannelKeypair::generate();
        let sig = sign_digest(&kp, &keccak256(b"original")).unwrap();
        let recovered = recover(&keccak256(b"tampered"), &sig);
        assert!(recovered.map(|a| a != kp.address()).unwrap_or(true));
    }

    #[test]
    fn wrong_length_is_malformed() {
        assert!(matches!(
            RecoverableSignature::from_bytes(&[0u8; 64]),
            Err(EncodingError::MalformedSignature(_))
        ));
    }

    #[test]
    fn bad_v_is_malformed() {
        let kp = ChannelKeypair::generate();
        let sig = sign_digest(&kp, &keccak256(b"v")).unwrap();
        let mut bytes = *sig.as_bytes();
        bytes[64] = 29;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
        bytes[64] = 1;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
    }

    #[test]
    fn zero_r_and_s_are_malformed() {
        let mut bytes = [0u8; 65];
        bytes[64] = 27;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
    }

    #[test]
    fn high_s_is_rejected() {
        let kp = ChannelKeypair::generate();
        let digest = keccak256(b"malleable");
        let sig = sign_digest(&kp, &digest).unwrap();
        let (ecdsa, _) = sig.components().unwrap();
        let (r, s) = ecdsa.split_scalars();
        let high = EcdsaSignature::from_scalars(r, -(*s)).unwrap();
        let mut bytes = *sig.as_bytes();
        bytes[..64].copy_from_slice(&high.to_bytes());
        assert!(matches!(
            RecoverableSignature::from_bytes(&bytes),
            Err(EncodingError::MalformedSignature(_))
        ));
    }

    #[test]
    fn hex_roundtrip() {
        let kp = ChannelKeypair::generate();
        let sig = sign_digest(&kp, &keccak256(b"hex")).unwrap();
        assert_eq!(RecoverableSignature::from_hex(&sig.to_hex()).unwrap(), sig);
    }

    #[test]
    fn sign_text_rejects_negative_balance() {
        let kp = ChannelKeypair::generate();
        let a = kp.address().to_string();
        let result = sign_text(("-5", "10"), (&a, &a), &kp);
        assert!(matches!(
            result,
            Err(SignatureError::Encoding(EncodingError::UnrepresentableBalance(_)))
        ));
    }

    #[test]
    fn sign_text_rejects_malformed_address() {
        let kp = ChannelKeypair::generate();
        let a = kp.address().to_string();
        let result = sign_text(("5", "10"), (&a, "0xnope"), &kp);
        assert!(matches!(
            result,
            Err(SignatureError::Encoding(EncodingError::MalformedAddress(_)))
        ));
    }

    #[test]
    fn sign_text_matches_typed_sign() {
        let kp = ChannelKeypair::generate();
        let other = ChannelKeypair::generate();
        let typed = sign((7, 9), (&kp.address(), &other.address()), &kp).unwrap();
        let text = sign_text(
            ("7", "9"),
            (&kp.address().to_string(), &other.address().to_string()),
            &kp,
        )
        .unwrap();
        assert_eq!(typed, text);
    }

    #[test]
    fn is_valid_for_checks_message_and_signer() {
        let kp = ChannelKeypair::generate();
        let other = ChannelKeypair::generate();
        let sig = sign((1, 1), (&kp.address(), &other.address()), &kp).unwrap();
        let msg = balance_message(1, 1, &kp.address(), &other.address());
        assert!(sig.is_valid_for(&msg, &kp.address()));
        assert!(!sig.is_valid_for(&msg, &other.address()));
        let wrong_msg = balance_message(2, 0, &kp.address(), &other.address());
        assert!(!sig.is_valid_for(&wrong_msg, &kp.address()));
    }
}
