//! # Protocol Configuration & Constants
//!
//! Every fixed number in Tandem lives here. Most of them are dictated by the
//! settlement side: the verifier recomputes the same digest and runs the same
//! recovery, so these values are part of the wire contract, not tuning knobs.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Crate-level protocol version, reported by the operator CLI.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Signature scheme used for receipt authorization.
pub const SIGNING_ALGORITHM: &str = "secp256k1-ECDSA-recoverable";

/// Digest function applied to the canonical balance encoding.
pub const HASH_FUNCTION: &str = "Keccak-256";

/// Participant address length in bytes (last 20 bytes of the public key hash).
pub const ADDRESS_LENGTH: usize = 20;

/// Digest length in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// secp256k1 secret scalar length in bytes.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Recoverable signature length: `r (32) ‖ s (32) ‖ v (1)`.
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id to form `v`. The verifier only accepts
/// `v ∈ {27, 28}`.
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// Width of a packed `uint` field in the canonical encoding.
pub const UINT_WORD_LENGTH: usize = 32;

/// Length of the packed canonical balance tuple:
/// `uint256 ‖ uint256 ‖ address ‖ address`.
pub const CANONICAL_ENCODING_LENGTH: usize = 2 * UINT_WORD_LENGTH + 2 * ADDRESS_LENGTH;

// ---------------------------------------------------------------------------
// Channel Parameters
// ---------------------------------------------------------------------------

/// Nonce carried by the first receipt of every channel leg.
pub const OPENING_NONCE: u64 = 0;

/// Token supply minted to the deployer when no explicit supply is configured.
pub const DEFAULT_INITIAL_SUPPLY: u128 = 2_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_encoding_is_104_bytes() {
        assert_eq!(CANONICAL_ENCODING_LENGTH, 104);
    }

    #[test]
    fn signature_is_rs_plus_v() {
        assert_eq!(SIGNATURE_LENGTH, 2 * DIGEST_LENGTH + 1);
    }
}
