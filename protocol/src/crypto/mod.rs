//! # Cryptographic Primitives for Tandem
//!
//! Everything a receipt signature depends on flows through here:
//!
//! - **Keccak-256** for digests, because the settlement side computes the
//!   same hash and anything else would never match.
//! - **secp256k1 ECDSA** with recovery ids, so a verifier can go from
//!   `(message, signature)` straight to the signer's address without being
//!   handed a public key.
//! - **Packed typed encoding** of the balance tuple. Field order and field
//!   types are part of the protocol.
//!
//! Nothing here is homemade math. These are thin, typed wrappers around
//! `k256` and `sha3`.

pub mod address;
pub mod encoding;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use address::Address;
pub use encoding::{balance_message, encode_balance_tuple, parse_balance, EncodingError};
pub use hash::{keccak256, Digest};
pub use keys::ChannelKeypair;
pub use signatures::{recover, sign, RecoverableSignature, Signature, SignatureError};
