//! Receipt data model.
//!
//! The balance tuple and participant slots live in [`ReceiptBody`]. Whether
//! a receipt is signed, half signed, or fully authorized is an
//! [`Authorization`] variant, not a pair of nullable fields. An
//! [`AuthorizedReceipt`] is a separate type that can only be produced from
//! a receipt carrying both slots.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ChannelError;
use super::wire::ReceiptWire;
use crate::crypto::{balance_message, Address, Digest, Signature};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Which participant slot an address occupies, resolved by address match.
///
/// The initiator opened the channel and is always `participant1`; the
/// counterparty is always `participant2`. Slots never swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// `participant1`.
    Initiator,
    /// `participant2`.
    Counterparty,
}

impl Role {
    /// The opposite slot.
    pub fn other(self) -> Role {
        match self {
            Role::Initiator => Role::Counterparty,
            Role::Counterparty => Role::Initiator,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "participant1"),
            Role::Counterparty => write!(f, "participant2"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// The movement that produced a receipt. Informational: it is not part of
/// the signed message, the balances are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    /// Tokens moved.
    pub value: u128,
    /// Paying participant.
    pub from: Address,
    /// Receiving participant.
    pub to: Address,
}

// ---------------------------------------------------------------------------
// ReceiptState
// ---------------------------------------------------------------------------

/// How far a receipt has progressed through signing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptState {
    /// No slot filled. Never produced by the builder; only reachable by
    /// decoding a receipt from the wire.
    Unsigned,
    /// Exactly one slot filled.
    PartiallySigned,
    /// Both slots filled.
    Authorized,
}

impl fmt::Display for ReceiptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptState::Unsigned => write!(f, "unsigned"),
            ReceiptState::PartiallySigned => write!(f, "partially signed"),
            ReceiptState::Authorized => write!(f, "authorized"),
        }
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// The signature slots of a receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Authorization {
    /// No signatures.
    Unsigned,
    /// One participant has signed.
    SingleSigned {
        /// Whose slot is filled.
        role: Role,
        /// That participant's signature.
        signature: Signature,
    },
    /// Both participants have signed.
    Authorized {
        /// `participant1`'s signature.
        initiator: Signature,
        /// `participant2`'s signature.
        counterparty: Signature,
    },
}

impl Authorization {
    /// Assemble from two optional slots.
    pub fn from_slots(initiator: Option<Signature>, counterparty: Option<Signature>) -> Self {
        match (initiator, counterparty) {
            (None, None) => Authorization::Unsigned,
            (Some(signature), None) => Authorization::SingleSigned {
                role: Role::Initiator,
                signature,
            },
            (None, Some(signature)) => Authorization::SingleSigned {
                role: Role::Counterparty,
                signature,
            },
            (Some(initiator), Some(counterparty)) => Authorization::Authorized {
                initiator,
                counterparty,
            },
        }
    }

    /// The signature in `role`'s slot, if any.
    pub fn slot(&self, role: Role) -> Option<&Signature> {
        match (self, role) {
            (Authorization::SingleSigned { role: r, signature }, role) if *r == role => {
                Some(signature)
            }
            (Authorization::Authorized { initiator, .. }, Role::Initiator) => Some(initiator),
            (Authorization::Authorized { counterparty, .. }, Role::Counterparty) => {
                Some(counterparty)
            }
            _ => None,
        }
    }

    /// A copy with `role`'s slot set to `signature`. The other slot is
    /// carried over untouched.
    pub fn with_slot(&self, role: Role, signature: Signature) -> Self {
        let other = self.slot(role.other()).copied();
        match role {
            Role::Initiator => Self::from_slots(Some(signature), other),
            Role::Counterparty => Self::from_slots(other, Some(signature)),
        }
    }

    /// Signing progress.
    pub fn state(&self) -> ReceiptState {
        match self {
            Authorization::Unsigned => ReceiptState::Unsigned,
            Authorization::SingleSigned { .. } => ReceiptState::PartiallySigned,
            Authorization::Authorized { .. } => ReceiptState::Authorized,
        }
    }
}

// ---------------------------------------------------------------------------
// ReceiptBody
// ---------------------------------------------------------------------------

/// Everything on a receipt except the signatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptBody {
    /// The transfer that produced this receipt.
    pub transfer: Transfer,
    /// Initiator address.
    pub participant1: Address,
    /// Counterparty address.
    pub participant2: Address,
    /// Position in the chain, 0 for the opening receipt.
    pub nonce: u64,
    /// Initiator's balance after the transfer.
    pub participant1_balance: u128,
    /// Counterparty's balance after the transfer.
    pub participant2_balance: u128,
}

impl ReceiptBody {
    /// The canonical digest of this body's balance tuple. This is the exact
    /// message both slots must sign.
    pub fn message(&self) -> Digest {
        balance_message(
            self.participant1_balance,
            self.participant2_balance,
            &self.participant1,
            &self.participant2,
        )
    }

    /// Resolve an address to its slot.
    pub fn role_of(&self, address: &Address) -> Option<Role> {
        if *address == self.participant1 {
            Some(Role::Initiator)
        } else if *address == self.participant2 {
            Some(Role::Counterparty)
        } else {
            None
        }
    }

    /// Address in `role`'s slot.
    pub fn participant(&self, role: Role) -> Address {
        match role {
            Role::Initiator => self.participant1,
            Role::Counterparty => self.participant2,
        }
    }

    /// Balance held by `role`.
    pub fn balance(&self, role: Role) -> u128 {
        match role {
            Role::Initiator => self.participant1_balance,
            Role::Counterparty => self.participant2_balance,
        }
    }

    /// Balance held by `address`, if it is a participant.
    pub fn balance_of(&self, address: &Address) -> Option<u128> {
        self.role_of(address).map(|role| self.balance(role))
    }

    /// Combined channel balance. `None` only for bodies decoded from the
    /// wire whose sum overflows; the builder never produces one.
    pub fn total_balance(&self) -> Option<u128> {
        self.participant1_balance.checked_add(self.participant2_balance)
    }
}

// ---------------------------------------------------------------------------
// ChannelReceipt
// ---------------------------------------------------------------------------

/// A receipt at any stage of signing.
///
/// Only the builder, the approver, and wire decoding construct these. There
/// are no setters; every protocol step returns a new receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReceiptWire", into = "ReceiptWire")]
pub struct ChannelReceipt {
    body: ReceiptBody,
    authorization: Authorization,
}

impl ChannelReceipt {
    pub(crate) fn new(body: ReceiptBody, authorization: Authorization) -> Self {
        Self {
            body,
            authorization,
        }
    }

    /// Balances, participants, nonce and transfer.
    pub fn body(&self) -> &ReceiptBody {
        &self.body
    }

    /// The signature slots.
    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    /// Shorthand for `body().nonce`.
    pub fn nonce(&self) -> u64 {
        self.body.nonce
    }

    /// Signing progress.
    pub fn state(&self) -> ReceiptState {
        self.authorization.state()
    }

    /// `true` when both slots are filled. This is a presence check only;
    /// see [`verify_signatures`](Self::verify_signatures).
    pub fn is_fully_signed(&self) -> bool {
        self.state() == ReceiptState::Authorized
    }

    /// The signature in `role`'s slot, if any.
    pub fn signature(&self, role: Role) -> Option<&Signature> {
        self.authorization.slot(role)
    }

    /// Check every filled slot: it must carry this body's canonical message
    /// and recover to the participant holding the slot.
    pub fn verify_signatures(&self) -> Result<(), ChannelError> {
        let message = self.body.message();
        for role in [Role::Initiator, Role::Counterparty] {
            if let Some(sig) = self.signature(role) {
                if !sig.is_valid_for(&message, &self.body.participant(role)) {
                    return Err(ChannelError::InvalidSignature(role));
                }
            }
        }
        Ok(())
    }

    /// Promote to an [`AuthorizedReceipt`] if both slots are present.
    ///
    /// This is the four-field check: both messages and both signatures must
    /// exist. It does not run signature recovery; call
    /// [`AuthorizedReceipt::verify`] for that.
    pub fn authorized(&self) -> Result<AuthorizedReceipt, ChannelError> {
        AuthorizedReceipt::try_from(self.clone())
    }
}

// ---------------------------------------------------------------------------
// AuthorizedReceipt
// ---------------------------------------------------------------------------

/// A receipt with both signature slots filled.
///
/// Settlement and channel extension take this type, so an under-signed
/// receipt cannot reach either of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReceiptWire", into = "ReceiptWire")]
pub struct AuthorizedReceipt {
    body: ReceiptBody,
    initiator: Signature,
    counterparty: Signature,
}

impl AuthorizedReceipt {
    /// Balances, participants, nonce and transfer.
    pub fn body(&self) -> &ReceiptBody {
        &self.body
    }

    /// `participant1`'s signature.
    pub fn initiator_signature(&self) -> &Signature {
        &self.initiator
    }

    /// `participant2`'s signature.
    pub fn counterparty_signature(&self) -> &Signature {
        &self.counterparty
    }

    /// The signature in `role`'s slot.
    pub fn signature(&self, role: Role) -> &Signature {
        match role {
            Role::Initiator => &self.initiator,
            Role::Counterparty => &self.counterparty,
        }
    }

    /// Run recovery on both slots against this body's canonical message.
    pub fn verify(&self) -> Result<(), ChannelError> {
        let message = self.body.message();
        for role in [Role::Initiator, Role::Counterparty] {
            if !self
                .signature(role)
                .is_valid_for(&message, &self.body.participant(role))
            {
                return Err(ChannelError::InvalidSignature(role));
            }
        }
        Ok(())
    }
}

impl TryFrom<ChannelReceipt> for AuthorizedReceipt {
    type Error = ChannelError;

    fn try_from(receipt: ChannelReceipt) -> Result<Self, Self::Error> {
        match receipt.authorization {
            Authorization::Authorized {
                initiator,
                counterparty,
            } => Ok(Self {
                body: receipt.body,
                initiator,
                counterparty,
            }),
            other => Err(ChannelError::StaleReceipt {
                nonce: receipt.body.nonce,
                state: other.state(),
            }),
        }
    }
}

impl From<AuthorizedReceipt> for ChannelReceipt {
    fn from(receipt: AuthorizedReceipt) -> Self {
        ChannelReceipt {
            body: receipt.body,
            authorization: Authorization::Authorized {
                initiator: receipt.initiator,
                counterparty: receipt.counterparty,
            },
        }
    }
}
