//! Transport shape of a receipt.
//!
//! How receipts travel between the two participants is not this crate's
//! business, but both sides must agree on what one looks like. This is it:
//! a flat JSON object with camelCase keys and one optional message and
//! signature per participant.
//!
//! ```json
//! {
//!   "transfer": { "value": "80000", "from": "0xA…", "to": "0xB…" },
//!   "participant1": "0xA…",
//!   "participant2": "0xB…",
//!   "nonce": 0,
//!   "participant1Balance": "20000",
//!   "participant2Balance": "80000",
//!   "participant1Message": "0x…",
//!   "participant1Signature": "0x…"
//! }
//! ```
//!
//! Balances and values are decimal strings so the full `u128` range
//! survives JSON parsers that squeeze numbers into doubles.

use serde::{Deserialize, Serialize};

use super::error::ChannelError;
use super::types::{Authorization, AuthorizedReceipt, ChannelReceipt, ReceiptBody, Role, Transfer};
use crate::crypto::{parse_balance, Address, Digest, EncodingError, RecoverableSignature, Signature};

/// Wire form of [`Transfer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferWire {
    pub value: String,
    pub from: Address,
    pub to: Address,
}

/// Wire form of a receipt at any signing stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptWire {
    pub transfer: TransferWire,
    pub participant1: Address,
    pub participant2: Address,
    pub nonce: u64,
    pub participant1_balance: String,
    pub participant2_balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant1_message: Option<Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant1_signature: Option<RecoverableSignature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant2_message: Option<Digest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant2_signature: Option<RecoverableSignature>,
}

/// A slot is present only when both halves are. Half a slot is malformed,
/// not "unsigned".
fn decode_slot(
    role: Role,
    message: Option<Digest>,
    signature: Option<RecoverableSignature>,
) -> Result<Option<Signature>, EncodingError> {
    match (message, signature) {
        (Some(message), Some(signature_bytes)) => Ok(Some(Signature {
            message,
            signature_bytes,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(EncodingError::MalformedSignature(format!(
            "{role}Message present without {role}Signature"
        ))),
        (None, Some(_)) => Err(EncodingError::MalformedSignature(format!(
            "{role}Signature present without {role}Message"
        ))),
    }
}

impl TryFrom<ReceiptWire> for ChannelReceipt {
    type Error = ChannelError;

    fn try_from(wire: ReceiptWire) -> Result<Self, Self::Error> {
        let body = ReceiptBody {
            transfer: Transfer {
                value: parse_balance(&wire.transfer.value)?,
                from: wire.transfer.from,
                to: wire.transfer.to,
            },
            participant1: wire.participant1,
            participant2: wire.participant2,
            nonce: wire.nonce,
            participant1_balance: parse_balance(&wire.participant1_balance)?,
            participant2_balance: parse_balance(&wire.participant2_balance)?,
        };

        if body.participant1 == body.participant2 {
            return Err(ChannelError::SelfTransfer(body.participant1));
        }
        for addr in [body.transfer.from, body.transfer.to] {
            if body.role_of(&addr).is_none() {
                return Err(ChannelError::UnknownParticipant(addr));
            }
        }
        if body.transfer.from == body.transfer.to {
            return Err(ChannelError::SelfTransfer(body.transfer.from));
        }

        let initiator = decode_slot(
            Role::Initiator,
            wire.participant1_message,
            wire.participant1_signature,
        )?;
        let counterparty = decode_slot(
            Role::Counterparty,
            wire.participant2_message,
            wire.participant2_signature,
        )?;

        Ok(ChannelReceipt::new(
            body,
            Authorization::from_slots(initiator, counterparty),
        ))
    }
}

impl From<ChannelReceipt> for ReceiptWire {
    fn from(receipt: ChannelReceipt) -> Self {
        let body = receipt.body();
        let slot1 = receipt.signature(Role::Initiator);
        let slot2 = receipt.signature(Role::Counterparty);
        ReceiptWire {
            transfer: TransferWire {
                value: body.transfer.value.to_string(),
                from: body.transfer.from,
                to: body.transfer.to,
            },
            participant1: body.participant1,
            participant2: body.participant2,
            nonce: body.nonce,
            participant1_balance: body.participant1_balance.to_string(),
            participant2_balance: body.participant2_balance.to_string(),
            participant1_message: slot1.map(|s| s.message),
            participant1_signature: slot1.map(|s| s.signature_bytes),
            participant2_message: slot2.map(|s| s.message),
            participant2_signature: slot2.map(|s| s.signature_bytes),
        }
    }
}

impl TryFrom<ReceiptWire> for AuthorizedReceipt {
    type Error = ChannelError;

    fn try_from(wire: ReceiptWire) -> Result<Self, Self::Error> {
        AuthorizedReceipt::try_from(ChannelReceipt::try_from(wire)?)
    }
}

impl From<AuthorizedReceipt> for ReceiptWire {
    fn from(receipt: AuthorizedReceipt) -> Self {
        ReceiptWire::from(ChannelReceipt::from(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{approve_as, ReceiptBuilder};
    use crate::crypto::ChannelKeypair;

    fn opened() -> (ChannelKeypair, ChannelKeypair, ChannelReceipt) {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let receipt = ReceiptBuilder::transfer(80_000, b.address())
            .opening(100_000, 0)
            .sign(&a)
            .unwrap();
        (a, b, receipt)
    }

    #[test]
    fn json_uses_transport_field_names() {
        let (_, _, receipt) = opened();
        let json: serde_json::Value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["participant1Balance"], "20000");
        assert_eq!(json["participant2Balance"], "80000");
        assert_eq!(json["nonce"], 0);
        assert_eq!(json["transfer"]["value"], "80000");
        assert!(json["participant1Message"].is_string());
        assert!(json["participant1Signature"].is_string());
        assert!(json.get("participant2Signature").is_none());
    }

    #[test]
    fn authorized_receipt_survives_transport() {
        let (_, b, receipt) = opened();
        let approved = approve_as(&receipt, &b).unwrap();
        let json = serde_json::to_string(&approved).unwrap();

        let decoded: ChannelReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, approved);
        let auth: AuthorizedReceipt = serde_json::from_str(&json).unwrap();
        assert!(auth.verify().is_ok());
    }

    #[test]
    fn partially_signed_json_is_not_an_authorized_receipt() {
        let (_, _, receipt) = opened();
        let json = serde_json::to_string(&receipt).unwrap();
        assert!(serde_json::from_str::<AuthorizedReceipt>(&json).is_err());
    }

    #[test]
    fn half_slot_is_rejected() {
        let (_, _, receipt) = opened();
        let mut wire = ReceiptWire::from(receipt);
        wire.participant1_signature = None;
        assert!(matches!(
            ChannelReceipt::try_from(wire),
            Err(ChannelError::Encoding(EncodingError::MalformedSignature(_)))
        ));
    }

    #[test]
    fn negative_balance_on_the_wire_is_an_encoding_error() {
        let (_, _, receipt) = opened();
        let mut wire = ReceiptWire::from(receipt);
        wire.participant2_balance = "-80000".to_string();
        assert!(matches!(
            ChannelReceipt::try_from(wire),
            Err(ChannelError::Encoding(EncodingError::UnrepresentableBalance(_)))
        ));
    }

    #[test]
    fn transfer_between_strangers_is_rejected() {
        let (_, _, receipt) = opened();
        let stranger = ChannelKeypair::generate().address();
        let mut wire = ReceiptWire::from(receipt);
        wire.transfer.to = stranger;
        assert!(matches!(
            ChannelReceipt::try_from(wire),
            Err(ChannelError::UnknownParticipant(a)) if a == stranger
        ));
    }

    #[test]
    fn tampered_balance_on_the_wire_fails_verification() {
        let (_, b, receipt) = opened();
        let approved = approve_as(&receipt, &b).unwrap();
        let mut wire = ReceiptWire::from(approved);
        wire.participant1_balance = "30000".to_string();
        wire.participant2_balance = "70000".to_string();
        let tampered = ChannelReceipt::try_from(wire).unwrap();
        assert!(tampered.verify_signatures().is_err());
    }
}
