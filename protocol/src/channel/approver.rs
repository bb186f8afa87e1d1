//! Receipt approval.
//!
//! The counterparty signs exactly the balance tuple the sender proposed.
//! Approval never recomputes or edits balances; if the approver disagrees
//! with the proposal, the right move is to not approve it.

use super::error::ChannelError;
use super::types::ChannelReceipt;
use crate::crypto::signatures::sign_digest;
use crate::crypto::{Address, ChannelKeypair, Signature};

/// Add `approver_address`'s signature to `receipt`.
///
/// The slot is chosen by address match, never by position. The slot that
/// is already filled must be a valid signature by the other participant
/// over this receipt's balances; otherwise approving would authorize a
/// receipt that settlement will reject anyway.
///
/// Approving a slot that is already filled re-signs it. Signing is
/// deterministic, so the result is identical.
///
/// # Errors
///
/// - [`ChannelError::KeyMismatch`] if the key does not belong to
///   `approver_address`.
/// - [`ChannelError::UnknownParticipant`] if `approver_address` is neither
///   participant.
/// - [`ChannelError::InvalidSignature`] if the other slot is filled with a
///   signature that does not cover this receipt.
pub fn approve(
    receipt: &ChannelReceipt,
    approver_address: &Address,
    approver_key: &ChannelKeypair,
) -> Result<ChannelReceipt, ChannelError> {
    if approver_key.address() != *approver_address {
        return Err(ChannelError::KeyMismatch {
            expected: *approver_address,
            actual: approver_key.address(),
        });
    }

    let body = receipt.body();
    let role = body
        .role_of(approver_address)
        .ok_or(ChannelError::UnknownParticipant(*approver_address))?;

    let message = body.message();
    let other = role.other();
    if let Some(existing) = receipt.signature(other) {
        if !existing.is_valid_for(&message, &body.participant(other)) {
            tracing::warn!(
                nonce = body.nonce,
                slot = %other,
                "refusing to approve receipt with invalid counter-signature"
            );
            return Err(ChannelError::InvalidSignature(other));
        }
    }

    let signature = Signature {
        message,
        signature_bytes: sign_digest(approver_key, &message)?,
    };
    let authorization = receipt.authorization().with_slot(role, signature);

    tracing::info!(
        nonce = body.nonce,
        approver = %approver_address,
        slot = %role,
        state = %authorization.state(),
        "receipt approved"
    );

    Ok(ChannelReceipt::new(*body, authorization))
}

/// [`approve`] with the address taken from the keypair.
pub fn approve_as(
    receipt: &ChannelReceipt,
    approver: &ChannelKeypair,
) -> Result<ChannelReceipt, ChannelError> {
    approve(receipt, &approver.address(), approver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::builder::ReceiptBuilder;
    use crate::channel::types::{Authorization, ReceiptState, Role};
    use crate::crypto::sign;

    fn proposal(a: &ChannelKeypair, b: &ChannelKeypair) -> ChannelReceipt {
        ReceiptBuilder::transfer(80_000, b.address())
            .opening(100_000, 0)
            .sign(a)
            .unwrap()
    }

    #[test]
    fn approval_fills_the_other_slot() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let receipt = proposal(&a, &b);

        let approved = approve(&receipt, &b.address(), &b).unwrap();
        assert_eq!(approved.state(), ReceiptState::Authorized);
        assert_eq!(approved.body(), receipt.body());
        assert_eq!(
            approved.signature(Role::Initiator),
            receipt.signature(Role::Initiator)
        );
        let sig_b = approved.signature(Role::Counterparty).unwrap();
        assert_eq!(sig_b.message, receipt.body().message());
        assert!(approved.authorized().unwrap().verify().is_ok());

        // The input is a value; approval returns a new one.
        assert_eq!(receipt.state(), ReceiptState::PartiallySigned);
    }

    #[test]
    fn both_messages_are_identical_after_approval() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let approved = approve_as(&proposal(&a, &b), &b).unwrap();
        let m1 = approved.signature(Role::Initiator).unwrap().message;
        let m2 = approved.signature(Role::Counterparty).unwrap().message;
        assert_eq!(m1, m2);
    }

    #[test]
    fn stranger_cannot_approve() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let c = ChannelKeypair::generate();
        let result = approve_as(&proposal(&a, &b), &c);
        assert!(matches!(result, Err(ChannelError::UnknownParticipant(addr)) if addr == c.address()));
    }

    #[test]
    fn mismatched_key_is_rejected() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let result = approve(&proposal(&a, &b), &b.address(), &a);
        assert!(matches!(result, Err(ChannelError::KeyMismatch { .. })));
    }

    #[test]
    fn forged_counter_signature_is_refused() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let receipt = proposal(&a, &b);

        // Signature over different balances placed in the initiator slot.
        let forged = sign((0, 100_000), (&a.address(), &b.address()), &a).unwrap();
        let tampered = ChannelReceipt::new(
            *receipt.body(),
            Authorization::from_slots(Some(forged), None),
        );
        assert!(matches!(
            approve_as(&tampered, &b),
            Err(ChannelError::InvalidSignature(Role::Initiator))
        ));
    }

    #[test]
    fn re_approval_is_idempotent() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let once = approve_as(&proposal(&a, &b), &b).unwrap();
        let twice = approve_as(&once, &b).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn sender_may_approve_an_unsigned_receipt() {
        let a = ChannelKeypair::generate();
        let b = ChannelKeypair::generate();
        let unsigned = ChannelReceipt::new(*proposal(&a, &b).body(), Authorization::Unsigned);
        let signed = approve_as(&unsigned, &a).unwrap();
        assert_eq!(signed.state(), ReceiptState::PartiallySigned);
        assert!(signed.signature(Role::Initiator).is_some());
    }
}
