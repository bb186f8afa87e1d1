//! Receipt construction.
//!
//! The [`ReceiptBuilder`] turns "pay `value` to `target`" into the next
//! receipt of a channel:
//!
//! 1. Find the current balances, either the opening balances or the
//!    balances on the prior authorized receipt.
//! 2. Move `value` from sender to target. Nothing else changes; there are
//!    no fees, so the channel total is conserved.
//! 3. Assign the nonce: 0 for an opening receipt, prior + 1 otherwise.
//! 4. Sign the new balance tuple with the sender's key and put the
//!    signature in the sender's slot only.
//!
//! The result is partially signed. The counterparty authorizes it with
//! [`super::approver::approve`].
//!
//! ## Prior receipt check
//!
//! A prior receipt must carry both participants' messages *and* signatures,
//! and both must recover to their slot's participant over the prior
//! receipt's own balance tuple. Anything less could let one participant
//! build on a state the other never agreed to.

use super::error::ChannelError;
use super::types::{
    Authorization, AuthorizedReceipt, ChannelReceipt, ReceiptBody, Role, Transfer,
};
use crate::config::OPENING_NONCE;
use crate::crypto::{sign, Address, ChannelKeypair};

/// Where the builder takes current balances from.
#[derive(Clone, Copy, Debug)]
enum Prior<'a> {
    None,
    Opening {
        sender_balance: u128,
        target_balance: u128,
    },
    Receipt(&'a ChannelReceipt),
    Authorized(&'a AuthorizedReceipt),
}

/// Fluent construction of the next receipt in a channel.
///
/// # Example
///
/// ```
/// use tandem_protocol::channel::{approve_as, ReceiptBuilder};
/// use tandem_protocol::crypto::ChannelKeypair;
///
/// let alice = ChannelKeypair::generate();
/// let bob = ChannelKeypair::generate();
///
/// let opening = ReceiptBuilder::transfer(80_000, bob.address())
///     .opening(100_000, 0)
///     .sign(&alice)
///     .unwrap();
/// let opening = approve_as(&opening, &bob).unwrap();
///
/// let next = ReceiptBuilder::transfer(35_000, alice.address())
///     .after(&opening)
///     .sign(&bob)
///     .unwrap();
/// assert_eq!(next.nonce(), 1);
/// assert_eq!(next.body().participant1_balance, 55_000);
/// ```
#[derive(Clone, Debug)]
pub struct ReceiptBuilder<'a> {
    value: u128,
    target: Address,
    prior: Prior<'a>,
}

impl<'a> ReceiptBuilder<'a> {
    /// Start a receipt that moves `value` to `target`.
    pub fn transfer(value: u128, target: Address) -> Self {
        Self {
            value,
            target,
            prior: Prior::None,
        }
    }

    /// Open a new channel leg with explicit current balances. The sender
    /// becomes `participant1`, the target `participant2`.
    pub fn opening(mut self, sender_balance: u128, target_balance: u128) -> Self {
        self.prior = Prior::Opening {
            sender_balance,
            target_balance,
        };
        self
    }

    /// Continue from a prior receipt. It is checked for full authorization
    /// when [`sign`](Self::sign) runs.
    pub fn after(mut self, prior: &'a ChannelReceipt) -> Self {
        self.prior = Prior::Receipt(prior);
        self
    }

    /// Continue from a receipt already known to carry both slots.
    pub fn extending(mut self, prior: &'a AuthorizedReceipt) -> Self {
        self.prior = Prior::Authorized(prior);
        self
    }

    /// Compute the new balances, sign them as `sender`, and return the
    /// partially-signed receipt.
    pub fn sign(self, sender: &ChannelKeypair) -> Result<ChannelReceipt, ChannelError> {
        let sender_address = sender.address();
        if sender_address == self.target {
            return Err(ChannelError::SelfTransfer(sender_address));
        }

        let current = match self.prior {
            Prior::None => return Err(ChannelError::MissingOpeningBalances),
            Prior::Opening {
                sender_balance,
                target_balance,
            } => {
                sender_balance
                    .checked_add(target_balance)
                    .ok_or(ChannelError::BalanceOverflow {
                        balance: sender_balance,
                        credit: target_balance,
                    })?;
                Current {
                    participant1: sender_address,
                    participant2: self.target,
                    sender_role: Role::Initiator,
                    sender_balance,
                    target_balance,
                    nonce: OPENING_NONCE,
                }
            }
            Prior::Receipt(receipt) => {
                let authorized = receipt.authorized()?;
                Current::from_prior(&authorized, &sender_address, &self.target)?
            }
            Prior::Authorized(authorized) => {
                Current::from_prior(authorized, &sender_address, &self.target)?
            }
        };

        if self.value > current.sender_balance {
            return Err(ChannelError::InsufficientBalance {
                available: current.sender_balance,
                requested: self.value,
            });
        }
        let new_sender = current.sender_balance - self.value;
        let new_target =
            current
                .target_balance
                .checked_add(self.value)
                .ok_or(ChannelError::BalanceOverflow {
                    balance: current.target_balance,
                    credit: self.value,
                })?;

        let (participant1_balance, participant2_balance) = match current.sender_role {
            Role::Initiator => (new_sender, new_target),
            Role::Counterparty => (new_target, new_sender),
        };

        let signature = sign(
            (participant1_balance, participant2_balance),
            (&current.participant1, &current.participant2),
            sender,
        )?;

        let body = ReceiptBody {
            transfer: Transfer {
                value: self.value,
                from: sender_address,
                to: self.target,
            },
            participant1: current.participant1,
            participant2: current.participant2,
            nonce: current.nonce,
            participant1_balance,
            participant2_balance,
        };

        tracing::debug!(
            nonce = body.nonce,
            value = %self.value,
            from = %sender_address,
            to = %self.target,
            participant1_balance = %participant1_balance,
            participant2_balance = %participant2_balance,
            "receipt built"
        );

        Ok(ChannelReceipt::new(
            body,
            Authorization::SingleSigned {
                role: current.sender_role,
                signature,
            },
        ))
    }
}

/// Channel state the new receipt is computed from.
struct Current {
    participant1: Address,
    participant2: Address,
    sender_role: Role,
    sender_balance: u128,
    target_balance: u128,
    nonce: u64,
}

impl Current {
    fn from_prior(
        prior: &AuthorizedReceipt,
        sender: &Address,
        target: &Address,
    ) -> Result<Self, ChannelError> {
        prior.verify()?;

        let body = prior.body();
        let sender_role = body
            .role_of(sender)
            .ok_or(ChannelError::UnknownParticipant(*sender))?;
        let target_role = body
            .role_of(target)
            .ok_or(ChannelError::UnknownParticipant(*target))?;
        // sender != target was checked by the caller, so the roles differ.
        debug_assert_ne!(sender_role, target_role);

        let nonce = body
            .nonce
            .checked_add(1)
            .ok_or(ChannelError::NonceOverflow(body.nonce))?;

        Ok(Self {
            participant1: body.participant1,
            participant2: body.participant2,
            sender_role,
            sender_balance: body.balance(sender_role),
            target_balance: body.balance(target_role),
            nonce,
        })
    }
}

/// Build a receipt from positional arguments.
///
/// Mirrors the builder for callers that carry the sender address and key
/// separately. Opening balances are used only when `old_receipt` is `None`.
///
/// # Errors
///
/// - [`ChannelError::KeyMismatch`] if `sender_key` does not sign for
///   `sender_address`.
/// - [`ChannelError::MissingOpeningBalances`] when opening without both
///   balances.
/// - [`ChannelError::StaleReceipt`] when `old_receipt` is not fully signed.
/// - [`ChannelError::UnknownParticipant`] when sender or target is not in
///   the prior receipt.
/// - [`ChannelError::InsufficientBalance`] when `value` exceeds the
///   sender's balance.
#[allow(clippy::too_many_arguments)]
pub fn build_receipt(
    value: u128,
    sender_address: &Address,
    sender_key: &ChannelKeypair,
    target_address: &Address,
    old_receipt: Option<&ChannelReceipt>,
    opening_sender_balance: Option<u128>,
    opening_target_balance: Option<u128>,
) -> Result<ChannelReceipt, ChannelError> {
    if sender_key.address() != *sender_address {
        return Err(ChannelError::KeyMismatch {
            expected: *sender_address,
            actual: sender_key.address(),
        });
    }

    let builder = ReceiptBuilder::transfer(value, *target_address);
    let builder = match (old_receipt, opening_sender_balance, opening_target_balance) {
        (Some(old), _, _) => builder.after(old),
        (None, Some(sender_balance), Some(target_balance)) => {
            builder.opening(sender_balance, target_balance)
        }
        (None, _, _) => builder,
    };
    builder.sign(sender_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::approver::approve_as;
    use crate::channel::types::ReceiptState;

    struct Parties {
        a: ChannelKeypair,
        b: ChannelKeypair,
    }

    fn parties() -> Parties {
        Parties {
            a: ChannelKeypair::generate(),
            b: ChannelKeypair::generate(),
        }
    }

    #[test]
    fn opening_receipt_assigns_slots_and_nonce_zero() {
        let p = parties();
        let r = ReceiptBuilder::transfer(80_000, p.b.address())
            .opening(100_000, 0)
            .sign(&p.a)
            .unwrap();

        assert_eq!(r.nonce(), 0);
        assert_eq!(r.body().participant1, p.a.address());
        assert_eq!(r.body().participant2, p.b.address());
        assert_eq!(r.body().participant1_balance, 20_000);
        assert_eq!(r.body().participant2_balance, 80_000);
        assert_eq!(r.state(), ReceiptState::PartiallySigned);
        assert!(r.signature(Role::Initiator).is_some());
        assert!(r.signature(Role::Counterparty).is_none());
        assert!(r.verify_signatures().is_ok());
    }

    #[test]
    fn counterparty_payment_fills_counterparty_slot() {
        let p = parties();
        let opening = ReceiptBuilder::transfer(80_000, p.b.address())
            .opening(100_000, 0)
            .sign(&p.a)
            .unwrap();
        let opening = approve_as(&opening, &p.b).unwrap();

        let next = ReceiptBuilder::transfer(35_000, p.a.address())
            .after(&opening)
            .sign(&p.b)
            .unwrap();

        assert_eq!(next.nonce(), 1);
        // Slots never swap, even though b is now the sender.
        assert_eq!(next.body().participant1, p.a.address());
        assert_eq!(next.body().participant1_balance, 55_000);
        assert_eq!(next.body().participant2_balance, 45_000);
        assert!(next.signature(Role::Initiator).is_none());
        assert!(next.signature(Role::Counterparty).is_some());
    }

    #[test]
    fn missing_opening_balances() {
        let p = parties();
        let result = ReceiptBuilder::transfer(1, p.b.address()).sign(&p.a);
        assert!(matches!(result, Err(ChannelError::MissingOpeningBalances)));

        let result = build_receipt(1, &p.a.address(), &p.a, &p.b.address(), None, Some(10), None);
        assert!(matches!(result, Err(ChannelError::MissingOpeningBalances)));
    }

    #[test]
    fn insufficient_balance_on_opening() {
        let p = parties();
        let result = ReceiptBuilder::transfer(101, p.b.address())
            .opening(100, 0)
            .sign(&p.a);
        assert!(matches!(
            result,
            Err(ChannelError::InsufficientBalance {
                available: 100,
                requested: 101
            })
        ));
    }

    #[test]
    fn exact_balance_can_be_spent() {
        let p = parties();
        let r = ReceiptBuilder::transfer(100, p.b.address())
            .opening(100, 0)
            .sign(&p.a)
            .unwrap();
        assert_eq!(r.body().participant1_balance, 0);
        assert_eq!(r.body().participant2_balance, 100);
    }

    #[test]
    fn zero_value_transfer_is_allowed() {
        let p = parties();
        let r = ReceiptBuilder::transfer(0, p.b.address())
            .opening(5, 5)
            .sign(&p.a)
            .unwrap();
        assert_eq!(r.body().participant1_balance, 5);
        assert_eq!(r.body().participant2_balance, 5);
    }

    #[test]
    fn partially_signed_prior_is_stale() {
        let p = parties();
        let opening = ReceiptBuilder::transfer(10, p.b.address())
            .opening(100, 0)
            .sign(&p.a)
            .unwrap();
        let result = ReceiptBuilder::transfer(5, p.a.address())
            .after(&opening)
            .sign(&p.b);
        assert!(matches!(
            result,
            Err(ChannelError::StaleReceipt {
                nonce: 0,
                state: ReceiptState::PartiallySigned
            })
        ));
    }

    #[test]
    fn unknown_sender_or_target() {
        let p = parties();
        let stranger = ChannelKeypair::generate();
        let opening = ReceiptBuilder::transfer(10, p.b.address())
            .opening(100, 0)
            .sign(&p.a)
            .unwrap();
        let opening = approve_as(&opening, &p.b).unwrap();

        let result = ReceiptBuilder::transfer(1, p.a.address())
            .after(&opening)
            .sign(&stranger);
        assert!(matches!(result, Err(ChannelError::UnknownParticipant(a)) if a == stranger.address()));

        let result = ReceiptBuilder::transfer(1, stranger.address())
            .after(&opening)
            .sign(&p.a);
        assert!(matches!(result, Err(ChannelError::UnknownParticipant(a)) if a == stranger.address()));
    }

    #[test]
    fn self_transfer_is_rejected() {
        let p = parties();
        let result = ReceiptBuilder::transfer(1, p.a.address())
            .opening(10, 10)
            .sign(&p.a);
        assert!(matches!(result, Err(ChannelError::SelfTransfer(_))));
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let p = parties();
        let result = build_receipt(1, &p.b.address(), &p.a, &p.b.address(), None, Some(1), Some(0));
        assert!(matches!(result, Err(ChannelError::KeyMismatch { .. })));
    }

    #[test]
    fn opening_total_overflow_is_rejected() {
        let p = parties();
        let result = ReceiptBuilder::transfer(0, p.b.address())
            .opening(u128::MAX, 1)
            .sign(&p.a);
        assert!(matches!(result, Err(ChannelError::BalanceOverflow { .. })));
    }

    #[test]
    fn positional_build_ignores_opening_balances_when_prior_given() {
        let p = parties();
        let opening = build_receipt(40, &p.a.address(), &p.a, &p.b.address(), None, Some(50), Some(50)).unwrap();
        let opening = approve_as(&opening, &p.b).unwrap();
        let next = build_receipt(
            20,
            &p.b.address(),
            &p.b,
            &p.a.address(),
            Some(&opening),
            Some(1),
            Some(1),
        )
        .unwrap();
        assert_eq!(next.body().participant1_balance, 30);
        assert_eq!(next.body().participant2_balance, 70);
    }

    #[test]
    fn extending_an_authorized_receipt() {
        let p = parties();
        let opening = ReceiptBuilder::transfer(10, p.b.address())
            .opening(10, 10)
            .sign(&p.a)
            .unwrap();
        let authorized = approve_as(&opening, &p.b).unwrap().authorized().unwrap();
        let next = ReceiptBuilder::transfer(20, p.a.address())
            .extending(&authorized)
            .sign(&p.b)
            .unwrap();
        assert_eq!(next.nonce(), 1);
        assert_eq!(next.body().participant1_balance, 20);
        assert_eq!(next.body().participant2_balance, 0);
    }

    #[test]
    fn input_receipt_is_untouched_on_failure() {
        let p = parties();
        let opening = ReceiptBuilder::transfer(10, p.b.address())
            .opening(10, 0)
            .sign(&p.a)
            .unwrap();
        let opening = approve_as(&opening, &p.b).unwrap();
        let before = opening.clone();
        assert!(ReceiptBuilder::transfer(11, p.a.address())
            .after(&opening)
            .sign(&p.b)
            .is_err());
        assert_eq!(opening, before);
    }
}
