//! # State Channel Settlement
//!
//! Takes the last authorized receipt of a channel and writes its balances
//! back to the ledger. The contract never sees the receipt chain, only the
//! final balance tuple and both participants' signatures over it.
//!
//! ## Checks
//!
//! [`StateChannel::apply_state`] runs these in order and stops at the first
//! failure:
//!
//! 1. **Conservation**: the proposed balances sum to what the two
//!    participants hold on the ledger right now.
//! 2. **Authenticity**: each signature recovers to its participant.
//! 3. **Binding**: both messages equal the canonical message of the
//!    proposed balances. Without this, valid signatures over *some other*
//!    tuple would be accepted.
//! 4. **Authorization**: the caller is one of the participants.
//!
//! Only when all four pass are the ledger balances overwritten.
//!
//! ## Known limitation
//!
//! The nonce is not part of the signed message, so any authorized receipt
//! whose sum matches the current ledger can be settled, including an older
//! one. There is no challenge period to contest it; participants are
//! expected to settle only their latest receipt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tandem_protocol::channel::{AuthorizedReceipt, Role};
use tandem_protocol::crypto::{self, balance_message, Address, Digest, RecoverableSignature, SignatureError};
use thiserror::Error;

use crate::ledger::Ledger;
use crate::token::TokenError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a settlement was rejected. The ledger is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Proposed balances do not sum to the participants' ledger balances.
    #[error(
        "conservation violated: ledger holds {ledger_total:?}, receipt assigns \
         {participant1_balance} + {participant2_balance}"
    )]
    Conservation {
        /// `balance_of(p1) + balance_of(p2)` on the ledger. `None` if the
        /// sum overflows.
        ledger_total: Option<u128>,
        /// Proposed balance for `participant1`.
        participant1_balance: u128,
        /// Proposed balance for `participant2`.
        participant2_balance: u128,
    },

    /// A signature does not recover to the participant it is claimed for.
    #[error("authenticity failed: {role} signature does not recover to {expected}")]
    Authenticity {
        /// Which slot failed.
        role: Role,
        /// The participant it should have recovered to.
        expected: Address,
    },

    /// A signed message is not the canonical message of these balances.
    #[error("binding failed: {role} message does not match the proposed balances")]
    Binding {
        /// Which slot's message differs.
        role: Role,
    },

    /// The caller is neither participant.
    #[error("unauthorized: {0} is not a participant of this channel")]
    Authorization(Address),

    /// The ledger refused the rewrite.
    #[error("ledger rejected settlement: {0}")]
    Ledger(#[from] TokenError),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Record of one successful settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateApplied {
    pub participant1: Address,
    pub participant2: Address,
    pub participant1_balance: u128,
    pub participant2_balance: u128,
    /// Who submitted the settlement.
    pub caller: Address,
    pub applied_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Settlement contract bound to one ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChannel<L> {
    ledger: L,
    /// Successful settlements, oldest first.
    events: Vec<StateApplied>,
}

impl<L: Ledger> StateChannel<L> {
    /// Deploy the contract against `ledger`.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            events: Vec::new(),
        }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the ledger, for operations outside settlement
    /// such as funding participants.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Settlement history.
    pub fn events(&self) -> &[StateApplied] {
        &self.events
    }

    /// Recover the signer of `message`. Exposed so off-ledger tooling can
    /// check a signature exactly the way settlement will.
    pub fn recover(
        &self,
        message: &Digest,
        signature: &RecoverableSignature,
    ) -> Result<Address, SignatureError> {
        crypto::recover(message, signature)
    }

    /// Verify a final balance tuple and both signatures over it, then
    /// overwrite the participants' ledger balances.
    ///
    /// See the module docs for the check order.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_state(
        &mut self,
        participant1: &Address,
        participant2: &Address,
        participant1_balance: u128,
        participant2_balance: u128,
        participant1_message: &Digest,
        participant2_message: &Digest,
        participant1_signature: &RecoverableSignature,
        participant2_signature: &RecoverableSignature,
        caller: &Address,
    ) -> Result<(), SettlementError> {
        let result = self.check_state(
            participant1,
            participant2,
            participant1_balance,
            participant2_balance,
            [participant1_message, participant2_message],
            [participant1_signature, participant2_signature],
            caller,
        );
        if let Err(err) = result {
            tracing::warn!(
                %participant1,
                %participant2,
                %caller,
                error = %err,
                "settlement rejected"
            );
            return Err(err);
        }

        self.ledger.overwrite_balances([
            (*participant1, participant1_balance),
            (*participant2, participant2_balance),
        ])?;

        let event = StateApplied {
            participant1: *participant1,
            participant2: *participant2,
            participant1_balance,
            participant2_balance,
            caller: *caller,
            applied_at: Utc::now(),
        };
        tracing::info!(
            %participant1,
            %participant2,
            participant1_balance = %participant1_balance,
            participant2_balance = %participant2_balance,
            %caller,
            "state applied"
        );
        self.events.push(event);
        Ok(())
    }

    /// Settle an authorized receipt.
    pub fn settle(
        &mut self,
        receipt: &AuthorizedReceipt,
        caller: &Address,
    ) -> Result<(), SettlementError> {
        let body = receipt.body();
        let sig1 = receipt.initiator_signature();
        let sig2 = receipt.counterparty_signature();
        self.apply_state(
            &body.participant1,
            &body.participant2,
            body.participant1_balance,
            body.participant2_balance,
            &sig1.message,
            &sig2.message,
            &sig1.signature_bytes,
            &sig2.signature_bytes,
            caller,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn check_state(
        &self,
        participant1: &Address,
        participant2: &Address,
        participant1_balance: u128,
        participant2_balance: u128,
        messages: [&Digest; 2],
        signatures: [&RecoverableSignature; 2],
        caller: &Address,
    ) -> Result<(), SettlementError> {
        let ledger_total = self
            .ledger
            .balance_of(participant1)
            .checked_add(self.ledger.balance_of(participant2));
        let proposed_total = participant1_balance.checked_add(participant2_balance);
        if ledger_total.is_none() || proposed_total != ledger_total {
            return Err(SettlementError::Conservation {
                ledger_total,
                participant1_balance,
                participant2_balance,
            });
        }

        let slots = [
            (Role::Initiator, participant1),
            (Role::Counterparty, participant2),
        ];
        for (i, (role, expected)) in slots.into_iter().enumerate() {
            let recovered = crypto::recover(messages[i], signatures[i]).ok();
            if recovered.as_ref() != Some(expected) {
                return Err(SettlementError::Authenticity {
                    role,
                    expected: *expected,
                });
            }
        }

        let canonical = balance_message(
            participant1_balance,
            participant2_balance,
            participant1,
            participant2,
        );
        for (i, (role, _)) in slots.into_iter().enumerate() {
            if *messages[i] != canonical {
                return Err(SettlementError::Binding { role });
            }
        }

        if caller != participant1 && caller != participant2 {
            return Err(SettlementError::Authorization(*caller));
        }

        Ok(())
    }
}
