//! # Channel Receipts
//!
//! A channel is two participants trading a balance back and forth. Every
//! trade produces a new [`ChannelReceipt`]: both balances, a nonce, and a
//! signature slot per participant.
//!
//! ```text
//!   ┌───────────┐  build   ┌──────────────────┐  approve  ┌────────────┐
//!   │  OPENING  ├─────────►│ PARTIALLY_SIGNED ├──────────►│ AUTHORIZED │
//!   └───────────┘          └──────────────────┘           └─────┬──────┘
//!         ▲                                                     │
//!         │                 extend (next build)                 │ settle
//!         └─────────────────────────────────────────────────────┤
//!                                                               ▼
//!                                                          ┌─────────┐
//!                                                          │ SETTLED │
//!                                                          └─────────┘
//! ```
//!
//! - [`builder`] proposes the next receipt and signs the sender's slot.
//! - [`approver`] counter-signs exactly what was proposed.
//! - Only an [`AuthorizedReceipt`] can be extended or settled, and the type
//!   system enforces it.
//!
//! Every step returns a new value. Receipts are never mutated, so a chain
//! of receipts doubles as its own audit log.
//!
//! ## Caller responsibilities
//!
//! Nothing here serializes concurrent extensions of one channel. If both
//! participants build on the same prior receipt at once, two receipts with
//! the same nonce exist and at most one will ever settle. Keep at most one
//! pending, unauthorized receipt per channel.

pub mod approver;
pub mod builder;
pub mod types;
pub mod wire;

mod error;

pub use approver::{approve, approve_as};
pub use builder::{build_receipt, ReceiptBuilder};
pub use error::ChannelError;
pub use types::{
    Authorization, AuthorizedReceipt, ChannelReceipt, ReceiptBody, ReceiptState, Role, Transfer,
};
pub use wire::ReceiptWire;
