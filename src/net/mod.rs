//! Reconciliation messages and replicated state.
//!
//! The transport is not part of this crate. Components push [`Envelope`]s
//! into an [`Outbox`]; the game drains it, delivers each message reliably
//! and in order per instance, and hands incoming messages back to
//! [`ActionComponent::handle_message`](crate::machine::ActionComponent::handle_message).

pub mod error;
pub mod message;
pub mod replication;

pub use error::ProtocolError;
pub use message::{ActionMessage, Envelope, Outbox, Recipient};
pub use replication::{ComponentReplication, InstanceReplication};
