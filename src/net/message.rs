//! Messages exchanged between the authority and its clients.
//!
//! Every client-to-authority request that the authority may overrule
//! carries a per-instance `seq`. Every correction the authority sends back
//! carries `ack`, the highest `seq` it had processed for that instance.
//! A client only applies a correction whose `ack` matches its latest
//! request, so answers to superseded predictions are dropped.

use super::error::ProtocolError;
use crate::core::{ActionTypeKey, SegmentId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionMessage {
    /// Client predicted `from -> to` and asks the authority to confirm.
    ProposeTransition {
        instance: ActionTypeKey,
        seq: u32,
        from: Option<SegmentId>,
        to: SegmentId,
        /// Condition of the first transition taken, if it had one.
        condition: Option<String>,
    },
    /// Authority rejected a proposal; `restore` is its own active segment.
    TransitionFailed {
        instance: ActionTypeKey,
        ack: u32,
        restore: Option<SegmentId>,
        /// Authority's position in the restored segment's timeline.
        resync_seconds: Option<f64>,
    },
    /// Authority rejected a speculative entry; it never happened.
    Cancel {
        instance: ActionTypeKey,
        ack: u32,
        segment: SegmentId,
    },
    /// Authority started the instance through an entry point.
    EnterConfirmed {
        instance: ActionTypeKey,
        ack: u32,
        segment: SegmentId,
    },
    AbortBroadcast {
        instance: ActionTypeKey,
        ack: Option<u32>,
    },
    AbortToAuthority {
        instance: ActionTypeKey,
        seq: u32,
    },
    /// Client's timeline finished with no outgoing transition.
    FinishToAuthority {
        instance: ActionTypeKey,
        seq: u32,
        segment: SegmentId,
    },
    PlayActionToAuthority {
        instance: ActionTypeKey,
        entry: Option<String>,
    },
}

impl ActionMessage {
    pub fn instance(&self) -> &ActionTypeKey {
        match self {
            Self::ProposeTransition { instance, .. }
            | Self::TransitionFailed { instance, .. }
            | Self::Cancel { instance, .. }
            | Self::EnterConfirmed { instance, .. }
            | Self::AbortBroadcast { instance, .. }
            | Self::AbortToAuthority { instance, .. }
            | Self::FinishToAuthority { instance, .. }
            | Self::PlayActionToAuthority { instance, .. } => instance,
        }
    }

    /// Whether the message travels from a client to the authority.
    pub fn is_to_authority(&self) -> bool {
        matches!(
            self,
            Self::ProposeTransition { .. }
                | Self::AbortToAuthority { .. }
                | Self::FinishToAuthority { .. }
                | Self::PlayActionToAuthority { .. }
        )
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|source| ProtocolError::Encode {
            what: "action message",
            source,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|source| ProtocolError::Decode {
            what: "action message",
            source,
        })
    }
}

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    Authority,
    /// The client that owns and predicts the entity.
    OwningClient,
    /// Remote simulations that are not the owner.
    Observers,
    /// Every remote connection: owner and observers.
    Remotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub recipient: Recipient,
    pub message: ActionMessage,
}

/// Messages waiting for the transport to pick them up.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pending: Vec<Envelope>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipient: Recipient, message: ActionMessage) {
        self.pending.push(Envelope { recipient, message });
    }

    pub fn drain(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
