//! Notifications a component accumulates for its owner.

use crate::core::{ActionTypeKey, SegmentId, TransitionRecord};
use crate::timeline::TimelineEvent;
use serde::{Deserialize, Serialize};

/// Lifecycle change reported through
/// [`ActionComponent::drain_events`](super::ActionComponent::drain_events).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionEvent {
    InstanceConstructed {
        instance: ActionTypeKey,
    },
    InstanceDestructed {
        instance: ActionTypeKey,
    },
    InstanceActivated {
        instance: ActionTypeKey,
        segment: SegmentId,
    },
    InstanceDeactivated {
        instance: ActionTypeKey,
        aborted: bool,
    },
    SegmentActivated {
        instance: ActionTypeKey,
        segment: SegmentId,
    },
    SegmentDeactivated {
        instance: ActionTypeKey,
        segment: SegmentId,
        aborted: bool,
    },
    TransitionTaken {
        instance: ActionTypeKey,
        record: TransitionRecord,
    },
    /// The authority overruled a prediction; `restored` is the segment the
    /// instance was put back into.
    PredictionCorrected {
        instance: ActionTypeKey,
        restored: Option<SegmentId>,
    },
    Timeline {
        instance: ActionTypeKey,
        event: TimelineEvent,
    },
}

impl ActionEvent {
    pub fn instance(&self) -> &ActionTypeKey {
        match self {
            Self::InstanceConstructed { instance }
            | Self::InstanceDestructed { instance }
            | Self::InstanceActivated { instance, .. }
            | Self::InstanceDeactivated { instance, .. }
            | Self::SegmentActivated { instance, .. }
            | Self::SegmentDeactivated { instance, .. }
            | Self::TransitionTaken { instance, .. }
            | Self::PredictionCorrected { instance, .. }
            | Self::Timeline { instance, .. } => instance,
        }
    }
}
