//! Errors returned by component and instance operations.

use crate::core::{ActionTypeKey, SegmentId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MachineError {
    /// Programmer error: the machine was driven into a state it forbids.
    #[error("Invariant violated on {instance}: {detail}")]
    InvariantViolation {
        instance: ActionTypeKey,
        detail: String,
    },

    #[error("Action type {0} is not in the catalog")]
    UnknownActionType(ActionTypeKey),

    #[error("Action type {0} already has an instance on this component")]
    DuplicateInstance(ActionTypeKey),

    #[error("No instance of action type {0} on this component")]
    UnknownInstance(ActionTypeKey),

    #[error("Operation is reserved to the authority")]
    NotAuthority,

    #[error("Segment {segment} does not exist on {instance}")]
    UnknownSegment {
        instance: ActionTypeKey,
        segment: SegmentId,
    },
}
