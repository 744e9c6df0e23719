//! Authoring problems and how the builder reacts to them.

use thiserror::Error;

/// A problem found in a compiled action type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthoringError {
    #[error(
        "Condition {condition} used by {} is not registered",
        .segment.as_deref().unwrap_or("an entry point")
    )]
    UnboundCondition {
        segment: Option<String>,
        condition: String,
    },

    #[error("Segment {segment} cannot be reached from any entry point")]
    UnreachableSegment { segment: String },

    #[error("Segment {segment} has an unconditional tick transition to itself")]
    UnconditionalSelfLoop { segment: String },

    #[error("Segment {segment} plays a sequence with an empty range")]
    EmptySequence { segment: String },

    #[error("Custom check failed: {message}")]
    CustomCheckFailed { message: String },
}

/// What the builder does when authoring checks fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Fail the build with every problem found.
    Reject,

    /// Log each problem as a warning and keep the action type.
    #[default]
    WarnAndAccept,
}
