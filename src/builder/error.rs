//! Build errors for action type and segment builders.

use crate::core::ActionTypeKey;
use crate::validation::AuthoringError;
use thiserror::Error;

/// Errors that can occur when compiling an action type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("Action type {0} has no segments. Add at least one with .segment(...)")]
    MissingSegments(ActionTypeKey),

    #[error("Action type {0} has no entry points. Add one with .entry(name, segment)")]
    MissingEntryPoints(ActionTypeKey),

    #[error("Segment name {0} is used more than once")]
    DuplicateSegment(String),

    #[error("Transition from {from} targets unknown segment {target}")]
    UnknownTarget { from: String, target: String },

    #[error("Too many segments ({0}), at most {max} are supported", max = u16::MAX)]
    TooManySegments(usize),

    #[error("Authoring validation failed with {} problem(s)", .0.len())]
    Authoring(Vec<AuthoringError>),
}
