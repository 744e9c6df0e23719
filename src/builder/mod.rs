//! Builder API for authoring action types.
//!
//! Action types are normally produced ahead of time by an authoring tool.
//! These builders give the same result from code: segments, transitions
//! and entry points are declared by name and resolved when the type is
//! built, after which the authoring checks in [`crate::validation`] run.

pub mod action;
pub mod error;
pub mod macros;
pub mod segment;

pub use action::ActionTypeBuilder;
pub use error::BuildError;
pub use segment::SegmentBuilder;
