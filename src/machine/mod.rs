//! Action state machine runtime.
//!
//! An [`ActionComponent`] owns the [`ActionInstance`]s of one entity. Each
//! instance is duplicated from a compiled [`ActionType`] and keeps at most
//! one active [`Segment`]. Segments move through tick transitions, event
//! transitions and entry points; when networked, decisions are predicted
//! locally and reconciled with the authority through [`crate::net`].

mod behavior;
mod component;
mod error;
mod event;
mod host;
mod instance;
mod segment;
mod template;
mod transition;

pub use behavior::{InstanceBehavior, NoBehavior, SegmentBehavior, SegmentInfo};
pub use component::ActionComponent;
pub use error::MachineError;
pub use event::ActionEvent;
pub use host::ActionHost;
pub use instance::ActionInstance;
pub use segment::Segment;
pub use template::{
    ActionCatalog, ActionType, InstanceBehaviorFactory, SegmentBehaviorFactory, SegmentTemplate,
    SequenceAsset, TransitionTemplate,
};
pub use transition::{chase, first_eligible, Chase, Transition};

/// Entry point used by `play_action` when none is named.
pub const DEFAULT_ENTRY: &str = "Default";

/// Event transition taken when a segment's timeline finishes.
pub const FINISHED_EVENT: &str = "OnFinished";
