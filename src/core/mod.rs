//! Pure core shared by the runtime layers.
//!
//! This module contains the side-effect free building blocks:
//! - Identifiers and network roles
//! - Transition conditions and their registration table
//! - The bounded diagnostic transition trail

mod condition;
mod history;
mod ids;

pub use condition::{Condition, ConditionBinding, ConditionRegistry, SourceSegment};
pub use history::{TransitionCause, TransitionRecord, TransitionTrail};
pub use ids::{ActionTypeKey, NetRole, ObjectId, SegmentId};
