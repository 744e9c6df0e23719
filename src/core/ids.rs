//! Identifiers and network roles shared by every layer.
//!
//! Identifiers are plain values: segments are addressed by their position
//! in the compiled template, instances by their action type key, and
//! spawned objects by a random uuid handed out by the spawn world.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Index of a segment inside its compiled action type.
///
/// Segment ids are stable across machines because every side builds its
/// instances from the same compiled template, so they are safe to put on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u16);

impl SegmentId {
    /// Position of the segment in the template's segment list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name of an action type.
///
/// A component holds at most one instance per key, so the key doubles as
/// the network identity of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionTypeKey(String);

impl ActionTypeKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionTypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ActionTypeKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Handle of an object created by the spawn world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Network role of the entity that owns a component, as seen from the
/// local machine.
///
/// # Example
///
/// ```rust
/// use actionline::core::NetRole;
///
/// assert!(NetRole::AutonomousProxy.is_predicting());
/// assert!(!NetRole::Standalone.is_predicting());
/// assert!(NetRole::Authority.has_authority());
/// assert!(!NetRole::SimulatedProxy.is_locally_controlled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetRole {
    /// Authority that also controls the entity (offline play, listen host).
    Standalone,
    /// Authority for an entity controlled by a remote client.
    Authority,
    /// The owning client: controls the entity and predicts ahead of the authority.
    AutonomousProxy,
    /// A remote observer that only mirrors replicated state.
    SimulatedProxy,
}

impl NetRole {
    pub fn has_authority(self) -> bool {
        matches!(self, Self::Standalone | Self::Authority)
    }

    pub fn is_locally_controlled(self) -> bool {
        matches!(self, Self::Standalone | Self::AutonomousProxy)
    }

    /// Locally controlled without authority: transitions are predicted and
    /// proposed to the authority.
    pub fn is_predicting(self) -> bool {
        self.is_locally_controlled() && !self.has_authority()
    }

    /// Neither authority nor controller: state arrives through replication.
    pub fn is_observer(self) -> bool {
        matches!(self, Self::SimulatedProxy)
    }
}
