//! Collaborators the machine borrows for the duration of one call.

use crate::config::ActionConfig;
use crate::core::NetRole;
use crate::net::Outbox;
use crate::spawn::{SpawnWorld, Transform};
use crate::timeline::SequencePlayer;

use super::event::ActionEvent;

/// The entity a component is attached to, as seen by the machine.
///
/// Role and clock are supplied by the game's networking layer; the machine
/// never decides on its own whether it is the authority.
pub trait ActionHost {
    fn role(&self) -> NetRole;

    /// Monotonic time in seconds.
    fn now_seconds(&self) -> f64;

    /// Estimated one-way latency to the authority, in seconds.
    fn ping_seconds(&self) -> f64 {
        0.0
    }

    /// World transform spawned objects are placed relative to.
    fn origin(&self) -> Transform {
        Transform::IDENTITY
    }
}

/// Everything an instance may touch while it runs.
pub(crate) struct ActionContext<'a> {
    pub host: &'a dyn ActionHost,
    pub world: &'a mut dyn SpawnWorld,
    pub outbox: &'a mut Outbox,
    pub config: &'a ActionConfig,
    pub shared_player: &'a mut SequencePlayer,
    pub events: &'a mut Vec<ActionEvent>,
}

impl ActionContext<'_> {
    pub fn role(&self) -> NetRole {
        self.host.role()
    }

    pub fn now(&self) -> f64 {
        self.host.now_seconds()
    }
}
