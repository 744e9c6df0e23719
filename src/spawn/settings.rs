//! Ownership policy and teardown causes for spawned objects.

use serde::{Deserialize, Serialize};

/// Scope whose end destroys a spawned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpawnOwnership {
    /// Destroyed when the sequence that spawned it stops.
    Sequence,
    /// Survives segment transitions; destroyed when the instance deactivates.
    #[default]
    Instance,
    /// Left to whoever took it over; never destroyed by a finishing sequence.
    External,
}

/// Per-track spawn options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Bind the object to the instance under its template id and reuse it
    /// across segments instead of spawning a fresh one each activation.
    pub as_reference: bool,
    pub ownership: SpawnOwnership,
    pub destroy_when_aborted: bool,
    /// Seconds to keep the object alive once it has been released.
    pub destroy_delay_secs: f32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            as_reference: false,
            ownership: SpawnOwnership::Instance,
            destroy_when_aborted: true,
            destroy_delay_secs: 0.0,
        }
    }
}

impl SpawnSettings {
    pub fn reference(ownership: SpawnOwnership) -> Self {
        Self {
            as_reference: true,
            ownership,
            ..Self::default()
        }
    }

    pub fn with_destroy_delay(mut self, seconds: f32) -> Self {
        self.destroy_delay_secs = seconds;
        self
    }

    pub fn surviving_aborts(mut self) -> Self {
        self.destroy_when_aborted = false;
        self
    }
}

/// Why spawned objects are being released.
///
/// Passed explicitly down the teardown path so the registry never has to
/// consult ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeardownCause {
    /// A spawn track's channel switched off during playback.
    Evaluation,
    /// The segment is being left for another segment.
    Transition,
    /// The sequence or instance ended gracefully.
    Finished,
    /// The instance was aborted.
    Aborted,
}

impl TeardownCause {
    pub fn is_abort(self) -> bool {
        matches!(self, Self::Aborted)
    }
}
