//! Debug snapshots of component state.
//!
//! A snapshot is a read-only picture of what every instance on a component
//! is doing: its active segment, the timeline it drives, the events a debug
//! UI could offer and the recent transition trail. Snapshots are for
//! tooling and bug reports; they are not used to restore a component.

use crate::core::{ActionTypeKey, SegmentId, TransitionRecord};
use crate::machine::ActionComponent;
use crate::timeline::PlaybackStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Playback of the timeline an instance's active segment drives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub status: PlaybackStatus,
    pub position_frames: f64,
    pub seconds: f64,
    pub loops: u32,
    /// Whether the component's shared timeline is the one playing.
    pub shared: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    pub type_key: ActionTypeKey,
    pub active_segment: Option<SegmentId>,
    pub active_segment_name: Option<String>,
    pub timeline: Option<TimelineSnapshot>,
    pub eligible_events: Vec<String>,
    pub live_spawns: usize,
    pub trail: Vec<TransitionRecord>,
}

/// Serializable picture of one component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    pub instances: Vec<InstanceSnapshot>,
}

impl ComponentSnapshot {
    pub fn capture(component: &ActionComponent) -> Self {
        let shared = component.shared_player();
        let instances = component
            .instances()
            .iter()
            .map(|instance| {
                let timeline = instance.bound_timeline(shared).map(|player| TimelineSnapshot {
                    status: player.status(),
                    position_frames: player.position_frames(),
                    seconds: player.current_seconds(),
                    loops: player.loops(),
                    shared: instance.uses_shared_timeline(),
                });
                InstanceSnapshot {
                    type_key: instance.key().clone(),
                    active_segment: instance.active_segment(),
                    active_segment_name: instance.active_segment_name().map(str::to_string),
                    timeline,
                    eligible_events: instance.eligible_events(shared),
                    live_spawns: instance.spawns().instance_managed().count(),
                    trail: instance.trail().records().cloned().collect(),
                }
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            taken_at: Utc::now(),
            instances,
        }
    }

    pub fn find(&self, key: &ActionTypeKey) -> Option<&InstanceSnapshot> {
        self.instances.iter().find(|instance| &instance.type_key == key)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()
    }

    fn check_version(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ActionTypeBuilder, SegmentBuilder};
    use crate::core::{NetRole, ObjectId};
    use crate::machine::{ActionCatalog, ActionHost, SequenceAsset};
    use crate::spawn::{SpawnError, SpawnTemplate, SpawnWorld, Transform};
    use crate::timeline::{EndAction, FrameRange, FrameRate, TrackData};
    use crate::ActionConfig;
    use std::sync::Arc;

    struct Host;

    impl ActionHost for Host {
        fn role(&self) -> NetRole {
            NetRole::Standalone
        }

        fn now_seconds(&self) -> f64 {
            0.0
        }
    }

    struct NoWorld;

    impl SpawnWorld for NoWorld {
        fn spawn(&mut self, template: &SpawnTemplate, _: Transform) -> Result<ObjectId, SpawnError> {
            Err(SpawnError::UnknownTemplate(template.id.clone()))
        }

        fn destroy(&mut self, _: ObjectId) {}

        fn destroy_after(&mut self, _: ObjectId, _: f32) {}

        fn is_alive(&self, _: ObjectId) -> bool {
            false
        }
    }

    fn running_component() -> ActionComponent {
        let track = TrackData::new(FrameRate::new(30.0), FrameRange::new(0, 60));
        let attack = ActionTypeBuilder::new("Attack")
            .segment(
                SegmentBuilder::new("Swing")
                    .sequence(SequenceAsset::new(track, EndAction::Stop))
                    .on_event("Parry", "Recover"),
            )
            .segment(SegmentBuilder::new("Recover"))
            .entry("Default", "Swing")
            .build()
            .unwrap();
        let catalog = Arc::new(ActionCatalog::new().with_default(attack));
        let mut component = ActionComponent::new(catalog, ActionConfig::default());
        let key = ActionTypeKey::new("Attack");
        component.start(&Host, &mut NoWorld).unwrap();
        component
            .try_start_entry(&key, "Default", &Host, &mut NoWorld)
            .unwrap();
        component.tick(0.5, &Host, &mut NoWorld).unwrap();
        component
    }

    #[test]
    fn capture_describes_running_instances() {
        let snapshot = running_component().snapshot();

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        let attack = snapshot.find(&ActionTypeKey::new("Attack")).unwrap();
        assert_eq!(attack.active_segment_name.as_deref(), Some("Swing"));
        assert_eq!(attack.eligible_events, vec!["Parry".to_string()]);
        let timeline = attack.timeline.as_ref().unwrap();
        assert_eq!(timeline.status, PlaybackStatus::Playing);
        assert!((timeline.seconds - 0.5).abs() < 1e-9);
        assert_eq!(attack.trail.len(), 1);
    }

    #[test]
    fn snapshot_roundtrips_through_json_and_bytes() {
        let snapshot = running_component().snapshot();

        let from_json = ComponentSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let from_bytes = ComponentSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();

        assert_eq!(from_json, snapshot);
        assert_eq!(from_bytes, snapshot);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut snapshot = running_component().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;

        let result = ComponentSnapshot::from_json(&snapshot.to_json().unwrap());

        assert!(matches!(
            result,
            Err(SnapshotError::UnsupportedVersion { found, supported })
                if found == SNAPSHOT_VERSION + 1 && supported == SNAPSHOT_VERSION
        ));
    }
}
