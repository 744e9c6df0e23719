//! Authored track data a sequence player evaluates.
//!
//! Track data is an opaque asset as far as the runtime is concerned; these
//! types only give it a shape. Events are kept sorted by frame so the
//! player can walk them in play order.

use super::time::{FrameRange, FrameRate};
use crate::spawn::{SpawnSettings, SpawnTemplate};
use serde::{Deserialize, Serialize};

/// Point event fired when the cursor sweeps over its frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub frame: i32,
    pub name: String,
    /// Name of the listener object the event is bound to, if any.
    pub binding: Option<String>,
}

impl KeyEvent {
    pub fn new(frame: i32, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
            binding: None,
        }
    }

    pub fn bound_to(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }
}

/// Interval event: started when the cursor enters `range`, ticked while
/// it plays inside, ended when it leaves or the sequence tears down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    pub name: String,
    pub range: FrameRange,
    pub binding: Option<String>,
    /// Key events that only fire while this state is ticking.
    pub inner_keys: Vec<KeyEvent>,
}

impl StateEvent {
    pub fn new(name: impl Into<String>, range: FrameRange) -> Self {
        Self {
            name: name.into(),
            range,
            binding: None,
            inner_keys: Vec::new(),
        }
    }

    pub fn with_inner_key(mut self, key: KeyEvent) -> Self {
        insert_sorted(&mut self.inner_keys, key);
        self
    }
}

/// Key of a spawn track's boolean channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnKey {
    pub frame: i32,
    pub spawned: bool,
}

/// Track that keeps an object alive while its channel is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTrack {
    pub template: SpawnTemplate,
    pub settings: SpawnSettings,
    pub keys: Vec<SpawnKey>,
    /// Channel value before the first key.
    pub default_spawned: bool,
}

impl SpawnTrack {
    pub fn new(template: SpawnTemplate, settings: SpawnSettings) -> Self {
        Self {
            template,
            settings,
            keys: Vec::new(),
            default_spawned: true,
        }
    }

    pub fn with_key(mut self, frame: i32, spawned: bool) -> Self {
        let at = self.keys.partition_point(|key| key.frame <= frame);
        self.keys.insert(at, SpawnKey { frame, spawned });
        self
    }

    pub fn starting_despawned(mut self) -> Self {
        self.default_spawned = false;
        self
    }

    /// Channel value at `frame`: the last key at or before it.
    pub fn desired_at(&self, frame: i32) -> bool {
        self.keys
            .iter()
            .rev()
            .find(|key| key.frame <= frame)
            .map_or(self.default_spawned, |key| key.spawned)
    }
}

/// Complete content of one sequence.
///
/// # Example
///
/// ```rust
/// use actionline::timeline::{FrameRange, FrameRate, KeyEvent, TrackData};
///
/// let track = TrackData::new(FrameRate::new(60.0), FrameRange::new(0, 120))
///     .with_key_event(KeyEvent::new(90, "Release"))
///     .with_key_event(KeyEvent::new(30, "Swing"));
///
/// let order: Vec<_> = track.key_events.iter().map(|k| k.name.as_str()).collect();
/// assert_eq!(order, ["Swing", "Release"]);
/// assert_eq!(track.total_seconds(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackData {
    pub display_rate: FrameRate,
    pub range: FrameRange,
    pub key_events: Vec<KeyEvent>,
    pub state_events: Vec<StateEvent>,
    pub spawn_tracks: Vec<SpawnTrack>,
}

impl TrackData {
    pub fn new(display_rate: FrameRate, range: FrameRange) -> Self {
        Self {
            display_rate,
            range,
            key_events: Vec::new(),
            state_events: Vec::new(),
            spawn_tracks: Vec::new(),
        }
    }

    pub fn with_key_event(mut self, key: KeyEvent) -> Self {
        insert_sorted(&mut self.key_events, key);
        self
    }

    pub fn with_state_event(mut self, state: StateEvent) -> Self {
        self.state_events.push(state);
        self
    }

    pub fn with_spawn_track(mut self, track: SpawnTrack) -> Self {
        self.spawn_tracks.push(track);
        self
    }

    pub fn total_seconds(&self) -> f64 {
        self.display_rate
            .to_seconds(f64::from(self.range.duration()))
    }
}

/// Insert keeping frame order; equal frames keep authoring order.
fn insert_sorted(keys: &mut Vec<KeyEvent>, key: KeyEvent) {
    let at = keys.partition_point(|existing| existing.frame <= key.frame);
    keys.insert(at, key);
}
