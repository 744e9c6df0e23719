//! Sequence player: a frame cursor over one track with event dispatch.
//!
//! The player never calls out while it evaluates. Every update returns the
//! events it produced, in dispatch order, and the caller routes them after
//! the player has settled. Spawn tracks are the exception: they are
//! resolved during evaluation through the [`SpawnScope`] the caller lends.

use super::netsync::{plan_sync, CursorFix, NetSyncProps, SyncTolerance};
use super::time::{FrameRange, SweptRange};
use super::track::TrackData;
use crate::core::{ActionTypeKey, NetRole, SegmentId};
use crate::spawn::{SpawnRegistry, SpawnScope, TeardownCause};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
    /// Cursor set directly, outside real-time playback.
    Scrubbing,
}

/// What happens when playback reaches the end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndAction {
    #[default]
    Stop,
    Loop,
    Pause,
}

/// Event produced by evaluating the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimelineEvent {
    Key {
        name: String,
        binding: Option<String>,
        frame: i32,
    },
    StateStarted {
        index: usize,
        name: String,
    },
    StateTicked {
        index: usize,
        name: String,
        delta_seconds: f64,
        /// Inner key events swept during this tick, in play order.
        inner_keys: Vec<String>,
    },
    StateEnded {
        index: usize,
        name: String,
        /// False when the state was cut short by an abort.
        completed: bool,
    },
    Looped {
        loops: u32,
    },
    /// Playback reached the end of the range with the `Stop` end action.
    Finished,
}

/// Which instance segment currently drives the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBinding {
    pub instance: ActionTypeKey,
    pub segment: SegmentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorMethod {
    Play,
    Jump,
    Scrub,
}

impl CursorMethod {
    fn status(self) -> PlaybackStatus {
        match self {
            Self::Play => PlaybackStatus::Playing,
            Self::Jump => PlaybackStatus::Stopped,
            Self::Scrub => PlaybackStatus::Scrubbing,
        }
    }
}

/// Frame cursor over one [`TrackData`].
///
/// # Example
///
/// Advancing by one large step still reports every key event that was
/// swept over:
///
/// ```rust
/// use actionline::core::{NetRole, SegmentId};
/// use actionline::spawn::{InstanceSpawns, SpawnScope, SpawnTemplate, SpawnWorld, SpawnError, Transform};
/// use actionline::core::ObjectId;
/// use actionline::timeline::{
///     EndAction, FrameRange, FrameRate, KeyEvent, PlayerBinding, SequencePlayer, TimelineEvent, TrackData,
/// };
/// use std::sync::Arc;
///
/// struct NoWorld;
/// impl SpawnWorld for NoWorld {
///     fn spawn(&mut self, t: &SpawnTemplate, _: Transform) -> Result<ObjectId, SpawnError> {
///         Err(SpawnError::UnknownTemplate(t.id.clone()))
///     }
///     fn destroy(&mut self, _: ObjectId) {}
///     fn destroy_after(&mut self, _: ObjectId, _: f32) {}
///     fn is_alive(&self, _: ObjectId) -> bool { false }
/// }
///
/// let track = Arc::new(
///     TrackData::new(FrameRate::new(60.0), FrameRange::new(0, 120))
///         .with_key_event(KeyEvent::new(10, "a"))
///         .with_key_event(KeyEvent::new(20, "b")),
/// );
/// let mut world = NoWorld;
/// let mut spawns = InstanceSpawns::new();
/// let mut scope = SpawnScope { world: &mut world, spawns: &mut spawns, origin: Transform::IDENTITY, authority: true };
///
/// let mut player = SequencePlayer::new();
/// let binding = PlayerBinding { instance: "Attack".into(), segment: SegmentId(0) };
/// player.initialize(binding, track, 1.0, EndAction::Stop, NetRole::Standalone, &mut scope);
/// player.play(&mut scope);
///
/// let events = player.update(0.5, &mut scope);
/// let keys: Vec<_> = events
///     .iter()
///     .filter_map(|e| match e {
///         TimelineEvent::Key { name, .. } => Some(name.as_str()),
///         _ => None,
///     })
///     .collect();
/// assert_eq!(keys, ["a", "b"]);
/// assert_eq!(player.position_frames(), 30.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SequencePlayer {
    binding: Option<PlayerBinding>,
    track: Option<Arc<TrackData>>,
    status: PlaybackStatus,
    position: f64,
    last_eval: Option<f64>,
    rate: f64,
    end_action: EndAction,
    loops: u32,
    sub_step_secs: Option<f64>,
    halt_on_finish: bool,
    authority: bool,
    finish_reported: bool,
    active_states: Vec<bool>,
    spawns: SpawnRegistry,
}

impl SequencePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a track and reset the cursor to the start of its range.
    ///
    /// A player still running a previous track is stopped first. The
    /// locally controlled side halts when playback finishes; other sides
    /// hold the last frame and wait for the replicated outcome.
    pub fn initialize(
        &mut self,
        binding: PlayerBinding,
        track: Arc<TrackData>,
        rate: f64,
        end_action: EndAction,
        role: NetRole,
        scope: &mut SpawnScope<'_>,
    ) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        if let Some(previous) = self.track.clone() {
            if self.status != PlaybackStatus::Stopped {
                self.stop_at(self.position, TeardownCause::Transition, &previous, scope, &mut out);
            }
        }
        if self.spawns.live_count() > 0 {
            self.spawns.teardown(TeardownCause::Transition, scope);
        }

        trace!(instance = %binding.instance, segment = %binding.segment, "timeline initialized");
        self.position = f64::from(track.range.start);
        self.last_eval = None;
        self.loops = 0;
        self.status = PlaybackStatus::Stopped;
        self.active_states = vec![false; track.state_events.len()];
        self.rate = rate;
        self.end_action = end_action;
        self.halt_on_finish = role.is_locally_controlled();
        self.authority = role.has_authority();
        self.finish_reported = false;
        self.binding = Some(binding);
        self.track = Some(track);
        out
    }

    pub fn binding(&self) -> Option<&PlayerBinding> {
        self.binding.as_ref()
    }

    pub fn is_bound_to(&self, instance: &ActionTypeKey, segment: SegmentId) -> bool {
        self.binding
            .as_ref()
            .map_or(false, |b| &b.instance == instance && b.segment == segment)
    }

    pub fn track(&self) -> Option<&TrackData> {
        self.track.as_deref()
    }

    pub fn range(&self) -> Option<FrameRange> {
        self.track.as_ref().map(|track| track.range)
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.status == PlaybackStatus::Paused
    }

    pub fn position_frames(&self) -> f64 {
        self.position
    }

    pub fn loops(&self) -> u32 {
        self.loops
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn end_action(&self) -> EndAction {
        self.end_action
    }

    pub fn spawns(&self) -> &SpawnRegistry {
        &self.spawns
    }

    /// Cursor position in seconds of sequence time.
    pub fn current_seconds(&self) -> f64 {
        self.track
            .as_ref()
            .map_or(0.0, |track| track.display_rate.to_seconds(self.position))
    }

    pub fn total_seconds(&self) -> f64 {
        self.track.as_ref().map_or(0.0, |track| track.total_seconds())
    }

    /// Whether the cursor lies within `[lower, upper]` seconds.
    pub fn is_in_time(&self, lower: f64, upper: f64) -> bool {
        let now = self.current_seconds();
        self.track.is_some() && now >= lower && now <= upper
    }

    /// Enable sub-stepping with the given step, or disable it with `None`.
    pub fn set_sub_step(&mut self, seconds: Option<f32>) {
        self.sub_step_secs = seconds.map(f64::from).filter(|s| *s > 0.0);
    }

    pub fn sub_step(&self) -> Option<f64> {
        self.sub_step_secs
    }

    /// Triple the authority publishes for observers.
    pub fn net_sync_props(&self) -> NetSyncProps {
        NetSyncProps {
            status: self.status,
            position: self.position,
            loops: self.loops,
        }
    }

    /// Start or resume playback, rewinding first when parked at the end.
    pub fn play(&mut self, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        let Some(track) = self.track.clone() else {
            return out;
        };
        if self.status == PlaybackStatus::Playing {
            return out;
        }

        let range = track.range;
        if self.rate >= 0.0 && self.position >= f64::from(range.last_valid()) {
            self.update_cursor(f64::from(range.start), CursorMethod::Jump, &track, scope, &mut out);
        } else if self.rate < 0.0 && self.position <= f64::from(range.start) {
            self.update_cursor(f64::from(range.last_valid()), CursorMethod::Jump, &track, scope, &mut out);
        }

        self.status = PlaybackStatus::Playing;
        self.finish_reported = false;
        if self.last_eval != Some(self.position) {
            let swept = self.play_range(self.position);
            self.evaluate(&track, swept, PlaybackStatus::Playing, scope, &mut out);
        }
        out
    }

    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
    }

    pub fn scrub(&mut self) {
        if self.track.is_some() {
            self.status = PlaybackStatus::Scrubbing;
        }
    }

    /// Stop and rewind to the start of the range.
    pub fn stop(&mut self, cause: TeardownCause, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        if let Some(track) = self.track.clone() {
            self.stop_at(f64::from(track.range.start), cause, &track, scope, &mut out);
        }
        out
    }

    /// Stop without moving the cursor.
    pub fn stop_at_current(
        &mut self,
        cause: TeardownCause,
        scope: &mut SpawnScope<'_>,
    ) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        if let Some(track) = self.track.clone() {
            self.stop_at(self.position, cause, &track, scope, &mut out);
        }
        out
    }

    pub fn jump_to_frame(&mut self, frame: f64, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        self.move_cursor(frame, CursorMethod::Jump, scope)
    }

    pub fn jump_to_seconds(&mut self, seconds: f64, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        let frame = self
            .track
            .as_ref()
            .map_or(0.0, |track| track.display_rate.to_frames(seconds));
        self.jump_to_frame(frame, scope)
    }

    pub fn play_to_frame(&mut self, frame: f64, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        self.move_cursor(frame, CursorMethod::Play, scope)
    }

    pub fn scrub_to_frame(&mut self, frame: f64, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        self.status = PlaybackStatus::Scrubbing;
        self.move_cursor(frame, CursorMethod::Scrub, scope)
    }

    /// Advance by `delta_seconds` of real time.
    ///
    /// With sub-stepping enabled, a delta longer than two sub-steps is cut
    /// into sub-step sized pieces (the last piece takes the remainder) so
    /// short events inside a long frame are still evaluated in order.
    pub fn update(&mut self, delta_seconds: f32, scope: &mut SpawnScope<'_>) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        if self.status != PlaybackStatus::Playing {
            return out;
        }
        let Some(track) = self.track.clone() else {
            return out;
        };

        let delta = f64::from(delta_seconds);
        match self.sub_step_secs {
            Some(sub) if delta > sub * 2.0 => {
                trace!(delta, sub_step = sub, "sub-stepping timeline update");
                let mut remaining = delta;
                while remaining > 0.0 && self.status == PlaybackStatus::Playing {
                    let step = if remaining > sub * 2.0 { sub } else { remaining };
                    self.advance(step, &track, scope, &mut out);
                    remaining -= step;
                }
            }
            _ => self.advance(delta, &track, scope, &mut out),
        }
        out
    }

    /// Bring an observer's playback in line with the authority's triple.
    pub fn apply_net_sync(
        &mut self,
        server: &NetSyncProps,
        ping_secs: f64,
        threshold_ms: f64,
        scope: &mut SpawnScope<'_>,
    ) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        if self.authority {
            return out;
        }
        let Some(track) = self.track.clone() else {
            return out;
        };

        let fps = track.display_rate.fps();
        let tolerance = SyncTolerance {
            lag_frames: ping_secs * self.rate * fps,
            threshold_frames: threshold_ms / 1000.0 * fps,
            loop_frames: f64::from(track.range.duration()),
        };
        let plan = plan_sync(&self.net_sync_props(), server, tolerance);
        if plan.is_noop() {
            return out;
        }

        if plan.start_playing {
            out.extend(self.play(scope));
        }
        if let Some(fix) = plan.cursor {
            debug!(?fix, local = self.position, server = server.position, "timeline net correction");
            match fix {
                CursorFix::PlayTo(frame) => {
                    self.update_cursor(frame, CursorMethod::Play, &track, scope, &mut out)
                }
                CursorFix::JumpTo(frame) => {
                    self.update_cursor(frame, CursorMethod::Jump, &track, scope, &mut out)
                }
                CursorFix::ScrubTo(frame) => {
                    self.update_cursor(frame, CursorMethod::Scrub, &track, scope, &mut out)
                }
            }
        }
        match plan.status {
            Some(PlaybackStatus::Paused) => self.pause(),
            Some(PlaybackStatus::Playing) => out.extend(self.play(scope)),
            Some(PlaybackStatus::Scrubbing) => self.scrub(),
            Some(PlaybackStatus::Stopped) | None => {}
        }
        out
    }

    fn move_cursor(
        &mut self,
        frame: f64,
        method: CursorMethod,
        scope: &mut SpawnScope<'_>,
    ) -> Vec<TimelineEvent> {
        let mut out = Vec::new();
        if let Some(track) = self.track.clone() {
            self.update_cursor(frame, method, &track, scope, &mut out);
        }
        out
    }

    fn advance(
        &mut self,
        seconds: f64,
        track: &TrackData,
        scope: &mut SpawnScope<'_>,
        out: &mut Vec<TimelineEvent>,
    ) {
        let target = self.position + track.display_rate.to_frames(seconds * self.rate);
        self.update_cursor(target, CursorMethod::Play, track, scope, out);
    }

    fn update_cursor(
        &mut self,
        target: f64,
        method: CursorMethod,
        track: &TrackData,
        scope: &mut SpawnScope<'_>,
        out: &mut Vec<TimelineEvent>,
    ) {
        let range = track.range;
        if range.is_empty() {
            warn!(start = range.start, end = range.end, "playing back a sequence with zero duration");
            return;
        }

        if method == CursorMethod::Play && self.should_stop_or_loop(target, range) {
            match self.end_action {
                EndAction::Stop => {
                    let clamped = self.clamp_to_range(target, range);
                    let swept = self.play_range(clamped);
                    self.evaluate(track, swept, PlaybackStatus::Playing, scope, out);
                    if self.halt_on_finish {
                        self.stop_at(clamped, TeardownCause::Finished, track, scope, out);
                    }
                    if !self.finish_reported {
                        self.finish_reported = true;
                        out.push(TimelineEvent::Finished);
                    }
                }
                EndAction::Loop => self.wrap(target, track, scope, out),
                EndAction::Pause => {
                    let clamped = self.clamp_to_range(target, range);
                    let swept = self.play_range(clamped);
                    self.evaluate(track, swept, PlaybackStatus::Playing, scope, out);
                    self.status = PlaybackStatus::Paused;
                }
            }
            return;
        }

        let swept = match method {
            CursorMethod::Play => self.play_range(target),
            CursorMethod::Jump | CursorMethod::Scrub => self.jump_range(target),
        };
        let status = if method == CursorMethod::Play {
            self.status
        } else {
            method.status()
        };
        self.evaluate(track, swept, status, scope, out);
    }

    fn should_stop_or_loop(&self, target: f64, range: FrameRange) -> bool {
        if self.status != PlaybackStatus::Playing {
            return false;
        }
        if self.rate >= 0.0 {
            match self.end_action {
                EndAction::Loop => target >= f64::from(range.end),
                EndAction::Stop | EndAction::Pause => target >= f64::from(range.last_valid()),
            }
        } else {
            target < f64::from(range.start)
        }
    }

    fn clamp_to_range(&self, target: f64, range: FrameRange) -> f64 {
        target.clamp(f64::from(range.start), f64::from(range.last_valid()))
    }

    /// Finish the current loop, then re-enter at the overplay offset.
    fn wrap(
        &mut self,
        target: f64,
        track: &TrackData,
        scope: &mut SpawnScope<'_>,
        out: &mut Vec<TimelineEvent>,
    ) {
        let start = f64::from(track.range.start);
        let end = f64::from(track.range.end);
        let length = end - start;

        let relative = target - start;
        let mut wraps = (relative / length).floor();
        let mut overplay = relative - wraps * length;
        if overplay >= length {
            overplay -= length;
            wraps += 1.0;
        }

        let forwards = self.rate >= 0.0;
        let (finish_at, reenter_at) = if forwards { (end, start) } else { (start, end) };
        if self.position != finish_at {
            let swept = self.play_range(finish_at);
            self.evaluate(track, swept, PlaybackStatus::Playing, scope, out);
        }

        self.loops += wraps.abs() as u32;
        self.position = reenter_at;
        self.last_eval = None;
        let swept = self.play_range(start + overplay);
        self.evaluate(track, swept, PlaybackStatus::Playing, scope, out);
        out.push(TimelineEvent::Looped { loops: self.loops });
    }

    fn stop_at(
        &mut self,
        position: f64,
        cause: TeardownCause,
        track: &TrackData,
        scope: &mut SpawnScope<'_>,
        out: &mut Vec<TimelineEvent>,
    ) {
        if self.status == PlaybackStatus::Stopped {
            return;
        }
        self.status = PlaybackStatus::Stopped;
        self.position = position;
        self.last_eval = None;
        self.loops = 0;

        let completed = !cause.is_abort();
        for (index, state) in track.state_events.iter().enumerate() {
            if let Some(active) = self.active_states.get_mut(index) {
                if *active {
                    *active = false;
                    out.push(TimelineEvent::StateEnded {
                        index,
                        name: state.name.clone(),
                        completed,
                    });
                }
            }
        }
        self.spawns.teardown(cause, scope);
    }

    fn play_range(&mut self, target: f64) -> SweptRange {
        let swept = match self.last_eval {
            Some(previous) => SweptRange::exclusive(previous, target),
            None => SweptRange::inclusive(self.position, target),
        };
        self.position = target;
        self.last_eval = Some(target);
        swept
    }

    fn jump_range(&mut self, target: f64) -> SweptRange {
        self.position = target;
        self.last_eval = None;
        SweptRange::point(target)
    }

    fn evaluate(
        &mut self,
        track: &TrackData,
        swept: SweptRange,
        status: PlaybackStatus,
        scope: &mut SpawnScope<'_>,
        out: &mut Vec<TimelineEvent>,
    ) {
        let frame = self.position.floor() as i32;

        for (index, spawn) in track.spawn_tracks.iter().enumerate() {
            let desired = spawn.desired_at(frame);
            self.spawns.evaluate(index, spawn, desired, scope);
        }

        let fires = status != PlaybackStatus::Stopped;
        if fires {
            let swept_keys = track.key_events.iter().filter(|key| swept.contains(key.frame));
            let mut keys: Vec<_> = swept_keys
                .map(|key| TimelineEvent::Key {
                    name: key.name.clone(),
                    binding: key.binding.clone(),
                    frame: key.frame,
                })
                .collect();
            if !swept.is_forwards() {
                keys.reverse();
            }
            out.extend(keys);
        }

        let delta_seconds = track.display_rate.to_seconds(swept.span());
        for (index, state) in track.state_events.iter().enumerate() {
            let Some(active) = self.active_states.get_mut(index) else {
                continue;
            };
            let inside = state.range.contains(frame);
            if inside && !*active {
                *active = true;
                out.push(TimelineEvent::StateStarted {
                    index,
                    name: state.name.clone(),
                });
            }
            if inside && fires {
                let mut inner_keys: Vec<String> = state
                    .inner_keys
                    .iter()
                    .filter(|key| swept.contains(key.frame))
                    .map(|key| key.name.clone())
                    .collect();
                if !swept.is_forwards() {
                    inner_keys.reverse();
                }
                out.push(TimelineEvent::StateTicked {
                    index,
                    name: state.name.clone(),
                    delta_seconds,
                    inner_keys,
                });
            }
            if !inside && *active {
                *active = false;
                out.push(TimelineEvent::StateEnded {
                    index,
                    name: state.name.clone(),
                    completed: true,
                });
            }
        }
    }
}
