//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use actionline::core::{ActionTypeKey, NetRole, ObjectId, SegmentId};
use actionline::machine::{ActionEvent, ActionHost, InstanceBehavior, SegmentBehavior, SegmentInfo};
use actionline::spawn::{SpawnError, SpawnTemplate, SpawnWorld, Transform};
use actionline::timeline::{FrameRange, FrameRate, TrackData};
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Host with a hand-driven clock.
pub struct TestHost {
    role: NetRole,
    now: Cell<f64>,
    ping: f64,
}

impl TestHost {
    pub fn new(role: NetRole) -> Self {
        Self {
            role,
            now: Cell::new(0.0),
            ping: 0.0,
        }
    }

    pub fn with_ping(mut self, seconds: f64) -> Self {
        self.ping = seconds;
        self
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl ActionHost for TestHost {
    fn role(&self) -> NetRole {
        self.role
    }

    fn now_seconds(&self) -> f64 {
        self.now.get()
    }

    fn ping_seconds(&self) -> f64 {
        self.ping
    }
}

/// World that records every spawn and destroy it is asked for.
#[derive(Debug, Default)]
pub struct TestWorld {
    alive: HashSet<ObjectId>,
    pub spawned: Vec<String>,
    pub destroyed: Vec<ObjectId>,
    pub delayed: Vec<(ObjectId, f32)>,
    names: Vec<(ObjectId, String)>,
}

impl TestWorld {
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Template ids of the objects still alive, sorted.
    pub fn alive_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .names
            .iter()
            .filter(|(object, _)| self.alive.contains(object))
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl SpawnWorld for TestWorld {
    fn spawn(&mut self, template: &SpawnTemplate, _transform: Transform) -> Result<ObjectId, SpawnError> {
        let object = ObjectId::new();
        self.alive.insert(object);
        self.spawned.push(template.id.clone());
        self.names.push((object, template.id.clone()));
        Ok(object)
    }

    fn destroy(&mut self, object: ObjectId) {
        self.alive.remove(&object);
        self.destroyed.push(object);
    }

    fn destroy_after(&mut self, object: ObjectId, delay_secs: f32) {
        self.delayed.push((object, delay_secs));
    }

    fn is_alive(&self, object: ObjectId) -> bool {
        self.alive.contains(&object)
    }
}

/// Ordered log of lifecycle hooks, shared between behaviors and the test.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn segments(&self) -> impl Fn() -> Box<dyn SegmentBehavior> + Send + Sync + 'static {
        let journal = self.clone();
        move || -> Box<dyn SegmentBehavior> { Box::new(Journaling(journal.clone())) }
    }

    pub fn instances(&self) -> impl Fn() -> Box<dyn InstanceBehavior> + Send + Sync + 'static {
        let journal = self.clone();
        move || -> Box<dyn InstanceBehavior> { Box::new(Journaling(journal.clone())) }
    }
}

pub struct Journaling(Journal);

impl SegmentBehavior for Journaling {
    fn on_begin(&mut self, segment: &SegmentInfo<'_>) {
        self.0.push(format!("begin:{}", segment.name));
    }

    fn on_end(&mut self, segment: &SegmentInfo<'_>) {
        self.0.push(format!("end:{}", segment.name));
    }

    fn on_abort(&mut self, segment: &SegmentInfo<'_>) {
        self.0.push(format!("abort:{}", segment.name));
    }

    fn on_transition_failed(&mut self, segment: &SegmentInfo<'_>) {
        self.0.push(format!("failed:{}", segment.name));
    }
}

impl InstanceBehavior for Journaling {
    fn on_activated(&mut self, _instance: &ActionTypeKey, _segment: SegmentId) {
        self.0.push("activated".to_string());
    }

    fn on_deactivated(&mut self, _instance: &ActionTypeKey) {
        self.0.push("deactivated".to_string());
    }

    fn on_aborted(&mut self, _instance: &ActionTypeKey) {
        self.0.push("aborted".to_string());
    }
}

/// Track of `frames` frames at 30 fps starting at frame 0.
pub fn track(frames: i32) -> TrackData {
    TrackData::new(FrameRate::new(30.0), FrameRange::new(0, frames))
}

/// Running count of active segments, starting from `initially_active`, never leaves `0..=1`.
pub fn assert_exclusive(initially_active: i32, events: &[ActionEvent]) {
    let mut active = initially_active;
    for event in events {
        match event {
            ActionEvent::SegmentActivated { .. } => active += 1,
            ActionEvent::SegmentDeactivated { .. } => active -= 1,
            _ => {}
        }
        assert!((0..=1).contains(&active), "segment exclusivity broken by {event:?}");
    }
}
