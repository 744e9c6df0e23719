//! Spawn bookkeeping for sequences and instances.
//!
//! A [`SpawnRegistry`] lives inside each sequence player and tracks the
//! objects its spawn tracks created. Objects that outlive the sequence
//! (reference-mode spawns with Instance or External ownership) are also
//! bound to the instance in [`InstanceSpawns`], which is how a later
//! segment finds and reuses them.

use super::settings::{SpawnOwnership, SpawnSettings, TeardownCause};
use super::world::{SpawnWorld, Transform};
use crate::core::ObjectId;
use crate::timeline::SpawnTrack;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace, warn};

/// Spawned objects bound to one instance rather than to a sequence.
#[derive(Debug, Clone, Default)]
pub struct InstanceSpawns {
    references: HashMap<String, ObjectId>,
    instance_managed: Vec<(ObjectId, SpawnSettings)>,
}

impl InstanceSpawns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object bound under `template_id`, if any.
    pub fn reference(&self, template_id: &str) -> Option<ObjectId> {
        self.references.get(template_id).copied()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Objects destroyed when the instance deactivates.
    pub fn instance_managed(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.instance_managed.iter().map(|(object, _)| *object)
    }

    fn bind(&mut self, template_id: &str, object: ObjectId, settings: SpawnSettings) {
        self.references.insert(template_id.to_string(), object);
        if settings.ownership == SpawnOwnership::Instance {
            self.instance_managed.push((object, settings));
        }
    }

    fn forget(&mut self, object: ObjectId) {
        self.references.retain(|_, bound| *bound != object);
        self.instance_managed.retain(|(managed, _)| *managed != object);
    }

    /// Destroy the instance-scoped objects at the end of an activation.
    ///
    /// On abort, objects flagged to survive aborts are released from the
    /// instance instead of destroyed. Returns how many were destroyed.
    pub fn release(&mut self, aborted: bool, world: &mut dyn SpawnWorld) -> usize {
        let mut destroyed = 0;
        for (object, settings) in std::mem::take(&mut self.instance_managed) {
            self.references.retain(|_, bound| *bound != object);
            if aborted && !settings.destroy_when_aborted {
                trace!(%object, "instance object survives abort");
                continue;
            }
            if world.is_alive(object) {
                world.destroy(object);
                destroyed += 1;
            }
        }
        destroyed
    }
}

/// What a registry evaluation may touch.
pub struct SpawnScope<'a> {
    pub world: &'a mut dyn SpawnWorld,
    pub spawns: &'a mut InstanceSpawns,
    /// Action-space origin of the owning instance.
    pub origin: Transform,
    pub authority: bool,
}

#[derive(Debug, Clone)]
struct LiveSpawn {
    object: ObjectId,
    settings: SpawnSettings,
    replicated: bool,
}

/// Objects currently spawned by one sequence, keyed by spawn track index.
#[derive(Debug, Clone, Default)]
pub struct SpawnRegistry {
    live: BTreeMap<usize, LiveSpawn>,
    failed: BTreeSet<usize>,
}

impl SpawnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_object(&self, track_index: usize) -> Option<ObjectId> {
        self.live.get(&track_index).map(|live| live.object)
    }

    /// Bring track `index` in line with its desired state.
    ///
    /// Returns the live object for the track after evaluation.
    pub fn evaluate(
        &mut self,
        index: usize,
        track: &SpawnTrack,
        desired: bool,
        scope: &mut SpawnScope<'_>,
    ) -> Option<ObjectId> {
        if desired {
            return self.ensure_spawned(index, track, scope);
        }
        if let Some(live) = self.live.remove(&index) {
            Self::release(live, TeardownCause::Evaluation, scope);
        }
        None
    }

    fn ensure_spawned(
        &mut self,
        index: usize,
        track: &SpawnTrack,
        scope: &mut SpawnScope<'_>,
    ) -> Option<ObjectId> {
        if let Some(live) = self.live.get(&index) {
            if scope.world.is_alive(live.object) {
                return Some(live.object);
            }
            self.live.remove(&index);
        }
        if self.failed.contains(&index) {
            return None;
        }

        let template = &track.template;
        if template.replicated && !scope.authority {
            return None;
        }

        if track.settings.as_reference {
            if let Some(bound) = scope.spawns.reference(&template.id) {
                if scope.world.is_alive(bound) {
                    debug!(template = %template.id, object = %bound, "reusing bound object");
                    self.track_live(index, bound, track);
                    return Some(bound);
                }
                scope.spawns.forget(bound);
            }
        }

        let transform = scope.origin.compose(&template.relative);
        match scope.world.spawn(template, transform) {
            Ok(object) => {
                trace!(template = %template.id, %object, "spawned");
                if track.settings.as_reference {
                    scope.spawns.bind(&template.id, object, track.settings);
                }
                self.track_live(index, object, track);
                Some(object)
            }
            Err(error) => {
                warn!(template = %template.id, %error, "spawn failed, track inactive for this activation");
                self.failed.insert(index);
                None
            }
        }
    }

    fn track_live(&mut self, index: usize, object: ObjectId, track: &SpawnTrack) {
        self.live.insert(
            index,
            LiveSpawn {
                object,
                settings: track.settings,
                replicated: track.template.replicated,
            },
        );
    }

    /// Release every live object because the sequence is going away.
    ///
    /// Returns how many objects were destroyed or scheduled for destruction.
    pub fn teardown(&mut self, cause: TeardownCause, scope: &mut SpawnScope<'_>) -> usize {
        self.failed.clear();
        std::mem::take(&mut self.live)
            .into_values()
            .map(|live| Self::release(live, cause, scope))
            .filter(|destroyed| *destroyed)
            .count()
    }

    fn release(live: LiveSpawn, cause: TeardownCause, scope: &mut SpawnScope<'_>) -> bool {
        if live.replicated && !scope.authority {
            return false;
        }
        if live.settings.as_reference {
            let keep = match cause {
                TeardownCause::Aborted => !live.settings.destroy_when_aborted,
                TeardownCause::Transition | TeardownCause::Finished => {
                    live.settings.ownership != SpawnOwnership::Sequence
                }
                TeardownCause::Evaluation => false,
            };
            if keep {
                trace!(object = %live.object, ?cause, "keeping reference object");
                return false;
            }
            scope.spawns.forget(live.object);
        }

        if live.settings.destroy_delay_secs > 0.0 {
            scope
                .world
                .destroy_after(live.object, live.settings.destroy_delay_secs);
        } else {
            scope.world.destroy(live.object);
        }
        true
    }
}
