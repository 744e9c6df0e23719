//! Compiled action types: the opaque input instances are duplicated from.

use super::behavior::{InstanceBehavior, SegmentBehavior};
use crate::core::{ActionTypeKey, ConditionRegistry, SegmentId};
use crate::timeline::{EndAction, TrackData};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Produces a fresh segment behavior for every instance.
pub type SegmentBehaviorFactory = Arc<dyn Fn() -> Box<dyn SegmentBehavior> + Send + Sync>;

/// Produces a fresh instance behavior for every instance.
pub type InstanceBehaviorFactory = Arc<dyn Fn() -> Box<dyn InstanceBehavior> + Send + Sync>;

/// Transition as authored: a condition name and a resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTemplate {
    pub condition: Option<String>,
    pub target: SegmentId,
}

/// Sequence a segment plays while active.
#[derive(Debug, Clone)]
pub struct SequenceAsset {
    pub track: Arc<TrackData>,
    pub rate: f64,
    pub end_action: EndAction,
}

impl SequenceAsset {
    pub fn new(track: impl Into<Arc<TrackData>>, end_action: EndAction) -> Self {
        Self {
            track: track.into(),
            rate: 1.0,
            end_action,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }
}

pub struct SegmentTemplate {
    pub id: SegmentId,
    pub name: String,
    pub tick_transitions: Vec<TransitionTemplate>,
    pub event_transitions: BTreeMap<String, Vec<TransitionTemplate>>,
    pub sequence: Option<SequenceAsset>,
    pub(crate) behavior: Option<SegmentBehaviorFactory>,
}

impl fmt::Debug for SegmentTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentTemplate")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tick_transitions", &self.tick_transitions)
            .field("event_transitions", &self.event_transitions)
            .field("sequence", &self.sequence)
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}

/// Everything needed to construct instances of one action type.
///
/// Built with [`ActionTypeBuilder`](crate::builder::ActionTypeBuilder) and
/// shared between instances through an [`ActionCatalog`].
pub struct ActionType {
    pub(crate) key: ActionTypeKey,
    pub(crate) segments: Vec<SegmentTemplate>,
    pub(crate) entries: BTreeMap<String, Vec<TransitionTemplate>>,
    pub(crate) uses_shared_timeline: bool,
    pub(crate) sub_step_secs: Option<f32>,
    pub(crate) conditions: ConditionRegistry,
    pub(crate) instance_behavior: Option<InstanceBehaviorFactory>,
}

impl ActionType {
    pub fn key(&self) -> &ActionTypeKey {
        &self.key
    }

    pub fn segments(&self) -> &[SegmentTemplate] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&SegmentTemplate> {
        self.segments.get(id.index())
    }

    pub fn segment_by_name(&self, name: &str) -> Option<&SegmentTemplate> {
        self.segments.iter().find(|segment| segment.name == name)
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<TransitionTemplate>> {
        &self.entries
    }

    pub fn uses_shared_timeline(&self) -> bool {
        self.uses_shared_timeline
    }

    pub fn sub_step_secs(&self) -> Option<f32> {
        self.sub_step_secs
    }

    pub fn conditions(&self) -> &ConditionRegistry {
        &self.conditions
    }

    /// Every authored transition with the segment it leaves from.
    ///
    /// Entry transitions report `None` as their source.
    pub fn transitions(&self) -> impl Iterator<Item = (Option<&SegmentTemplate>, &TransitionTemplate)> {
        let entries = self
            .entries
            .values()
            .flatten()
            .map(|transition| (None, transition));
        let segments = self.segments.iter().flat_map(|segment| {
            segment
                .tick_transitions
                .iter()
                .chain(segment.event_transitions.values().flatten())
                .map(move |transition| (Some(segment), transition))
        });
        entries.chain(segments)
    }
}

impl fmt::Debug for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionType")
            .field("key", &self.key)
            .field("segments", &self.segments)
            .field("entries", &self.entries)
            .field("uses_shared_timeline", &self.uses_shared_timeline)
            .field("sub_step_secs", &self.sub_step_secs)
            .finish_non_exhaustive()
    }
}

/// Action types available to a component, plus the ones it starts with.
#[derive(Debug, Default)]
pub struct ActionCatalog {
    types: BTreeMap<ActionTypeKey, Arc<ActionType>>,
    defaults: Vec<ActionTypeKey>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action type, replacing any previous one with its key.
    pub fn with(mut self, action: ActionType) -> Self {
        self.types.insert(action.key.clone(), Arc::new(action));
        self
    }

    /// Register an action type the authority adds on start-up.
    pub fn with_default(mut self, action: ActionType) -> Self {
        if !self.defaults.contains(&action.key) {
            self.defaults.push(action.key.clone());
        }
        self.with(action)
    }

    pub fn get(&self, key: &ActionTypeKey) -> Option<Arc<ActionType>> {
        self.types.get(key).cloned()
    }

    pub fn contains(&self, key: &ActionTypeKey) -> bool {
        self.types.contains_key(key)
    }

    pub fn defaults(&self) -> &[ActionTypeKey] {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
