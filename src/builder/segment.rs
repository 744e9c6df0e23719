//! Builder for segment templates.

use crate::machine::{SegmentBehavior, SegmentBehaviorFactory, SequenceAsset};
use std::sync::Arc;

/// Transition as written by the author: target by name, not yet resolved.
#[derive(Debug, Clone)]
pub(crate) struct PendingTransition {
    pub condition: Option<String>,
    pub target: String,
}

impl PendingTransition {
    pub fn new(target: impl Into<String>, condition: Option<String>) -> Self {
        Self {
            condition,
            target: target.into(),
        }
    }
}

/// Fluent builder for one segment of an action type.
///
/// Transitions are evaluated in the order they are added.
pub struct SegmentBuilder {
    pub(crate) name: String,
    pub(crate) sequence: Option<SequenceAsset>,
    pub(crate) tick: Vec<PendingTransition>,
    pub(crate) events: Vec<(String, PendingTransition)>,
    pub(crate) behavior: Option<SegmentBehaviorFactory>,
}

impl SegmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: None,
            tick: Vec::new(),
            events: Vec::new(),
            behavior: None,
        }
    }

    /// Play a sequence while the segment is active.
    pub fn sequence(mut self, sequence: SequenceAsset) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Unconditional tick transition.
    pub fn tick_to(mut self, target: impl Into<String>) -> Self {
        self.tick.push(PendingTransition::new(target, None));
        self
    }

    pub fn tick_to_if(mut self, target: impl Into<String>, condition: impl Into<String>) -> Self {
        self.tick
            .push(PendingTransition::new(target, Some(condition.into())));
        self
    }

    pub fn on_event(mut self, event: impl Into<String>, target: impl Into<String>) -> Self {
        self.events
            .push((event.into(), PendingTransition::new(target, None)));
        self
    }

    pub fn on_event_if(
        mut self,
        event: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        self.events.push((
            event.into(),
            PendingTransition::new(target, Some(condition.into())),
        ));
        self
    }

    /// Hooks for this segment; the factory runs once per instance.
    pub fn behavior<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SegmentBehavior> + Send + Sync + 'static,
    {
        self.behavior = Some(Arc::new(factory));
        self
    }
}
