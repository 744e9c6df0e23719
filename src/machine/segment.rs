//! Runtime segments: private per-instance copies of segment templates.

use super::behavior::{NoBehavior, SegmentBehavior, SegmentInfo};
use super::template::{SegmentTemplate, SequenceAsset, TransitionTemplate};
use super::transition::{first_eligible, Transition};
use crate::core::{ActionTypeKey, ConditionRegistry, SegmentId, SourceSegment};
use std::collections::BTreeMap;
use std::fmt;

pub struct Segment {
    pub id: SegmentId,
    pub name: String,
    pub tick_transitions: Vec<Transition>,
    pub event_transitions: BTreeMap<String, Vec<Transition>>,
    pub sequence: Option<SequenceAsset>,
    behavior: Box<dyn SegmentBehavior>,
}

impl Segment {
    /// Duplicate a template, resolving condition names once.
    pub fn instantiate(template: &SegmentTemplate, registry: &ConditionRegistry) -> Self {
        let compile = |transitions: &[TransitionTemplate]| {
            transitions
                .iter()
                .map(|transition| Transition::compile(transition, registry))
                .collect::<Vec<_>>()
        };
        let behavior = template
            .behavior
            .as_ref()
            .map_or_else(|| Box::new(NoBehavior) as Box<dyn SegmentBehavior>, |factory| factory());

        Self {
            id: template.id,
            name: template.name.clone(),
            tick_transitions: compile(&template.tick_transitions),
            event_transitions: template
                .event_transitions
                .iter()
                .map(|(event, transitions)| (event.clone(), compile(transitions)))
                .collect(),
            sequence: template.sequence.clone(),
            behavior,
        }
    }

    pub fn source(&self, time_seconds: Option<f64>) -> SourceSegment<'_> {
        SourceSegment {
            id: self.id,
            name: &self.name,
            time_seconds,
        }
    }

    /// First eligible transition for `event`, evaluated client side.
    pub fn first_eligible_event(
        &self,
        event: &str,
        time_seconds: Option<f64>,
    ) -> Option<&Transition> {
        let source = self.source(time_seconds);
        self.event_transitions
            .get(event)
            .and_then(|transitions| first_eligible(transitions, Some(&source), false))
            .map(|(_, transition)| transition)
    }

    /// Events that currently have at least one eligible transition.
    pub fn eligible_events(&self, time_seconds: Option<f64>) -> Vec<String> {
        self.event_transitions
            .keys()
            .filter(|event| self.first_eligible_event(event, time_seconds).is_some())
            .cloned()
            .collect()
    }

    /// Run a hook with this segment's description.
    pub(crate) fn notify(
        &mut self,
        instance: &ActionTypeKey,
        hook: impl FnOnce(&mut dyn SegmentBehavior, &SegmentInfo<'_>),
    ) {
        let info = SegmentInfo {
            instance,
            id: self.id,
            name: &self.name,
        };
        hook(self.behavior.as_mut(), &info);
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tick_transitions", &self.tick_transitions)
            .field("event_transitions", &self.event_transitions)
            .field("sequence", &self.sequence.is_some())
            .finish_non_exhaustive()
    }
}
