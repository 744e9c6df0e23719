//! Runtime transitions and the tick-transition chase.

use super::segment::Segment;
use super::template::TransitionTemplate;
use crate::core::{ConditionBinding, ConditionRegistry, SegmentId, SourceSegment};
use std::collections::HashSet;
use tracing::warn;

/// A transition with its condition resolved against the registry.
#[derive(Debug, Clone)]
pub struct Transition {
    pub binding: ConditionBinding,
    pub target: SegmentId,
}

impl Transition {
    pub fn compile(template: &TransitionTemplate, registry: &ConditionRegistry) -> Self {
        Self {
            binding: ConditionBinding::bind(template.condition.as_deref(), registry),
            target: template.target,
        }
    }

    pub fn is_eligible(&self, source: Option<&SourceSegment<'_>>, authority_check: bool) -> bool {
        self.binding.is_satisfied(source, authority_check)
    }

    pub fn condition_name(&self) -> Option<&str> {
        self.binding.name()
    }
}

/// First eligible transition in declaration order, with its index.
pub fn first_eligible<'t>(
    transitions: &'t [Transition],
    source: Option<&SourceSegment<'_>>,
    authority_check: bool,
) -> Option<(usize, &'t Transition)> {
    transitions
        .iter()
        .enumerate()
        .find(|(_, transition)| transition.is_eligible(source, authority_check))
}

/// Outcome of following tick transitions from a freshly chosen target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chase {
    /// Segment that is actually activated.
    pub target: SegmentId,
    /// Segments passed through without activation, in order.
    pub skipped: Vec<SegmentId>,
    pub cycle: bool,
}

/// Follow eligible tick transitions from `start` until none is eligible.
///
/// `taken` holds the (segment, tick index) pairs already used in this
/// chase; a transition is never taken twice. When the next eligible
/// transition has already been taken the chase stops on the segment it
/// reached. Intermediate segments are evaluated without a timeline.
pub fn chase(segments: &[Segment], start: SegmentId, mut taken: HashSet<(SegmentId, usize)>) -> Chase {
    let mut current = start;
    let mut skipped = Vec::new();
    let mut cycle = false;

    while let Some(segment) = segments.get(current.index()) {
        let source = segment.source(None);
        let Some((index, next)) = first_eligible(&segment.tick_transitions, Some(&source), false) else {
            break;
        };
        if !taken.insert((current, index)) {
            warn!(segment = %segment.name, "tick transition cycle detected, stopping chase");
            cycle = true;
            break;
        }
        skipped.push(current);
        current = next.target;
    }

    Chase {
        target: current,
        skipped,
        cycle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::template::SegmentTemplate;
    use std::collections::BTreeMap;

    fn segment(id: u16, name: &str, tick: &[(Option<&str>, u16)]) -> SegmentTemplate {
        SegmentTemplate {
            id: SegmentId(id),
            name: name.to_string(),
            tick_transitions: tick
                .iter()
                .map(|(condition, target)| TransitionTemplate {
                    condition: condition.map(str::to_string),
                    target: SegmentId(*target),
                })
                .collect(),
            event_transitions: BTreeMap::new(),
            sequence: None,
            behavior: None,
        }
    }

    fn compile(templates: &[SegmentTemplate], registry: &ConditionRegistry) -> Vec<Segment> {
        templates
            .iter()
            .map(|template| Segment::instantiate(template, registry))
            .collect()
    }

    #[test]
    fn unbound_condition_counts_as_satisfied() {
        let registry = ConditionRegistry::new();
        let transition = Transition::compile(
            &TransitionTemplate {
                condition: Some("Missing".to_string()),
                target: SegmentId(1),
            },
            &registry,
        );
        assert!(transition.is_eligible(None, true));
        assert_eq!(transition.condition_name(), Some("Missing"));
    }

    #[test]
    fn first_eligible_respects_declaration_order() {
        let registry = ConditionRegistry::new()
            .with("Never", |_, _| false)
            .with("Always", |_, _| true);
        let transitions: Vec<_> = [("Never", 1), ("Always", 2), ("Always", 3)]
            .iter()
            .map(|(condition, target)| {
                Transition::compile(
                    &TransitionTemplate {
                        condition: Some(condition.to_string()),
                        target: SegmentId(*target),
                    },
                    &registry,
                )
            })
            .collect();

        let (index, transition) = first_eligible(&transitions, None, false).unwrap();
        assert_eq!(index, 1);
        assert_eq!(transition.target, SegmentId(2));
    }

    #[test]
    fn chase_skips_intermediate_segments() {
        let registry = ConditionRegistry::new();
        let segments = compile(
            &[
                segment(0, "S1", &[(None, 1)]),
                segment(1, "S2", &[(None, 2)]),
                segment(2, "S3", &[]),
            ],
            &registry,
        );

        let result = chase(&segments, SegmentId(1), HashSet::from([(SegmentId(0), 0)]));

        assert_eq!(result.target, SegmentId(2));
        assert_eq!(result.skipped, vec![SegmentId(1)]);
        assert!(!result.cycle);
    }

    #[test]
    fn chase_stops_on_cycle() {
        let registry = ConditionRegistry::new();
        let segments = compile(
            &[segment(0, "A", &[(None, 1)]), segment(1, "B", &[(None, 0)])],
            &registry,
        );

        let result = chase(&segments, SegmentId(1), HashSet::from([(SegmentId(0), 0)]));

        assert!(result.cycle);
        assert_eq!(result.target, SegmentId(0));
        assert_eq!(result.skipped, vec![SegmentId(1)]);
    }

    #[test]
    fn chase_evaluates_client_side() {
        let registry = ConditionRegistry::new().with("ClientOnly", |_, authority| !authority);
        let segments = compile(
            &[segment(0, "A", &[(Some("ClientOnly"), 1)]), segment(1, "B", &[])],
            &registry,
        );

        let result = chase(&segments, SegmentId(0), HashSet::new());
        assert_eq!(result.target, SegmentId(1));
    }
}
