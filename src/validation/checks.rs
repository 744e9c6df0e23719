//! Built-in authoring checks.
//!
//! Each check reports every offending segment or transition, not just the
//! first one.

use crate::core::SegmentId;
use crate::machine::ActionType;
use crate::validation::violations::AuthoringError;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type CheckResult = Validation<(), NonEmptyVec<AuthoringError>>;

fn ensure(ok: bool, problem: impl FnOnce() -> AuthoringError) -> CheckResult {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(problem())
    }
}

fn all(checks: Vec<CheckResult>) -> CheckResult {
    Validation::all_vec(checks).map(|_| ())
}

/// Every named condition has a predicate in the registry.
pub fn bound_conditions(action: &ActionType) -> CheckResult {
    all(action
        .transitions()
        .filter_map(|(source, transition)| {
            let condition = transition.condition.as_ref()?;
            Some(ensure(action.conditions().contains(condition), || {
                AuthoringError::UnboundCondition {
                    segment: source.map(|segment| segment.name.clone()),
                    condition: condition.clone(),
                }
            }))
        })
        .collect())
}

/// Segments that some chain of transitions from an entry point reaches.
fn reachable(action: &ActionType) -> HashSet<SegmentId> {
    let mut seen: HashSet<SegmentId> = HashSet::new();
    let mut pending: Vec<SegmentId> = action
        .entries()
        .values()
        .flatten()
        .map(|transition| transition.target)
        .collect();

    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(segment) = action.segment(id) {
            pending.extend(
                segment
                    .tick_transitions
                    .iter()
                    .chain(segment.event_transitions.values().flatten())
                    .map(|transition| transition.target),
            );
        }
    }
    seen
}

pub fn reachable_segments(action: &ActionType) -> CheckResult {
    let reachable = reachable(action);
    all(action
        .segments()
        .iter()
        .map(|segment| {
            ensure(reachable.contains(&segment.id), || AuthoringError::UnreachableSegment {
                segment: segment.name.clone(),
            })
        })
        .collect())
}

/// An unconditional tick transition to the same segment would re-enter it
/// every frame.
pub fn no_unconditional_self_loops(action: &ActionType) -> CheckResult {
    all(action
        .segments()
        .iter()
        .map(|segment| {
            let loops = segment
                .tick_transitions
                .iter()
                .any(|transition| transition.condition.is_none() && transition.target == segment.id);
            ensure(!loops, || AuthoringError::UnconditionalSelfLoop {
                segment: segment.name.clone(),
            })
        })
        .collect())
}

pub fn non_empty_sequences(action: &ActionType) -> CheckResult {
    all(action
        .segments()
        .iter()
        .filter_map(|segment| {
            let sequence = segment.sequence.as_ref()?;
            Some(ensure(!sequence.track.range.is_empty(), || {
                AuthoringError::EmptySequence {
                    segment: segment.name.clone(),
                }
            }))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ActionTypeBuilder, SegmentBuilder};
    use crate::validation::AuthoringRules;

    fn lenient(builder: ActionTypeBuilder) -> ActionType {
        builder.rules(AuthoringRules::new()).build().unwrap()
    }

    #[test]
    fn unbound_conditions_are_all_reported() {
        let action = lenient(
            ActionTypeBuilder::new("Guarded")
                .condition("Known", |_, _| true)
                .segment(
                    SegmentBuilder::new("Idle")
                        .tick_to_if("Idle", "Known")
                        .on_event_if("Go", "Idle", "MissingA"),
                )
                .entry_if("Default", "Idle", "MissingB"),
        );

        let Validation::Failure(errors) = bound_conditions(&action) else {
            panic!("expected unbound conditions");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(
            e,
            AuthoringError::UnboundCondition { segment: None, condition } if condition == "MissingB"
        )));
    }

    #[test]
    fn event_transitions_make_segments_reachable() {
        let action = lenient(
            ActionTypeBuilder::new("Chain")
                .segment(SegmentBuilder::new("A").on_event("Next", "B"))
                .segment(SegmentBuilder::new("B").tick_to("C"))
                .segment(SegmentBuilder::new("C"))
                .segment(SegmentBuilder::new("D"))
                .entry("Default", "A"),
        );

        let Validation::Failure(errors) = reachable_segments(&action) else {
            panic!("expected D to be unreachable");
        };
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn conditional_self_loop_is_allowed() {
        let action = lenient(
            ActionTypeBuilder::new("Spin")
                .condition("Again", |_, _| false)
                .segment(SegmentBuilder::new("Turn").tick_to_if("Turn", "Again"))
                .entry("Default", "Turn"),
        );

        assert!(no_unconditional_self_loops(&action).is_success());
    }
}
