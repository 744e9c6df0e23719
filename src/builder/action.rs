//! Builder for compiled action types.

use crate::builder::error::BuildError;
use crate::builder::segment::{PendingTransition, SegmentBuilder};
use crate::core::{ActionTypeKey, ConditionRegistry, SegmentId, SourceSegment};
use crate::machine::{
    ActionType, InstanceBehavior, InstanceBehaviorFactory, SegmentTemplate, TransitionTemplate,
};
use crate::validation::{AuthoringRules, ValidationPolicy};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use stillwater::validation::Validation;
use tracing::warn;

/// Builder for action types with a fluent API.
///
/// Segments and transitions refer to each other by name; names are
/// resolved to [`SegmentId`]s when the type is built. Segment ids follow
/// the order segments are added in.
///
/// # Example
///
/// ```rust
/// use actionline::builder::{ActionTypeBuilder, SegmentBuilder};
/// use actionline::conditions;
///
/// let combo = ActionTypeBuilder::new("Combo")
///     .conditions(conditions! {
///         "HasStamina" => |_source, _authority| true,
///     })
///     .segment(SegmentBuilder::new("First").on_event_if("Attack", "Second", "HasStamina"))
///     .segment(SegmentBuilder::new("Second"))
///     .entry("Default", "First")
///     .build()
///     .unwrap();
///
/// assert_eq!(combo.segments().len(), 2);
/// assert!(combo.segment_by_name("Second").is_some());
/// ```
pub struct ActionTypeBuilder {
    key: ActionTypeKey,
    segments: Vec<SegmentBuilder>,
    entries: Vec<(String, PendingTransition)>,
    conditions: ConditionRegistry,
    shared_timeline: bool,
    sub_step_secs: Option<f32>,
    instance_behavior: Option<InstanceBehaviorFactory>,
    rules: AuthoringRules,
}

impl ActionTypeBuilder {
    pub fn new(key: impl Into<ActionTypeKey>) -> Self {
        Self {
            key: key.into(),
            segments: Vec::new(),
            entries: Vec::new(),
            conditions: ConditionRegistry::new(),
            shared_timeline: false,
            sub_step_secs: None,
            instance_behavior: None,
            rules: AuthoringRules::standard(),
        }
    }

    pub fn segment(mut self, segment: SegmentBuilder) -> Self {
        self.segments.push(segment);
        self
    }

    /// Unconditional transition into `target` through the named entry point.
    pub fn entry(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.entries
            .push((name.into(), PendingTransition::new(target, None)));
        self
    }

    pub fn entry_if(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        self.entries.push((
            name.into(),
            PendingTransition::new(target, Some(condition.into())),
        ));
        self
    }

    /// Replace the condition table.
    pub fn conditions(mut self, registry: ConditionRegistry) -> Self {
        self.conditions = registry;
        self
    }

    /// Register a single condition.
    pub fn condition<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&SourceSegment<'_>>, bool) -> bool + Send + Sync + 'static,
    {
        self.conditions.register(name, predicate);
        self
    }

    /// Play sequences on the component's shared timeline.
    pub fn shared_timeline(mut self) -> Self {
        self.shared_timeline = true;
        self
    }

    /// Sub-step duration used while sub-step mode is pushed.
    pub fn sub_step(mut self, seconds: f32) -> Self {
        self.sub_step_secs = Some(seconds);
        self
    }

    pub fn instance_behavior<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn InstanceBehavior> + Send + Sync + 'static,
    {
        self.instance_behavior = Some(Arc::new(factory));
        self
    }

    /// Authoring checks run by [`build`](Self::build).
    pub fn rules(mut self, rules: AuthoringRules) -> Self {
        self.rules = rules;
        self
    }

    /// Resolve names, compile the action type and run the authoring checks.
    pub fn build(self) -> Result<ActionType, BuildError> {
        let Self {
            key,
            segments,
            entries,
            conditions,
            shared_timeline,
            sub_step_secs,
            instance_behavior,
            rules,
        } = self;

        if segments.is_empty() {
            return Err(BuildError::MissingSegments(key));
        }
        if entries.is_empty() {
            return Err(BuildError::MissingEntryPoints(key));
        }

        let mut ids = HashMap::new();
        for (index, segment) in segments.iter().enumerate() {
            let id = u16::try_from(index).map_err(|_| BuildError::TooManySegments(segments.len()))?;
            if ids.insert(segment.name.clone(), SegmentId(id)).is_some() {
                return Err(BuildError::DuplicateSegment(segment.name.clone()));
            }
        }
        let resolve = |from: &str, pending: PendingTransition| match ids.get(&pending.target) {
            Some(&target) => Ok(TransitionTemplate {
                condition: pending.condition,
                target,
            }),
            None => Err(BuildError::UnknownTarget {
                from: from.to_string(),
                target: pending.target,
            }),
        };

        let mut entry_table: BTreeMap<String, Vec<TransitionTemplate>> = BTreeMap::new();
        for (name, pending) in entries {
            let transition = resolve(&format!("entry {name}"), pending)?;
            entry_table.entry(name).or_default().push(transition);
        }

        let mut templates = Vec::with_capacity(segments.len());
        for segment in segments {
            let id = ids[&segment.name];
            let tick_transitions = segment
                .tick
                .into_iter()
                .map(|pending| resolve(&segment.name, pending))
                .collect::<Result<Vec<_>, _>>()?;
            let mut event_transitions: BTreeMap<String, Vec<TransitionTemplate>> = BTreeMap::new();
            for (event, pending) in segment.events {
                let transition = resolve(&segment.name, pending)?;
                event_transitions.entry(event).or_default().push(transition);
            }
            templates.push(SegmentTemplate {
                id,
                name: segment.name,
                tick_transitions,
                event_transitions,
                sequence: segment.sequence,
                behavior: segment.behavior,
            });
        }

        let action = ActionType {
            key,
            segments: templates,
            entries: entry_table,
            uses_shared_timeline: shared_timeline,
            sub_step_secs,
            conditions,
            instance_behavior,
        };

        for (source, transition) in action.transitions() {
            if let Some(condition) = &transition.condition {
                if !action.conditions.contains(condition) {
                    warn!(
                        action = %action.key,
                        from = source.map_or("entry", |segment| segment.name.as_str()),
                        condition = %condition,
                        "unbound condition treated as satisfied"
                    );
                }
            }
        }

        match rules.enforce(&action) {
            Validation::Success(_) => Ok(action),
            Validation::Failure(errors) => match rules.policy() {
                ValidationPolicy::Reject => Err(BuildError::Authoring(errors.iter().cloned().collect())),
                ValidationPolicy::WarnAndAccept => {
                    for error in errors.iter() {
                        warn!(action = %action.key, problem = %error, "authoring problem");
                    }
                    Ok(action)
                }
            },
        }
    }
}
