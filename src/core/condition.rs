//! Transition conditions and the name-to-predicate registry.
//!
//! A condition is a pure predicate over the segment the transition leaves
//! from and a flag telling whether the authority is validating a client's
//! proposal. The same predicate runs on the predicting client and again on
//! the authority, so it must not have side effects visible outside itself.

use super::ids::SegmentId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Read-only view of the segment a transition is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceSegment<'a> {
    pub id: SegmentId,
    pub name: &'a str,
    /// Current timeline position when the segment is playing a sequence.
    pub time_seconds: Option<f64>,
}

type Predicate = dyn Fn(Option<&SourceSegment<'_>>, bool) -> bool + Send + Sync;

/// Pure predicate that decides whether a transition may be taken.
///
/// The source is `None` for entry-point transitions, which start from a
/// dormant instance.
///
/// # Example
///
/// ```rust
/// use actionline::core::{Condition, SegmentId, SourceSegment};
///
/// let client_only = Condition::new(|_source, authority_check| !authority_check);
///
/// let source = SourceSegment { id: SegmentId(0), name: "Windup", time_seconds: None };
/// assert!(client_only.check(Some(&source), false));
/// assert!(!client_only.check(Some(&source), true));
/// ```
#[derive(Clone)]
pub struct Condition {
    predicate: Arc<Predicate>,
}

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(Option<&SourceSegment<'_>>, bool) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate.
    pub fn check(&self, source: Option<&SourceSegment<'_>>, authority_check: bool) -> bool {
        (self.predicate)(source, authority_check)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition")
    }
}

/// Registration table from condition names to predicates.
///
/// Built once and shared by every instance of an action type; transitions
/// look their condition up by name when the instance is constructed.
#[derive(Clone, Debug, Default)]
pub struct ConditionRegistry {
    conditions: HashMap<String, Condition>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(Option<&SourceSegment<'_>>, bool) -> bool + Send + Sync + 'static,
    {
        self.conditions
            .insert(name.into(), Condition::new(predicate));
        self
    }

    /// Consuming variant of [`register`](Self::register) for chained construction.
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&SourceSegment<'_>>, bool) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<Condition> {
        self.conditions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// A transition's condition after name resolution.
#[derive(Clone, Debug)]
pub enum ConditionBinding {
    /// No condition was authored.
    Always,
    /// A named condition; `condition` is `None` when the name is unbound,
    /// which is treated as satisfied.
    Named {
        name: String,
        condition: Option<Condition>,
    },
}

impl ConditionBinding {
    pub fn bind(name: Option<&str>, registry: &ConditionRegistry) -> Self {
        match name {
            None => Self::Always,
            Some(name) => Self::Named {
                name: name.to_string(),
                condition: registry.resolve(name),
            },
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Always => None,
            Self::Named { name, .. } => Some(name),
        }
    }

    pub fn is_satisfied(&self, source: Option<&SourceSegment<'_>>, authority_check: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Named {
                condition: Some(condition),
                ..
            } => condition.check(source, authority_check),
            Self::Named {
                condition: None, ..
            } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn source(name: &str) -> SourceSegment<'_> {
        SourceSegment {
            id: SegmentId(0),
            name,
            time_seconds: Some(0.5),
        }
    }

    #[test]
    fn condition_sees_authority_flag() {
        let condition = Condition::new(|_, authority| authority);
        assert!(condition.check(None, true));
        assert!(!condition.check(None, false));
    }

    #[test]
    fn condition_sees_source_segment() {
        let condition =
            Condition::new(|source, _| source.map_or(false, |s| s.name == "Windup"));
        assert!(condition.check(Some(&source("Windup")), false));
        assert!(!condition.check(Some(&source("Strike")), false));
        assert!(!condition.check(None, false));
    }

    #[test]
    fn condition_is_deterministic() {
        let condition = Condition::new(|source, _| {
            source.and_then(|s| s.time_seconds).unwrap_or(0.0) > 0.25
        });
        let s = source("Windup");
        assert_eq!(condition.check(Some(&s), false), condition.check(Some(&s), false));
    }

    #[test]
    fn registry_resolves_registered_names() {
        let registry = ConditionRegistry::new()
            .with("always", |_, _| true)
            .with("never", |_, _| false);

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("always").unwrap().check(None, false));
        assert!(!registry.resolve("never").unwrap().check(None, false));
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn registered_predicate_can_read_shared_input() {
        let pressed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&pressed);
        let registry = ConditionRegistry::new()
            .with("pressed", move |_, _| flag.load(Ordering::SeqCst));

        let condition = registry.resolve("pressed").unwrap();
        assert!(!condition.check(None, false));
        pressed.store(true, Ordering::SeqCst);
        assert!(condition.check(None, false));
    }

    #[test]
    fn unbound_binding_is_satisfied() {
        let registry = ConditionRegistry::new();
        let binding = ConditionBinding::bind(Some("missing"), &registry);

        assert_eq!(binding.name(), Some("missing"));
        assert!(binding.is_satisfied(None, true));
        assert!(binding.is_satisfied(None, false));
    }

    #[test]
    fn absent_name_binds_to_always() {
        let binding = ConditionBinding::bind(None, &ConditionRegistry::new());
        assert!(matches!(binding, ConditionBinding::Always));
        assert_eq!(binding.name(), None);
    }
}
