//! Macros for ergonomic condition registration.

/// Build a [`ConditionRegistry`](crate::core::ConditionRegistry) from
/// `name => predicate` pairs.
///
/// # Example
///
/// ```
/// use actionline::conditions;
///
/// let registry = conditions! {
///     "Late" => |source, _authority| {
///         source.and_then(|s| s.time_seconds).unwrap_or(0.0) > 0.5
///     },
///     "ClientOnly" => |_source, authority| !authority,
/// };
///
/// assert!(registry.contains("Late"));
/// assert_eq!(registry.len(), 2);
/// ```
#[macro_export]
macro_rules! conditions {
    ($($name:literal => $predicate:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut registry = $crate::core::ConditionRegistry::new();
        $(
            registry.register($name, $predicate);
        )*
        registry
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::{SegmentId, SourceSegment};

    #[test]
    fn conditions_macro_registers_every_predicate() {
        let registry = conditions! {
            "Always" => |_source, _authority| true,
            "AuthorityOnly" => |_source, authority| authority,
        };

        let source = SourceSegment {
            id: SegmentId(0),
            name: "Idle",
            time_seconds: None,
        };
        let authority_only = registry.resolve("AuthorityOnly").unwrap();
        assert!(authority_only.check(Some(&source), true));
        assert!(!authority_only.check(Some(&source), false));
        assert!(registry.contains("Always"));
    }

    #[test]
    fn empty_conditions_macro_builds_empty_registry() {
        let registry = conditions! {};
        assert!(registry.is_empty());
    }
}
