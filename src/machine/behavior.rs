//! Lifecycle callbacks for segments and instances.
//!
//! Every hook has an empty default so concrete behaviors only override the
//! ones they care about. Hooks run after the state change they report has
//! been applied; they observe the machine and must not drive it.

use crate::core::{ActionTypeKey, SegmentId};
use crate::timeline::TimelineEvent;

/// Segment the hook is running for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo<'a> {
    pub instance: &'a ActionTypeKey,
    pub id: SegmentId,
    pub name: &'a str,
}

pub trait SegmentBehavior: Send {
    fn on_begin(&mut self, _segment: &SegmentInfo<'_>) {}

    fn on_end(&mut self, _segment: &SegmentInfo<'_>) {}

    /// Non-graceful end. Falls back to [`on_end`](Self::on_end).
    fn on_abort(&mut self, segment: &SegmentInfo<'_>) {
        self.on_end(segment);
    }

    fn on_tick(&mut self, _segment: &SegmentInfo<'_>, _delta_seconds: f32) {}

    /// The authority rejected a transition proposed from this segment.
    fn on_transition_failed(&mut self, _segment: &SegmentInfo<'_>) {}
}

pub trait InstanceBehavior: Send {
    fn on_construct(&mut self, _instance: &ActionTypeKey) {}

    /// The instance left the dormant state by activating `segment`.
    fn on_activated(&mut self, _instance: &ActionTypeKey, _segment: SegmentId) {}

    fn on_deactivated(&mut self, _instance: &ActionTypeKey) {}

    fn on_aborted(&mut self, instance: &ActionTypeKey) {
        self.on_deactivated(instance);
    }

    fn on_destruct(&mut self, _instance: &ActionTypeKey) {}

    fn on_tick(&mut self, _instance: &ActionTypeKey, _delta_seconds: f32) {}

    fn on_timeline_event(&mut self, _instance: &ActionTypeKey, _event: &TimelineEvent) {}
}

/// Behavior used when a template does not supply one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBehavior;

impl SegmentBehavior for NoBehavior {}

impl InstanceBehavior for NoBehavior {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        ends: usize,
        deactivations: usize,
    }

    impl SegmentBehavior for Counting {
        fn on_end(&mut self, _segment: &SegmentInfo<'_>) {
            self.ends += 1;
        }
    }

    impl InstanceBehavior for Counting {
        fn on_deactivated(&mut self, _instance: &ActionTypeKey) {
            self.deactivations += 1;
        }
    }

    #[test]
    fn abort_hooks_fall_back_to_graceful_ones() {
        let key = ActionTypeKey::new("Attack");
        let info = SegmentInfo {
            instance: &key,
            id: SegmentId(0),
            name: "Windup",
        };
        let mut behavior = Counting::default();

        SegmentBehavior::on_abort(&mut behavior, &info);
        InstanceBehavior::on_aborted(&mut behavior, &key);

        assert_eq!(behavior.ends, 1);
        assert_eq!(behavior.deactivations, 1);
    }
}
