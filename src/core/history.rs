//! Diagnostic trail of segment transitions.
//!
//! Every instance keeps a bounded trail of the transitions it went through,
//! including the intermediate segments a chase skipped over. The trail is
//! for observability only; no decision ever reads it back.

use super::ids::SegmentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Why a transition happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// Started from a named entry point.
    Entry(String),
    /// A tick transition of the previous segment was eligible.
    Tick,
    /// A named event transition was invoked.
    Event(String),
    /// The instance finished without an outgoing transition.
    Finished,
    /// The instance was aborted.
    Aborted,
    /// The authority applied a client's proposal.
    Authority,
    /// The authority rejected a prediction and the client rolled back.
    Rollback,
    /// The authority cancelled a speculative entry.
    Cancelled,
    /// Applied from replicated state on a remote observer.
    Replicated,
}

/// Record of a single transition of an instance.
///
/// `from` and `to` are `None` when the instance was dormant before or
/// after the transition.
///
/// # Example
///
/// ```rust
/// use actionline::core::{SegmentId, TransitionCause, TransitionRecord};
///
/// let record = TransitionRecord::new(Some(SegmentId(0)), Some(SegmentId(2)), TransitionCause::Tick)
///     .with_skipped(vec![SegmentId(1)]);
/// assert_eq!(record.skipped, vec![SegmentId(1)]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: Option<SegmentId>,
    pub to: Option<SegmentId>,
    /// Segments passed through by a chase without being activated.
    pub skipped: Vec<SegmentId>,
    pub cause: TransitionCause,
    pub timestamp: DateTime<Utc>,
}

impl TransitionRecord {
    pub fn new(from: Option<SegmentId>, to: Option<SegmentId>, cause: TransitionCause) -> Self {
        Self {
            from,
            to,
            skipped: Vec::new(),
            cause,
            timestamp: Utc::now(),
        }
    }

    pub fn with_skipped(mut self, skipped: Vec<SegmentId>) -> Self {
        self.skipped = skipped;
        self
    }
}

/// Bounded, ordered trail of transition records.
///
/// Once `capacity` records are held, recording a new one evicts the oldest.
///
/// # Example
///
/// ```rust
/// use actionline::core::{SegmentId, TransitionCause, TransitionRecord, TransitionTrail};
///
/// let mut trail = TransitionTrail::new(8);
/// trail.record(TransitionRecord::new(None, Some(SegmentId(0)), TransitionCause::Entry("Default".into())));
/// trail.record(TransitionRecord::new(Some(SegmentId(0)), Some(SegmentId(1)), TransitionCause::Tick));
///
/// assert_eq!(trail.get_path(), vec![None, Some(SegmentId(0)), Some(SegmentId(1))]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionTrail {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl Default for TransitionTrail {
    fn default() -> Self {
        Self::new(32)
    }
}

impl TransitionTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Segments visited, oldest first: the `from` of the first retained
    /// record followed by the `to` of every record.
    pub fn get_path(&self) -> Vec<Option<SegmentId>> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.from);
        }
        path.extend(self.records.iter().map(|record| record.to));
        path
    }

    /// Every segment skipped by a chase, in the order they were skipped.
    pub fn skipped_segments(&self) -> Vec<SegmentId> {
        self.records
            .iter()
            .flat_map(|record| record.skipped.iter().copied())
            .collect()
    }

    /// Time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        match (self.records.front(), self.records.back()) {
            (Some(first), Some(last)) => last
                .timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok(),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
