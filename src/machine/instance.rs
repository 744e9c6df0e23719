//! Action instances: at most one active segment plus reconciliation state.
//!
//! An instance runs on every machine that simulates the entity. What it
//! does with a decision depends on the role the host reports:
//!
//! - the locally controlled side evaluates tick and event transitions and
//!   takes them immediately;
//! - a predicting client additionally proposes each decision to the
//!   authority and applies the authority's corrections;
//! - the authority validates proposals and publishes its truth;
//! - observers only mirror replicated state.
//!
//! Corrections from the authority are matched against the latest proposal
//! through `seq`/`ack` numbers; see [`crate::net::message`].

use super::behavior::{InstanceBehavior, NoBehavior};
use super::error::MachineError;
use super::event::ActionEvent;
use super::host::{ActionContext, ActionHost};
use super::segment::Segment;
use super::template::ActionType;
use super::transition::{chase, first_eligible, Chase, Transition};
use super::FINISHED_EVENT;
use crate::config::ActionConfig;
use crate::core::{ActionTypeKey, SegmentId, TransitionCause, TransitionRecord, TransitionTrail};
use crate::net::{ActionMessage, Recipient};
use crate::spawn::{InstanceSpawns, SpawnScope, SpawnWorld, TeardownCause};
use crate::timeline::{NetSyncProps, PlaybackStatus, PlayerBinding, SequencePlayer, TimelineEvent};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// How an active segment is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndKind {
    Finish,
    Transition,
    Abort,
}

impl EndKind {
    fn teardown(self) -> TeardownCause {
        match self {
            Self::Finish => TeardownCause::Finished,
            Self::Transition => TeardownCause::Transition,
            Self::Abort => TeardownCause::Aborted,
        }
    }

    fn is_abort(self) -> bool {
        self == Self::Abort
    }
}

fn timeline<'p>(
    own: &'p mut Option<SequencePlayer>,
    shared: &'p mut SequencePlayer,
) -> &'p mut SequencePlayer {
    match own {
        Some(player) => player,
        None => shared,
    }
}

fn timeline_ref<'p>(own: &'p Option<SequencePlayer>, shared: &'p SequencePlayer) -> &'p SequencePlayer {
    own.as_ref().unwrap_or(shared)
}

fn spawn_scope<'s>(
    world: &'s mut dyn SpawnWorld,
    spawns: &'s mut InstanceSpawns,
    host: &dyn ActionHost,
) -> SpawnScope<'s> {
    SpawnScope {
        world,
        spawns,
        origin: host.origin(),
        authority: host.role().has_authority(),
    }
}

pub struct ActionInstance {
    key: ActionTypeKey,
    action: Arc<ActionType>,
    segments: Vec<Segment>,
    entries: BTreeMap<String, Vec<Transition>>,
    active: Option<SegmentId>,
    /// Private timeline; `None` when the type plays on the component's
    /// shared timeline.
    player: Option<SequencePlayer>,
    spawns: InstanceSpawns,
    last_rollback: Option<f64>,
    sub_step_depth: u32,
    sub_step_secs: f32,
    /// Latest request sent to the authority.
    proposal_seq: u32,
    /// Latest client request processed as the authority.
    processed_seq: u32,
    trail: TransitionTrail,
    behavior: Box<dyn InstanceBehavior>,
    transient: bool,
    pending_finish: bool,
}

impl ActionInstance {
    pub(crate) fn new(action: Arc<ActionType>, config: &ActionConfig, transient: bool) -> Self {
        let registry = action.conditions();
        let segments = action
            .segments()
            .iter()
            .map(|template| Segment::instantiate(template, registry))
            .collect();
        let entries = action
            .entries()
            .iter()
            .map(|(name, transitions)| {
                let compiled = transitions
                    .iter()
                    .map(|transition| Transition::compile(transition, registry))
                    .collect();
                (name.clone(), compiled)
            })
            .collect();
        let behavior = action
            .instance_behavior
            .as_ref()
            .map_or_else(|| Box::new(NoBehavior) as Box<dyn InstanceBehavior>, |factory| factory());

        Self {
            key: action.key().clone(),
            segments,
            entries,
            active: None,
            player: (!action.uses_shared_timeline()).then(SequencePlayer::new),
            spawns: InstanceSpawns::new(),
            last_rollback: None,
            sub_step_depth: 0,
            sub_step_secs: action.sub_step_secs().unwrap_or(config.sub_step_secs),
            proposal_seq: 0,
            processed_seq: 0,
            trail: TransitionTrail::new(config.trail_capacity),
            behavior,
            transient,
            pending_finish: false,
            action,
        }
    }

    pub fn key(&self) -> &ActionTypeKey {
        &self.key
    }

    pub fn action(&self) -> &ActionType {
        &self.action
    }

    pub fn active_segment(&self) -> Option<SegmentId> {
        self.active
    }

    pub fn active_segment_name(&self) -> Option<&str> {
        self.active
            .and_then(|id| self.segments.get(id.index()))
            .map(|segment| segment.name.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Created by `play_action` and removed once it goes dormant.
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_id(&self, name: &str) -> Option<SegmentId> {
        self.segments
            .iter()
            .find(|segment| segment.name == name)
            .map(|segment| segment.id)
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn trail(&self) -> &TransitionTrail {
        &self.trail
    }

    pub fn spawns(&self) -> &InstanceSpawns {
        &self.spawns
    }

    pub fn own_timeline(&self) -> Option<&SequencePlayer> {
        self.player.as_ref()
    }

    pub fn uses_shared_timeline(&self) -> bool {
        self.player.is_none()
    }

    pub fn last_rollback(&self) -> Option<f64> {
        self.last_rollback
    }

    pub fn proposal_seq(&self) -> u32 {
        self.proposal_seq
    }

    pub fn processed_seq(&self) -> u32 {
        self.processed_seq
    }

    pub fn sub_step_depth(&self) -> u32 {
        self.sub_step_depth
    }

    /// Timeline currently driven by the active segment, if any.
    pub(crate) fn bound_timeline<'p>(&'p self, shared: &'p SequencePlayer) -> Option<&'p SequencePlayer> {
        let active = self.active?;
        let player = timeline_ref(&self.player, shared);
        player.is_bound_to(&self.key, active).then_some(player)
    }

    pub(crate) fn timeline_seconds(&self, shared: &SequencePlayer) -> Option<f64> {
        self.bound_timeline(shared).map(SequencePlayer::current_seconds)
    }

    /// Playback state of the private timeline, for replication.
    pub(crate) fn own_timeline_props(&self) -> Option<NetSyncProps> {
        let active = self.active?;
        self.player
            .as_ref()
            .filter(|player| player.is_bound_to(&self.key, active))
            .map(SequencePlayer::net_sync_props)
    }

    pub(crate) fn eligible_events(&self, shared: &SequencePlayer) -> Vec<String> {
        let Some(active) = self.active else {
            return Vec::new();
        };
        let time = self.time_in(active, shared);
        self.segments
            .get(active.index())
            .map(|segment| segment.eligible_events(time))
            .unwrap_or_default()
    }

    fn time_in(&self, id: SegmentId, shared: &SequencePlayer) -> Option<f64> {
        let player = timeline_ref(&self.player, shared);
        player
            .is_bound_to(&self.key, id)
            .then(|| player.current_seconds())
    }

    /// Authority position in `id`'s timeline while it is still running.
    fn resync_time(&self, id: SegmentId, shared: &SequencePlayer) -> Option<f64> {
        let player = timeline_ref(&self.player, shared);
        (player.is_bound_to(&self.key, id) && player.status() != PlaybackStatus::Stopped)
            .then(|| player.current_seconds())
    }

    fn can_transition(&self, ctx: &ActionContext<'_>) -> bool {
        self.last_rollback
            .map_or(true, |at| ctx.now() > at + ctx.config.rollback_interval_secs)
    }

    fn invariant(&self, detail: String) -> MachineError {
        error!(instance = %self.key, %detail, "action invariant violated");
        debug_assert!(false, "action invariant violated on {}: {}", self.key, detail);
        MachineError::InvariantViolation {
            instance: self.key.clone(),
            detail,
        }
    }

    fn check_segment(&self, id: SegmentId) -> Result<(), MachineError> {
        if self.segments.get(id.index()).is_some() {
            Ok(())
        } else {
            Err(MachineError::UnknownSegment {
                instance: self.key.clone(),
                segment: id,
            })
        }
    }

    fn next_seq(&mut self) -> u32 {
        self.proposal_seq = self.proposal_seq.wrapping_add(1);
        self.proposal_seq
    }

    // Lifecycle

    pub(crate) fn construct(&mut self, ctx: &mut ActionContext<'_>) {
        trace!(instance = %self.key, transient = self.transient, "instance constructed");
        self.behavior.on_construct(&self.key);
        ctx.events.push(ActionEvent::InstanceConstructed {
            instance: self.key.clone(),
        });
    }

    /// Tear the instance down, aborting its active segment first.
    pub(crate) fn destruct(&mut self, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        let result = if self.active.is_some() {
            self.leave_from_active(EndKind::Abort, TransitionCause::Aborted, ctx)
        } else {
            Ok(())
        };
        trace!(instance = %self.key, "instance destructed");
        self.behavior.on_destruct(&self.key);
        ctx.events.push(ActionEvent::InstanceDestructed {
            instance: self.key.clone(),
        });
        result
    }

    fn activate(&mut self, id: SegmentId, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        if let Some(active) = self.active {
            return Err(self.invariant(format!("activating {id} while {active} is active")));
        }
        let Some(segment) = self.segments.get_mut(id.index()) else {
            return Err(MachineError::UnknownSegment {
                instance: self.key.clone(),
                segment: id,
            });
        };

        self.active = Some(id);
        segment.notify(&self.key, |behavior, info| behavior.on_begin(info));
        let sequence = segment.sequence.clone();

        if let Some(asset) = sequence {
            let role = ctx.role();
            let sub_step = self.current_sub_step();
            let binding = PlayerBinding {
                instance: self.key.clone(),
                segment: id,
            };
            let player = timeline(&mut self.player, ctx.shared_player);
            player.set_sub_step(sub_step);
            let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
            let mut events = player.initialize(
                binding,
                asset.track,
                asset.rate,
                asset.end_action,
                role,
                &mut scope,
            );
            events.extend(player.play(&mut scope));
            self.dispatch_timeline(events, ctx);
        }

        ctx.events.push(ActionEvent::SegmentActivated {
            instance: self.key.clone(),
            segment: id,
        });
        Ok(())
    }

    fn deactivate(&mut self, kind: EndKind, ctx: &mut ActionContext<'_>) -> Result<SegmentId, MachineError> {
        let Some(id) = self.active else {
            return Err(self.invariant("deactivating a dormant instance".to_string()));
        };
        self.active = None;
        self.pending_finish = false;

        let has_sequence = self
            .segments
            .get(id.index())
            .map_or(false, |segment| segment.sequence.is_some());
        if has_sequence {
            let player = timeline(&mut self.player, ctx.shared_player);
            if player.is_bound_to(&self.key, id) {
                let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
                let events = player.stop(kind.teardown(), &mut scope);
                self.dispatch_timeline(events, ctx);
            }
        }

        if let Some(segment) = self.segments.get_mut(id.index()) {
            if kind.is_abort() {
                segment.notify(&self.key, |behavior, info| behavior.on_abort(info));
            } else {
                segment.notify(&self.key, |behavior, info| behavior.on_end(info));
            }
        }
        ctx.events.push(ActionEvent::SegmentDeactivated {
            instance: self.key.clone(),
            segment: id,
            aborted: kind.is_abort(),
        });
        Ok(id)
    }

    /// Instance went from dormant to active.
    fn enter(&mut self, segment: SegmentId, ctx: &mut ActionContext<'_>) {
        self.behavior.on_activated(&self.key, segment);
        ctx.events.push(ActionEvent::InstanceActivated {
            instance: self.key.clone(),
            segment,
        });
    }

    /// Instance went from active to dormant.
    fn leave(&mut self, aborted: bool, ctx: &mut ActionContext<'_>) {
        let destroyed = self.spawns.release(aborted, ctx.world);
        trace!(instance = %self.key, destroyed, aborted, "instance deactivated");
        if aborted {
            self.behavior.on_aborted(&self.key);
        } else {
            self.behavior.on_deactivated(&self.key);
        }
        ctx.events.push(ActionEvent::InstanceDeactivated {
            instance: self.key.clone(),
            aborted,
        });
    }

    fn record(
        &mut self,
        from: Option<SegmentId>,
        to: Option<SegmentId>,
        cause: TransitionCause,
        skipped: Vec<SegmentId>,
        ctx: &mut ActionContext<'_>,
    ) {
        let record = TransitionRecord::new(from, to, cause).with_skipped(skipped);
        debug!(
            instance = %self.key,
            ?from,
            ?to,
            skipped = ?record.skipped,
            cause = ?record.cause,
            "transition taken"
        );
        self.trail.record(record.clone());
        ctx.events.push(ActionEvent::TransitionTaken {
            instance: self.key.clone(),
            record,
        });
    }

    /// Make `target` the active segment, entering the instance if dormant.
    fn transition_to(
        &mut self,
        target: SegmentId,
        cause: TransitionCause,
        skipped: Vec<SegmentId>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        self.check_segment(target)?;
        let from = self.active;
        if from.is_some() {
            self.deactivate(EndKind::Transition, ctx)?;
        }
        self.activate(target, ctx)?;
        if from.is_none() {
            self.enter(target, ctx);
        }
        self.record(from, Some(target), cause, skipped, ctx);
        Ok(())
    }

    fn leave_from_active(
        &mut self,
        kind: EndKind,
        cause: TransitionCause,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        let from = self.deactivate(kind, ctx)?;
        self.leave(kind.is_abort(), ctx);
        self.record(Some(from), None, cause, Vec::new(), ctx);
        Ok(())
    }

    fn dispatch_timeline(&mut self, events: Vec<TimelineEvent>, ctx: &mut ActionContext<'_>) {
        let locally_controlled = ctx.role().is_locally_controlled();
        for event in events {
            if locally_controlled && matches!(event, TimelineEvent::Finished) {
                self.pending_finish = true;
            }
            self.behavior.on_timeline_event(&self.key, &event);
            ctx.events.push(ActionEvent::Timeline {
                instance: self.key.clone(),
                event,
            });
        }
    }

    // Local decisions

    pub(crate) fn tick(&mut self, delta_seconds: f32, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        let Some(active) = self.active else {
            return Ok(());
        };
        self.behavior.on_tick(&self.key, delta_seconds);

        if let Some(player) = self.player.as_mut() {
            if player.is_bound_to(&self.key, active) {
                let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
                let events = player.update(delta_seconds, &mut scope);
                self.dispatch_timeline(events, ctx);
            }
        }

        if self.pending_finish {
            self.pending_finish = false;
            return self.try_finish(ctx);
        }

        let Some(active) = self.active else {
            return Ok(());
        };
        if let Some(segment) = self.segments.get_mut(active.index()) {
            segment.notify(&self.key, |behavior, info| behavior.on_tick(info, delta_seconds));
        }

        if !ctx.role().is_locally_controlled() || !self.can_transition(ctx) {
            return Ok(());
        }
        let time = self.time_in(active, ctx.shared_player);
        let Some(segment) = self.segments.get(active.index()) else {
            return Ok(());
        };
        let source = segment.source(time);
        let Some((index, transition)) = first_eligible(&segment.tick_transitions, Some(&source), false) else {
            return Ok(());
        };
        let first_target = transition.target;
        let condition = transition.condition_name().map(str::to_string);

        let chased = chase(&self.segments, first_target, HashSet::from([(active, index)]));
        self.take_predicted(Some(active), chased, condition, TransitionCause::Tick, ctx)
    }

    /// Advance the component's shared timeline when it plays for this instance.
    pub(crate) fn tick_shared_timeline(&mut self, delta_seconds: f32, ctx: &mut ActionContext<'_>) {
        let Some(active) = self.active else {
            return;
        };
        if self.player.is_some() || !ctx.shared_player.is_bound_to(&self.key, active) {
            return;
        }
        let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
        let events = ctx.shared_player.update(delta_seconds, &mut scope);
        self.dispatch_timeline(events, ctx);
    }

    fn take_predicted(
        &mut self,
        from: Option<SegmentId>,
        chased: Chase,
        condition: Option<String>,
        cause: TransitionCause,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        let target = chased.target;
        self.transition_to(target, cause, chased.skipped, ctx)?;
        if ctx.role().is_predicting() {
            let seq = self.next_seq();
            ctx.outbox.push(
                Recipient::Authority,
                ActionMessage::ProposeTransition {
                    instance: self.key.clone(),
                    seq,
                    from,
                    to: target,
                    condition,
                },
            );
        }
        Ok(())
    }

    pub(crate) fn invoke_event_transition(
        &mut self,
        event: &str,
        ctx: &mut ActionContext<'_>,
    ) -> Result<bool, MachineError> {
        if !ctx.role().is_locally_controlled() || !self.can_transition(ctx) {
            return Ok(false);
        }
        self.take_event_transition(event, ctx)
    }

    fn take_event_transition(&mut self, event: &str, ctx: &mut ActionContext<'_>) -> Result<bool, MachineError> {
        let Some(active) = self.active else {
            return Ok(false);
        };
        let time = self.time_in(active, ctx.shared_player);
        let Some(transition) = self
            .segments
            .get(active.index())
            .and_then(|segment| segment.first_eligible_event(event, time))
        else {
            return Ok(false);
        };
        let first_target = transition.target;
        let condition = transition.condition_name().map(str::to_string);

        let chased = chase(&self.segments, first_target, HashSet::new());
        let cause = TransitionCause::Event(event.to_string());
        self.take_predicted(Some(active), chased, condition, cause, ctx)?;
        Ok(true)
    }

    /// Leave through `OnFinished` if eligible, otherwise finish the instance.
    pub(crate) fn try_finish(&mut self, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        let Some(active) = self.active else {
            return Ok(());
        };
        if self.take_event_transition(FINISHED_EVENT, ctx)? {
            return Ok(());
        }

        self.leave_from_active(EndKind::Finish, TransitionCause::Finished, ctx)?;
        if ctx.role().is_predicting() {
            let seq = self.next_seq();
            ctx.outbox.push(
                Recipient::Authority,
                ActionMessage::FinishToAuthority {
                    instance: self.key.clone(),
                    seq,
                    segment: active,
                },
            );
        }
        Ok(())
    }

    pub(crate) fn try_start_entry(&mut self, entry: &str, ctx: &mut ActionContext<'_>) -> Result<bool, MachineError> {
        if self.active.is_some() {
            return Ok(false);
        }
        let role = ctx.role();
        if !role.has_authority() && !role.is_locally_controlled() {
            return Ok(false);
        }
        if self.player.is_none() && ctx.shared_player.is_playing() {
            debug!(instance = %self.key, "shared timeline busy, entry refused");
            return Ok(false);
        }
        let Some(transitions) = self.entries.get(entry) else {
            warn!(instance = %self.key, entry, "unknown entry point");
            return Ok(false);
        };
        let Some((_, transition)) = first_eligible(transitions, None, false) else {
            return Ok(false);
        };
        let first_target = transition.target;
        let condition = transition.condition_name().map(str::to_string);

        let chased = chase(&self.segments, first_target, HashSet::new());
        let target = chased.target;
        let cause = TransitionCause::Entry(entry.to_string());
        self.take_predicted(None, chased, condition, cause, ctx)?;

        if role.has_authority() && !role.is_locally_controlled() {
            ctx.outbox.push(
                Recipient::OwningClient,
                ActionMessage::EnterConfirmed {
                    instance: self.key.clone(),
                    ack: self.processed_seq,
                    segment: target,
                },
            );
        }
        Ok(true)
    }

    pub(crate) fn abort(&mut self, ctx: &mut ActionContext<'_>) -> Result<bool, MachineError> {
        if self.active.is_none() {
            return Ok(false);
        }
        let role = ctx.role();
        if role.has_authority() {
            self.leave_from_active(EndKind::Abort, TransitionCause::Aborted, ctx)?;
            ctx.outbox.push(
                Recipient::Remotes,
                ActionMessage::AbortBroadcast {
                    instance: self.key.clone(),
                    ack: Some(self.processed_seq),
                },
            );
        } else if role.is_predicting() {
            self.leave_from_active(EndKind::Abort, TransitionCause::Aborted, ctx)?;
            let seq = self.next_seq();
            ctx.outbox.push(
                Recipient::Authority,
                ActionMessage::AbortToAuthority {
                    instance: self.key.clone(),
                    seq,
                },
            );
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    // Authority side

    pub(crate) fn handle_propose(
        &mut self,
        seq: u32,
        from: Option<SegmentId>,
        to: SegmentId,
        condition: Option<&str>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        self.processed_seq = seq;
        let accepted = self.active == from
            && self.check_segment(to).is_ok()
            && self.authority_check(from, condition, ctx.shared_player);
        if !accepted {
            debug!(instance = %self.key, seq, ?from, ?to, active = ?self.active, "rejecting proposed transition");
            self.reject(seq, from, to, ctx);
            return Ok(());
        }
        self.transition_to(to, TransitionCause::Authority, Vec::new(), ctx)
    }

    fn authority_check(&self, from: Option<SegmentId>, condition: Option<&str>, shared: &SequencePlayer) -> bool {
        let Some(condition) = condition.and_then(|name| self.action.conditions().resolve(name)) else {
            return true;
        };
        let time = from.and_then(|id| self.time_in(id, shared));
        let source = from
            .and_then(|id| self.segments.get(id.index()))
            .map(|segment| segment.source(time));
        condition.check(source.as_ref(), true)
    }

    fn reject(&mut self, seq: u32, from: Option<SegmentId>, to: SegmentId, ctx: &mut ActionContext<'_>) {
        // Only a segment the authority is actually running can fail a transition.
        let failed = from.filter(|id| self.active == Some(*id));
        if let Some(segment) = failed.and_then(|id| self.segments.get_mut(id.index())) {
            segment.notify(&self.key, |behavior, info| behavior.on_transition_failed(info));
        }
        if from.is_none() && self.active.is_none() {
            ctx.outbox.push(
                Recipient::OwningClient,
                ActionMessage::Cancel {
                    instance: self.key.clone(),
                    ack: seq,
                    segment: to,
                },
            );
        } else {
            self.send_truth(seq, ctx);
        }
    }

    /// Tell the owning client where the authority actually is.
    fn send_truth(&self, seq: u32, ctx: &mut ActionContext<'_>) {
        let restore = self.active;
        let resync_seconds = restore.and_then(|id| self.resync_time(id, ctx.shared_player));
        ctx.outbox.push(
            Recipient::OwningClient,
            ActionMessage::TransitionFailed {
                instance: self.key.clone(),
                ack: seq,
                restore,
                resync_seconds,
            },
        );
    }

    pub(crate) fn handle_finish(
        &mut self,
        seq: u32,
        segment: SegmentId,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        self.processed_seq = seq;
        if self.active == Some(segment) {
            return self.leave_from_active(EndKind::Finish, TransitionCause::Finished, ctx);
        }
        debug!(instance = %self.key, seq, %segment, active = ?self.active, "finish does not match authority state");
        self.send_truth(seq, ctx);
        Ok(())
    }

    pub(crate) fn handle_abort_request(&mut self, seq: u32, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        self.processed_seq = seq;
        if self.active.is_none() {
            return Ok(());
        }
        self.leave_from_active(EndKind::Abort, TransitionCause::Aborted, ctx)?;
        ctx.outbox.push(
            Recipient::Observers,
            ActionMessage::AbortBroadcast {
                instance: self.key.clone(),
                ack: Some(seq),
            },
        );
        Ok(())
    }

    // Owning client side

    fn is_stale(&self, ack: u32) -> bool {
        ack != self.proposal_seq
    }

    pub(crate) fn on_transition_failed(
        &mut self,
        ack: u32,
        restore: Option<SegmentId>,
        resync_seconds: Option<f64>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        if self.is_stale(ack) {
            debug!(instance = %self.key, ack, latest = self.proposal_seq, "dropping stale correction");
            return Ok(());
        }
        self.last_rollback = Some(ctx.now());

        match restore {
            Some(target) => {
                if self.active != Some(target) {
                    self.transition_to(target, TransitionCause::Rollback, Vec::new(), ctx)?;
                }
                if let Some(seconds) = resync_seconds {
                    let resumed = seconds + ctx.host.ping_seconds();
                    self.resync_timeline(target, resumed, ctx);
                }
            }
            None => {
                if self.active.is_some() {
                    self.leave_from_active(EndKind::Abort, TransitionCause::Rollback, ctx)?;
                }
            }
        }

        debug!(instance = %self.key, ?restore, ?resync_seconds, "prediction rolled back");
        ctx.events.push(ActionEvent::PredictionCorrected {
            instance: self.key.clone(),
            restored: restore,
        });
        Ok(())
    }

    fn resync_timeline(&mut self, id: SegmentId, seconds: f64, ctx: &mut ActionContext<'_>) {
        let player = timeline(&mut self.player, ctx.shared_player);
        if !player.is_bound_to(&self.key, id) {
            return;
        }
        let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
        let events = player.jump_to_seconds(seconds, &mut scope);
        self.dispatch_timeline(events, ctx);
    }

    pub(crate) fn on_cancel(&mut self, ack: u32, segment: SegmentId, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        if self.is_stale(ack) {
            debug!(instance = %self.key, ack, latest = self.proposal_seq, "dropping stale cancel");
            return Ok(());
        }
        if self.active.is_some() {
            debug!(instance = %self.key, %segment, "speculative entry cancelled");
            self.leave_from_active(EndKind::Abort, TransitionCause::Cancelled, ctx)?;
        }
        ctx.events.push(ActionEvent::PredictionCorrected {
            instance: self.key.clone(),
            restored: None,
        });
        Ok(())
    }

    pub(crate) fn on_enter_confirmed(
        &mut self,
        ack: u32,
        segment: SegmentId,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        if self.is_stale(ack) {
            debug!(instance = %self.key, ack, latest = self.proposal_seq, "dropping stale entry confirmation");
            return Ok(());
        }
        if self.active == Some(segment) {
            return Ok(());
        }
        self.transition_to(segment, TransitionCause::Authority, Vec::new(), ctx)
    }

    pub(crate) fn on_abort_broadcast(&mut self, ack: Option<u32>, ctx: &mut ActionContext<'_>) -> Result<(), MachineError> {
        if ctx.role().is_predicting() {
            if let Some(ack) = ack.filter(|ack| self.is_stale(*ack)) {
                debug!(instance = %self.key, ack, latest = self.proposal_seq, "dropping stale abort");
                return Ok(());
            }
        }
        if self.active.is_none() {
            return Ok(());
        }
        self.leave_from_active(EndKind::Abort, TransitionCause::Aborted, ctx)
    }

    // Observers

    pub(crate) fn apply_replicated_active(
        &mut self,
        replicated: Option<SegmentId>,
        ctx: &mut ActionContext<'_>,
    ) -> Result<(), MachineError> {
        if self.active == replicated {
            return Ok(());
        }
        match replicated {
            Some(target) => self.transition_to(target, TransitionCause::Replicated, Vec::new(), ctx),
            None => self.leave_from_active(EndKind::Finish, TransitionCause::Replicated, ctx),
        }
    }

    pub(crate) fn apply_net_sync(&mut self, props: &NetSyncProps, ctx: &mut ActionContext<'_>) {
        let Some(active) = self.active else {
            return;
        };
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if !player.is_bound_to(&self.key, active) {
            return;
        }
        let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
        let events = player.apply_net_sync(
            props,
            ctx.host.ping_seconds(),
            ctx.config.net_sync_threshold_ms,
            &mut scope,
        );
        self.dispatch_timeline(events, ctx);
    }

    pub(crate) fn apply_shared_net_sync(&mut self, props: &NetSyncProps, ctx: &mut ActionContext<'_>) {
        let Some(active) = self.active else {
            return;
        };
        if self.player.is_some() || !ctx.shared_player.is_bound_to(&self.key, active) {
            return;
        }
        let mut scope = spawn_scope(ctx.world, &mut self.spawns, ctx.host);
        let events = ctx.shared_player.apply_net_sync(
            props,
            ctx.host.ping_seconds(),
            ctx.config.net_sync_threshold_ms,
            &mut scope,
        );
        self.dispatch_timeline(events, ctx);
    }

    // Sub-stepping

    fn current_sub_step(&self) -> Option<f32> {
        (self.sub_step_depth > 0).then_some(self.sub_step_secs)
    }

    pub(crate) fn push_sub_step_mode(&mut self, shared: &mut SequencePlayer) {
        self.sub_step_depth += 1;
        self.apply_sub_step(shared);
    }

    pub(crate) fn pop_sub_step_mode(&mut self, shared: &mut SequencePlayer) {
        if self.sub_step_depth == 0 {
            warn!(instance = %self.key, "sub-step mode popped more often than pushed");
            return;
        }
        self.sub_step_depth -= 1;
        self.apply_sub_step(shared);
    }

    fn apply_sub_step(&mut self, shared: &mut SequencePlayer) {
        let step = self.current_sub_step();
        match self.player.as_mut() {
            Some(player) => player.set_sub_step(step),
            None => {
                let bound = self
                    .active
                    .map_or(false, |active| shared.is_bound_to(&self.key, active));
                if bound {
                    shared.set_sub_step(step);
                }
            }
        }
    }
}

impl fmt::Debug for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInstance")
            .field("key", &self.key)
            .field("active", &self.active)
            .field("segments", &self.segments.len())
            .field("proposal_seq", &self.proposal_seq)
            .field("processed_seq", &self.processed_seq)
            .field("transient", &self.transient)
            .finish_non_exhaustive()
    }
}
