//! Segment lifecycle on a standalone machine: entries, tick chases, event
//! transitions, finishing, aborting and the spawned objects that follow.

mod common;

use actionline::builder::{ActionTypeBuilder, SegmentBuilder};
use actionline::core::{ActionTypeKey, NetRole, SegmentId, TransitionCause, TransitionRecord};
use actionline::machine::{ActionCatalog, ActionComponent, ActionEvent, ActionType, SequenceAsset};
use actionline::spawn::{SpawnOwnership, SpawnSettings, SpawnTemplate};
use actionline::timeline::{EndAction, KeyEvent, SpawnTrack, TimelineEvent};
use actionline::ActionConfig;
use common::{assert_exclusive, track, Journal, TestHost, TestWorld};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Rig {
    host: TestHost,
    world: TestWorld,
    component: ActionComponent,
    key: ActionTypeKey,
}

impl Rig {
    fn new(action: ActionType) -> Self {
        let key = action.key().clone();
        let catalog = Arc::new(ActionCatalog::new().with_default(action));
        let host = TestHost::new(NetRole::Standalone);
        let mut world = TestWorld::default();
        let mut component = ActionComponent::new(catalog, ActionConfig::default());
        component.start(&host, &mut world).unwrap();
        Self {
            host,
            world,
            component,
            key,
        }
    }

    fn enter(&mut self, entry: &str) -> bool {
        self.component
            .try_start_entry(&self.key, entry, &self.host, &mut self.world)
            .unwrap()
    }

    fn event(&mut self, event: &str) -> bool {
        self.component
            .try_event_transition(&self.key, event, &self.host, &mut self.world)
            .unwrap()
    }

    fn tick(&mut self, seconds: f32) {
        self.component.tick(seconds, &self.host, &mut self.world).unwrap();
    }

    fn abort(&mut self) -> bool {
        self.component.abort(&self.key, &self.host, &mut self.world).unwrap()
    }

    fn active(&self) -> Option<&str> {
        self.component.active_segment_name(&self.key)
    }

    fn last_record(&self) -> TransitionRecord {
        self.component
            .find(&self.key)
            .and_then(|instance| instance.trail().last().cloned())
            .unwrap()
    }
}

fn gated_chain(go: Arc<AtomicBool>) -> ActionType {
    ActionTypeBuilder::new("Chain")
        .condition("Go", move |_, _| go.load(Ordering::SeqCst))
        .segment(SegmentBuilder::new("A").tick_to_if("B", "Go"))
        .segment(SegmentBuilder::new("B").tick_to("C"))
        .segment(SegmentBuilder::new("C"))
        .entry("Default", "A")
        .build()
        .unwrap()
}

#[test]
fn entry_starts_a_dormant_instance_once() {
    let mut rig = Rig::new(gated_chain(Arc::new(AtomicBool::new(false))));

    assert!(!rig.enter("Missing"));
    assert!(rig.enter("Default"));
    assert_eq!(rig.active(), Some("A"));
    assert!(!rig.enter("Default"));

    let record = rig.last_record();
    assert_eq!(record.from, None);
    assert_eq!(record.to, Some(SegmentId(0)));
    assert_eq!(record.cause, TransitionCause::Entry("Default".to_string()));
}

#[test]
fn tick_chase_skips_intermediate_segments() {
    let go = Arc::new(AtomicBool::new(false));
    let journal = Journal::new();
    let chain = ActionTypeBuilder::new("Chain")
        .condition("Go", {
            let go = go.clone();
            move |_, _| go.load(Ordering::SeqCst)
        })
        .segment(SegmentBuilder::new("A").tick_to_if("B", "Go").behavior(journal.segments()))
        .segment(SegmentBuilder::new("B").tick_to("C").behavior(journal.segments()))
        .segment(SegmentBuilder::new("C").behavior(journal.segments()))
        .entry("Default", "A")
        .build()
        .unwrap();
    let mut rig = Rig::new(chain);

    rig.enter("Default");
    rig.tick(0.016);
    assert_eq!(rig.active(), Some("A"));
    journal.take();
    rig.component.drain_events();

    go.store(true, Ordering::SeqCst);
    rig.tick(0.016);

    assert_eq!(rig.active(), Some("C"));
    assert_eq!(journal.entries(), ["end:A", "begin:C"]);
    let record = rig.last_record();
    assert_eq!(record.from, Some(SegmentId(0)));
    assert_eq!(record.to, Some(SegmentId(2)));
    assert_eq!(record.skipped, vec![SegmentId(1)]);
    assert_eq!(record.cause, TransitionCause::Tick);

    let events = rig.component.drain_events();
    assert_exclusive(1, &events);
    assert!(!events.contains(&ActionEvent::SegmentActivated {
        instance: rig.key.clone(),
        segment: SegmentId(1),
    }));
}

#[test]
fn tick_cycle_stops_on_the_last_segment_reached() {
    let go = Arc::new(AtomicBool::new(false));
    let looping = ActionTypeBuilder::new("Loop")
        .condition("Go", {
            let go = go.clone();
            move |_, _| go.load(Ordering::SeqCst)
        })
        .segment(SegmentBuilder::new("A").tick_to_if("B", "Go"))
        .segment(SegmentBuilder::new("B").tick_to("A"))
        .entry("Default", "A")
        .build()
        .unwrap();
    let mut rig = Rig::new(looping);
    rig.enter("Default");

    go.store(true, Ordering::SeqCst);
    rig.tick(0.016);

    assert_eq!(rig.active(), Some("A"));
    let record = rig.last_record();
    assert_eq!(record.from, Some(SegmentId(0)));
    assert_eq!(record.to, Some(SegmentId(0)));
    assert_eq!(record.skipped, vec![SegmentId(1)]);
}

#[test]
fn event_transitions_take_the_first_eligible_in_declaration_order() {
    let action = ActionTypeBuilder::new("Parry")
        .condition("Never", |_, _| false)
        .segment(
            SegmentBuilder::new("Guard")
                .on_event_if("Hit", "Riposte", "Never")
                .on_event("Hit", "Stagger"),
        )
        .segment(SegmentBuilder::new("Riposte"))
        .segment(SegmentBuilder::new("Stagger"))
        .entry("Default", "Guard")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");

    assert!(!rig.event("Miss"));
    assert_eq!(rig.active(), Some("Guard"));
    assert!(rig.event("Hit"));
    assert_eq!(rig.active(), Some("Stagger"));
    assert_eq!(rig.last_record().cause, TransitionCause::Event("Hit".to_string()));
}

#[test]
fn conditions_see_the_source_timeline_position() {
    let action = ActionTypeBuilder::new("Combo")
        .condition("Late", |source, _| {
            source.and_then(|segment| segment.time_seconds).unwrap_or(0.0) >= 0.5
        })
        .segment(
            SegmentBuilder::new("First")
                .sequence(SequenceAsset::new(track(60), EndAction::Stop))
                .on_event_if("Attack", "Second", "Late"),
        )
        .segment(SegmentBuilder::new("Second"))
        .entry("Default", "First")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");

    rig.tick(0.25);
    assert!(rig.component.eligible_events(&rig.key).is_empty());
    assert!(!rig.event("Attack"));

    rig.tick(0.25);
    assert_eq!(rig.component.eligible_events(&rig.key), vec!["Attack".to_string()]);
    assert!(rig.event("Attack"));
    assert_eq!(rig.active(), Some("Second"));
}

#[test]
fn finished_timeline_without_outgoing_event_deactivates_the_instance() {
    let action = ActionTypeBuilder::new("Emote")
        .segment(
            SegmentBuilder::new("Wave").sequence(SequenceAsset::new(
                track(30).with_key_event(KeyEvent::new(15, "Peak")),
                EndAction::Stop,
            )),
        )
        .entry("Default", "Wave")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");
    rig.component.drain_events();

    rig.tick(1.5);

    assert_eq!(rig.active(), None);
    let events = rig.component.drain_events();
    let timeline: Vec<&TimelineEvent> = events
        .iter()
        .filter_map(|event| match event {
            ActionEvent::Timeline { event, .. } => Some(event),
            _ => None,
        })
        .collect();
    assert!(matches!(timeline[0], TimelineEvent::Key { name, .. } if name == "Peak"));
    assert_eq!(
        timeline.iter().filter(|event| ***event == TimelineEvent::Finished).count(),
        1
    );
    assert!(events.contains(&ActionEvent::InstanceDeactivated {
        instance: rig.key.clone(),
        aborted: false,
    }));
    assert_eq!(rig.last_record().cause, TransitionCause::Finished);
    assert_eq!(rig.last_record().to, None);
}

#[test]
fn finished_timeline_follows_on_finished() {
    let action = ActionTypeBuilder::new("Attack")
        .segment(
            SegmentBuilder::new("Swing")
                .sequence(SequenceAsset::new(track(30), EndAction::Stop))
                .on_event("OnFinished", "Recover"),
        )
        .segment(SegmentBuilder::new("Recover"))
        .entry("Default", "Swing")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");

    rig.tick(1.5);

    assert_eq!(rig.active(), Some("Recover"));
    assert_eq!(rig.last_record().cause, TransitionCause::Event("OnFinished".to_string()));
}

#[test]
fn looping_timeline_never_finishes() {
    let action = ActionTypeBuilder::new("Idle")
        .segment(SegmentBuilder::new("Breathe").sequence(SequenceAsset::new(track(30), EndAction::Loop)))
        .entry("Default", "Breathe")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");

    rig.tick(2.5);

    assert_eq!(rig.active(), Some("Breathe"));
    let player = rig.component.find(&rig.key).unwrap().own_timeline().unwrap();
    assert_eq!(player.loops(), 2);
    assert!((player.current_seconds() - 0.5).abs() < 1e-6);
}

#[test]
fn hooks_run_in_lifecycle_order() {
    let journal = Journal::new();
    let action = ActionTypeBuilder::new("Attack")
        .instance_behavior(journal.instances())
        .segment(
            SegmentBuilder::new("Swing")
                .on_event("Next", "Recover")
                .behavior(journal.segments()),
        )
        .segment(SegmentBuilder::new("Recover").behavior(journal.segments()))
        .entry("Default", "Swing")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);

    rig.enter("Default");
    rig.event("Next");
    assert!(rig.abort());
    assert!(!rig.abort());

    assert_eq!(
        journal.entries(),
        [
            "begin:Swing",
            "activated",
            "end:Swing",
            "begin:Recover",
            "abort:Recover",
            "aborted",
        ]
    );
    assert_exclusive(0, &rig.component.drain_events());
}

fn armed_attack() -> ActionType {
    let swing = track(60)
        .with_spawn_track(SpawnTrack::new(
            SpawnTemplate::new("Blade"),
            SpawnSettings::reference(SpawnOwnership::Instance),
        ))
        .with_spawn_track(SpawnTrack::new(SpawnTemplate::new("Spark"), SpawnSettings::default()))
        .with_spawn_track(SpawnTrack::new(
            SpawnTemplate::new("Banner"),
            SpawnSettings::reference(SpawnOwnership::External).surviving_aborts(),
        ));
    let recover = track(30).with_spawn_track(SpawnTrack::new(
        SpawnTemplate::new("Blade"),
        SpawnSettings::reference(SpawnOwnership::Instance),
    ));
    ActionTypeBuilder::new("Armed")
        .segment(
            SegmentBuilder::new("Swing")
                .sequence(SequenceAsset::new(swing, EndAction::Stop))
                .on_event("Next", "Recover"),
        )
        .segment(SegmentBuilder::new("Recover").sequence(SequenceAsset::new(recover, EndAction::Stop)))
        .entry("Default", "Swing")
        .build()
        .unwrap()
}

#[test]
fn reference_spawns_carry_across_segments() {
    let mut rig = Rig::new(armed_attack());
    rig.enter("Default");
    assert_eq!(rig.world.spawned, ["Blade", "Spark", "Banner"]);

    rig.event("Next");

    assert_eq!(rig.world.spawned.len(), 3, "bound blade is reused");
    assert_eq!(rig.world.alive_templates(), ["Banner", "Blade"]);
    let instance = rig.component.find(&rig.key).unwrap();
    assert!(instance.spawns().reference("Blade").is_some());
}

#[test]
fn instance_scoped_spawns_end_with_the_instance() {
    let mut rig = Rig::new(armed_attack());
    rig.enter("Default");
    rig.event("Next");

    rig.tick(1.5);

    assert_eq!(rig.active(), None);
    assert_eq!(rig.world.alive_templates(), ["Banner"]);
    assert_eq!(rig.component.find(&rig.key).unwrap().spawns().reference_count(), 1);
}

#[test]
fn abort_destroys_spawns_that_do_not_survive_aborts() {
    let mut rig = Rig::new(armed_attack());
    rig.enter("Default");

    assert!(rig.abort());

    assert_eq!(rig.world.alive_templates(), ["Banner"]);
    let events = rig.component.drain_events();
    assert!(events.contains(&ActionEvent::SegmentDeactivated {
        instance: rig.key.clone(),
        segment: SegmentId(0),
        aborted: true,
    }));
    assert_eq!(rig.last_record().cause, TransitionCause::Aborted);
}

#[test]
fn delayed_destruction_is_handed_to_the_world() {
    let action = ActionTypeBuilder::new("Flare")
        .segment(
            SegmentBuilder::new("Burn").sequence(SequenceAsset::new(
                track(30).with_spawn_track(SpawnTrack::new(
                    SpawnTemplate::new("Smoke"),
                    SpawnSettings::default().with_destroy_delay(2.0),
                )),
                EndAction::Stop,
            )),
        )
        .entry("Default", "Burn")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");

    rig.tick(1.5);

    assert_eq!(rig.world.delayed.len(), 1);
    assert_eq!(rig.world.delayed[0].1, 2.0);
    assert!(rig.world.destroyed.is_empty());
}

#[test]
fn sub_step_mode_reaches_the_private_timeline() {
    let action = ActionTypeBuilder::new("Dash")
        .sub_step(0.01)
        .segment(SegmentBuilder::new("Go").sequence(SequenceAsset::new(track(30), EndAction::Stop)))
        .entry("Default", "Go")
        .build()
        .unwrap();
    let mut rig = Rig::new(action);
    rig.enter("Default");
    let key = rig.key.clone();

    rig.component.push_sub_step_mode(&key).unwrap();
    rig.component.push_sub_step_mode(&key).unwrap();
    rig.component.pop_sub_step_mode(&key).unwrap();
    let instance = rig.component.find(&key).unwrap();
    assert_eq!(instance.sub_step_depth(), 1);
    assert_eq!(instance.own_timeline().unwrap().sub_step(), Some(f64::from(0.01_f32)));

    rig.component.pop_sub_step_mode(&key).unwrap();
    rig.component.pop_sub_step_mode(&key).unwrap();
    let instance = rig.component.find(&key).unwrap();
    assert_eq!(instance.sub_step_depth(), 0);
    assert_eq!(instance.own_timeline().unwrap().sub_step(), None);
}
