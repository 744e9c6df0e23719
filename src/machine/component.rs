//! The per-entity container that owns action instances.

use super::error::MachineError;
use super::event::ActionEvent;
use super::host::{ActionContext, ActionHost};
use super::instance::ActionInstance;
use super::template::ActionCatalog;
use super::DEFAULT_ENTRY;
use crate::config::ActionConfig;
use crate::core::{ActionTypeKey, SegmentId};
use crate::net::{ActionMessage, ComponentReplication, Envelope, InstanceReplication, Outbox, Recipient};
use crate::snapshot::ComponentSnapshot;
use crate::spawn::SpawnWorld;
use crate::timeline::SequencePlayer;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Action instances attached to one entity, plus the timeline they may share.
///
/// Every mutating call borrows the entity's [`ActionHost`] and the game's
/// [`SpawnWorld`] for its duration. Messages for the network are queued in
/// an outbox and lifecycle notifications in an event list; the owner drains
/// both after each call or frame.
///
/// # Example
///
/// ```rust
/// use actionline::builder::{ActionTypeBuilder, SegmentBuilder};
/// use actionline::core::{ActionTypeKey, NetRole, ObjectId};
/// use actionline::machine::{ActionCatalog, ActionComponent, ActionHost};
/// use actionline::spawn::{SpawnError, SpawnTemplate, SpawnWorld, Transform};
/// use actionline::ActionConfig;
/// use std::sync::Arc;
///
/// struct Host;
/// impl ActionHost for Host {
///     fn role(&self) -> NetRole { NetRole::Standalone }
///     fn now_seconds(&self) -> f64 { 0.0 }
/// }
///
/// struct NoWorld;
/// impl SpawnWorld for NoWorld {
///     fn spawn(&mut self, t: &SpawnTemplate, _: Transform) -> Result<ObjectId, SpawnError> {
///         Err(SpawnError::UnknownTemplate(t.id.clone()))
///     }
///     fn destroy(&mut self, _: ObjectId) {}
///     fn destroy_after(&mut self, _: ObjectId, _: f32) {}
///     fn is_alive(&self, _: ObjectId) -> bool { false }
/// }
///
/// let attack = ActionTypeBuilder::new("Attack")
///     .segment(SegmentBuilder::new("Windup").on_event("Release", "Strike"))
///     .segment(SegmentBuilder::new("Strike"))
///     .entry("Default", "Windup")
///     .build()
///     .unwrap();
/// let catalog = Arc::new(ActionCatalog::new().with_default(attack));
/// let mut component = ActionComponent::new(catalog, ActionConfig::default());
///
/// component.start(&Host, &mut NoWorld).unwrap();
/// let key = ActionTypeKey::new("Attack");
/// assert!(component.try_start_entry(&key, "Default", &Host, &mut NoWorld).unwrap());
/// assert!(component.try_event_transition(&key, "Release", &Host, &mut NoWorld).unwrap());
/// assert_eq!(component.active_segment_name(&key), Some("Strike"));
/// ```
pub struct ActionComponent {
    catalog: Arc<ActionCatalog>,
    config: ActionConfig,
    instances: Vec<ActionInstance>,
    shared_player: SequencePlayer,
    outbox: Outbox,
    events: Vec<ActionEvent>,
}

impl ActionComponent {
    pub fn new(catalog: Arc<ActionCatalog>, config: ActionConfig) -> Self {
        Self {
            catalog,
            config,
            instances: Vec::new(),
            shared_player: SequencePlayer::new(),
            outbox: Outbox::new(),
            events: Vec::new(),
        }
    }

    fn split<'c>(
        &'c mut self,
        host: &'c dyn ActionHost,
        world: &'c mut dyn SpawnWorld,
    ) -> (&'c mut Vec<ActionInstance>, ActionContext<'c>) {
        let ctx = ActionContext {
            host,
            world,
            outbox: &mut self.outbox,
            config: &self.config,
            shared_player: &mut self.shared_player,
            events: &mut self.events,
        };
        (&mut self.instances, ctx)
    }

    fn index_of(&self, key: &ActionTypeKey) -> Result<usize, MachineError> {
        self.instances
            .iter()
            .position(|instance| instance.key() == key)
            .ok_or_else(|| MachineError::UnknownInstance(key.clone()))
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    pub fn instances(&self) -> &[ActionInstance] {
        &self.instances
    }

    pub fn find(&self, key: &ActionTypeKey) -> Option<&ActionInstance> {
        self.instances.iter().find(|instance| instance.key() == key)
    }

    pub fn shared_player(&self) -> &SequencePlayer {
        &self.shared_player
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        self.outbox.drain()
    }

    pub fn drain_events(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.events)
    }

    // Roster

    /// Add the catalog's default action types. Only the authority adds
    /// them; remote copies receive the roster through replication.
    pub fn start(&mut self, host: &dyn ActionHost, world: &mut dyn SpawnWorld) -> Result<(), MachineError> {
        if !host.role().has_authority() {
            return Ok(());
        }
        let defaults = self.catalog.defaults().to_vec();
        info!(defaults = defaults.len(), "starting action component");
        for key in defaults {
            if self.find(&key).is_none() {
                self.insert_instance(key, false, host, world)?;
            }
        }
        Ok(())
    }

    /// Destroy every instance, aborting the active ones.
    pub fn shutdown(&mut self, host: &dyn ActionHost, world: &mut dyn SpawnWorld) -> Result<(), MachineError> {
        let (instances, mut ctx) = self.split(host, world);
        let mut first_error = None;
        while let Some(mut instance) = instances.pop() {
            if let Err(err) = instance.destruct(&mut ctx) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn add_action(
        &mut self,
        key: &ActionTypeKey,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<(), MachineError> {
        if !host.role().has_authority() {
            return Err(MachineError::NotAuthority);
        }
        self.insert_instance(key.clone(), false, host, world).map(|_| ())
    }

    pub fn remove_action(
        &mut self,
        key: &ActionTypeKey,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<(), MachineError> {
        if !host.role().has_authority() {
            return Err(MachineError::NotAuthority);
        }
        let index = self.index_of(key)?;
        let (instances, mut ctx) = self.split(host, world);
        instances.remove(index).destruct(&mut ctx)
    }

    fn insert_instance(
        &mut self,
        key: ActionTypeKey,
        transient: bool,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<usize, MachineError> {
        if self.find(&key).is_some() {
            return Err(MachineError::DuplicateInstance(key));
        }
        let action = self
            .catalog
            .get(&key)
            .ok_or_else(|| MachineError::UnknownActionType(key.clone()))?;
        let mut instance = ActionInstance::new(action, &self.config, transient);

        let (instances, mut ctx) = self.split(host, world);
        instance.construct(&mut ctx);
        instances.push(instance);
        Ok(instances.len() - 1)
    }

    /// Remove transient instances that have gone dormant.
    fn reap_transients(&mut self, host: &dyn ActionHost, world: &mut dyn SpawnWorld) -> Result<(), MachineError> {
        if !host.role().has_authority() {
            return Ok(());
        }
        let (instances, mut ctx) = self.split(host, world);
        let mut first_error = None;
        let mut index = instances.len();
        while index > 0 {
            index -= 1;
            if instances[index].is_transient() && !instances[index].is_active() {
                debug!(instance = %instances[index].key(), "removing finished transient instance");
                if let Err(err) = instances.remove(index).destruct(&mut ctx) {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Play an action type once through an entry point.
    ///
    /// On the authority a transient instance is created when the type has
    /// no instance yet, and removed again once it goes dormant. A client
    /// asks the authority instead and returns `false`.
    pub fn play_action(
        &mut self,
        key: &ActionTypeKey,
        entry: Option<&str>,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<bool, MachineError> {
        let role = host.role();
        if !role.has_authority() {
            if !role.is_locally_controlled() {
                return Err(MachineError::NotAuthority);
            }
            self.outbox.push(
                Recipient::Authority,
                ActionMessage::PlayActionToAuthority {
                    instance: key.clone(),
                    entry: entry.map(str::to_string),
                },
            );
            return Ok(false);
        }

        let entry = entry.unwrap_or(DEFAULT_ENTRY);
        let index = match self.index_of(key) {
            Ok(index) => index,
            Err(_) => self.insert_instance(key.clone(), true, host, world)?,
        };
        let started = {
            let (instances, mut ctx) = self.split(host, world);
            instances[index].try_start_entry(entry, &mut ctx)?
        };
        self.reap_transients(host, world)?;
        Ok(started)
    }

    // Instance operations

    pub fn try_start_entry(
        &mut self,
        key: &ActionTypeKey,
        entry: &str,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<bool, MachineError> {
        let index = self.index_of(key)?;
        let (instances, mut ctx) = self.split(host, world);
        instances[index].try_start_entry(entry, &mut ctx)
    }

    pub fn try_event_transition(
        &mut self,
        key: &ActionTypeKey,
        event: &str,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<bool, MachineError> {
        let index = self.index_of(key)?;
        let taken = {
            let (instances, mut ctx) = self.split(host, world);
            instances[index].invoke_event_transition(event, &mut ctx)?
        };
        self.reap_transients(host, world)?;
        Ok(taken)
    }

    pub fn abort(
        &mut self,
        key: &ActionTypeKey,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<bool, MachineError> {
        let index = self.index_of(key)?;
        let aborted = {
            let (instances, mut ctx) = self.split(host, world);
            instances[index].abort(&mut ctx)?
        };
        self.reap_transients(host, world)?;
        Ok(aborted)
    }

    /// Instance whose active segment currently drives the shared timeline.
    pub fn shared_player_active_action(&self) -> Option<&ActionTypeKey> {
        let binding = self.shared_player.binding()?;
        self.find(&binding.instance)
            .filter(|instance| instance.active_segment() == Some(binding.segment))
            .map(ActionInstance::key)
    }

    pub fn abort_shared_player_action(
        &mut self,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<bool, MachineError> {
        match self.shared_player_active_action().cloned() {
            Some(key) => self.abort(&key, host, world),
            None => Ok(false),
        }
    }

    pub fn push_sub_step_mode(&mut self, key: &ActionTypeKey) -> Result<(), MachineError> {
        let index = self.index_of(key)?;
        self.instances[index].push_sub_step_mode(&mut self.shared_player);
        Ok(())
    }

    pub fn pop_sub_step_mode(&mut self, key: &ActionTypeKey) -> Result<(), MachineError> {
        let index = self.index_of(key)?;
        self.instances[index].pop_sub_step_mode(&mut self.shared_player);
        Ok(())
    }

    /// Advance one frame: the shared timeline first, then every instance
    /// in reverse roster order.
    ///
    /// An instance that hits an invariant violation stops for this frame;
    /// the others still run and the first error is returned.
    pub fn tick(
        &mut self,
        delta_seconds: f32,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<(), MachineError> {
        let mut first_error = None;
        {
            let (instances, mut ctx) = self.split(host, world);
            for instance in instances.iter_mut() {
                instance.tick_shared_timeline(delta_seconds, &mut ctx);
            }
            for instance in instances.iter_mut().rev() {
                if let Err(err) = instance.tick(delta_seconds, &mut ctx) {
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Err(err) = self.reap_transients(host, world) {
            first_error.get_or_insert(err);
        }
        first_error.map_or(Ok(()), Err)
    }

    // Network

    /// Apply a message delivered by the transport.
    ///
    /// Messages addressed to the other side, and messages for instances
    /// that no longer exist, are dropped.
    pub fn handle_message(
        &mut self,
        message: ActionMessage,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<(), MachineError> {
        let role = host.role();
        let routed = if message.is_to_authority() {
            role.has_authority()
        } else if matches!(message, ActionMessage::AbortBroadcast { .. }) {
            !role.has_authority()
        } else {
            role.is_predicting()
        };
        if !routed {
            debug!(instance = %message.instance(), ?role, "dropping misrouted message");
            return Ok(());
        }

        if let ActionMessage::PlayActionToAuthority { instance, entry } = &message {
            return self.play_action(instance, entry.as_deref(), host, world).map(|_| ());
        }
        if let ActionMessage::EnterConfirmed { instance, .. } = &message {
            if self.find(instance).is_none() {
                self.insert_instance(instance.clone(), false, host, world)?;
            }
        }

        let Ok(index) = self.index_of(message.instance()) else {
            debug!(instance = %message.instance(), "dropping message for unknown instance");
            return Ok(());
        };
        {
            let (instances, mut ctx) = self.split(host, world);
            let instance = &mut instances[index];
            match message {
                ActionMessage::ProposeTransition {
                    seq,
                    from,
                    to,
                    condition,
                    ..
                } => instance.handle_propose(seq, from, to, condition.as_deref(), &mut ctx)?,
                ActionMessage::FinishToAuthority { seq, segment, .. } => {
                    instance.handle_finish(seq, segment, &mut ctx)?
                }
                ActionMessage::AbortToAuthority { seq, .. } => instance.handle_abort_request(seq, &mut ctx)?,
                ActionMessage::TransitionFailed {
                    ack,
                    restore,
                    resync_seconds,
                    ..
                } => instance.on_transition_failed(ack, restore, resync_seconds, &mut ctx)?,
                ActionMessage::Cancel { ack, segment, .. } => instance.on_cancel(ack, segment, &mut ctx)?,
                ActionMessage::EnterConfirmed { ack, segment, .. } => {
                    instance.on_enter_confirmed(ack, segment, &mut ctx)?
                }
                ActionMessage::AbortBroadcast { ack, .. } => instance.on_abort_broadcast(ack, &mut ctx)?,
                ActionMessage::PlayActionToAuthority { .. } => {}
            }
        }
        self.reap_transients(host, world)
    }

    /// State the authority publishes to every remote copy.
    pub fn replicate(&self) -> ComponentReplication {
        ComponentReplication {
            instances: self
                .instances
                .iter()
                .map(|instance| InstanceReplication {
                    type_key: instance.key().clone(),
                    active: instance.active_segment(),
                    timeline: instance.own_timeline_props(),
                })
                .collect(),
            shared_timeline: self
                .shared_player_active_action()
                .map(|_| self.shared_player.net_sync_props()),
        }
    }

    /// Apply replicated state on a remote copy.
    ///
    /// The roster is mirrored on every remote. Active segments and timeline
    /// playback are only applied by observers; the owning client predicts
    /// those itself and is corrected through messages.
    pub fn apply_replication(
        &mut self,
        state: &ComponentReplication,
        host: &dyn ActionHost,
        world: &mut dyn SpawnWorld,
    ) -> Result<(), MachineError> {
        let role = host.role();
        if role.has_authority() {
            debug!("authority ignores replicated state");
            return Ok(());
        }
        let mut first_error = None;

        {
            let (instances, mut ctx) = self.split(host, world);
            let mut index = instances.len();
            while index > 0 {
                index -= 1;
                if !state.contains(instances[index].key()) {
                    if let Err(err) = instances.remove(index).destruct(&mut ctx) {
                        first_error.get_or_insert(err);
                    }
                }
            }
        }

        for replicated in &state.instances {
            if self.find(&replicated.type_key).is_some() {
                continue;
            }
            if let Err(err) = self.insert_instance(replicated.type_key.clone(), false, host, world) {
                warn!(instance = %replicated.type_key, error = %err, "cannot mirror replicated instance");
                first_error.get_or_insert(err);
            }
        }

        if role.is_observer() {
            let (instances, mut ctx) = self.split(host, world);
            for replicated in &state.instances {
                let Some(instance) = instances
                    .iter_mut()
                    .find(|instance| instance.key() == &replicated.type_key)
                else {
                    continue;
                };
                if let Err(err) = instance.apply_replicated_active(replicated.active, &mut ctx) {
                    first_error.get_or_insert(err);
                    continue;
                }
                if let Some(props) = &replicated.timeline {
                    instance.apply_net_sync(props, &mut ctx);
                }
            }
            if let Some(props) = &state.shared_timeline {
                for instance in instances.iter_mut() {
                    instance.apply_shared_net_sync(props, &mut ctx);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    // Introspection

    pub fn is_any_action_active(&self) -> bool {
        self.instances.iter().any(ActionInstance::is_active)
    }

    pub fn active_segment(&self, key: &ActionTypeKey) -> Option<SegmentId> {
        self.find(key).and_then(ActionInstance::active_segment)
    }

    pub fn active_segment_name(&self, key: &ActionTypeKey) -> Option<&str> {
        self.find(key).and_then(ActionInstance::active_segment_name)
    }

    /// Position of the active segment's timeline, in seconds.
    pub fn timeline_seconds(&self, key: &ActionTypeKey) -> Option<f64> {
        self.find(key)
            .and_then(|instance| instance.timeline_seconds(&self.shared_player))
    }

    /// Events that would currently take a transition, for debug tooling.
    pub fn eligible_events(&self, key: &ActionTypeKey) -> Vec<String> {
        self.find(key)
            .map(|instance| instance.eligible_events(&self.shared_player))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> ComponentSnapshot {
        ComponentSnapshot::capture(self)
    }
}

impl std::fmt::Debug for ActionComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionComponent")
            .field("instances", &self.instances)
            .field("shared_player", &self.shared_player.binding())
            .field("outbox", &self.outbox.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{ActionTypeBuilder, SegmentBuilder};
    use crate::core::{NetRole, ObjectId};
    use crate::machine::SequenceAsset;
    use crate::spawn::{SpawnError, SpawnTemplate, Transform};
    use crate::timeline::{EndAction, FrameRange, FrameRate, TrackData};

    struct Host(NetRole);

    impl ActionHost for Host {
        fn role(&self) -> NetRole {
            self.0
        }

        fn now_seconds(&self) -> f64 {
            10.0
        }
    }

    struct NoWorld;

    impl SpawnWorld for NoWorld {
        fn spawn(&mut self, template: &SpawnTemplate, _: Transform) -> Result<ObjectId, SpawnError> {
            Err(SpawnError::UnknownTemplate(template.id.clone()))
        }

        fn destroy(&mut self, _: ObjectId) {}

        fn destroy_after(&mut self, _: ObjectId, _: f32) {}

        fn is_alive(&self, _: ObjectId) -> bool {
            false
        }
    }

    fn one_second() -> SequenceAsset {
        SequenceAsset::new(
            TrackData::new(FrameRate::new(10.0), FrameRange::new(0, 10)),
            EndAction::Stop,
        )
    }

    fn catalog() -> Arc<ActionCatalog> {
        let attack = ActionTypeBuilder::new("Attack")
            .segment(SegmentBuilder::new("Swing").sequence(one_second()))
            .entry(DEFAULT_ENTRY, "Swing")
            .build()
            .unwrap();
        let emote = ActionTypeBuilder::new("Emote")
            .segment(SegmentBuilder::new("Wave").sequence(one_second()))
            .entry(DEFAULT_ENTRY, "Wave")
            .shared_timeline()
            .build()
            .unwrap();
        let taunt = ActionTypeBuilder::new("Taunt")
            .segment(SegmentBuilder::new("Shout").sequence(one_second()))
            .entry(DEFAULT_ENTRY, "Shout")
            .shared_timeline()
            .build()
            .unwrap();
        Arc::new(
            ActionCatalog::new()
                .with_default(attack)
                .with(emote)
                .with(taunt),
        )
    }

    fn component() -> ActionComponent {
        ActionComponent::new(catalog(), ActionConfig::default())
    }

    #[test]
    fn start_adds_defaults_on_the_authority_only() {
        let mut server = component();
        server.start(&Host(NetRole::Authority), &mut NoWorld).unwrap();
        assert!(server.find(&"Attack".into()).is_some());

        let mut client = component();
        client.start(&Host(NetRole::AutonomousProxy), &mut NoWorld).unwrap();
        assert!(client.instances().is_empty());
    }

    #[test]
    fn roster_operations_are_checked() {
        let host = Host(NetRole::Authority);
        let mut server = component();
        server.start(&host, &mut NoWorld).unwrap();

        assert_eq!(
            server.add_action(&"Attack".into(), &host, &mut NoWorld),
            Err(MachineError::DuplicateInstance("Attack".into()))
        );
        assert_eq!(
            server.add_action(&"Missing".into(), &host, &mut NoWorld),
            Err(MachineError::UnknownActionType("Missing".into()))
        );
        assert_eq!(
            component().add_action(&"Attack".into(), &Host(NetRole::SimulatedProxy), &mut NoWorld),
            Err(MachineError::NotAuthority)
        );

        server.remove_action(&"Attack".into(), &host, &mut NoWorld).unwrap();
        assert!(server.instances().is_empty());
        let events = server.drain_events();
        assert!(matches!(events.last(), Some(ActionEvent::InstanceDestructed { .. })));
    }

    #[test]
    fn play_action_reaps_transient_instance_after_finish() {
        let host = Host(NetRole::Standalone);
        let mut component = component();
        let key = ActionTypeKey::new("Emote");

        assert!(component.play_action(&key, None, &host, &mut NoWorld).unwrap());
        assert!(component.find(&key).unwrap().is_transient());
        assert_eq!(component.shared_player_active_action(), Some(&key));

        component.tick(1.5, &host, &mut NoWorld).unwrap();

        assert!(component.find(&key).is_none());
        assert!(!component.is_any_action_active());
    }

    #[test]
    fn shared_timeline_is_exclusive() {
        let host = Host(NetRole::Standalone);
        let mut component = component();

        assert!(component.play_action(&"Emote".into(), None, &host, &mut NoWorld).unwrap());
        assert!(!component.play_action(&"Taunt".into(), None, &host, &mut NoWorld).unwrap());
        assert!(component.find(&"Taunt".into()).is_none());

        assert!(component.abort_shared_player_action(&host, &mut NoWorld).unwrap());
        assert!(component.play_action(&"Taunt".into(), None, &host, &mut NoWorld).unwrap());
        assert_eq!(component.shared_player_active_action(), Some(&"Taunt".into()));
    }

    #[test]
    fn client_play_action_asks_the_authority() {
        let mut client = component();
        let started = client
            .play_action(&"Emote".into(), Some("Default"), &Host(NetRole::AutonomousProxy), &mut NoWorld)
            .unwrap();

        assert!(!started);
        let sent = client.drain_outbox();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, Recipient::Authority);
        assert!(matches!(sent[0].message, ActionMessage::PlayActionToAuthority { .. }));
    }

    #[test]
    fn misrouted_messages_are_dropped() {
        let host = Host(NetRole::SimulatedProxy);
        let mut observer = component();
        let message = ActionMessage::EnterConfirmed {
            instance: "Attack".into(),
            ack: 0,
            segment: SegmentId(0),
        };

        observer.handle_message(message, &host, &mut NoWorld).unwrap();

        assert!(observer.instances().is_empty());
    }

    #[test]
    fn owning_client_mirrors_roster_but_not_active_segments() {
        let server_host = Host(NetRole::Authority);
        let mut server = component();
        server.start(&server_host, &mut NoWorld).unwrap();
        server
            .try_start_entry(&"Attack".into(), DEFAULT_ENTRY, &server_host, &mut NoWorld)
            .unwrap();
        let state = server.replicate();

        let mut owner = component();
        owner
            .apply_replication(&state, &Host(NetRole::AutonomousProxy), &mut NoWorld)
            .unwrap();
        let mut observer = component();
        observer
            .apply_replication(&state, &Host(NetRole::SimulatedProxy), &mut NoWorld)
            .unwrap();

        assert!(owner.find(&"Attack".into()).is_some());
        assert_eq!(owner.active_segment(&"Attack".into()), None);
        assert_eq!(observer.active_segment_name(&"Attack".into()), Some("Swing"));
    }
}
