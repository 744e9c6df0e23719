//! Actionline: networked action state machines driven by timelines
//!
//! Actionline runs gameplay actions such as attacks, dodges or emotes as
//! small state machines. Each action instance has at most one active
//! segment; segments move through ordered, condition-gated transitions and
//! may play a timeline that fires key events, state events and spawns
//! objects into the game world.
//!
//! # Core Concepts
//!
//! - **Segments and transitions**: tick transitions are evaluated every
//!   frame, event transitions on demand, entry points start a dormant
//!   instance. The first eligible transition in declaration order wins.
//! - **Prediction and reconciliation**: the locally controlled client takes
//!   transitions immediately and proposes them to the authority, which
//!   confirms or corrects them through [`net::ActionMessage`]s.
//! - **Timelines**: a [`timeline::SequencePlayer`] advances a frame cursor
//!   with stop, loop and pause end actions and an optional sub-stepped
//!   update for long frames.
//! - **Spawns**: spawn tracks create and destroy objects through the
//!   [`spawn::SpawnWorld`] collaborator under an ownership policy.
//!
//! # Example
//!
//! ```rust
//! use actionline::builder::{ActionTypeBuilder, SegmentBuilder};
//! use actionline::core::{ActionTypeKey, NetRole, ObjectId};
//! use actionline::machine::{ActionCatalog, ActionComponent, ActionHost, SequenceAsset};
//! use actionline::spawn::{SpawnError, SpawnTemplate, SpawnWorld, Transform};
//! use actionline::timeline::{EndAction, FrameRange, FrameRate, KeyEvent, TrackData};
//! use actionline::{conditions, ActionConfig};
//! use std::sync::Arc;
//!
//! struct Player;
//! impl ActionHost for Player {
//!     fn role(&self) -> NetRole { NetRole::Standalone }
//!     fn now_seconds(&self) -> f64 { 0.0 }
//! }
//!
//! struct World;
//! impl SpawnWorld for World {
//!     fn spawn(&mut self, t: &SpawnTemplate, _: Transform) -> Result<ObjectId, SpawnError> {
//!         Err(SpawnError::UnknownTemplate(t.id.clone()))
//!     }
//!     fn destroy(&mut self, _: ObjectId) {}
//!     fn destroy_after(&mut self, _: ObjectId, _: f32) {}
//!     fn is_alive(&self, _: ObjectId) -> bool { false }
//! }
//!
//! let swing = TrackData::new(FrameRate::new(30.0), FrameRange::new(0, 15))
//!     .with_key_event(KeyEvent::new(5, "Hit"));
//!
//! let attack = ActionTypeBuilder::new("Attack")
//!     .conditions(conditions! {
//!         "LateInSwing" => |source, _| source.and_then(|s| s.time_seconds).unwrap_or(0.0) > 0.2,
//!     })
//!     .segment(
//!         SegmentBuilder::new("Swing")
//!             .sequence(SequenceAsset::new(swing, EndAction::Stop))
//!             .on_event_if("Attack", "Followup", "LateInSwing"),
//!     )
//!     .segment(SegmentBuilder::new("Followup"))
//!     .entry("Default", "Swing")
//!     .build()
//!     .unwrap();
//!
//! let catalog = Arc::new(ActionCatalog::new().with_default(attack));
//! let mut component = ActionComponent::new(catalog, ActionConfig::default());
//! let key = ActionTypeKey::new("Attack");
//!
//! component.start(&Player, &mut World).unwrap();
//! component.try_start_entry(&key, "Default", &Player, &mut World).unwrap();
//!
//! // Too early: the condition rejects the combo.
//! assert!(!component.try_event_transition(&key, "Attack", &Player, &mut World).unwrap());
//!
//! component.tick(0.25, &Player, &mut World).unwrap();
//! assert!(component.try_event_transition(&key, "Attack", &Player, &mut World).unwrap());
//! assert_eq!(component.active_segment_name(&key), Some("Followup"));
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;
pub mod net;
pub mod snapshot;
pub mod spawn;
pub mod timeline;
pub mod validation;

// Re-export commonly used types
pub use builder::{ActionTypeBuilder, BuildError, SegmentBuilder};
pub use config::{ActionConfig, ConfigError};
pub use machine::{ActionCatalog, ActionComponent, ActionEvent, ActionHost, MachineError};
