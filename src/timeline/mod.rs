//! Frame-locked sequence playback.
//!
//! A [`SequencePlayer`] moves a cursor over a [`TrackData`] and reports the
//! key events, state events and loop or finish notifications it produced.
//! Remote observers converge on the authority's playback through
//! [`plan_sync`].

pub mod netsync;
pub mod player;
pub mod time;
pub mod track;

pub use netsync::{plan_sync, CursorFix, NetSyncProps, SyncPlan, SyncTolerance};
pub use player::{EndAction, PlaybackStatus, PlayerBinding, SequencePlayer, TimelineEvent};
pub use time::{FrameRange, FrameRate, SweptRange};
pub use track::{KeyEvent, SpawnKey, SpawnTrack, StateEvent, TrackData};
