//! Timeline time synchronisation for remote observers.
//!
//! The authority publishes its (status, position, loop count) triple; an
//! observer compares it with its own and decides how to correct. The
//! decision is a pure function so it can be reasoned about in isolation;
//! the player applies the resulting plan.

use super::player::PlaybackStatus;
use serde::{Deserialize, Serialize};

/// Replicated playback state of a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetSyncProps {
    pub status: PlaybackStatus,
    /// Cursor position in frames.
    pub position: f64,
    pub loops: u32,
}

impl Default for NetSyncProps {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            position: 0.0,
            loops: 0,
        }
    }
}

/// Cursor correction an observer should perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorFix {
    /// Sweep forward to the frame, firing events on the way.
    PlayTo(f64),
    /// Teleport without firing events.
    JumpTo(f64),
    ScrubTo(f64),
}

/// Result of comparing local playback with the authority's.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SyncPlan {
    /// Begin playing before applying `cursor`.
    pub start_playing: bool,
    pub cursor: Option<CursorFix>,
    /// Status to adopt after the cursor fix.
    pub status: Option<PlaybackStatus>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        !self.start_playing && self.cursor.is_none() && self.status.is_none()
    }
}

/// Inputs that describe how far apart two timelines may drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncTolerance {
    /// Estimated latency expressed in frames of sequence time, signed by
    /// play direction.
    pub lag_frames: f64,
    /// Allowed divergence in frames.
    pub threshold_frames: f64,
    /// Length of one loop in frames.
    pub loop_frames: f64,
}

/// Decide how an observer at `local` catches up with the authority at `server`.
///
/// # Example
///
/// ```rust
/// use actionline::timeline::{plan_sync, CursorFix, NetSyncProps, PlaybackStatus, SyncTolerance};
///
/// let local = NetSyncProps { status: PlaybackStatus::Playing, position: 10.0, loops: 0 };
/// let server = NetSyncProps { status: PlaybackStatus::Playing, position: 40.0, loops: 0 };
/// let tolerance = SyncTolerance { lag_frames: 6.0, threshold_frames: 12.0, loop_frames: 120.0 };
///
/// let plan = plan_sync(&local, &server, tolerance);
/// assert_eq!(plan.cursor, Some(CursorFix::PlayTo(46.0)));
/// ```
pub fn plan_sync(local: &NetSyncProps, server: &NetSyncProps, tolerance: SyncTolerance) -> SyncPlan {
    let mut plan = SyncPlan::default();
    let status_changed = local.status != server.status;
    let time_changed = local.position != server.position;
    if !status_changed && !time_changed {
        return plan;
    }

    let corrected = server.position + tolerance.lag_frames;
    let forwards = tolerance.lag_frames >= 0.0;

    if server.status == PlaybackStatus::Playing && local.status != PlaybackStatus::Playing {
        plan.start_playing = true;
        if (local.position - corrected).abs() > tolerance.threshold_frames {
            plan.cursor = Some(CursorFix::PlayTo(corrected));
        }
        return plan;
    }

    if time_changed {
        match local.status {
            PlaybackStatus::Playing => {
                let loop_offset = f64::from(server.loops) - f64::from(local.loops);
                let direction = if forwards { 1.0 } else { -1.0 };
                let offset_server = corrected + tolerance.loop_frames * loop_offset * direction;
                let difference = (local.position - offset_server).abs();

                if status_changed {
                    plan.cursor = Some(CursorFix::PlayTo(corrected));
                } else if difference > tolerance.threshold_frames + tolerance.lag_frames.abs() {
                    let server_ahead = if forwards {
                        offset_server > local.position
                    } else {
                        offset_server < local.position
                    };
                    plan.cursor = Some(if server_ahead {
                        CursorFix::PlayTo(corrected)
                    } else {
                        CursorFix::JumpTo(corrected)
                    });
                }
            }
            PlaybackStatus::Scrubbing => {
                plan.cursor = Some(CursorFix::ScrubTo(server.position));
            }
            PlaybackStatus::Stopped | PlaybackStatus::Paused => {}
        }
    }

    if status_changed && server.status != PlaybackStatus::Stopped {
        plan.status = Some(server.status);
    }
    plan
}
