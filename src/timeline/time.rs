//! Frame arithmetic for timelines.
//!
//! Positions are fractional frames at the track's display rate; authored
//! events sit on whole frames.

use serde::{Deserialize, Serialize};

/// Display rate of a track in frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRate(f64);

impl FrameRate {
    pub fn new(fps: f64) -> Self {
        Self(fps)
    }

    pub fn fps(self) -> f64 {
        self.0
    }

    pub fn to_frames(self, seconds: f64) -> f64 {
        seconds * self.0
    }

    pub fn to_seconds(self, frames: f64) -> f64 {
        if self.0 == 0.0 {
            0.0
        } else {
            frames / self.0
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(60.0)
    }
}

/// Half-open playback range `[start, end)` in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i32,
    pub end: i32,
}

impl FrameRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn duration(self) -> i32 {
        self.end - self.start
    }

    /// Last frame playback may rest on.
    pub fn last_valid(self) -> i32 {
        self.end - 1
    }

    pub fn contains(self, frame: i32) -> bool {
        frame >= self.start && frame < self.end
    }

    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

/// Frames crossed by one cursor move.
///
/// The origin of the move is excluded once the cursor has already been
/// evaluated there, so consecutive sweeps partition the timeline and no
/// frame is reported twice.
///
/// # Example
///
/// ```rust
/// use actionline::timeline::SweptRange;
///
/// let first = SweptRange::inclusive(0.0, 2.5);
/// let next = SweptRange::exclusive(2.5, 4.0);
///
/// assert!(first.contains(0) && first.contains(2));
/// assert!(!next.contains(2) && next.contains(3) && next.contains(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptRange {
    from: f64,
    to: f64,
    include_from: bool,
}

impl SweptRange {
    pub fn inclusive(from: f64, to: f64) -> Self {
        Self {
            from,
            to,
            include_from: true,
        }
    }

    pub fn exclusive(from: f64, to: f64) -> Self {
        Self {
            from,
            to,
            include_from: false,
        }
    }

    /// A non-moving evaluation at a single position.
    pub fn point(at: f64) -> Self {
        Self::inclusive(at, at)
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn is_forwards(&self) -> bool {
        self.to >= self.from
    }

    /// Frames covered, regardless of direction.
    pub fn span(&self) -> f64 {
        (self.to - self.from).abs()
    }

    pub fn contains(&self, frame: i32) -> bool {
        let frame = frame as f64;
        if self.is_forwards() {
            let after_origin = if self.include_from {
                frame >= self.from
            } else {
                frame > self.from
            };
            after_origin && frame <= self.to
        } else {
            let after_origin = if self.include_from {
                frame <= self.from
            } else {
                frame < self.from
            };
            after_origin && frame >= self.to
        }
    }
}
