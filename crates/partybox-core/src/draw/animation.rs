//! Reel deceleration
//!
//! The reel scrolls from offset 0 to the offset that centers the winner,
//! following an ease-out curve over the spin duration. The host advances
//! it once per frame; each frame reports the new offset and, when the reel
//! moved into a new entry, a crossing for the tick sound cue.
//!
//! Crossing cues thin out as the reel slows down:
//! - `intensity = max(0.1, 1 - 0.7 * progress)`
//! - at most one cue per `50ms / intensity`
//! - no cues once progress reaches 0.9

use std::time::{Duration, Instant};

use super::reel::{Reel, ReelLayout};

/// Minimum gap between crossing cues at full speed
pub const CROSSING_BASE_INTERVAL: Duration = Duration::from_millis(50);

/// Progress after which crossing cues are suppressed
pub const CROSSING_CUTOFF: f32 = 0.9;

/// Per-frame movement (in pixels) below which crossings are not cued
const MIN_CUE_SPEED: f32 = 1.0;

/// Ease-out curve mapping linear progress to travelled distance
pub fn ease_out(progress: f32) -> f32 {
    1.0 - (1.0 - progress.clamp(0.0, 1.0)).powf(2.5)
}

/// Relative speed/volume hint for a crossing cue
pub fn crossing_intensity(progress: f32) -> f32 {
    (1.0 - progress * 0.7).max(0.1)
}

/// A crossing cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Entry the reel just moved into
    pub entry_index: usize,
    /// Relative speed in (0, 1]
    pub intensity: f32,
}

/// Result of advancing the animation by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    pub offset: f32,
    pub progress: f32,
    pub crossing: Option<Crossing>,
    /// The reel has stopped and the settle delay has elapsed
    pub settled: bool,
}

/// Time-sliced reel animation
#[derive(Debug, Clone)]
pub struct ReelAnimation {
    started_at: Instant,
    duration: Duration,
    settle: Duration,
    target_offset: f32,
    item_height: f32,
    offset: f32,
    last_item: Option<usize>,
    last_cue_at: Option<Instant>,
}

impl ReelAnimation {
    pub fn new(
        started_at: Instant,
        duration: Duration,
        settle: Duration,
        target_offset: f32,
        item_height: f32,
    ) -> Self {
        Self {
            started_at,
            duration,
            settle,
            target_offset,
            item_height,
            offset: 0.0,
            last_item: None,
            last_cue_at: None,
        }
    }

    /// Animation that stops with the reel's winner centered
    pub fn for_reel(
        reel: &Reel,
        layout: &ReelLayout,
        started_at: Instant,
        duration: Duration,
        settle: Duration,
    ) -> Self {
        Self::new(
            started_at,
            duration,
            settle,
            layout.offset_for(reel.winner_index),
            layout.item_height,
        )
    }

    /// Linear progress in [0, 1]
    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn target_offset(&self) -> f32 {
        self.target_offset
    }

    /// Advance to `now` and report the frame
    pub fn advance(&mut self, now: Instant) -> FrameUpdate {
        let progress = self.progress_at(now);
        let offset = if progress < 1.0 {
            self.target_offset * ease_out(progress)
        } else {
            self.target_offset
        };
        let speed = (offset - self.offset).abs();
        self.offset = offset;

        let mut crossing = None;
        if self.item_height > 0.0 {
            let item = (offset.abs() / self.item_height).floor() as usize;
            if self.last_item != Some(item) && speed > MIN_CUE_SPEED {
                let intensity = crossing_intensity(progress);
                let min_gap = CROSSING_BASE_INTERVAL.div_f32(intensity);
                let due = self
                    .last_cue_at
                    .map_or(true, |at| now.saturating_duration_since(at) > min_gap);
                if due && progress < CROSSING_CUTOFF {
                    crossing = Some(Crossing {
                        entry_index: item,
                        intensity,
                    });
                    self.last_cue_at = Some(now);
                }
                self.last_item = Some(item);
            }
        }

        let settled = now.saturating_duration_since(self.started_at) >= self.duration + self.settle;
        FrameUpdate {
            offset,
            progress,
            crossing,
            settled,
        }
    }
}
