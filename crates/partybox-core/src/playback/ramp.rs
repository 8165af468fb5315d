//! Volume ramps
//!
//! Fades move linearly in discrete steps (`fade_step`, 50 ms by default)
//! so the volume only changes on step boundaries, the way a repeating
//! timer would apply it. A ramp is plain owned state: replacing or
//! dropping it cancels the fade.

use std::time::{Duration, Instant};

/// Direction of a fade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampKind {
    /// From the starting volume up to the effective target
    FadeIn,
    /// From the starting volume down to silence
    FadeOut,
}

/// A running fade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub kind: RampKind,
    pub started_at: Instant,
    /// Volume when the ramp started
    pub from: f32,
    pub duration: Duration,
    pub step: Duration,
}

impl Ramp {
    pub fn fade_in(started_at: Instant, duration: Duration, step: Duration) -> Self {
        Self {
            kind: RampKind::FadeIn,
            started_at,
            from: 0.0,
            duration,
            step,
        }
    }

    pub fn fade_out(started_at: Instant, from: f32, duration: Duration, step: Duration) -> Self {
        Self {
            kind: RampKind::FadeOut,
            started_at,
            from,
            duration,
            step,
        }
    }

    fn total_steps(&self) -> u128 {
        let step = self.step.as_nanos();
        if step == 0 {
            return 1;
        }
        self.duration.as_nanos().div_ceil(step).max(1)
    }

    /// Completed fraction in [0, 1], quantized to whole steps
    pub fn fraction(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let total = self.total_steps();
        let step = self.step.as_nanos();
        let done = if step == 0 {
            total
        } else {
            now.saturating_duration_since(self.started_at).as_nanos() / step
        };
        done.min(total) as f32 / total as f32
    }

    /// Volume to apply at `now`, given the effective target volume
    ///
    /// The target is re-read on every step so a volume change during a
    /// fade-in is picked up by the remaining steps.
    pub fn volume_at(&self, now: Instant, target: f32) -> f32 {
        let fraction = self.fraction(now);
        match self.kind {
            RampKind::FadeIn => self.from + (target - self.from) * fraction,
            RampKind::FadeOut => self.from * (1.0 - fraction),
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.fraction(now) >= 1.0
    }
}
