//! Configuration tree for the draw and mixer engines
//!
//! Stored as YAML, every section falls back to its defaults field by field:
//!
//! ```yaml
//! draw:
//!   lucky_count: 10
//!   spin_duration_ms: 5000
//! mixer:
//!   global_volume: 0.7
//!   fade_duration_ms: 1000
//! keybindings:
//!   toggle_mute: ["m"]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::draw::{ReelLayout, SessionConfig};
use crate::keyboard::KeybindingsConfig;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    /// Lucky draw settings
    pub draw: DrawConfig,
    /// Mixer panel settings
    pub mixer: MixerConfig,
    /// Mixer keyboard shortcuts
    pub keybindings: KeybindingsConfig,
}

/// Lucky draw section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Number of winners per session
    pub lucky_count: usize,
    /// Length of the reel deceleration
    pub spin_duration_ms: u64,
    /// Base volume of the spin sound cues (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Reel construction and geometry
    pub reel: ReelLayout,
    /// Pause after the reel stops before the winner is announced
    pub settle_ms: u64,
    /// Pause between the last announcement and the completion notice
    pub completion_delay_ms: u64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            lucky_count: 10,
            spin_duration_ms: 5000,
            sfx_volume: 0.7,
            reel: ReelLayout::default(),
            settle_ms: 800,
            completion_delay_ms: 2000,
        }
    }
}

impl DrawConfig {
    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_duration_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    /// Session settings as configured, before any command-line override
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            lucky_count: self.lucky_count,
            spin_duration: self.spin_duration(),
        }
    }
}

/// Mixer panel section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Initial global volume (0.0 - 1.0)
    pub global_volume: f32,
    /// Start with the global volume governing every category
    pub global_volume_mode: bool,
    /// Initial per-category volume (0.0 - 1.0)
    pub default_volume: f32,
    /// Length of fade-in and fade-out ramps
    pub fade_duration_ms: u64,
    /// Interval between discrete ramp steps
    pub fade_step_ms: u64,
    /// Initial loop flag for every category
    pub loop_enabled: bool,
    /// Initial fade-in flag for every category
    pub fade_in_enabled: bool,
    /// Initial fade-out flag for every category
    pub fade_out_enabled: bool,
    /// Seek distance of the left/right shortcuts
    pub seek_step_secs: f64,
    /// Global volume change of the up/down shortcuts, in percent
    pub volume_step_percent: u8,
    /// Volume restored by unmute when nothing was remembered, in percent
    pub unmute_fallback_percent: u8,
    /// How long shortcut feedback stays on screen
    pub feedback_ms: u64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            global_volume: 0.7,
            global_volume_mode: true,
            default_volume: 0.7,
            fade_duration_ms: 1000,
            fade_step_ms: 50,
            loop_enabled: false,
            fade_in_enabled: true,
            fade_out_enabled: true,
            seek_step_secs: 10.0,
            volume_step_percent: 5,
            unmute_fallback_percent: 70,
            feedback_ms: 1500,
        }
    }
}

impl MixerConfig {
    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    pub fn fade_step(&self) -> Duration {
        Duration::from_millis(self.fade_step_ms)
    }

    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}
