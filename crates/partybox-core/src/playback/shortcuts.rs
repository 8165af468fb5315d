//! Keyboard shortcut actions
//!
//! Every applied shortcut shows a short feedback text that clears itself
//! after the configured feedback duration. Shortcuts that need an active
//! category do nothing when there is none.

use std::time::Instant;

use crate::audio::AudioBackend;
use crate::keyboard::Shortcut;

use super::PlaybackCoordinator;

impl<B: AudioBackend> PlaybackCoordinator<B> {
    /// Apply a shortcut, returning the feedback text when it did something
    pub fn apply_shortcut(&mut self, shortcut: Shortcut, now: Instant) -> Option<String> {
        let feedback = match shortcut {
            Shortcut::TogglePlay => self.shortcut_toggle_play(now),
            Shortcut::VolumeUp => Some(self.shortcut_step_volume(true)),
            Shortcut::VolumeDown => Some(self.shortcut_step_volume(false)),
            Shortcut::SeekBackward => self.shortcut_seek(-self.seek_step),
            Shortcut::SeekForward => self.shortcut_seek(self.seek_step),
            Shortcut::ToggleMute => Some(self.shortcut_toggle_mute()),
            Shortcut::ToggleLoop => self.shortcut_toggle_loop(),
        }?;
        self.show_feedback(feedback.clone(), now);
        Some(feedback)
    }

    fn shortcut_toggle_play(&mut self, now: Instant) -> Option<String> {
        let key = self.active.or(self.last_active)?;
        self.toggle_play(key, now).ok()?;
        let title = &self.players[key.index()].title;
        let text = if self.active == Some(key) && !self.players[key.index()].fading_out() {
            format!("Playing: {}", title)
        } else {
            format!("Paused: {}", title)
        };
        Some(text)
    }

    fn shortcut_step_volume(&mut self, up: bool) -> String {
        let step = self.volume_step_percent as i32;
        let current = (self.global_volume * 100.0).round() as i32;
        let next = if up { current + step } else { current - step }.clamp(0, 100);
        self.set_global_volume(next as f32 / 100.0);
        format!("Volume: {}%", next)
    }

    fn shortcut_seek(&mut self, delta: f64) -> Option<String> {
        let key = self.active?;
        self.seek_by(key, delta).ok()?;
        Some(if delta < 0.0 {
            format!("Rewind {}s", delta.abs())
        } else {
            format!("Forward {}s", delta)
        })
    }

    fn shortcut_toggle_mute(&mut self) -> String {
        if self.global_volume > 0.0 {
            self.set_global_volume(0.0);
            "Muted".to_string()
        } else {
            let restore = self.last_audible_volume.unwrap_or(self.unmute_fallback);
            self.set_global_volume(restore);
            format!("Volume: {}%", (self.global_volume * 100.0).round() as i32)
        }
    }

    fn shortcut_toggle_loop(&mut self) -> Option<String> {
        let key = self.active?;
        let enabled = !self.players[key.index()].loop_enabled;
        self.set_loop_enabled(key, enabled).ok()?;
        Some(format!("Loop {}", if enabled { "on" } else { "off" }))
    }
}
