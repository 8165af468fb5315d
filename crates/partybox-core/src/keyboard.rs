//! Mixer keyboard shortcuts
//!
//! Bindings are lists of key names per action, stored in the `keybindings`
//! section of the config file. Key names follow the browser/iced naming
//! loosely: `"Space"`, `"Up"`, `"Left"`, single characters like `"m"`.
//! Letters match case-insensitively, and the DOM forms `"ArrowUp"`,
//! `"KeyM"` and `" "` are accepted too.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::audio::AudioBackend;
use crate::playback::PlaybackCoordinator;

/// Mixer action reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    /// Play/pause the active (or most recently active) category
    TogglePlay,
    VolumeUp,
    VolumeDown,
    SeekBackward,
    SeekForward,
    /// Mute, or restore the last audible global volume
    ToggleMute,
    /// Toggle looping of the active category
    ToggleLoop,
}

/// What currently holds keyboard focus in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Page,
    /// A text field; shortcuts are suppressed so typing works
    TextInput,
}

/// Mixer keybindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub play_pause: Vec<String>,
    pub volume_up: Vec<String>,
    pub volume_down: Vec<String>,
    pub seek_backward: Vec<String>,
    pub seek_forward: Vec<String>,
    pub toggle_mute: Vec<String>,
    pub toggle_loop: Vec<String>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            play_pause: vec!["Space".into()],
            volume_up: vec!["Up".into()],
            volume_down: vec!["Down".into()],
            seek_backward: vec!["Left".into()],
            seek_forward: vec!["Right".into()],
            toggle_mute: vec!["m".into()],
            toggle_loop: vec!["l".into()],
        }
    }
}

impl KeybindingsConfig {
    /// Find the action bound to `key`, if any
    pub fn resolve(&self, key: &str) -> Option<Shortcut> {
        let key = normalize_key(key);
        if key.is_empty() {
            return None;
        }
        let bindings = [
            (&self.play_pause, Shortcut::TogglePlay),
            (&self.volume_up, Shortcut::VolumeUp),
            (&self.volume_down, Shortcut::VolumeDown),
            (&self.seek_backward, Shortcut::SeekBackward),
            (&self.seek_forward, Shortcut::SeekForward),
            (&self.toggle_mute, Shortcut::ToggleMute),
            (&self.toggle_loop, Shortcut::ToggleLoop),
        ];
        bindings
            .iter()
            .find(|(keys, _)| keys.iter().any(|k| normalize_key(k) == key))
            .map(|(_, shortcut)| *shortcut)
    }
}

/// Canonical form of a key name for matching
pub fn normalize_key(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    let trimmed = key.trim();
    let name = trimmed.strip_prefix("Arrow").unwrap_or(trimmed);
    let name = match name.strip_prefix("Key") {
        Some(letter) if letter.chars().count() == 1 => letter,
        _ => name,
    };
    name.to_lowercase()
}

/// Keyboard input surface for the mixer
#[derive(Debug, Clone, Default)]
pub struct KeyboardSurface {
    pub bindings: KeybindingsConfig,
}

impl KeyboardSurface {
    pub fn new(bindings: KeybindingsConfig) -> Self {
        Self { bindings }
    }

    /// Route a key press to the coordinator
    ///
    /// Returns the shortcut that was applied, or `None` when the key is
    /// unbound, a text field has focus, or the shortcut had nothing to act
    /// on (e.g. seeking with no active category).
    pub fn handle<B: AudioBackend>(
        &self,
        coordinator: &mut PlaybackCoordinator<B>,
        key: &str,
        focus: FocusTarget,
        now: Instant,
    ) -> Option<Shortcut> {
        if focus == FocusTarget::TextInput {
            return None;
        }
        let shortcut = self.bindings.resolve(key)?;
        log::debug!("handle: '{}' -> {:?}", key, shortcut);
        coordinator.apply_shortcut(shortcut, now).map(|_| shortcut)
    }
}
