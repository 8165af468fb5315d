//! Per-category player state

use crate::audio::AudioResource;
use crate::types::{CategoryKey, Track};

use super::ramp::{Ramp, RampKind};

/// Mutable playback state of one category
///
/// Created once per category when the coordinator is built and kept for
/// its whole lifetime. `epoch` is bumped whenever an operation supersedes
/// whatever was scheduled for this player, so a parked start carrying an
/// older epoch is discarded instead of fired.
pub(crate) struct PlayerState {
    pub key: CategoryKey,
    pub title: String,
    pub tracks: Vec<Track>,
    pub current_track_index: usize,
    pub playing: bool,
    /// Own volume in [0, 1], before the global volume is applied
    pub volume: f32,
    pub loop_enabled: bool,
    pub fade_in_enabled: bool,
    pub fade_out_enabled: bool,
    pub audio: Option<Box<dyn AudioResource>>,
    pub ramp: Option<Ramp>,
    pub epoch: u64,
}

impl PlayerState {
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current_track_index)
    }

    pub fn fading_out(&self) -> bool {
        matches!(self.ramp, Some(Ramp { kind: RampKind::FadeOut, .. }))
    }

    pub fn current_time(&self) -> f64 {
        self.audio.as_ref().map_or(0.0, |a| a.current_time())
    }

    pub fn duration(&self) -> Option<f64> {
        self.audio.as_ref().and_then(|a| a.duration())
    }

    pub fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            key: self.key,
            title: self.title.clone(),
            current_track_index: self.current_track_index,
            track_title: self.current_track().map(|t| t.title.clone()),
            playing: self.playing,
            volume: self.volume,
            loop_enabled: self.loop_enabled,
            fade_in_enabled: self.fade_in_enabled,
            fade_out_enabled: self.fade_out_enabled,
            fading: self.ramp.map(|r| r.kind),
            current_time: self.current_time(),
            duration: self.duration(),
            loaded: self.audio.is_some(),
        }
    }
}

/// Read-only view of a category's player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub key: CategoryKey,
    pub title: String,
    pub current_track_index: usize,
    pub track_title: Option<String>,
    pub playing: bool,
    pub volume: f32,
    pub loop_enabled: bool,
    pub fade_in_enabled: bool,
    pub fade_out_enabled: bool,
    /// Direction of the fade in progress, if any
    pub fading: Option<RampKind>,
    pub current_time: f64,
    pub duration: Option<f64>,
    /// Whether the current track has a loaded audio resource
    pub loaded: bool,
}
