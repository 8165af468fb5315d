//! Category playback coordinator
//!
//! Owns one [`PlayerState`] per category and enforces that at most one
//! category is audible at a time.
//!
//! # Switching categories
//!
//! ```text
//! play(B) while A plays with fade-out:
//!
//!   t0          A: FadeOut ramp starts     B: parked (epoch e)
//!   t0 + fade   A: paused                  B: started by tick(), FadeIn ramp
//! ```
//!
//! Nothing here sleeps or spawns timers. Fades, parked starts and
//! shortcut feedback are owned state advanced by [`PlaybackCoordinator::tick`];
//! replacing that state is how an operation supersedes an older one.

mod error;
mod events;
mod player;
mod ramp;
mod shortcuts;

pub use error::PlaybackError;
pub use events::{format_time, PlaybackEvent, TransportDisplay};
pub use player::PlayerSnapshot;
pub use ramp::{Ramp, RampKind};

use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;

use crate::audio::{AudioBackend, AudioError};
use crate::config::MixerConfig;
use crate::events::EventBus;
use crate::types::{clamp_volume, Category, CategoryKey};

use player::PlayerState;

/// A start waiting for other categories to finish fading out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingStart {
    key: CategoryKey,
    epoch: u64,
}

/// Single-active-player mixer over a fixed set of categories
pub struct PlaybackCoordinator<B: AudioBackend> {
    backend: B,
    players: Vec<PlayerState>,
    active: Option<CategoryKey>,
    last_active: Option<CategoryKey>,
    /// Category whose track the transport bar currently shows
    displayed: Option<CategoryKey>,
    global_volume: f32,
    global_volume_mode: bool,
    /// Last audible global volume, restored by unmute
    last_audible_volume: Option<f32>,
    fade_duration: Duration,
    fade_step: Duration,
    seek_step: f64,
    volume_step_percent: u8,
    unmute_fallback: f32,
    feedback_duration: Duration,
    feedback_due: Option<Instant>,
    pending: Option<PendingStart>,
    events: EventBus<PlaybackEvent>,
}

impl<B: AudioBackend> PlaybackCoordinator<B> {
    /// Build a coordinator, loading the first track of every category
    ///
    /// Categories are keyed by position: the first one is `CategoryKey(0)`.
    pub fn new(categories: Vec<Category>, backend: B, config: &MixerConfig) -> Self {
        let players = categories
            .into_iter()
            .enumerate()
            .map(|(index, category)| PlayerState {
                key: CategoryKey(index),
                title: category.title,
                tracks: category.tracks,
                current_track_index: 0,
                playing: false,
                volume: clamp_volume(config.default_volume),
                loop_enabled: config.loop_enabled,
                fade_in_enabled: config.fade_in_enabled,
                fade_out_enabled: config.fade_out_enabled,
                audio: None,
                ramp: None,
                epoch: 0,
            })
            .collect();

        let global_volume = clamp_volume(config.global_volume);
        let mut coordinator = Self {
            backend,
            players,
            active: None,
            last_active: None,
            displayed: None,
            global_volume,
            global_volume_mode: config.global_volume_mode,
            last_audible_volume: (global_volume > 0.0).then_some(global_volume),
            fade_duration: config.fade_duration(),
            fade_step: config.fade_step(),
            seek_step: config.seek_step_secs.max(0.0),
            volume_step_percent: config.volume_step_percent.min(100),
            unmute_fallback: clamp_volume(config.unmute_fallback_percent as f32 / 100.0),
            feedback_duration: config.feedback_duration(),
            feedback_due: None,
            pending: None,
            events: EventBus::new(),
        };

        for index in 0..coordinator.players.len() {
            if coordinator.players[index].tracks.is_empty() {
                log::warn!(
                    "new: Category '{}' has no tracks",
                    coordinator.players[index].title
                );
                continue;
            }
            coordinator.load_current_track(index);
        }

        log::info!(
            "new: Coordinator ready with {} categories",
            coordinator.players.len()
        );
        coordinator
    }

    /// Subscribe to playback notifications
    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    fn index_of(&self, key: CategoryKey) -> Result<usize, PlaybackError> {
        if key.index() < self.players.len() {
            Ok(key.index())
        } else {
            Err(PlaybackError::UnknownCategory(key))
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────

    /// Switch a category to another track
    ///
    /// Playback of the category stops first; if it was playing, the new
    /// track starts right away. Audio failures while loading are contained.
    pub fn select_track(
        &mut self,
        key: CategoryKey,
        index: usize,
        now: Instant,
    ) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        let len = self.players[i].tracks.len();
        if index >= len {
            return Err(PlaybackError::TrackOutOfRange {
                category: key,
                index,
                len,
            });
        }

        // A fade-out is a pause in progress, so it does not count as playing
        let fading_out = self.players[i].fading_out();
        let was_playing = (self.players[i].playing && !fading_out) || self.pending_for(key);
        if self.pending_for(key) {
            self.pending = None;
        }
        {
            let player = &mut self.players[i];
            if let Some(audio) = player.audio.as_mut() {
                audio.pause();
            }
            player.audio = None;
            player.ramp = None;
            player.playing = false;
            player.bump_epoch();
            player.current_track_index = index;
        }
        if !was_playing {
            if fading_out {
                self.events.emit(PlaybackEvent::Paused { category: key });
            }
            self.release_transport(key);
            if self.active == Some(key) {
                self.active = None;
            }
        }

        let title = self.players[i].tracks[index].title.clone();
        log::info!("select_track: {} -> track {} '{}'", key, index, title);
        self.load_current_track(i);
        self.events.emit(PlaybackEvent::TrackSelected {
            category: key,
            index,
            title,
        });

        if was_playing && self.players[i].audio.is_some() {
            self.play(key, now)?;
        }
        Ok(())
    }

    /// Start a category, pausing every other one first
    pub fn play(&mut self, key: CategoryKey, now: Instant) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;

        if self.players[i].playing {
            if self.players[i].fading_out() {
                self.resume_from_fade_out(i, now);
            } else {
                log::debug!("play: {} already playing", key);
            }
            return Ok(());
        }

        if self.players[i].audio.is_none() {
            if self.players[i].tracks.is_empty() {
                log::debug!("play: {} has no tracks", key);
                return Ok(());
            }
            self.load_current_track(i);
            if self.players[i].audio.is_none() {
                return Ok(());
            }
        }

        // A newer play supersedes any parked start
        self.pending = None;

        for other in 0..self.players.len() {
            if other != i && self.players[other].playing {
                self.begin_pause(other, now);
            }
        }

        self.active = Some(key);
        self.last_active = Some(key);

        if self.players.iter().any(|p| p.playing) {
            log::debug!("play: {} parked until other categories fade out", key);
            self.pending = Some(PendingStart {
                key,
                epoch: self.players[i].epoch,
            });
        } else {
            self.start_now(i, now);
        }
        Ok(())
    }

    /// Pause a category, fading out first when enabled
    pub fn pause(&mut self, key: CategoryKey, now: Instant) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;

        if self.pending_for(key) {
            log::debug!("pause: Cancelled parked start of {}", key);
            self.pending = None;
            self.players[i].bump_epoch();
            if self.active == Some(key) {
                self.active = None;
            }
            return Ok(());
        }

        if !self.players[i].playing {
            log::debug!("pause: {} is not playing", key);
            return Ok(());
        }
        self.players[i].bump_epoch();
        self.begin_pause(i, now);
        Ok(())
    }

    /// Pause immediately and rewind to the start, ignoring fade settings
    pub fn stop(&mut self, key: CategoryKey) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;

        if self.pending_for(key) {
            self.pending = None;
        }
        let effective = self.effective_volume_at(i);
        let player = &mut self.players[i];
        player.bump_epoch();
        player.ramp = None;
        player.playing = false;
        if let Some(audio) = player.audio.as_mut() {
            audio.pause();
            audio.set_current_time(0.0);
            audio.set_volume(effective);
        }

        log::debug!("stop: {}", key);
        self.events.emit(PlaybackEvent::Stopped { category: key });
        if self.active == Some(key) {
            self.active = None;
        }
        self.release_transport(key);
        Ok(())
    }

    /// Play if paused, pause if playing
    pub fn toggle_play(&mut self, key: CategoryKey, now: Instant) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        let player = &self.players[i];
        if (player.playing && !player.fading_out()) || self.pending_for(key) {
            self.pause(key, now)
        } else {
            self.play(key, now)
        }
    }

    /// Move the playhead, clamped to `[0, duration]`
    pub fn seek(&mut self, key: CategoryKey, seconds: f64) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        let player = &mut self.players[i];
        let Some(audio) = player.audio.as_mut() else {
            log::debug!("seek: {} has no loaded track", key);
            return Ok(());
        };

        let upper = audio.duration().unwrap_or(f64::INFINITY);
        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, upper)
        };
        audio.set_current_time(target);
        let duration = audio.duration();
        self.events.emit(PlaybackEvent::TimeUpdate {
            category: key,
            current_time: target,
            duration,
        });
        Ok(())
    }

    /// Move the playhead relative to its current position
    pub fn seek_by(&mut self, key: CategoryKey, delta: f64) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        let position = self.players[i].current_time();
        self.seek(key, position + delta)
    }

    fn pending_for(&self, key: CategoryKey) -> bool {
        self.pending.is_some_and(|p| p.key == key)
    }

    fn start_now(&mut self, i: usize, now: Instant) {
        let key = self.players[i].key;
        let effective = self.effective_volume_at(i);
        let (fade_duration, fade_step) = (self.fade_duration, self.fade_step);

        let player = &mut self.players[i];
        let Some(audio) = player.audio.as_mut() else {
            log::debug!("start_now: {} has no loaded track", key);
            return;
        };
        let fade_in = player.fade_in_enabled;
        audio.set_volume(if fade_in { 0.0 } else { effective });
        if let Err(e) = audio.play() {
            self.contain_error(i, e);
            return;
        }
        player.playing = true;
        player.ramp = fade_in.then(|| Ramp::fade_in(now, fade_duration, fade_step));

        log::info!("start_now: Playing {} '{}'", key, player.title);
        self.events.emit(PlaybackEvent::Started { category: key });
        if fade_in {
            self.events.emit(PlaybackEvent::FadeStarted {
                category: key,
                kind: RampKind::FadeIn,
            });
        }
        self.active = Some(key);
        self.last_active = Some(key);
        self.displayed = Some(key);
        let display = self.transport_display();
        self.events.emit(PlaybackEvent::Transport(display));
    }

    fn resume_from_fade_out(&mut self, i: usize, now: Instant) {
        let key = self.players[i].key;
        let effective = self.effective_volume_at(i);
        let (fade_duration, fade_step) = (self.fade_duration, self.fade_step);

        // The category keeps the transport, so nothing else may start
        self.pending = None;
        let player = &mut self.players[i];
        player.bump_epoch();
        let current = player.audio.as_ref().map_or(0.0, |a| a.volume());
        if player.fade_in_enabled {
            let mut ramp = Ramp::fade_in(now, fade_duration, fade_step);
            ramp.from = current;
            player.ramp = Some(ramp);
            self.events.emit(PlaybackEvent::FadeStarted {
                category: key,
                kind: RampKind::FadeIn,
            });
        } else {
            player.ramp = None;
            if let Some(audio) = player.audio.as_mut() {
                audio.set_volume(effective);
            }
        }
        log::debug!("resume_from_fade_out: {} resumed", key);
        self.active = Some(key);
        self.last_active = Some(key);
        if self.displayed != Some(key) {
            self.displayed = Some(key);
            let display = self.transport_display();
            self.events.emit(PlaybackEvent::Transport(display));
        }
    }

    fn begin_pause(&mut self, i: usize, now: Instant) {
        let player = &mut self.players[i];
        if player.fading_out() {
            return;
        }
        if player.fade_out_enabled && !self.fade_duration.is_zero() {
            let from = player.audio.as_ref().map_or(0.0, |a| a.volume());
            player.ramp = Some(Ramp::fade_out(now, from, self.fade_duration, self.fade_step));
            let key = player.key;
            log::debug!("begin_pause: Fading out {}", key);
            self.events.emit(PlaybackEvent::FadeStarted {
                category: key,
                kind: RampKind::FadeOut,
            });
        } else {
            self.finish_pause(i);
        }
    }

    fn finish_pause(&mut self, i: usize) {
        let effective = self.effective_volume_at(i);
        let player = &mut self.players[i];
        player.ramp = None;
        player.playing = false;
        if let Some(audio) = player.audio.as_mut() {
            audio.pause();
            audio.set_volume(effective);
        }
        let key = player.key;
        log::debug!("finish_pause: {} paused", key);
        self.events.emit(PlaybackEvent::Paused { category: key });
        if self.active == Some(key) {
            self.active = None;
        }
        self.release_transport(key);
    }

    /// Clear the transport bar if it shows `key`
    fn release_transport(&mut self, key: CategoryKey) {
        if self.displayed == Some(key) {
            self.displayed = None;
            self.events.emit(PlaybackEvent::Transport(None));
        }
    }

    fn load_current_track(&mut self, i: usize) {
        let effective = self.effective_volume_at(i);
        let player = &mut self.players[i];
        let Some(track) = player.current_track() else {
            return;
        };
        let restart = track.restart_position();
        match self.backend.load(&track.path) {
            Ok(mut audio) => {
                audio.set_current_time(restart);
                audio.set_volume(effective);
                player.audio = Some(audio);
            }
            Err(e) => {
                player.audio = None;
                self.contain_error(i, e);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Volume
    // ─────────────────────────────────────────────────────────────

    /// Effective volume of a category under the current mode
    pub fn effective_volume(&self, key: CategoryKey) -> Option<f32> {
        self.index_of(key).ok().map(|i| self.effective_volume_at(i))
    }

    fn effective_volume_at(&self, i: usize) -> f32 {
        let own = self.players[i].volume;
        if self.global_volume_mode {
            own * self.global_volume
        } else {
            own
        }
    }

    /// Value a per-category slider shows; mirrors the global one in global mode
    pub fn displayed_category_volume(&self, key: CategoryKey) -> Option<f32> {
        let i = self.index_of(key).ok()?;
        Some(if self.global_volume_mode {
            self.global_volume
        } else {
            self.players[i].volume
        })
    }

    pub fn global_volume(&self) -> f32 {
        self.global_volume
    }

    pub fn global_volume_mode(&self) -> bool {
        self.global_volume_mode
    }

    pub fn set_global_volume(&mut self, volume: f32) {
        self.global_volume = clamp_volume(volume);
        if self.global_volume > 0.0 {
            self.last_audible_volume = Some(self.global_volume);
        }
        if self.global_volume_mode {
            self.apply_all_volumes();
        }
        self.events.emit(PlaybackEvent::VolumeChanged {
            category: None,
            effective: self.global_volume,
        });
    }

    /// Set a category's own volume
    ///
    /// Returns `Ok(false)` without changing anything while global mode is
    /// on, matching a disabled slider.
    pub fn set_category_volume(
        &mut self,
        key: CategoryKey,
        volume: f32,
    ) -> Result<bool, PlaybackError> {
        let i = self.index_of(key)?;
        if self.global_volume_mode {
            log::debug!("set_category_volume: Ignored for {} in global mode", key);
            return Ok(false);
        }
        self.players[i].volume = clamp_volume(volume);
        self.apply_volume(i);
        self.events.emit(PlaybackEvent::VolumeChanged {
            category: Some(key),
            effective: self.effective_volume_at(i),
        });
        Ok(true)
    }

    pub fn set_global_volume_mode(&mut self, global: bool) {
        if self.global_volume_mode == global {
            return;
        }
        self.global_volume_mode = global;
        self.apply_all_volumes();
        log::info!("set_global_volume_mode: global mode {}", global);
        self.events.emit(PlaybackEvent::VolumeModeChanged { global });
    }

    fn apply_all_volumes(&mut self) {
        for i in 0..self.players.len() {
            self.apply_volume(i);
        }
    }

    /// Push the effective volume to the resource unless a ramp owns it
    fn apply_volume(&mut self, i: usize) {
        let effective = self.effective_volume_at(i);
        let player = &mut self.players[i];
        if player.ramp.is_some() {
            return;
        }
        if let Some(audio) = player.audio.as_mut() {
            audio.set_volume(effective);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Per-category flags
    // ─────────────────────────────────────────────────────────────

    pub fn set_loop_enabled(&mut self, key: CategoryKey, enabled: bool) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        self.players[i].loop_enabled = enabled;
        self.events.emit(PlaybackEvent::LoopToggled {
            category: key,
            enabled,
        });
        Ok(())
    }

    pub fn set_fade_in_enabled(&mut self, key: CategoryKey, enabled: bool) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        self.players[i].fade_in_enabled = enabled;
        Ok(())
    }

    pub fn set_fade_out_enabled(&mut self, key: CategoryKey, enabled: bool) -> Result<(), PlaybackError> {
        let i = self.index_of(key)?;
        self.players[i].fade_out_enabled = enabled;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Transport notifications
    // ─────────────────────────────────────────────────────────────

    /// Jump back to the loop start once the playhead passes the loop end
    ///
    /// Returns whether a jump happened.
    pub fn handle_loop_points(&mut self, key: CategoryKey) -> bool {
        let Ok(i) = self.index_of(key) else {
            return false;
        };
        let player = &mut self.players[i];
        if !player.loop_enabled {
            return false;
        }
        let Some((start, end)) = player
            .current_track()
            .and_then(|t| t.loop_end.map(|end| (t.restart_position(), end)))
        else {
            return false;
        };
        let Some(audio) = player.audio.as_mut() else {
            return false;
        };

        let position = audio.current_time();
        if position < end {
            return false;
        }
        audio.set_current_time(start);
        log::debug!("handle_loop_points: {} {:.2}s -> {:.2}s", key, position, start);
        self.events.emit(PlaybackEvent::LoopJump {
            category: key,
            from: position,
            to: start,
        });
        true
    }

    /// Playhead moved; applies loop points and refreshes the transport bar
    pub fn on_time_update(&mut self, key: CategoryKey) {
        let Ok(i) = self.index_of(key) else {
            return;
        };
        self.handle_loop_points(key);

        let player = &self.players[i];
        self.events.emit(PlaybackEvent::TimeUpdate {
            category: key,
            current_time: player.current_time(),
            duration: player.duration(),
        });
        if self.displayed == Some(key) {
            let display = self.transport_display();
            self.events.emit(PlaybackEvent::Transport(display));
        }
    }

    /// Track ran to its end: restart at the loop start when looping, else stop
    pub fn on_ended(&mut self, key: CategoryKey) {
        let Ok(i) = self.index_of(key) else {
            return;
        };
        let player = &mut self.players[i];
        let restart = player.current_track().map_or(0.0, |t| t.restart_position());
        if player.loop_enabled {
            if let Some(audio) = player.audio.as_mut() {
                let from = audio.current_time();
                audio.set_current_time(restart);
                match audio.play() {
                    Ok(()) => {
                        log::debug!("on_ended: {} looped to {:.2}s", key, restart);
                        self.events.emit(PlaybackEvent::LoopJump {
                            category: key,
                            from,
                            to: restart,
                        });
                    }
                    Err(e) => self.contain_error(i, e),
                }
                return;
            }
        }
        log::debug!("on_ended: {} finished", key);
        // index_of already validated the key
        let _ = self.stop(key);
    }

    /// Contain an audio failure reported by the host
    pub fn on_error(&mut self, key: CategoryKey, message: impl Into<String>) {
        if let Ok(i) = self.index_of(key) {
            self.contain_error(i, AudioError::Stream(message.into()));
        }
    }

    fn contain_error(&mut self, i: usize, error: AudioError) {
        let key = self.players[i].key;
        log::error!("contain_error: {} '{}': {}", key, self.players[i].title, error);
        let _ = self.stop(key);
        self.events.emit(PlaybackEvent::Error {
            category: key,
            message: error.to_string(),
        });
    }

    // ─────────────────────────────────────────────────────────────
    // Tick
    // ─────────────────────────────────────────────────────────────

    /// Advance fades, parked starts, transport polling and feedback expiry
    pub fn tick(&mut self, now: Instant) {
        self.step_ramps(now);
        self.fire_pending(now);

        for i in 0..self.players.len() {
            if !self.players[i].playing {
                continue;
            }
            let key = self.players[i].key;
            let ended = self.players[i]
                .audio
                .as_ref()
                .is_some_and(|a| a.has_ended());
            if ended {
                self.on_ended(key);
            } else {
                self.on_time_update(key);
            }
        }

        if self.feedback_due.is_some_and(|due| now >= due) {
            self.feedback_due = None;
            self.events.emit(PlaybackEvent::FeedbackCleared);
        }
    }

    fn step_ramps(&mut self, now: Instant) {
        for i in 0..self.players.len() {
            let Some(ramp) = self.players[i].ramp else {
                continue;
            };
            let target = self.effective_volume_at(i);
            let volume = clamp_volume(ramp.volume_at(now, target));
            if let Some(audio) = self.players[i].audio.as_mut() {
                audio.set_volume(volume);
            }
            if ramp.is_finished(now) {
                match ramp.kind {
                    RampKind::FadeIn => self.players[i].ramp = None,
                    RampKind::FadeOut => self.finish_pause(i),
                }
            }
        }
    }

    fn fire_pending(&mut self, now: Instant) {
        let Some(pending) = self.pending else {
            return;
        };
        let i = pending.key.index();
        if self.players.get(i).map(|p| p.epoch) != Some(pending.epoch) {
            log::debug!("fire_pending: Dropped stale start of {}", pending.key);
            self.pending = None;
            return;
        }
        if self.players.iter().any(|p| p.playing) {
            return;
        }
        self.pending = None;
        self.start_now(i, now);
    }

    pub(crate) fn show_feedback(&mut self, text: String, now: Instant) {
        log::debug!("show_feedback: {}", text);
        self.feedback_due = Some(now + self.feedback_duration);
        self.events.emit(PlaybackEvent::Feedback(text));
    }

    // ─────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────

    /// Category currently holding the transport, including a parked start
    pub fn active(&self) -> Option<CategoryKey> {
        self.active
    }

    /// Most recent category to be played, even if paused since
    pub fn last_active(&self) -> Option<CategoryKey> {
        self.last_active
    }

    /// Whether a start for `key` is waiting on fade-outs
    pub fn is_pending(&self, key: CategoryKey) -> bool {
        self.pending_for(key)
    }

    pub fn playing_count(&self) -> usize {
        self.players.iter().filter(|p| p.playing).count()
    }

    pub fn category_count(&self) -> usize {
        self.players.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = CategoryKey> + '_ {
        self.players.iter().map(|p| p.key)
    }

    pub fn snapshot(&self, key: CategoryKey) -> Option<PlayerSnapshot> {
        self.index_of(key).ok().map(|i| self.players[i].snapshot())
    }

    pub fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(|p| p.snapshot()).collect()
    }

    /// Transport bar contents
    ///
    /// Follows the category that last started playing, including while it
    /// fades out after another category took over.
    pub fn transport_display(&self) -> Option<TransportDisplay> {
        let player = self.players.get(self.displayed?.index())?;
        if !player.playing {
            return None;
        }
        let track = player.current_track()?;
        Some(TransportDisplay {
            track_title: track.title.clone(),
            category_title: player.title.clone(),
            current_time: player.current_time(),
            duration: player.duration(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}


#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::test_support::*;
    use super::*;
    use crate::audio::SimulatedBackend;

    const FADE: Duration = Duration::from_millis(1000);

    fn playing_keys(c: &PlaybackCoordinator<SimulatedBackend>) -> Vec<CategoryKey> {
        c.snapshots().into_iter().filter(|s| s.playing).map(|s| s.key).collect()
    }

    #[test]
    fn test_new_loads_first_tracks() {
        let c = coordinator(&MixerConfig::default());
        assert_eq!(c.category_count(), 3);
        assert_eq!(c.backend().live_resources(), 2);
        let snap = c.snapshot(A).unwrap();
        assert_eq!(snap.track_title.as_deref(), Some("Intro"));
        assert!(!snap.playing);
        assert!(!c.snapshot(C).unwrap().loaded);
    }

    #[test]
    fn test_play_then_play_other_with_fades() {
        let mut c = coordinator(&MixerConfig::default());
        let events = c.subscribe();
        let t0 = Instant::now();

        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);
        assert_eq!(playing_keys(&c), vec![A]);

        let t1 = t0 + Duration::from_secs(2);
        c.play(B, t1).unwrap();
        assert_eq!(c.active(), Some(B));
        assert!(c.is_pending(B));
        // B's audio has not started while A fades out
        assert_eq!(c.backend().inspect(Path::new("b/quiz.mp3")).unwrap().play_calls, 0);

        let mut t = t1;
        while t <= t1 + FADE + Duration::from_millis(100) {
            c.tick(t);
            assert!(c.playing_count() <= 1);
            t += Duration::from_millis(16);
        }
        assert_eq!(playing_keys(&c), vec![B]);
        assert_eq!(c.active(), Some(B));

        let order: Vec<_> = events
            .try_iter()
            .filter(|e| {
                matches!(
                    e,
                    PlaybackEvent::Paused { .. } | PlaybackEvent::Started { .. }
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![
                PlaybackEvent::Started { category: A },
                PlaybackEvent::Paused { category: A },
                PlaybackEvent::Started { category: B },
            ]
        );
    }

    #[test]
    fn test_play_other_without_fades_is_immediate() {
        let mut c = coordinator(&no_fades());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.play(B, t0).unwrap();

        assert_eq!(playing_keys(&c), vec![B]);
        assert!(c.backend().inspect(Path::new("a/intro.mp3")).unwrap().paused);
        assert!(!c.backend().inspect(Path::new("b/quiz.mp3")).unwrap().paused);
    }

    #[test]
    fn test_fade_in_ramps_to_effective_volume() {
        let mut c = coordinator(&MixerConfig::default());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        assert_eq!(volume_of(&c, "a/intro.mp3"), 0.0);

        c.tick(t0 + Duration::from_millis(500));
        let half = volume_of(&c, "a/intro.mp3");
        assert!((half - 0.245).abs() < 1e-4, "half-way volume {}", half);

        c.tick(t0 + FADE);
        assert!((volume_of(&c, "a/intro.mp3") - 0.49).abs() < 1e-6);
        assert_eq!(c.snapshot(A).unwrap().fading, None);
    }

    #[test]
    fn test_pause_fades_out_then_pauses() {
        let mut c = coordinator(&MixerConfig::default());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);

        let t1 = t0 + Duration::from_secs(3);
        c.pause(A, t1).unwrap();
        c.tick(t1 + Duration::from_millis(500));
        assert!(c.snapshot(A).unwrap().playing);
        assert!(volume_of(&c, "a/intro.mp3") < 0.49);

        c.tick(t1 + FADE);
        let snap = c.snapshot(A).unwrap();
        assert!(!snap.playing);
        assert_eq!(c.active(), None);
        assert!(c.backend().inspect(Path::new("a/intro.mp3")).unwrap().paused);
    }

    #[test]
    fn test_play_during_fade_out_resumes() {
        let mut c = coordinator(&MixerConfig::default());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);
        let t1 = t0 + Duration::from_secs(2);
        c.pause(A, t1).unwrap();
        c.tick(t1 + Duration::from_millis(300));

        c.play(A, t1 + Duration::from_millis(300)).unwrap();
        c.tick(t1 + Duration::from_secs(3));
        let snap = c.snapshot(A).unwrap();
        assert!(snap.playing);
        assert_eq!(snap.fading, None);
        assert!((volume_of(&c, "a/intro.mp3") - 0.49).abs() < 1e-6);
    }

    #[test]
    fn test_stop_supersedes_parked_start() {
        let mut c = coordinator(&MixerConfig::default());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);
        c.play(B, t0 + FADE).unwrap();
        assert!(c.is_pending(B));

        c.stop(B).unwrap();
        assert!(!c.is_pending(B));
        c.tick(t0 + FADE * 3);
        assert_eq!(c.playing_count(), 0);
        assert_eq!(c.backend().inspect(Path::new("b/quiz.mp3")).unwrap().play_calls, 0);
    }

    #[test]
    fn test_stop_rewinds_immediately() {
        let mut c = coordinator(&MixerConfig::default());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.backend_mut().advance(Duration::from_secs(30));
        c.stop(A).unwrap();

        let snapshot = c.backend().inspect(Path::new("a/intro.mp3")).unwrap();
        assert!(snapshot.paused);
        assert_eq!(snapshot.position, 0.0);
        assert_eq!(c.active(), None);
        assert!(!c.snapshot(A).unwrap().playing);
    }

    #[test]
    fn test_global_mode_effective_volume() {
        let mut c = coordinator(&no_fades());
        c.set_global_volume_mode(false);
        assert_eq!(c.set_category_volume(A, 0.5), Ok(true));
        c.set_global_volume(0.4);
        assert_eq!(c.effective_volume(A), Some(0.5));

        c.set_global_volume_mode(true);
        for key in [A, B, C] {
            let own = c.snapshot(key).unwrap().volume;
            assert_eq!(c.effective_volume(key), Some(own * 0.4));
            assert_eq!(c.displayed_category_volume(key), Some(0.4));
        }
        assert!((volume_of(&c, "a/intro.mp3") - 0.2).abs() < 1e-6);

        assert_eq!(c.set_category_volume(A, 0.9), Ok(false));
        assert_eq!(c.snapshot(A).unwrap().volume, 0.5);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut c = coordinator(&no_fades());
        c.set_global_volume(1.7);
        assert_eq!(c.global_volume(), 1.0);
        c.set_global_volume(-0.2);
        assert_eq!(c.global_volume(), 0.0);
    }

    #[test]
    fn test_loop_point_jump() {
        let mut c = coordinator(&no_fades());
        let t0 = Instant::now();
        c.select_track(A, 1, t0).unwrap();
        assert_eq!(c.snapshot(A).unwrap().current_time, 10.0);
        c.set_loop_enabled(A, true).unwrap();
        c.play(A, t0).unwrap();

        c.seek(A, 20.0).unwrap();
        c.tick(t0 + Duration::from_millis(16));
        assert_eq!(c.snapshot(A).unwrap().current_time, 10.0);
    }

    #[test]
    fn test_loop_points_ignored_when_not_looping() {
        let mut c = coordinator(&no_fades());
        let t0 = Instant::now();
        c.select_track(A, 1, t0).unwrap();
        c.play(A, t0).unwrap();
        c.seek(A, 25.0).unwrap();
        assert!(!c.handle_loop_points(A));
        assert_eq!(c.snapshot(A).unwrap().current_time, 25.0);
    }

    #[test]
    fn test_select_track_out_of_range() {
        let mut c = coordinator(&no_fades());
        let err = c.select_track(A, 5, Instant::now()).unwrap_err();
        assert_eq!(
            err,
            PlaybackError::TrackOutOfRange {
                category: A,
                index: 5,
                len: 2
            }
        );
        assert_eq!(c.snapshot(A).unwrap().current_track_index, 0);
        assert_eq!(
            c.play(CategoryKey(9), Instant::now()),
            Err(PlaybackError::UnknownCategory(CategoryKey(9)))
        );
    }

    #[test]
    fn test_select_track_resumes_when_playing() {
        let mut c = coordinator(&no_fades());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.select_track(A, 1, t0).unwrap();

        let snap = c.snapshot(A).unwrap();
        assert!(snap.playing);
        assert_eq!(snap.track_title.as_deref(), Some("Theme"));
        assert!(!c.backend().inspect(Path::new("a/theme.mp3")).unwrap().paused);
    }

    #[test]
    fn test_ended_stops_or_loops() {
        let backend = SimulatedBackend::new().with_duration("b/quiz.mp3", 5.0);
        let mut c = PlaybackCoordinator::new(library(), backend, &no_fades());
        let t0 = Instant::now();

        c.play(B, t0).unwrap();
        c.backend_mut().advance(Duration::from_secs(6));
        c.tick(t0 + Duration::from_secs(6));
        assert!(!c.snapshot(B).unwrap().playing);
        assert_eq!(c.active(), None);

        c.set_loop_enabled(B, true).unwrap();
        c.play(B, t0).unwrap();
        c.backend_mut().advance(Duration::from_secs(6));
        c.tick(t0 + Duration::from_secs(12));
        let snap = c.snapshot(B).unwrap();
        assert!(snap.playing);
        assert_eq!(snap.current_time, 0.0);
    }

    #[test]
    fn test_load_failure_is_contained() {
        let mut backend = SimulatedBackend::new();
        backend.fail_load("b/quiz.mp3");
        let mut c = PlaybackCoordinator::new(library(), backend, &no_fades());
        let events = c.subscribe();
        let t0 = Instant::now();

        c.play(A, t0).unwrap();
        c.play(B, t0).unwrap();
        assert!(!c.snapshot(B).unwrap().playing);
        assert!(events
            .try_iter()
            .any(|e| matches!(e, PlaybackEvent::Error { category: B, .. })));
    }

    #[test]
    fn test_play_failure_is_contained() {
        let mut backend = SimulatedBackend::new();
        backend.fail_play("a/intro.mp3");
        let mut c = PlaybackCoordinator::new(library(), backend, &no_fades());
        let events = c.subscribe();
        let t0 = Instant::now();

        c.play(A, t0).unwrap();
        assert_eq!(c.playing_count(), 0);
        assert_eq!(c.active(), None);
        assert!(events
            .try_iter()
            .any(|e| matches!(e, PlaybackEvent::Error { category: A, .. })));

        c.play(B, t0).unwrap();
        assert_eq!(playing_keys(&c), vec![B]);
    }

    #[test]
    fn test_on_error_forces_stop() {
        let mut c = coordinator(&no_fades());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.on_error(A, "decode failed");
        assert_eq!(c.playing_count(), 0);
        assert_eq!(c.active(), None);
    }

    #[test]
    fn test_play_empty_category_is_noop() {
        let mut c = coordinator(&no_fades());
        c.play(C, Instant::now()).unwrap();
        assert_eq!(c.playing_count(), 0);
        assert_eq!(c.active(), None);
    }

    #[test]
    fn test_transport_display_follows_active() {
        let mut c = coordinator(&no_fades());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        let display = c.transport_display().unwrap();
        assert_eq!(display.track_title, "Intro");
        assert_eq!(display.category_title, "Opening");

        c.pause(A, t0).unwrap();
        assert_eq!(c.transport_display(), None);
    }

    #[test]
    fn test_seek_is_clamped() {
        let backend = SimulatedBackend::new().with_duration("a/intro.mp3", 60.0);
        let mut c = PlaybackCoordinator::new(library(), backend, &no_fades());
        c.seek(A, 90.0).unwrap();
        assert_eq!(c.snapshot(A).unwrap().current_time, 60.0);
        c.seek_by(A, -75.0).unwrap();
        assert_eq!(c.snapshot(A).unwrap().current_time, 0.0);
    }

    fn last_transport(events: &Receiver<PlaybackEvent>) -> Option<Option<TransportDisplay>> {
        events
            .try_iter()
            .filter_map(|e| match e {
                PlaybackEvent::Transport(display) => Some(display),
                _ => None,
            })
            .last()
    }

    #[test]
    fn test_transport_clears_when_parked_start_is_cancelled() {
        let mut c = coordinator(&MixerConfig::default());
        let events = c.subscribe();
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);

        let t1 = t0 + Duration::from_secs(2);
        c.play(B, t1).unwrap();
        c.pause(B, t1).unwrap();
        assert!(!c.is_pending(B));

        // A keeps the transport bar while it fades out
        c.tick(t1 + Duration::from_millis(500));
        let during = last_transport(&events).flatten().unwrap();
        assert_eq!(during.track_title, "Intro");

        c.tick(t1 + FADE);
        assert_eq!(c.playing_count(), 0);
        assert_eq!(c.active(), None);
        assert_eq!(c.transport_display(), None);
        assert_eq!(last_transport(&events), Some(None));
    }

    #[test]
    fn test_select_track_during_fade_out_keeps_pause() {
        let mut c = coordinator(&MixerConfig::default());
        let events = c.subscribe();
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);

        let t1 = t0 + Duration::from_secs(2);
        c.pause(A, t1).unwrap();
        c.select_track(A, 1, t1 + Duration::from_millis(200)).unwrap();
        c.tick(t1 + Duration::from_millis(300));

        let snap = c.snapshot(A).unwrap();
        assert!(!snap.playing);
        assert_eq!(snap.track_title.as_deref(), Some("Theme"));
        assert_eq!(c.active(), None);
        assert_eq!(last_transport(&events), Some(None));
        assert_eq!(c.backend().inspect(Path::new("a/theme.mp3")).unwrap().play_calls, 0);
    }

    #[test]
    fn test_select_track_on_fading_category_keeps_parked_start() {
        let mut c = coordinator(&MixerConfig::default());
        let t0 = Instant::now();
        c.play(A, t0).unwrap();
        c.tick(t0 + FADE);

        let t1 = t0 + Duration::from_secs(2);
        c.play(B, t1).unwrap();
        c.select_track(A, 1, t1 + Duration::from_millis(100)).unwrap();
        assert!(c.is_pending(B));
        assert_eq!(c.active(), Some(B));

        c.tick(t1 + Duration::from_millis(116));
        assert_eq!(playing_keys(&c), vec![B]);
        assert_eq!(c.active(), Some(B));
        assert_eq!(c.transport_display().unwrap().category_title, "Games");
    }
}
