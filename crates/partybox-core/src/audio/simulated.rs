//! Silent audio backend driven by host time
//!
//! Each resource's state lives behind an `Rc<RefCell<_>>` shared with the
//! backend, so [`SimulatedBackend::advance`] can move every unpaused
//! playhead forward and [`SimulatedBackend::inspect`] can read a resource back
//! after it has been handed to the mixer. Single-threaded only.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use super::{AudioBackend, AudioError, AudioResource, AudioResult};

/// Length given to resources without an explicit duration
pub const DEFAULT_SIMULATED_DURATION: f64 = 180.0;

#[derive(Debug)]
struct SimState {
    path: PathBuf,
    position: f64,
    duration: f64,
    volume: f32,
    paused: bool,
    ended: bool,
    play_calls: usize,
    fail_play: bool,
}

/// Observable state of a simulated resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    pub position: f64,
    pub duration: f64,
    pub volume: f32,
    pub paused: bool,
    pub ended: bool,
    pub play_calls: usize,
}

/// Resource handed out by [`SimulatedBackend`]
pub struct SimulatedResource {
    state: Rc<RefCell<SimState>>,
}

impl AudioResource for SimulatedResource {
    fn play(&mut self) -> AudioResult<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_play {
            return Err(AudioError::Playback(format!(
                "{} is not playable",
                state.path.display()
            )));
        }
        if state.ended {
            // Media elements restart from the top when played after ending
            state.position = 0.0;
            state.ended = false;
        }
        state.paused = false;
        state.play_calls += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn has_ended(&self) -> bool {
        self.state.borrow().ended
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().position
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        state.position = seconds.clamp(0.0, state.duration);
        state.ended = false;
    }

    fn duration(&self) -> Option<f64> {
        Some(self.state.borrow().duration)
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }
}

/// Audio backend without output, for the terminal host and tests
#[derive(Default)]
pub struct SimulatedBackend {
    resources: Vec<Rc<RefCell<SimState>>>,
    durations: HashMap<PathBuf, f64>,
    unloadable: HashSet<PathBuf>,
    unplayable: HashSet<PathBuf>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give resources loaded from `path` a specific length
    pub fn with_duration(mut self, path: impl Into<PathBuf>, seconds: f64) -> Self {
        self.durations.insert(path.into(), seconds.max(0.0));
        self
    }

    /// Make every future load of `path` fail
    pub fn fail_load(&mut self, path: impl Into<PathBuf>) {
        self.unloadable.insert(path.into());
    }

    /// Make resources loaded from `path` refuse to play
    pub fn fail_play(&mut self, path: impl Into<PathBuf>) {
        self.unplayable.insert(path.into());
    }

    /// Move every unpaused playhead forward by `elapsed`
    ///
    /// Resources that reach their duration stop there, pause and report
    /// `has_ended()`. Resources dropped by their owner are forgotten.
    pub fn advance(&mut self, elapsed: Duration) {
        self.prune();

        let step = elapsed.as_secs_f64();
        for state in &self.resources {
            let mut state = state.borrow_mut();
            if state.paused {
                continue;
            }
            state.position += step;
            if state.position >= state.duration {
                state.position = state.duration;
                state.paused = true;
                state.ended = true;
            }
        }
    }

    /// Forget resources dropped by their owner
    fn prune(&mut self) {
        self.resources.retain(|state| Rc::strong_count(state) > 1);
    }

    /// Inspect the most recently loaded live resource for `path`
    pub fn inspect(&self, path: &Path) -> Option<ResourceSnapshot> {
        self.resources
            .iter()
            .rev()
            .filter(|state| Rc::strong_count(state) > 1)
            .map(|state| state.borrow())
            .find(|state| state.path == path)
            .map(|state| ResourceSnapshot {
                position: state.position,
                duration: state.duration,
                volume: state.volume,
                paused: state.paused,
                ended: state.ended,
                play_calls: state.play_calls,
            })
    }

    /// Number of resources still held by the mixer
    pub fn live_resources(&self) -> usize {
        self.resources
            .iter()
            .filter(|state| Rc::strong_count(state) > 1)
            .count()
    }
}

impl AudioBackend for SimulatedBackend {
    fn load(&mut self, path: &Path) -> AudioResult<Box<dyn AudioResource>> {
        if self.unloadable.contains(path) {
            return Err(AudioError::Load {
                path: path.to_path_buf(),
                reason: "resource unavailable".to_string(),
            });
        }

        self.prune();
        let state = Rc::new(RefCell::new(SimState {
            path: path.to_path_buf(),
            position: 0.0,
            duration: self
                .durations
                .get(path)
                .copied()
                .unwrap_or(DEFAULT_SIMULATED_DURATION),
            volume: 1.0,
            paused: true,
            ended: false,
            play_calls: 0,
            fail_play: self.unplayable.contains(path),
        }));
        self.resources.push(Rc::clone(&state));

        log::debug!("SimulatedBackend::load: {:?}", path);
        Ok(Box::new(SimulatedResource { state }))
    }
}
