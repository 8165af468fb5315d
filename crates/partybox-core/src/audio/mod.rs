//! Audio resource abstraction
//!
//! The mixer never decodes or outputs audio itself. A host provides an
//! [`AudioBackend`] that turns a track path into a playable
//! [`AudioResource`], the way a browser turns a URL into a media element:
//!
//! - `load(path)` creates the resource (paused, at position 0)
//! - `play()` / `pause()` control the transport
//! - `current_time` / `volume` are read and written directly
//! - `has_ended()` is polled by the coordinator on every tick
//!
//! [`SimulatedBackend`] is a silent implementation whose playhead follows
//! host-supplied time.

mod error;
mod simulated;

pub use error::{AudioError, AudioResult};
pub use simulated::{ResourceSnapshot, SimulatedBackend, SimulatedResource, DEFAULT_SIMULATED_DURATION};

use std::path::Path;

/// A loaded, playable audio resource
pub trait AudioResource {
    /// Start or resume playback from the current position
    fn play(&mut self) -> AudioResult<()>;

    /// Pause playback, keeping the current position
    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Whether playback ran into the end of the resource
    fn has_ended(&self) -> bool;

    /// Playhead position in seconds
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Total length in seconds, `None` while unknown
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);
}

/// Factory for audio resources
pub trait AudioBackend {
    fn load(&mut self, path: &Path) -> AudioResult<Box<dyn AudioResource>>;
}
