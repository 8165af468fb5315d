//! Partybox Core - Lucky draw spinner and category mixer engines
//!
//! Both engines are host-agnostic state machines:
//! - The host owns the clock and calls `tick(now)` at its frame rate
//! - Audio output goes through the [`audio::AudioBackend`] trait
//! - Presentation layers subscribe to event channels instead of being
//!   mutated inline

pub mod audio;
pub mod config;
pub mod draw;
pub mod events;
pub mod keyboard;
pub mod library;
pub mod playback;
pub mod types;

pub use types::*;
