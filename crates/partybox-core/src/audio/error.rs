//! Audio backend error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an audio backend or one of its resources
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Resource could not be opened or decoded
    #[error("Failed to load audio resource {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Resource refused to start playback
    #[error("Failed to start playback: {0}")]
    Playback(String),

    /// Error reported while the resource was playing
    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
