//! Playback coordinator error types

use thiserror::Error;

use crate::types::CategoryKey;

/// Validation errors returned by coordinator operations
///
/// Audio failures are not reported here; they are contained per category
/// and surface as [`super::PlaybackEvent::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Unknown category {0}")]
    UnknownCategory(CategoryKey),

    #[error("Track {index} out of range for {category} ({len} tracks)")]
    TrackOutOfRange {
        category: CategoryKey,
        index: usize,
        len: usize,
    },
}
