//! Lucky draw error types

use thiserror::Error;

/// Validation errors reported by the draw engine
///
/// All of these are raised before any session state changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// Participant input was blank
    #[error("Participant list is empty")]
    EmptyInput,

    /// No line had both a name and an id
    #[error("No valid participants found (expected `name<TAB>id` per line)")]
    NoValidParticipants,

    /// Fewer participants than winners requested
    #[error("{available} participants are not enough for {required} winners")]
    NotEnoughParticipants { available: usize, required: usize },

    /// Winner count must be at least one
    #[error("Lucky count must be at least 1")]
    InvalidLuckyCount,

    /// Spin duration must be positive
    #[error("Spin duration must be greater than zero")]
    InvalidSpinDuration,

    /// A draw was requested before a session was started
    #[error("No draw session has been started")]
    NotConfigured,
}
