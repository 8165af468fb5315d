//! Playback notifications
//!
//! The coordinator never renders anything. Presentation layers subscribe
//! to these events and update their own view (sliders, play buttons, the
//! global transport bar, transient shortcut feedback).

use crate::types::CategoryKey;

use super::ramp::RampKind;

/// Contents of the global transport bar, mirrored from the active category
#[derive(Debug, Clone, PartialEq)]
pub struct TransportDisplay {
    pub track_title: String,
    pub category_title: String,
    /// Seconds
    pub current_time: f64,
    /// Seconds, `None` while unknown
    pub duration: Option<f64>,
}

impl TransportDisplay {
    /// `"MM:SS / MM:SS"` label for the transport bar
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time),
            format_time(self.duration.unwrap_or(0.0))
        )
    }
}

/// State changes emitted by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A category switched to another track
    TrackSelected {
        category: CategoryKey,
        index: usize,
        title: String,
    },
    /// Audio started for a category
    Started { category: CategoryKey },
    /// A volume ramp began
    FadeStarted { category: CategoryKey, kind: RampKind },
    /// A category paused (after its fade-out, if any)
    Paused { category: CategoryKey },
    /// A category stopped and rewound
    Stopped { category: CategoryKey },
    /// The global transport bar changed; `None` clears it
    Transport(Option<TransportDisplay>),
    /// Playhead update of a playing category
    TimeUpdate {
        category: CategoryKey,
        current_time: f64,
        duration: Option<f64>,
    },
    /// The playhead jumped back to the loop start
    LoopJump {
        category: CategoryKey,
        from: f64,
        to: f64,
    },
    /// Effective volume changed; `category: None` means the global value
    VolumeChanged {
        category: Option<CategoryKey>,
        effective: f32,
    },
    VolumeModeChanged { global: bool },
    LoopToggled { category: CategoryKey, enabled: bool },
    /// Transient acknowledgement of a keyboard shortcut
    Feedback(String),
    /// The shortcut acknowledgement expired
    FeedbackCleared,
    /// An audio failure was contained by stopping the category
    Error { category: CategoryKey, message: String },
}

/// Format seconds as `MM:SS`
///
/// Negative, NaN and infinite inputs render as `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
