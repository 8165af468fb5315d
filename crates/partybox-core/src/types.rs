//! Common types for partybox
//!
//! Participants feed the lucky draw, categories and tracks feed the mixer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A person taking part in a lucky draw
///
/// Identity is the `id`; two participants with the same id are the same
/// person even if the names differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub id: String,
}

impl Participant {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Stable identifier of a mixer category
///
/// Assigned in load order when the library is handed to the coordinator,
/// independent of the category's display title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryKey(pub usize);

impl CategoryKey {
    /// Position of the category in the loaded library
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "category-{}", self.0)
    }
}

/// A playable track with optional loop points (in seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub path: PathBuf,
    #[serde(default, alias = "startLoop", alias = "start_loop")]
    pub loop_start: Option<f64>,
    #[serde(default, alias = "endLoop", alias = "end_loop")]
    pub loop_end: Option<f64>,
}

impl Track {
    pub fn new(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            loop_start: None,
            loop_end: None,
        }
    }

    /// Builder-style loop point assignment
    pub fn with_loop(mut self, start: Option<f64>, end: Option<f64>) -> Self {
        self.loop_start = start;
        self.loop_end = end;
        self
    }

    /// Position a freshly selected track starts from
    pub fn restart_position(&self) -> f64 {
        self.loop_start.unwrap_or(0.0)
    }
}

/// A named group of tracks with its own playback controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    #[serde(rename = "playlist", alias = "tracks", default)]
    pub tracks: Vec<Track>,
}

impl Category {
    pub fn new(title: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            title: title.into(),
            tracks,
        }
    }
}

/// Clamp a volume into [0, 1], mapping NaN to silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
