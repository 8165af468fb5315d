//! Category library files
//!
//! A library is a list of categories, each with a playlist:
//!
//! ```yaml
//! - title: Opening
//!   playlist:
//!     - title: Theme
//!       path: music/theme.mp3
//!       startLoop: 12.5
//!       endLoop: 48.0
//! ```
//!
//! `.json` files are read as JSON, everything else as YAML.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Category;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Failed to read library {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse library {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Library {0:?} contains no categories")]
    Empty(PathBuf),
}

/// Load and sanity-check a category library
pub fn load_library(path: &Path) -> Result<Vec<Category>, LibraryError> {
    log::info!("load_library: Loading from {:?}", path);

    let contents = std::fs::read_to_string(path).map_err(|source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let categories = parse_library(&contents, is_json).map_err(|message| LibraryError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    if categories.is_empty() {
        return Err(LibraryError::Empty(path.to_path_buf()));
    }
    check_library(&categories);

    log::info!(
        "load_library: Loaded {} categories, {} tracks",
        categories.len(),
        categories.iter().map(|c| c.tracks.len()).sum::<usize>()
    );
    Ok(categories)
}

/// Parse library text as JSON or YAML
pub fn parse_library(contents: &str, json: bool) -> Result<Vec<Category>, String> {
    if json {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }
}

/// Warn about entries that load but will not behave as expected
fn check_library(categories: &[Category]) {
    for category in categories {
        if category.tracks.is_empty() {
            log::warn!("check_library: Category '{}' has no tracks", category.title);
        }
        for track in &category.tracks {
            if let (Some(start), Some(end)) = (track.loop_start, track.loop_end) {
                if end <= start {
                    log::warn!(
                        "check_library: '{}' loop end {:.2}s is not after loop start {:.2}s",
                        track.title,
                        end,
                        start
                    );
                }
            }
        }
    }
}
