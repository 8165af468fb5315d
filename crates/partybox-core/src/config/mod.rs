//! Configuration for partybox
//!
//! - Generic YAML config loading/saving
//! - Default config locations
//! - The [`PartyConfig`] tree shared by the draw and mixer engines
//!
//! # Usage
//!
//! ```ignore
//! use partybox_core::config::{default_config_path, load_config, save_config, PartyConfig};
//!
//! let path = default_config_path("config.yaml");
//! let config: PartyConfig = load_config(&path);
//! save_config(&config, &path)?;
//! ```

mod io;
mod party;
mod paths;

pub use io::{load_config, read_yaml, save_config};
pub use party::{DrawConfig, MixerConfig, PartyConfig};
pub use paths::{default_config_dir, default_config_path};
