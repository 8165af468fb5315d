//! Standard locations for partybox configuration files

use std::path::PathBuf;

/// Get the partybox config directory
///
/// Returns: `~/.config/partybox` (platform config dir, falling back to home)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("partybox")
}

/// Get the default path of a config file
///
/// # Arguments
/// * `filename` - Config file name (e.g., "config.yaml")
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}
