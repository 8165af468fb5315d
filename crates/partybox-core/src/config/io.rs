//! Generic configuration I/O utilities
//!
//! YAML loading and saving for any serializable configuration type.
//! Loading never fails; saving reports errors with `anyhow` context.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read and parse a YAML file
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Cannot read {:?}", path))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Cannot parse {:?}", path))
}

/// Load configuration, falling back to defaults
///
/// A missing file is normal on first start. An unreadable or invalid one
/// is logged and replaced by defaults so a broken config never blocks the
/// party.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: No config at {:?}, using defaults", path);
        return T::default();
    }

    match read_yaml(path) {
        Ok(config) => {
            log::info!("load_config: Loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: {:#}, using defaults", e);
            T::default()
        }
    }
}

/// Save configuration as YAML
///
/// Writes a sibling `.tmp` file first and renames it over the target, so
/// an interrupted save leaves the previous config intact.
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create config directory {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Cannot serialize config")?;
    let staging = path.with_extension("yaml.tmp");
    std::fs::write(&staging, yaml).with_context(|| format!("Cannot write {:?}", staging))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Cannot move {:?} into place", staging))?;

    log::info!("save_config: Saved {:?}", path);
    Ok(())
}
