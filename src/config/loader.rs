// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to also
/// check the invariants the rest of the crate relies on.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Rejects an empty executable path, blank database string, empty
///   directories and zero-sized tail batching.
///
/// Relative `logs.path` / `store.path` entries are resolved against the
/// directory containing the config file, so the same file works regardless
/// of the current working directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;

    let root = config_root_dir(path);
    raw_config.logs.path = resolve_against(&root, &raw_config.logs.path);
    raw_config.store.path = resolve_against(&root, &raw_config.store.path);

    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default config path: `Pulserun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Pulserun.toml")
}

/// - If the config path has a non-empty parent (e.g. "deploy/Pulserun.toml"),
///   we use that directory.
/// - If it's just a bare filename, fall back to the current working
///   directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() || path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
