// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate limits or
/// lesson test expressions. Use [`load_and_validate`] for that.
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
/// - Checks sandbox limits, lesson ids and that every lesson's `tests`
///   parses as a Python expression.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    debug!(
        path = %path.as_ref().display(),
        lessons = config.lessons.len(),
        "loaded configuration"
    );
    Ok(config)
}

/// Resolve the configuration to use.
///
/// An explicit path must exist. Without one, `CodeFarm.toml` in the current
/// directory is used if present, otherwise the built-in defaults (no lessons).
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = path {
        return load_and_validate(path);
    }

    let fallback = default_config_path();
    if fallback.is_file() {
        return load_and_validate(&fallback);
    }

    info!(
        path = %fallback.display(),
        "no configuration file found; using built-in defaults"
    );
    ConfigFile::try_from(RawConfigFile {
        sandbox: Default::default(),
        lesson: Default::default(),
    })
}

/// Default config location: `CodeFarm.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("CodeFarm.toml")
}
