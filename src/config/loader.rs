// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
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
/// - Checks ports, task commands and the job pattern.
/// - Resolves every path to an absolute one.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    validate_from(raw_config, Some(path.as_ref()))
}

/// Load the config the CLI asked for.
///
/// An explicitly requested file must exist. When no path was given and the
/// default `Quasar.toml` is absent, the built-in defaults are used.
///
/// `application_root` replaces `[paths].application_root` before paths are
/// resolved, so every derived folder follows it.
pub fn load_or_default(
    explicit: Option<&Path>,
    application_root: Option<&Path>,
) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let path = default_config_path();
            if path.is_file() {
                Some(path)
            } else {
                debug!(?path, "no config file found; using built-in defaults");
                None
            }
        }
    };

    let mut raw = match &path {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    if let Some(root) = application_root {
        debug!(root = ?root, "application root overridden");
        raw.paths.application_root = root.to_path_buf();
    }

    validate_from(raw, path.as_deref())
}

fn validate_from(raw: RawConfigFile, source: Option<&Path>) -> Result<ConfigFile> {
    let mut config = ConfigFile::try_from(raw)?;
    config.source = source.map(std::path::absolute).transpose()?;
    Ok(config)
}

/// Default config location: `Quasar.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Quasar.toml")
}
