// src/config/mod.rs

//! Configuration loading, validation and option resolution for quasar.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and resolve paths (`validate.rs`).
//! - Merge configured defaults with invocation overrides into the immutable
//!   [`ResolvedOptions`] a dispatch runs on (`options.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, PathsSection, RawConfigFile, ResolvedPaths, RuntimeSection, TaskConfig};
pub use options::{OptionOverrides, ResolvedOptions};
