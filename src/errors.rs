// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SubAppKind;

#[derive(Error, Debug)]
pub enum QuasarError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("failed to start '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process '{program}' ended without reporting an exit status")]
    SpawnLost { program: String },

    #[error(
        "cannot run {app} because {entry} has not been built yet, run again with option --{flag}=true to auto build the {app}"
    )]
    NotBuilt {
        app: SubAppKind,
        entry: PathBuf,
        flag: &'static str,
    },

    #[error("still cannot launch {app} after building it ({entry} is missing)")]
    StillCannotLaunch { app: SubAppKind, entry: PathBuf },

    #[error("build-then-retry was already attempted for {0} in this dispatch")]
    RetryExhausted(SubAppKind),

    #[error("no task selected")]
    NoTaskSelected,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("task '{task}' failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("job file {path}: {reason}")]
    JobError { path: PathBuf, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, QuasarError>;
