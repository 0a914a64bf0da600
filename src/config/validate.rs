// src/config/validate.rs

use std::path::{Path, PathBuf};

use globset::Glob;

use crate::config::model::{ConfigFile, PathsSection, RawConfigFile, ResolvedPaths};
use crate::errors::{QuasarError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::QuasarError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let paths = resolve_paths(&raw.paths)?;
        Ok(ConfigFile::new_unchecked(paths, raw.runtime, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runtime(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn validate_runtime(cfg: &RawConfigFile) -> Result<()> {
    let runtime = &cfg.runtime;

    if runtime.port == 0 {
        return Err(QuasarError::ConfigError(
            "[runtime].port must be >= 1 (got 0)".to_string(),
        ));
    }

    for (key, port) in [
        ("web_form_port", runtime.web_form_port),
        ("web_app_port", runtime.web_app_port),
    ] {
        if port == Some(0) {
            return Err(QuasarError::ConfigError(format!(
                "[runtime].{key} must be >= 1 (got 0)"
            )));
        }
    }

    Glob::new(&runtime.job_pattern).map_err(|e| {
        QuasarError::ConfigError(format!(
            "[runtime].job_pattern '{}' is not a valid glob: {e}",
            runtime.job_pattern
        ))
    })?;

    for (key, value) in [
        ("package_manager", &runtime.package_manager),
        ("node", &runtime.node),
        ("desktop_shell", &runtime.desktop_shell),
        ("web_form_build_task", &runtime.web_form_build_task),
        ("web_app_build_task", &runtime.web_app_build_task),
    ] {
        if value.trim().is_empty() {
            return Err(QuasarError::ConfigError(format!(
                "[runtime].{key} must not be empty"
            )));
        }
    }

    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(QuasarError::ConfigError(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
    }
    Ok(())
}

fn resolve_paths(paths: &PathsSection) -> Result<ResolvedPaths> {
    let application_root = std::path::absolute(&paths.application_root)?;
    let under_root = |p: &Path| -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            application_root.join(p)
        }
    };

    let jobs_folder = paths
        .jobs_folder
        .as_deref()
        .map(under_root)
        .unwrap_or_else(|| application_root.join("jobs"));

    let output_root = match paths.output_root.as_deref() {
        Some(p) => under_root(p),
        None => default_output_root(&application_root),
    };

    let output_folder = paths
        .output_folder
        .as_deref()
        .map(under_root)
        .unwrap_or_else(|| output_root.join("output"));

    let module_root = paths
        .module_root
        .as_deref()
        .map(under_root)
        .unwrap_or_else(|| application_root.clone());

    let dev_folders = paths.dev_folders.iter().map(|p| under_root(p)).collect();

    Ok(ResolvedPaths {
        application_root,
        jobs_folder,
        output_root,
        output_folder,
        module_root,
        dev_folders,
    })
}

/// `~/Documents/quasar`, falling back to the home directory and finally to
/// the application root when neither is known.
fn default_output_root(application_root: &Path) -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("quasar"))
        .unwrap_or_else(|| application_root.join("quasar-output"))
}
