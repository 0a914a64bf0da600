// src/config/options.rs

//! Resolved Options: built-in/configured defaults merged with the overrides
//! given for one invocation. Keys are struct fields, so they are unique by
//! construction; an override always wins over a default.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::LogLevel;
use crate::config::model::ConfigFile;
use crate::errors::{QuasarError, Result};

/// Environment variable that overrides the configured port.
pub const PORT_ENV: &str = "PORT";

/// Immutable options for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    /// Always the config's application root.
    pub app_root: PathBuf,
    pub port: u16,

    // Top-level selectors.
    pub replay_last_build: bool,
    pub package_app: bool,
    pub no_prompt: bool,

    // Batch-mode selectors, in execution order.
    pub clean_all_output: bool,
    pub clean_output: bool,
    pub clean_dev: bool,
    pub run_electron_app: bool,
    pub args_file: Option<PathBuf>,
    pub q_type: Option<String>,
    pub run_web_api: bool,
    pub watch_jobs: bool,
    pub run_web_form: bool,
    pub run_web_app: bool,

    // Policy.
    pub auto_build_web_form: bool,
    pub auto_build_web_app: bool,
    pub run_process: bool,
    pub no_logo: bool,

    // Task catalog.
    pub load_tasks: Vec<String>,
    pub load_default_tasks: bool,

    pub log_level: Option<LogLevel>,
}

/// Invocation-time overrides. `None` means "keep the default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub port: Option<u16>,
    pub replay_last_build: Option<bool>,
    pub package_app: Option<bool>,
    pub no_prompt: Option<bool>,
    pub run_process: Option<bool>,
    pub clean_all_output: Option<bool>,
    pub clean_output: Option<bool>,
    pub clean_dev: Option<bool>,
    pub run_electron_app: Option<bool>,
    pub args_file: Option<PathBuf>,
    pub q_type: Option<String>,
    pub run_web_api: Option<bool>,
    pub run_web_form: Option<bool>,
    pub run_web_app: Option<bool>,
    pub watch_jobs: Option<bool>,
    pub auto_build_web_form: Option<bool>,
    pub auto_build_web_app: Option<bool>,
    pub no_logo: Option<bool>,
    pub load_tasks: Option<Vec<String>>,
    pub load_default_tasks: Option<bool>,
    pub log_level: Option<LogLevel>,
}

impl ResolvedOptions {
    /// Defaults from the config plus the `PORT` environment variable, then
    /// the given overrides on top.
    pub fn resolve(cfg: &ConfigFile, overrides: OptionOverrides) -> Result<Self> {
        let env_port = std::env::var(PORT_ENV).ok();
        Self::resolve_with_env(cfg, overrides, env_port.as_deref())
    }

    /// [`resolve`](Self::resolve) with the raw `PORT` value passed in. An
    /// explicit port override means `env_port` is never parsed.
    pub fn resolve_with_env(
        cfg: &ConfigFile,
        overrides: OptionOverrides,
        env_port: Option<&str>,
    ) -> Result<Self> {
        let env_port = if overrides.port.is_some() { None } else { env_port };
        Ok(Self::defaults(cfg, env_port)?.merge(overrides))
    }

    /// Built-in defaults for this config. `env_port` is the raw value of
    /// `PORT`, if set.
    pub fn defaults(cfg: &ConfigFile, env_port: Option<&str>) -> Result<Self> {
        let port = match env_port.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(|| {
                QuasarError::ConfigError(format!("{PORT_ENV}={raw} is not a valid port"))
            })?,
            None => cfg.runtime.port,
        };

        Ok(Self {
            app_root: cfg.paths.application_root.clone(),
            port,
            replay_last_build: false,
            package_app: false,
            no_prompt: false,
            clean_all_output: false,
            clean_output: false,
            clean_dev: false,
            run_electron_app: false,
            args_file: None,
            q_type: None,
            run_web_api: false,
            watch_jobs: false,
            run_web_form: false,
            run_web_app: false,
            auto_build_web_form: false,
            auto_build_web_app: false,
            run_process: false,
            no_logo: false,
            load_tasks: Vec::new(),
            load_default_tasks: true,
            log_level: None,
        })
    }

    /// Apply overrides; every `Some` replaces the current value.
    pub fn merge(mut self, o: OptionOverrides) -> Self {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut self.port, o.port);
        set(&mut self.replay_last_build, o.replay_last_build);
        set(&mut self.package_app, o.package_app);
        set(&mut self.no_prompt, o.no_prompt);
        set(&mut self.run_process, o.run_process);
        set(&mut self.clean_all_output, o.clean_all_output);
        set(&mut self.clean_output, o.clean_output);
        set(&mut self.clean_dev, o.clean_dev);
        set(&mut self.run_electron_app, o.run_electron_app);
        set(&mut self.run_web_api, o.run_web_api);
        set(&mut self.run_web_form, o.run_web_form);
        set(&mut self.run_web_app, o.run_web_app);
        set(&mut self.watch_jobs, o.watch_jobs);
        set(&mut self.auto_build_web_form, o.auto_build_web_form);
        set(&mut self.auto_build_web_app, o.auto_build_web_app);
        set(&mut self.no_logo, o.no_logo);
        set(&mut self.load_tasks, o.load_tasks);
        set(&mut self.load_default_tasks, o.load_default_tasks);

        // An empty `--args-file=` means "no job file".
        if let Some(path) = o.args_file {
            self.args_file = (!path.as_os_str().is_empty()).then_some(path);
        }
        if let Some(task) = o.q_type {
            self.q_type = (!task.trim().is_empty()).then_some(task);
        }
        if o.log_level.is_some() {
            self.log_level = o.log_level;
        }

        self
    }

    /// True if any step needs the web-serving collaborator.
    pub fn needs_web_host(&self) -> bool {
        self.run_web_api || self.run_web_form || self.run_web_app
    }
}
