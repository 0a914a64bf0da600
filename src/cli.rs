// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every boolean selector accepts both `--flag` and `--flag=true|false`, so a
//! sibling instance can be started with explicit values
//! (`--run-process=true --no-prompt=true --args-file=...`).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::OptionOverrides;

/// Config file path, used when `--config` is not given. Sibling job
/// instances receive the parent's config through it.
pub const CONFIG_ENV: &str = "QUASAR_CONFIG";
/// Application root override, used when `--app-root` is not given.
pub const APP_ROOT_ENV: &str = "QUASAR_APP_ROOT";
/// Banner suppression, used when `--no-logo` is not given.
pub const NO_LOGO_ENV: &str = "QUASAR_NO_LOGO";

/// Command-line arguments for `quasar`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "quasar",
    version,
    about = "Dispatch quasar builds, jobs and sub-applications.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Quasar.toml` in the current working directory. A missing
    /// default file is not an error; built-in defaults are used instead.
    #[arg(long, value_name = "PATH", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `QUASAR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override the application root from the config file. Relative paths in
    /// the config are resolved against this root instead.
    #[arg(long, value_name = "PATH", env = APP_ROOT_ENV)]
    pub app_root: Option<PathBuf>,

    /// Port for the web API and sub-applications.
    #[arg(long, value_name = "N")]
    pub port: Option<u16>,

    /// Replay the last recorded successful run.
    #[arg(long, alias = "re-run", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub run_last_successful_build: Option<bool>,

    /// Package the application root.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub package_app: Option<bool>,

    /// Run in batch mode instead of showing the task menu.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub no_prompt: Option<bool>,

    /// Marks a sibling instance started to run a single job file.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub run_process: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub clean_all_output_folders: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub clean_output_folder: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub clean_dev_folders: Option<bool>,

    /// Launch the application root in the desktop shell.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub run_electron_app: Option<bool>,

    /// Run the job described by this JSON file.
    #[arg(long, value_name = "PATH")]
    pub args_file: Option<PathBuf>,

    /// Run this named task with the resolved options as its arguments.
    #[arg(long, value_name = "TASK")]
    pub q_type: Option<String>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub run_web_api: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub run_web_form: Option<bool>,

    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub run_web_app: Option<bool>,

    /// Watch `<jobs>/created` and run every job file added to it.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub watch_jobs: Option<bool>,

    /// Build the web form if it is missing, then retry once.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub auto_build_web_form: Option<bool>,

    /// Build the web app if it is missing, then retry once.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub auto_build_web_app: Option<bool>,

    /// Don't print the startup banner.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", env = NO_LOGO_ENV)]
    pub no_logo: Option<bool>,

    /// Only offer these tasks in the menu (comma separated).
    #[arg(long, value_name = "TASKS", value_delimiter = ',')]
    pub load_tasks: Vec<String>,

    /// Also offer the tasks marked as default in the config.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub load_default_tasks: Option<bool>,
}

impl CliArgs {
    /// Invocation-time overrides to merge over the configured defaults.
    ///
    /// `--config` and `--app-root` are not among them: they shape the
    /// config itself (see [`crate::config::load_or_default`]).
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            port: self.port,
            replay_last_build: self.run_last_successful_build,
            package_app: self.package_app,
            no_prompt: self.no_prompt,
            run_process: self.run_process,
            clean_all_output: self.clean_all_output_folders,
            clean_output: self.clean_output_folder,
            clean_dev: self.clean_dev_folders,
            run_electron_app: self.run_electron_app,
            args_file: self.args_file.clone(),
            q_type: self.q_type.clone(),
            run_web_api: self.run_web_api,
            run_web_form: self.run_web_form,
            run_web_app: self.run_web_app,
            watch_jobs: self.watch_jobs,
            auto_build_web_form: self.auto_build_web_form,
            auto_build_web_app: self.auto_build_web_app,
            no_logo: self.no_logo,
            load_tasks: (!self.load_tasks.is_empty()).then(|| self.load_tasks.clone()),
            load_default_tasks: self.load_default_tasks,
            log_level: self.log_level,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The spelling accepted by `--log-level`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
