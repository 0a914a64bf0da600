#![allow(dead_code)]

use std::path::PathBuf;

use quasar::config::{ConfigFile, OptionOverrides, RawConfigFile, ResolvedOptions, TaskConfig};

/// Builder for `ConfigFile` rooted at a fixed application root, with the
/// output root under it so nothing touches the home directory.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        let app_root = app_root.into();
        let mut config = RawConfigFile::default();
        config.paths.output_root = Some(app_root.join("out"));
        config.paths.application_root = app_root;
        Self { config }
    }

    pub fn jobs_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.paths.jobs_folder = Some(path.into());
        self
    }

    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.paths.output_root = Some(path.into());
        self
    }

    pub fn package_manager(mut self, pm: &str) -> Self {
        self.config.runtime.package_manager = pm.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.runtime.port = port;
        self
    }

    pub fn task(self, name: &str, cmd: &str) -> Self {
        self.task_with_default(name, cmd, true)
    }

    pub fn task_with_default(mut self, name: &str, cmd: &str, default: bool) -> Self {
        self.config.task.insert(
            name.to_string(),
            TaskConfig {
                cmd: cmd.to_string(),
                default,
            },
        );
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `ResolvedOptions`: defaults for a config, then overrides.
pub struct OptionsBuilder {
    base: ResolvedOptions,
    overrides: OptionOverrides,
}

impl OptionsBuilder {
    pub fn new(cfg: &ConfigFile) -> Self {
        Self {
            base: ResolvedOptions::defaults(cfg, None).expect("defaults without PORT"),
            overrides: OptionOverrides::default(),
        }
    }

    /// Batch mode (`--no-prompt`).
    pub fn batch(mut self) -> Self {
        self.overrides.no_prompt = Some(true);
        self
    }

    pub fn replay_last_build(mut self) -> Self {
        self.overrides.replay_last_build = Some(true);
        self
    }

    pub fn package_app(mut self) -> Self {
        self.overrides.package_app = Some(true);
        self
    }

    pub fn clean_all_output(mut self) -> Self {
        self.overrides.clean_all_output = Some(true);
        self
    }

    pub fn clean_output(mut self) -> Self {
        self.overrides.clean_output = Some(true);
        self
    }

    pub fn clean_dev(mut self) -> Self {
        self.overrides.clean_dev = Some(true);
        self
    }

    pub fn run_electron_app(mut self) -> Self {
        self.overrides.run_electron_app = Some(true);
        self
    }

    pub fn args_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overrides.args_file = Some(path.into());
        self
    }

    pub fn q_type(mut self, task: &str) -> Self {
        self.overrides.q_type = Some(task.to_string());
        self
    }

    pub fn run_process(mut self) -> Self {
        self.overrides.run_process = Some(true);
        self
    }

    pub fn run_web_api(mut self) -> Self {
        self.overrides.run_web_api = Some(true);
        self
    }

    pub fn run_web_form(mut self) -> Self {
        self.overrides.run_web_form = Some(true);
        self
    }

    pub fn run_web_app(mut self) -> Self {
        self.overrides.run_web_app = Some(true);
        self
    }

    pub fn watch_jobs(mut self) -> Self {
        self.overrides.watch_jobs = Some(true);
        self
    }

    pub fn auto_build_web_form(mut self) -> Self {
        self.overrides.auto_build_web_form = Some(true);
        self
    }

    pub fn auto_build_web_app(mut self) -> Self {
        self.overrides.auto_build_web_app = Some(true);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.overrides.port = Some(port);
        self
    }

    pub fn load_tasks(mut self, tasks: &[&str]) -> Self {
        self.overrides.load_tasks = Some(tasks.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn build(self) -> ResolvedOptions {
        self.base.merge(self.overrides)
    }
}
