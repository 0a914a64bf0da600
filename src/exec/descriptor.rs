// src/exec/descriptor.rs

//! Spawn descriptors: everything needed to create one child process.
//!
//! The three shapes the dispatcher uses are constructors on
//! [`SpawnDescriptor`]:
//! - [`SpawnDescriptor::sibling_job`]: another instance of this program that
//!   runs a single job file.
//! - [`SpawnDescriptor::desktop_shell`]: the desktop shell, detached.
//! - [`SpawnDescriptor::dependency_install`]: `<package manager> install` in
//!   a sub-application directory.

use std::path::{Path, PathBuf};

use crate::cli::{APP_ROOT_ENV, CONFIG_ENV, LogLevel, NO_LOGO_ENV};
use crate::types::{ExecMode, StdioMode};

/// Environment flag that makes the desktop shell behave as a plain process
/// runtime instead of opening a GUI.
pub const PROCESS_RUNTIME_ENV: (&str, &str) = ("ELECTRON_RUN_AS_NODE", "1");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnDescriptor {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    pub stdio: StdioMode,
    /// Detached children get their own process group and are never killed
    /// when their handle is dropped.
    pub detached: bool,
    pub mode: ExecMode,
}

impl SpawnDescriptor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            stdio: StdioMode::Inherited,
            detached: false,
            mode: ExecMode::Asynchronous,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    pub fn synchronous(mut self, synchronous: bool) -> Self {
        self.mode = if synchronous {
            ExecMode::Synchronous
        } else {
            ExecMode::Asynchronous
        };
        self
    }

    fn process_runtime(self) -> Self {
        let (key, value) = PROCESS_RUNTIME_ENV;
        self.env(key, value)
    }

    /// Sibling instance of this program running one job file out-of-process.
    pub fn sibling_job(exe: &Path, args_file: &Path, log_level: Option<LogLevel>) -> Self {
        let mut descriptor = Self::new(exe.to_string_lossy()).args([
            "--run-process=true".to_string(),
            "--no-prompt=true".to_string(),
            format!("--args-file={}", args_file.display()),
        ]);
        if let Some(level) = log_level {
            descriptor = descriptor.arg(format!("--log-level={}", level.as_str()));
        }
        descriptor.process_runtime()
    }

    /// Hand this process's config to a sibling instance. Passed through the
    /// environment so the sibling's argument vector stays fixed.
    pub fn inherit_config(self, config: Option<&Path>, app_root: &Path) -> Self {
        let descriptor = match config {
            Some(path) => self.env(CONFIG_ENV, path.to_string_lossy()),
            None => self,
        };
        descriptor
            .env(APP_ROOT_ENV, app_root.to_string_lossy())
            .env(NO_LOGO_ENV, "true")
    }

    /// Desktop shell started on the application root, outliving this process.
    pub fn desktop_shell(shell: &str, app_root: &Path) -> Self {
        Self::new(shell)
            .arg(".")
            .current_dir(app_root)
            .detached(true)
            .process_runtime()
    }

    /// `<package manager> install` in `dir`.
    pub fn dependency_install(package_manager: &str, dir: &Path) -> Self {
        Self::new(package_manager)
            .arg("install")
            .current_dir(dir)
            .detached(true)
            .process_runtime()
    }

    /// A shell command line, run through the platform shell.
    pub fn shell_command(cmd: &str) -> Self {
        if cfg!(windows) {
            Self::new("cmd").args(["/C", cmd])
        } else {
            Self::new("sh").args(["-c", cmd])
        }
    }

    /// `program arg1 arg2 ...`, for logging.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
