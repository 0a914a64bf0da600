// src/runtime/local.rs

//! Production task runtime.
//!
//! Tasks are the `[task.<name>]` entries of the config. A task runs its
//! `cmd` through the platform shell in the application root with two extra
//! environment variables:
//! - `QUASAR_TASK`: the task name
//! - `QUASAR_ARGS`: the task arguments as JSON
//!
//! Successful job runs are recorded in `<output_root>/.quasar/last-run.json`
//! so they can be replayed with `--run-last-successful-build`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::{QuasarError, Result};
use crate::exec::{SpawnDescriptor, SpawnGateway, SpawnOutcome};
use crate::fs::FileSystem;
use crate::runtime::TaskRuntime;
use crate::runtime::job::{JobDescriptor, record_error};
use crate::types::BoxFuture;
use crate::success;

/// Location of the last-run record, relative to the output root.
pub const LAST_RUN_FILE: &str = ".quasar/last-run.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    pub task: String,
    pub args: Value,
    pub job: Option<PathBuf>,
}

pub struct LocalTaskRuntime {
    cfg: ConfigFile,
    gateway: Arc<dyn SpawnGateway>,
    fs: Arc<dyn FileSystem>,
    loaded: Mutex<Vec<String>>,
}

impl LocalTaskRuntime {
    pub fn new(cfg: ConfigFile, gateway: Arc<dyn SpawnGateway>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            cfg,
            gateway,
            fs,
            loaded: Mutex::new(Vec::new()),
        }
    }

    fn last_run_path(&self) -> PathBuf {
        self.cfg.paths.output_root.join(LAST_RUN_FILE)
    }

    fn record_last_run(&self, run: &LastRun) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(run)?;
        self.fs.write(&self.last_run_path(), &bytes)?;
        Ok(())
    }

    async fn run_job(&self, path: &Path) -> Result<()> {
        let job = JobDescriptor::read(self.fs.as_ref(), path)?;
        debug!(job = ?path, payload = %job.payload, "job file contents");

        let task = job.task().ok_or_else(|| QuasarError::JobError {
            path: path.to_path_buf(),
            reason: "no `task` (or `qType`) field".to_string(),
        })?;
        let args = job.args();

        self.run_task(task, args.clone()).await?;

        self.record_last_run(&LastRun {
            task: task.to_string(),
            args,
            job: Some(path.to_path_buf()),
        })
    }
}

impl TaskRuntime for LocalTaskRuntime {
    fn create_output_folders(&self) -> Result<()> {
        let paths = &self.cfg.paths;
        for dir in [
            &paths.output_root,
            &paths.output_folder,
            &paths.job_queue_folder(),
        ] {
            self.fs.create_dir_all(dir)?;
        }
        Ok(())
    }

    fn clean_output_folders(&self, all: bool) -> Result<PathBuf> {
        let target = if all {
            self.cfg.paths.output_root.clone()
        } else {
            self.cfg.paths.output_folder.clone()
        };
        self.fs.remove_dir_all(&target)?;
        self.create_output_folders()?;
        Ok(target)
    }

    fn clean_dev_folders(&self) -> Result<()> {
        for dir in &self.cfg.paths.dev_folders {
            debug!(dir = ?dir, "removing dev folder");
            self.fs.remove_dir_all(dir)?;
        }
        Ok(())
    }

    fn load_tasks(&self, explicit: &[String], load_defaults: bool) {
        let mut names: Vec<String> = Vec::new();

        for name in explicit {
            if self.cfg.task.contains_key(name) {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            } else {
                warn!(task = %name, "requested task is not configured; skipping");
            }
        }

        if load_defaults {
            for (name, task) in &self.cfg.task {
                if task.default && !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }

        debug!(?names, "loaded tasks");
        if let Ok(mut loaded) = self.loaded.lock() {
            *loaded = names;
        }
    }

    fn available_task_names(&self) -> Vec<String> {
        self.loaded
            .lock()
            .map(|loaded| loaded.clone())
            .unwrap_or_default()
    }

    fn run_task<'a>(&'a self, name: &'a str, args: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let task = self
                .cfg
                .task
                .get(name)
                .ok_or_else(|| QuasarError::TaskNotFound(name.to_string()))?;

            info!(task = %name, cmd = %task.cmd, "running task");
            let descriptor = SpawnDescriptor::shell_command(&task.cmd)
                .current_dir(&self.cfg.paths.application_root)
                .env("QUASAR_TASK", name)
                .env("QUASAR_ARGS", args.to_string());

            let exit = self.gateway.spawn(descriptor).await?.finish().await?;
            if !exit.success {
                return Err(QuasarError::TaskFailed {
                    task: name.to_string(),
                    reason: exit.to_string(),
                });
            }

            success!(task = %name, "task finished");
            Ok(())
        })
    }

    fn run_from_args_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            info!(job = ?path, "processing argsFile");
            match self.run_job(path).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    if let Err(write_err) = record_error(self.fs.as_ref(), path, &err.to_string()) {
                        warn!(job = ?path, error = %write_err, "could not record job error");
                    }
                    Err(err)
                }
            }
        })
    }

    fn run_last_successful_build(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let path = self.last_run_path();
            if !self.fs.is_file(&path) {
                return Err(QuasarError::ConfigError(format!(
                    "no successful run recorded at {}",
                    path.display()
                )));
            }

            let raw = self.fs.read_to_string(&path)?;
            let last: LastRun = serde_json::from_str(&raw)?;
            info!(task = %last.task, job = ?last.job, "replaying last successful run");
            self.run_task(&last.task, last.args.clone()).await
        })
    }

    fn package_app(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let descriptor = SpawnDescriptor::shell_command(&self.cfg.runtime.package_cmd)
                .current_dir(&self.cfg.paths.application_root)
                .detached(true);

            match self.gateway.spawn(descriptor).await? {
                SpawnOutcome::Running(handle) => {
                    let pid = handle.detach();
                    info!(pid = ?pid, "packager started");
                }
                SpawnOutcome::Completed(exit) => {
                    info!(%exit, "packager finished");
                }
            }
            Ok(())
        })
    }
}
