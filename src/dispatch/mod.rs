// src/dispatch/mod.rs

//! Run Dispatcher.
//!
//! Turns one set of [`ResolvedOptions`] into exactly one top-level action
//! (see [`action`]) and drives it to completion. Failures surface once, at
//! [`Dispatcher::run`], where they are logged as critical and turned into a
//! [`DispatchOutcome::Rejected`].
//!
//! The dispatcher is also the [`JobSink`] for the job queue watcher: every
//! admitted job file re-enters through the single-job path
//! ([`Dispatcher::run_job`]).

pub mod action;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::build::{BuildRetryCoordinator, RetryLedger};
use crate::config::ResolvedOptions;
use crate::context::Context;
use crate::errors::{QuasarError, Result};
use crate::exec::{SpawnDescriptor, SpawnOutcome};
use crate::launch::{SubAppSpec, probe_and_launch};
use crate::prompt::NO_TASKS_SENTINEL;
use crate::runtime::{JobDescriptor, JobStatus, inspect_status};
use crate::types::{BoxFuture, SubAppKind};
use crate::watch::{JobPattern, JobSink, spawn_job_watcher};
use crate::web::AppHandle;
use crate::{critical, success};

pub use action::{BatchStep, TopLevelAction, plan, select_action};

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Resolved,
    /// Carries the message that was logged.
    Rejected(String),
}

impl DispatchOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, DispatchOutcome::Resolved)
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: Arc<Context>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Dispatch and convert any error into a rejected outcome.
    pub async fn run(&self, opts: &ResolvedOptions) -> DispatchOutcome {
        match self.dispatch(opts).await {
            Ok(()) => DispatchOutcome::Resolved,
            Err(err) => {
                critical!(error = %err, "dispatch rejected");
                DispatchOutcome::Rejected(err.to_string())
            }
        }
    }

    pub async fn dispatch(&self, opts: &ResolvedOptions) -> Result<()> {
        self.ctx.runtime.create_output_folders()?;

        let action = select_action(opts);
        debug!(?action, "selected top-level action");

        match action {
            TopLevelAction::ReplayLastBuild => self.ctx.runtime.run_last_successful_build().await,
            TopLevelAction::PackageApp => self.ctx.runtime.package_app().await,
            TopLevelAction::Batch => self.run_batch(opts).await,
            TopLevelAction::Interactive => self.run_interactive(opts).await,
        }
    }

    /// Run every selected batch step in order. A failing step stops the
    /// batch, except the job steps whose failures are only logged.
    pub async fn run_batch(&self, opts: &ResolvedOptions) -> Result<()> {
        let steps = plan(opts);
        if steps.is_empty() {
            debug!("no batch step selected");
            return Ok(());
        }

        let mut ledger = RetryLedger::new();
        for step in steps {
            debug!(?step, "batch step");
            self.run_step(&step, opts, &mut ledger).await?;
        }
        Ok(())
    }

    async fn run_step(
        &self,
        step: &BatchStep,
        opts: &ResolvedOptions,
        ledger: &mut RetryLedger,
    ) -> Result<()> {
        let ctx = &self.ctx;

        match step {
            BatchStep::CleanAllOutput => {
                let path = ctx.runtime.clean_output_folders(true)?;
                success!("Successfully cleaned output root path {}", path.display());
            }
            BatchStep::CleanOutput => {
                let path = ctx.runtime.clean_output_folders(false)?;
                success!("Successfully cleaned output folder path {}", path.display());
            }
            BatchStep::CleanDev => {
                ctx.runtime.clean_dev_folders()?;
                success!(
                    "Successfully cleaned the dev folder paths in the application root {}",
                    ctx.cfg.paths.application_root.display()
                );
            }
            BatchStep::RunElectronApp => {
                info!("running the webApp in electron");
                self.spawn_desktop_shell().await?;
            }
            BatchStep::RunArgsFile(path) => {
                let result = if opts.run_process {
                    ctx.runtime.run_from_args_file(path).await
                } else {
                    self.run_job(path).await
                };
                if let Err(err) = result {
                    error!(job = ?path, error = %err, "cli error");
                }
            }
            BatchStep::RunQType(task) => {
                info!(task = %task, "automated quasar build from --q-type");
                if let Err(err) = self.run_q_type(task, opts).await {
                    error!(task = %task, error = %err, "cli error");
                }
            }
            BatchStep::AcquireWebHost => {
                let host = ctx.web_host(opts.port);
                debug!(port = host.port(), "web host ready");
            }
            BatchStep::RunWebApi => {
                debug!("will run webApi");
                let host = ctx.web_host(opts.port);
                let server = host.run(opts.port).await?;
                ctx.keep_server(server);
            }
            BatchStep::WatchJobs => {
                debug!("will run watchJobs");
                let pattern = JobPattern::new(&ctx.cfg.runtime.job_pattern)?;
                let sink: Arc<dyn JobSink> = Arc::new(self.clone());
                let handle = spawn_job_watcher(
                    ctx.cfg.paths.job_queue_folder(),
                    pattern,
                    Arc::clone(&ctx.fs),
                    sink,
                )?;
                ctx.keep_watcher(handle);
            }
            BatchStep::LaunchSubApp(kind) => {
                let allowed = match kind {
                    SubAppKind::WebForm => opts.auto_build_web_form,
                    SubAppKind::WebApp => opts.auto_build_web_app,
                };
                self.launch_sub_app(*kind, allowed, opts, ledger).await?;
            }
        }

        Ok(())
    }

    async fn spawn_desktop_shell(&self) -> Result<()> {
        let cfg = &self.ctx.cfg;
        let descriptor =
            SpawnDescriptor::desktop_shell(&cfg.runtime.desktop_shell, &cfg.paths.application_root);
        debug!(cmd = %descriptor.command_line(), "spawning desktop shell");

        match self.ctx.gateway.spawn(descriptor).await? {
            SpawnOutcome::Running(handle) => {
                let pid = handle.detach();
                info!(pid = ?pid, "desktop shell started");
            }
            SpawnOutcome::Completed(exit) => info!(%exit, "desktop shell exited"),
        }
        Ok(())
    }

    async fn run_q_type(&self, task: &str, opts: &ResolvedOptions) -> Result<()> {
        let args = serde_json::to_value(opts)?;
        self.ctx.runtime.run_task(task, args).await
    }

    /// Probe the sub-application; if it is not built, hand over to the build
    /// retry coordinator.
    async fn launch_sub_app(
        &self,
        kind: SubAppKind,
        allowed: bool,
        opts: &ResolvedOptions,
        ledger: &mut RetryLedger,
    ) -> Result<()> {
        let spec = SubAppSpec::for_kind(kind, &self.ctx.cfg, opts.port);
        let app = self.ctx.web_host(opts.port).app();

        if self.probe(&spec, &app).await? {
            success!(app = %kind, "{kind} launched");
            return Ok(());
        }

        let coordinator = BuildRetryCoordinator::new(
            self.ctx.runtime.as_ref(),
            self.ctx.gateway.as_ref(),
            self.ctx.cfg.package_manager_program(),
        );
        coordinator
            .recover(&spec, allowed, ledger, || self.probe(&spec, &app))
            .await?;

        success!(app = %kind, "{kind} launched after build");
        Ok(())
    }

    async fn probe(&self, spec: &SubAppSpec, app: &AppHandle) -> Result<bool> {
        probe_and_launch(self.ctx.fs.as_ref(), self.ctx.loader.as_ref(), spec, app).await
    }

    /// Interactive mode: offer the loaded tasks and run the chosen one.
    async fn run_interactive(&self, opts: &ResolvedOptions) -> Result<()> {
        let runtime = &self.ctx.runtime;
        runtime.load_tasks(&opts.load_tasks, opts.load_default_tasks);

        let mut choices = runtime.available_task_names();
        if choices.is_empty() {
            choices.push(NO_TASKS_SENTINEL.to_string());
        }

        let selected = self
            .ctx
            .prompter
            .select("Select the type of quasar you want to launch", choices)
            .await?;

        if selected == NO_TASKS_SENTINEL {
            info!("alright then, nothing to run");
            return Err(QuasarError::NoTaskSelected);
        }

        runtime.run_task(&selected, Value::Null).await
    }

    /// Single-job path: run the job file in a sibling instance, wait for it
    /// to close, then report the status it left in the file.
    pub async fn run_job(&self, path: &Path) -> Result<()> {
        info!(job = ?path, "processing argsFile");

        let cfg = &self.ctx.cfg;
        let descriptor =
            SpawnDescriptor::sibling_job(&self.ctx.sibling_exe, path, self.ctx.log_level)
                .inherit_config(cfg.source.as_deref(), &cfg.paths.application_root);
        debug!("Running module {}", descriptor.command_line());

        let exit = self.ctx.gateway.spawn(descriptor).await?.finish().await?;

        match inspect_status(self.ctx.fs.as_ref(), path) {
            Ok(JobStatus::Ok) => success!(job = ?path, "job finished"),
            Ok(JobStatus::Failed(reason)) => error!(job = ?path, %reason, "job failed"),
            Ok(JobStatus::Missing) => warn!(job = ?path, "job file is gone"),
            Err(err) => warn!(job = ?path, error = %err, "could not inspect job status"),
        }

        if !exit.success {
            return Err(QuasarError::JobError {
                path: path.to_path_buf(),
                reason: exit.to_string(),
            });
        }
        Ok(())
    }
}

impl JobSink for Dispatcher {
    fn dispatch_job(&self, job: JobDescriptor) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            debug!(job = ?job.path, payload = %job.payload, "argsfile contents");
            self.run_job(&job.path).await
        })
    }
}
