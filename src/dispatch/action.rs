// src/dispatch/action.rs

//! Pure decision logic: which top-level action a dispatch takes, and which
//! batch steps run, in which order.

use std::path::PathBuf;

use crate::config::ResolvedOptions;
use crate::types::SubAppKind;

/// Exactly one of these is selected per dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevelAction {
    ReplayLastBuild,
    PackageApp,
    Batch,
    Interactive,
}

/// First match wins: replay, package, batch (`no_prompt`), else the menu.
pub fn select_action(opts: &ResolvedOptions) -> TopLevelAction {
    if opts.replay_last_build {
        TopLevelAction::ReplayLastBuild
    } else if opts.package_app {
        TopLevelAction::PackageApp
    } else if opts.no_prompt {
        TopLevelAction::Batch
    } else {
        TopLevelAction::Interactive
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStep {
    CleanAllOutput,
    CleanOutput,
    CleanDev,
    /// Ends the batch.
    RunElectronApp,
    RunArgsFile(PathBuf),
    RunQType(String),
    AcquireWebHost,
    RunWebApi,
    WatchJobs,
    LaunchSubApp(SubAppKind),
}

/// Steps selected by `opts`, in execution order. Nothing follows the
/// desktop shell step.
pub fn plan(opts: &ResolvedOptions) -> Vec<BatchStep> {
    let mut steps = Vec::new();

    if opts.clean_all_output {
        steps.push(BatchStep::CleanAllOutput);
    }
    if opts.clean_output {
        steps.push(BatchStep::CleanOutput);
    }
    if opts.clean_dev {
        steps.push(BatchStep::CleanDev);
    }
    if opts.run_electron_app {
        steps.push(BatchStep::RunElectronApp);
        return steps;
    }
    if let Some(path) = &opts.args_file {
        steps.push(BatchStep::RunArgsFile(path.clone()));
    }
    if let Some(task) = &opts.q_type {
        steps.push(BatchStep::RunQType(task.clone()));
    }
    if opts.needs_web_host() {
        steps.push(BatchStep::AcquireWebHost);
    }
    if opts.run_web_api {
        steps.push(BatchStep::RunWebApi);
    }
    if opts.watch_jobs {
        steps.push(BatchStep::WatchJobs);
    }
    if opts.run_web_form {
        steps.push(BatchStep::LaunchSubApp(SubAppKind::WebForm));
    }
    if opts.run_web_app {
        steps.push(BatchStep::LaunchSubApp(SubAppKind::WebApp));
    }

    steps
}
