// src/runtime/mod.rs

//! Task runtime collaborator.
//!
//! Everything the dispatcher delegates without caring how it is done:
//! output folder housekeeping, the task catalog, running named tasks and job
//! files, replaying the last successful run, and packaging.
//!
//! - [`job`] parses job descriptors and inspects their status.
//! - [`local`] is the production runtime, driven by `[task.<name>]` entries.

pub mod job;
pub mod local;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::Result;
use crate::types::BoxFuture;

pub use job::{JobDescriptor, JobStatus, inspect_status, record_error};
pub use local::LocalTaskRuntime;

pub trait TaskRuntime: Send + Sync {
    /// Create output and job folders. Idempotent.
    fn create_output_folders(&self) -> Result<()>;

    /// Empty the output folder (or the whole output root when `all`).
    /// Returns the path that was cleaned.
    fn clean_output_folders(&self, all: bool) -> Result<PathBuf>;

    fn clean_dev_folders(&self) -> Result<()>;

    /// Select which tasks the menu offers: the explicit ones, plus the
    /// default ones when `load_defaults`.
    fn load_tasks(&self, explicit: &[String], load_defaults: bool);

    fn available_task_names(&self) -> Vec<String>;

    fn run_task<'a>(&'a self, name: &'a str, args: Value) -> BoxFuture<'a, Result<()>>;

    /// Run the job described by the file at `path`, in this process.
    fn run_from_args_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>>;

    fn run_last_successful_build(&self) -> BoxFuture<'_, Result<()>>;

    /// Start packaging. Resolves once the packager has been started.
    fn package_app(&self) -> BoxFuture<'_, Result<()>>;
}
