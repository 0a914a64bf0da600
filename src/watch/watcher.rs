// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::Result as QuasarResult;
use crate::fs::FileSystem;
use crate::runtime::JobDescriptor;
use crate::types::BoxFuture;
use crate::watch::event_handler::{JobFsChange, admit_added, classify, snapshot_existing};
use crate::watch::hash::SeenJobs;
use crate::watch::patterns::JobPattern;
use crate::success;

/// Where admitted jobs go. The dispatcher implements this with its
/// single-job path; tests record the jobs instead.
pub trait JobSink: Send + Sync {
    fn dispatch_job(&self, job: JobDescriptor) -> BoxFuture<'_, QuasarResult<()>>;
}

/// Handle for the job queue watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct JobWatcherHandle {
    _inner: RecommendedWatcher,
    folder: PathBuf,
    task: JoinHandle<()>,
}

impl JobWatcherHandle {
    pub fn folder(&self) -> &PathBuf {
        &self.folder
    }
}

impl Drop for JobWatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for JobWatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobWatcherHandle")
            .field("folder", &self.folder)
            .finish()
    }
}

/// Spawn a watcher on `folder` that hands every newly added job file to
/// `sink`.
///
/// - Files already in `folder` are recorded up front and never dispatched.
/// - Only additions dispatch; modifications of admitted files do not.
/// - Each job is dispatched on its own Tokio task, so jobs added together
///   run concurrently and one failing job never stops the watcher.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_job_watcher(
    folder: impl Into<PathBuf>,
    pattern: JobPattern,
    fs: Arc<dyn FileSystem>,
    sink: Arc<dyn JobSink>,
) -> Result<JobWatcherHandle> {
    let folder = folder.into();
    fs.create_dir_all(&folder)?;
    let folder = folder.canonicalize().unwrap_or(folder);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("quasar: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("quasar: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&folder, RecursiveMode::NonRecursive)?;

    let mut seen = SeenJobs::new();
    let existing = snapshot_existing(fs.as_ref(), &mut seen, &pattern, &folder)?;
    debug!(existing, "ignoring job files present at startup");

    success!(
        "watching folder {} for new {} files to build from",
        folder.display(),
        pattern.as_str()
    );

    let task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for change in classify(&event) {
                let path = match change {
                    JobFsChange::Removed(path) => {
                        seen.forget(&path);
                        continue;
                    }
                    JobFsChange::Written(path) if seen.contains(&path) => continue,
                    JobFsChange::Added(path) | JobFsChange::Written(path) => path,
                };

                match admit_added(fs.as_ref(), &mut seen, &pattern, &path) {
                    Ok(Some(job)) => dispatch(Arc::clone(&sink), job),
                    Ok(None) => {}
                    Err(err) => {
                        error!(job = ?path, error = %err, "error reading job file");
                    }
                }
            }
        }
        warn!("job watcher event loop finished");
    });

    Ok(JobWatcherHandle {
        _inner: watcher,
        folder,
        task,
    })
}

fn dispatch(sink: Arc<dyn JobSink>, job: JobDescriptor) {
    tokio::spawn(async move {
        let path = job.path.clone();
        info!(job = ?path, "new job file");
        if let Err(err) = sink.dispatch_job(job).await {
            error!(job = ?path, error = %err, "error");
        }
    });
}
