// src/watch/event_handler.rs

//! Turning raw `notify` events into job admissions.

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::runtime::JobDescriptor;
use crate::watch::hash::{SeenJobs, compute_content_hash};
use crate::watch::patterns::JobPattern;

/// Filesystem change relevant to the job queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFsChange {
    /// A file appeared (created, or renamed into the folder).
    Added(PathBuf),
    /// A writer closed the file. Only counts for files not admitted yet,
    /// which covers writers whose create event arrived before the content.
    Written(PathBuf),
    /// A file disappeared (removed, or renamed away).
    Removed(PathBuf),
}

/// Classify one `notify` event. Everything except adds, finished writes and
/// removals is ignored.
pub fn classify(event: &Event) -> Vec<JobFsChange> {
    let paths = event.paths.iter().cloned();
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => paths.map(JobFsChange::Added).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(JobFsChange::Added).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(JobFsChange::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![
                JobFsChange::Removed(from.clone()),
                JobFsChange::Added(to.clone()),
            ],
            _ => Vec::new(),
        },
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            paths.map(JobFsChange::Written).collect()
        }
        EventKind::Remove(_) => paths.map(JobFsChange::Removed).collect(),
        _ => Vec::new(),
    }
}

/// Decide whether an added file becomes a job.
///
/// - `Ok(None)`: not a job file, still empty, or a duplicate identity.
/// - `Ok(Some(job))`: a new job; its identity is now recorded.
/// - `Err(_)`: unreadable or malformed. The identity is not recorded, so a
///   later finished write of the same file gets another chance.
pub fn admit_added(
    fs: &dyn FileSystem,
    seen: &mut SeenJobs,
    pattern: &JobPattern,
    path: &Path,
) -> Result<Option<JobDescriptor>> {
    if !pattern.matches(path) || !fs.is_file(path) {
        return Ok(None);
    }

    let bytes = fs.read(path)?;
    if bytes.is_empty() {
        debug!(?path, "job file is still empty; waiting for its content");
        return Ok(None);
    }

    let hash = compute_content_hash(&bytes);
    if seen.is_duplicate(path, &hash) {
        debug!(?path, "duplicate add event for the same job; ignoring");
        return Ok(None);
    }

    let contents = String::from_utf8_lossy(&bytes);
    let job = JobDescriptor::parse(path, &contents)?;

    seen.record(path, hash);
    Ok(Some(job))
}

/// Record every matching file already in `dir` so it never dispatches.
pub fn snapshot_existing(
    fs: &dyn FileSystem,
    seen: &mut SeenJobs,
    pattern: &JobPattern,
    dir: &Path,
) -> Result<usize> {
    let mut count = 0;
    for path in fs.read_dir(dir)? {
        if !pattern.matches(&path) || !fs.is_file(&path) {
            continue;
        }
        let bytes = fs.read(&path)?;
        if seen.admit(&path, compute_content_hash(&bytes)) {
            count += 1;
        }
    }
    Ok(count)
}
