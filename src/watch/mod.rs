// src/watch/mod.rs

//! Job Queue Watcher.
//!
//! This module is responsible for:
//! - Matching job descriptor file names against the configured pattern.
//! - Wiring up a cross-platform filesystem watcher (`notify`) on
//!   `<jobs>/created`.
//! - Tracking job identities (path + content hash) so each job dispatches
//!   at most once.
//!
//! It does **not** know how jobs run; admitted jobs are handed to a
//! [`JobSink`].

pub mod event_handler;
pub mod hash;
pub mod patterns;
pub mod watcher;

pub use event_handler::{JobFsChange, admit_added, classify, snapshot_existing};
pub use hash::{SeenJobs, compute_content_hash};
pub use patterns::JobPattern;
pub use watcher::{JobSink, JobWatcherHandle, spawn_job_watcher};
