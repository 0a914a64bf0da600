// src/watch/hash.rs

//! Content hashing for job identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use tracing::debug;

/// Hash of a job file's bytes.
pub fn compute_content_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// Job identities seen by one watcher: path plus content hash.
///
/// A second add event for the same identity (some platforms report a create
/// twice) is a duplicate. A remove forgets the path, so a new file written
/// at the same location is a new identity.
#[derive(Debug, Default)]
pub struct SeenJobs {
    hashes: HashMap<PathBuf, String>,
}

impl SeenJobs {
    pub fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    /// True if `path` was already recorded with exactly this content.
    pub fn is_duplicate(&self, path: &Path, hash: &str) -> bool {
        self.hashes.get(path).is_some_and(|existing| existing == hash)
    }

    pub fn record(&mut self, path: &Path, hash: String) {
        self.hashes.insert(path.to_path_buf(), hash);
    }

    /// Record `path` with `hash`. Returns `false` if this exact identity was
    /// already recorded.
    pub fn admit(&mut self, path: &Path, hash: String) -> bool {
        if self.is_duplicate(path, &hash) {
            return false;
        }
        self.record(path, hash);
        true
    }

    pub fn forget(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!(?path, "forgot job identity");
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.hashes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
