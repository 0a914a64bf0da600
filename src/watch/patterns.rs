// src/watch/patterns.rs

use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};

/// File-name pattern for job descriptors (e.g. `*.json`).
///
/// Only the file name is matched, so the pattern does not depend on where
/// the jobs folder lives.
#[derive(Debug, Clone)]
pub struct JobPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl JobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern)
            .with_context(|| format!("invalid job pattern '{pattern}'"))?;
        Ok(Self {
            raw: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matcher.is_match(name))
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}
