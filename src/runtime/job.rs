// src/runtime/job.rs

//! Job descriptors: JSON files describing one batch unit of work.
//!
//! The dispatcher treats the payload as opaque except for the optional
//! `error` field. The local task runtime additionally reads `task` (or
//! `qType`) and `args`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{QuasarError, Result};
use crate::fs::FileSystem;

#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    pub path: PathBuf,
    pub payload: Value,
}

impl JobDescriptor {
    /// Parse a job payload. The top level must be a JSON object.
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let path = path.into();
        let payload: Value = serde_json::from_str(contents)?;
        if !payload.is_object() {
            return Err(QuasarError::JobError {
                path,
                reason: "payload is not a JSON object".to_string(),
            });
        }
        Ok(Self { path, payload })
    }

    pub fn read(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let contents = fs.read_to_string(path)?;
        Self::parse(path, &contents)
    }

    /// The recorded error, if the job failed before.
    pub fn error(&self) -> Option<String> {
        match self.payload.get("error")? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Task this job runs.
    pub fn task(&self) -> Option<&str> {
        self.payload
            .get("task")
            .or_else(|| self.payload.get("qType"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Arguments for the task: the `args` object, or the whole payload.
    pub fn args(&self) -> Value {
        self.payload
            .get("args")
            .cloned()
            .unwrap_or_else(|| self.payload.clone())
    }
}

/// Status of a job file as seen from its `error` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Missing,
    Ok,
    Failed(String),
}

/// Read a job file and report whether it recorded an error.
pub fn inspect_status(fs: &dyn FileSystem, path: &Path) -> Result<JobStatus> {
    if !fs.is_file(path) {
        return Ok(JobStatus::Missing);
    }
    let job = JobDescriptor::read(fs, path)?;
    Ok(match job.error() {
        Some(err) => JobStatus::Failed(err),
        None => JobStatus::Ok,
    })
}

/// Write `error` into the job file, keeping the rest of the payload.
pub fn record_error(fs: &dyn FileSystem, path: &Path, message: &str) -> Result<()> {
    let mut job = JobDescriptor::read(fs, path)?;
    if let Some(obj) = job.payload.as_object_mut() {
        obj.insert("error".to_string(), Value::String(message.to_string()));
    }
    let bytes = serde_json::to_vec_pretty(&job.payload)?;
    fs.write(path, &bytes)?;
    Ok(())
}
