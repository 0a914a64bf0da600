// src/exec/process.rs

//! Process handles and their lifecycle events.
//!
//! A running child reports through an unbounded channel: zero or more
//! `Data` events, at most one `Error`, and exactly one terminal `Close`.
//! Whoever holds the [`ProcessHandle`] owns the child; once `Close` has been
//! observed the handle is consumed.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{QuasarError, Result};

/// Exit information reported by the terminal `Close` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ExitInfo {
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }

    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Lifecycle event of a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Diagnostic; a `Close` still follows if the OS reports termination.
    Error(String),
    Data { stream: OutputStream, line: String },
    Close(ExitInfo),
}

pub type ProcessEventSender = mpsc::UnboundedSender<ProcessEvent>;

/// Handle to a running (or finished) child.
#[derive(Debug)]
pub struct ProcessHandle {
    program: String,
    pid: Option<u32>,
    events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl ProcessHandle {
    /// Create a handle together with the sender its producer reports on.
    pub fn channel(program: impl Into<String>, pid: Option<u32>) -> (ProcessEventSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            program: program.into(),
            pid,
            events: rx,
        };
        (tx, handle)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Next lifecycle event, or `None` once the producer is gone.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }

    /// Drain events until `Close`, logging data and errors on the way.
    pub async fn wait(mut self) -> Result<ExitInfo> {
        while let Some(event) = self.events.recv().await {
            match event {
                ProcessEvent::Error(err) => {
                    error!(program = %self.program, pid = ?self.pid, error = %err, "SPAWN error");
                }
                ProcessEvent::Data { stream, line } => {
                    debug!(program = %self.program, ?stream, "DATA: {}", line);
                }
                ProcessEvent::Close(exit) => {
                    info!(
                        program = %self.program,
                        pid = ?self.pid,
                        exit_code = ?exit.code,
                        success = exit.success,
                        "command ended with {exit}"
                    );
                    return Ok(exit);
                }
            }
        }

        Err(QuasarError::SpawnLost {
            program: self.program,
        })
    }

    /// Stop tracking the child. A background task keeps draining its events
    /// so the close still gets logged; the caller only keeps the PID.
    pub fn detach(self) -> Option<u32> {
        let pid = self.pid;
        tokio::spawn(async move {
            if let Err(err) = self.wait().await {
                debug!(error = %err, "detached process stopped reporting");
            }
        });
        pid
    }
}

/// Result of a spawn: finished (synchronous mode) or still running.
#[derive(Debug)]
pub enum SpawnOutcome {
    Completed(ExitInfo),
    Running(ProcessHandle),
}

impl SpawnOutcome {
    /// Wait for the exit status regardless of the mode it was spawned in.
    pub async fn finish(self) -> Result<ExitInfo> {
        match self {
            SpawnOutcome::Completed(exit) => Ok(exit),
            SpawnOutcome::Running(handle) => handle.wait().await,
        }
    }
}
