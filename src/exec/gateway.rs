// src/exec/gateway.rs

//! The Spawn Gateway: one seam for every child process the dispatcher
//! creates.
//!
//! Production code uses [`RealSpawnGateway`] (Tokio processes); tests provide
//! their own implementation that records descriptors and fabricates
//! lifecycle events.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{QuasarError, Result};
use crate::exec::descriptor::SpawnDescriptor;
use crate::exec::process::{
    ExitInfo, OutputStream, ProcessEvent, ProcessEventSender, ProcessHandle, SpawnOutcome,
};
use crate::types::{BoxFuture, ExecMode, StdioMode};

/// Trait abstracting how child processes are created.
pub trait SpawnGateway: Send + Sync {
    /// Start the described process.
    ///
    /// - `Synchronous` descriptors resolve to `SpawnOutcome::Completed` once
    ///   the child exits.
    /// - `Asynchronous` descriptors resolve immediately to
    ///   `SpawnOutcome::Running`.
    ///
    /// An executable that cannot be started (not found, permission denied)
    /// is reported as `Err(QuasarError::SpawnFailed)`; no `Close` follows.
    fn spawn(&self, descriptor: SpawnDescriptor) -> BoxFuture<'_, Result<SpawnOutcome>>;
}

/// Gateway backed by `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct RealSpawnGateway;

impl RealSpawnGateway {
    pub fn new() -> Self {
        Self
    }
}

impl SpawnGateway for RealSpawnGateway {
    fn spawn(&self, descriptor: SpawnDescriptor) -> BoxFuture<'_, Result<SpawnOutcome>> {
        Box::pin(async move {
            debug!(cmd = %descriptor.command_line(), cwd = ?descriptor.current_dir, "spawning");

            let mut cmd = build_command(&descriptor);
            let mut child = cmd.spawn().map_err(|source| QuasarError::SpawnFailed {
                program: descriptor.program.clone(),
                source,
            })?;
            let pid = child.id();

            if descriptor.detached {
                info!(program = %descriptor.program, pid = ?pid, "started detached process");
            }

            if descriptor.mode == ExecMode::Synchronous {
                // Inherited stdio here, so there is nothing to pump.
                let status = child.wait().await?;
                return Ok(SpawnOutcome::Completed(ExitInfo::from_status(status)));
            }

            let (tx, handle) = ProcessHandle::channel(descriptor.program.clone(), pid);

            let mut pumps = Vec::new();
            if let Some(stdout) = child.stdout.take() {
                pumps.push(tokio::spawn(pump_lines(stdout, OutputStream::Stdout, tx.clone())));
            }
            if let Some(stderr) = child.stderr.take() {
                pumps.push(tokio::spawn(pump_lines(stderr, OutputStream::Stderr, tx.clone())));
            }

            tokio::spawn(async move {
                let status = child.wait().await;

                // Close must be the last event, after all output lines.
                for pump in pumps {
                    let _ = pump.await;
                }

                match status {
                    Ok(status) => {
                        let _ = tx.send(ProcessEvent::Close(ExitInfo::from_status(status)));
                    }
                    Err(err) => {
                        let _ = tx.send(ProcessEvent::Error(err.to_string()));
                    }
                }
            });

            Ok(SpawnOutcome::Running(handle))
        })
    }
}

fn build_command(descriptor: &SpawnDescriptor) -> Command {
    let mut cmd = Command::new(&descriptor.program);
    cmd.args(&descriptor.args);
    cmd.envs(descriptor.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    if let Some(dir) = &descriptor.current_dir {
        cmd.current_dir(dir);
    }

    // Synchronous children always share our terminal.
    let piped =
        descriptor.stdio == StdioMode::Piped && descriptor.mode == ExecMode::Asynchronous;
    if piped {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    cmd.stdin(Stdio::inherit());

    if descriptor.detached {
        #[cfg(unix)]
        cmd.process_group(0);
    }
    cmd.kill_on_drop(false);

    cmd
}

async fn pump_lines<R>(reader: R, stream: OutputStream, tx: ProcessEventSender)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(ProcessEvent::Data { stream, line }).is_err() {
            break;
        }
    }
}
