// src/exec/mod.rs

//! Process execution layer (the Spawn Gateway).
//!
//! - [`descriptor`] describes one child: program, args, env, stdio,
//!   detachment and sync/async mode, plus the three shapes the dispatcher
//!   uses.
//! - [`process`] holds the running-child handle and its `error` / `data` /
//!   `close` events.
//! - [`gateway`] provides the `SpawnGateway` trait and the Tokio-backed
//!   `RealSpawnGateway`; tests replace it with a recording fake.

pub mod descriptor;
pub mod gateway;
pub mod process;

pub use descriptor::{PROCESS_RUNTIME_ENV, SpawnDescriptor};
pub use gateway::{RealSpawnGateway, SpawnGateway};
pub use process::{ExitInfo, OutputStream, ProcessEvent, ProcessHandle, SpawnOutcome};
