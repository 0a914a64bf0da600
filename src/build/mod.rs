// src/build/mod.rs

//! Build-then-retry for sub-applications that are not on disk yet.
//!
//! - [`state`] holds the pure state machine and the per-dispatch retry
//!   ledger.
//! - [`coordinator`] drives it: build task, dependency install, one retry.

pub mod coordinator;
pub mod state;

pub use coordinator::BuildRetryCoordinator;
pub use state::{RetryEvent, RetryLedger, RetryState, RetryToken};
