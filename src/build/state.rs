// src/build/state.rs

//! Build-then-retry state machine.
//!
//! ```text
//! NotBuilt -> BuildTriggered -> BuildComplete -> RetryAttempted -> Succeeded
//!    |                                                  \-------> Failed
//!    \-- (no permission) -----------------------------------------> Failed
//! ```
//!
//! Transitions are pure so the protocol can be checked without processes.

use std::collections::HashSet;

use crate::types::SubAppKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    NotBuilt,
    BuildTriggered,
    BuildComplete,
    RetryAttempted,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    /// Auto-build is not allowed for this sub-application.
    PermissionDenied,
    /// A retry token for this sub-application was already used.
    TokenSpent,
    BuildStarted,
    /// Build (and dependency install) finished. Carries no success flag.
    BuildFinished,
    RetryStarted,
    /// Outcome of the single retry probe.
    Launched(bool),
}

impl RetryState {
    /// Next state, or `None` if `event` is not valid in this state.
    pub fn next(self, event: RetryEvent) -> Option<RetryState> {
        use RetryEvent::*;
        use RetryState::*;

        match (self, event) {
            (NotBuilt, PermissionDenied) | (NotBuilt, TokenSpent) => Some(Failed),
            (NotBuilt, BuildStarted) => Some(BuildTriggered),
            (BuildTriggered, BuildFinished) => Some(BuildComplete),
            (BuildComplete, RetryStarted) => Some(RetryAttempted),
            (RetryAttempted, Launched(true)) => Some(Succeeded),
            (RetryAttempted, Launched(false)) => Some(Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RetryState::Succeeded | RetryState::Failed)
    }
}

/// Proof that a build-then-retry may run for `kind` in this dispatch.
#[derive(Debug, PartialEq, Eq)]
pub struct RetryToken {
    kind: SubAppKind,
}

impl RetryToken {
    pub fn kind(&self) -> SubAppKind {
        self.kind
    }
}

/// Retry tokens handed out during one dispatch. At most one per
/// sub-application.
#[derive(Debug, Default)]
pub struct RetryLedger {
    spent: HashSet<SubAppKind>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the token for `kind`, or `None` if it was already taken.
    pub fn acquire(&mut self, kind: SubAppKind) -> Option<RetryToken> {
        self.spent.insert(kind).then_some(RetryToken { kind })
    }

    pub fn is_spent(&self, kind: SubAppKind) -> bool {
        self.spent.contains(&kind)
    }
}
