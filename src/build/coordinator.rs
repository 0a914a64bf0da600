// src/build/coordinator.rs

//! Build Retry Coordinator: recover from a sub-application that has not been
//! built yet by building it once and retrying the launch once.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::build::state::{RetryEvent, RetryLedger, RetryState};
use crate::errors::{QuasarError, Result};
use crate::exec::{SpawnDescriptor, SpawnGateway};
use crate::launch::SubAppSpec;
use crate::runtime::TaskRuntime;

pub struct BuildRetryCoordinator<'a> {
    runtime: &'a dyn TaskRuntime,
    gateway: &'a dyn SpawnGateway,
    package_manager: String,
}

impl<'a> BuildRetryCoordinator<'a> {
    pub fn new(
        runtime: &'a dyn TaskRuntime,
        gateway: &'a dyn SpawnGateway,
        package_manager: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            gateway,
            package_manager: package_manager.into(),
        }
    }

    /// Drive `spec` from `NotBuilt` to a terminal state.
    ///
    /// `relaunch` is the probe-and-launch to retry. It is `FnOnce`, so the
    /// retry can happen at most once per call; the ledger makes sure there is
    /// at most one call per sub-application per dispatch.
    ///
    /// Build and install failures are logged and the retry still happens;
    /// only the retry outcome decides success.
    pub async fn recover<F, Fut>(
        &self,
        spec: &SubAppSpec,
        allowed: bool,
        ledger: &mut RetryLedger,
        relaunch: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut machine = Machine::new(spec);

        if !allowed {
            machine.advance(RetryEvent::PermissionDenied);
            let err = QuasarError::NotBuilt {
                app: spec.kind,
                entry: spec.entry.clone(),
                flag: spec.kind.auto_build_flag(),
            };
            error!(app = %spec.kind, "{err}");
            return Err(err);
        }

        let Some(token) = ledger.acquire(spec.kind) else {
            machine.advance(RetryEvent::TokenSpent);
            return Err(QuasarError::RetryExhausted(spec.kind));
        };
        debug!(app = %token.kind(), "retry token acquired");

        machine.advance(RetryEvent::BuildStarted);
        info!(app = %spec.kind, task = %spec.build_task, "automated quasar build of `{}`", spec.kind);
        if let Err(err) = self.runtime.run_task(&spec.build_task, Value::Null).await {
            // TODO: stop before the retry once build tasks report a reliable outcome.
            error!(app = %spec.kind, task = %spec.build_task, error = %err, "build failed; retrying launch anyway");
        }

        if let Some(dir) = &spec.install_dir {
            debug!(app = %spec.kind, dir = ?dir, pm = %self.package_manager, "will install dependencies");
            let install = SpawnDescriptor::dependency_install(&self.package_manager, dir);
            match self.gateway.spawn(install).await {
                Ok(outcome) => match outcome.finish().await {
                    Ok(exit) => info!(app = %spec.kind, %exit, "finished installing {} dependencies", spec.kind),
                    Err(err) => error!(app = %spec.kind, error = %err, "dependency install did not finish cleanly"),
                },
                Err(err) => error!(app = %spec.kind, error = %err, "could not start dependency install"),
            }
        }
        machine.advance(RetryEvent::BuildFinished);

        info!(app = %spec.kind, "attempting another run of the {}", spec.kind);
        machine.advance(RetryEvent::RetryStarted);
        let launched = match relaunch().await {
            Ok(launched) => launched,
            Err(err) => {
                machine.advance(RetryEvent::Launched(false));
                return Err(err);
            }
        };

        match machine.advance(RetryEvent::Launched(launched)) {
            RetryState::Succeeded => Ok(()),
            _ => {
                let err = QuasarError::StillCannotLaunch {
                    app: spec.kind,
                    entry: spec.entry.clone(),
                };
                error!(app = %spec.kind, "Can't do that! {err}");
                Err(err)
            }
        }
    }
}

/// Tracks the current state for one `recover` call and logs transitions.
struct Machine<'s> {
    spec: &'s SubAppSpec,
    state: RetryState,
}

impl<'s> Machine<'s> {
    fn new(spec: &'s SubAppSpec) -> Self {
        Self {
            spec,
            state: RetryState::NotBuilt,
        }
    }

    fn advance(&mut self, event: RetryEvent) -> RetryState {
        let next = self.state.next(event).unwrap_or(RetryState::Failed);
        debug!(app = %self.spec.kind, from = ?self.state, to = ?next, ?event, "build-retry transition");
        self.state = next;
        next
    }
}
