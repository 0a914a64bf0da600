// src/launch/mod.rs

//! Sub-application launch probe.
//!
//! A sub-application (web form, web app) is "built" when its entry file
//! exists under the application root. Probing a built sub-application loads
//! it, calls `init()` and then `run(app, port)`; probing an unbuilt one has
//! no side effects and reports `false`.
//!
//! `port` is the sub-application's own port. The web API is reached through
//! the [`AppHandle`], never by sharing its socket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{SpawnDescriptor, SpawnGateway, SpawnOutcome};
use crate::fs::FileSystem;
use crate::types::{BoxFuture, SubAppKind};
use crate::web::AppHandle;

/// Where a sub-application lives and how to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAppSpec {
    pub kind: SubAppKind,
    /// Absolute path of the entry file whose presence means "built".
    pub entry: PathBuf,
    /// Task that builds the sub-application.
    pub build_task: String,
    /// Where dependencies are installed after a build, if anywhere.
    pub install_dir: Option<PathBuf>,
    /// Port the sub-application listens on.
    pub port: u16,
}

impl SubAppSpec {
    /// `api_port` is where the web API listens. Unless configured, the web
    /// form takes `api_port + 1` and the web app `api_port + 2`.
    pub fn for_kind(kind: SubAppKind, cfg: &ConfigFile, api_port: u16) -> Self {
        let rt = &cfg.runtime;
        let app_root = &cfg.paths.application_root;
        let (entry, build_task, install_dir, port, offset) = match kind {
            SubAppKind::WebForm => (
                &rt.web_form_entry,
                &rt.web_form_build_task,
                rt.web_form_install_dir.as_ref(),
                rt.web_form_port,
                1,
            ),
            SubAppKind::WebApp => (
                &rt.web_app_entry,
                &rt.web_app_build_task,
                rt.web_app_install_dir.as_ref(),
                rt.web_app_port,
                2,
            ),
        };

        Self {
            kind,
            entry: app_root.join(entry),
            build_task: build_task.clone(),
            install_dir: install_dir.map(|dir| app_root.join(dir)),
            port: port.unwrap_or_else(|| {
                api_port
                    .checked_add(offset)
                    .unwrap_or(api_port - offset)
            }),
        }
    }
}

/// A loaded sub-application module.
pub trait SubApplication: Send {
    fn init(&mut self) -> Result<()>;

    fn run<'a>(&'a mut self, app: &'a AppHandle, port: u16) -> BoxFuture<'a, Result<()>>;
}

/// Turns an entry file into a [`SubApplication`].
pub trait SubAppLoader: Send + Sync {
    fn load(&self, kind: SubAppKind, entry: &Path) -> Result<Box<dyn SubApplication>>;
}

/// Probe for the entry file; launch the sub-application if it is there.
///
/// Returns `Ok(false)` without side effects when the entry is missing.
pub async fn probe_and_launch(
    fs: &dyn FileSystem,
    loader: &dyn SubAppLoader,
    spec: &SubAppSpec,
    app: &AppHandle,
) -> Result<bool> {
    if !fs.is_file(&spec.entry) {
        debug!(app = %spec.kind, entry = ?spec.entry, "entry file not present");
        return Ok(false);
    }

    info!(app = %spec.kind, entry = ?spec.entry, port = spec.port, "loading the {} application", spec.kind);
    let mut sub_app = loader.load(spec.kind, &spec.entry)?;
    sub_app.init()?;
    sub_app.run(app, spec.port).await?;

    Ok(true)
}

/// Production loader: the entry file is started with the configured runtime
/// (`node` by default) as a detached child.
pub struct ProcessSubAppLoader {
    runtime: String,
    gateway: Arc<dyn SpawnGateway>,
}

impl ProcessSubAppLoader {
    pub fn new(runtime: impl Into<String>, gateway: Arc<dyn SpawnGateway>) -> Self {
        Self {
            runtime: runtime.into(),
            gateway,
        }
    }
}

impl SubAppLoader for ProcessSubAppLoader {
    fn load(&self, kind: SubAppKind, entry: &Path) -> Result<Box<dyn SubApplication>> {
        Ok(Box::new(ProcessSubApp {
            kind,
            runtime: self.runtime.clone(),
            entry: entry.to_path_buf(),
            gateway: Arc::clone(&self.gateway),
        }))
    }
}

struct ProcessSubApp {
    kind: SubAppKind,
    runtime: String,
    entry: PathBuf,
    gateway: Arc<dyn SpawnGateway>,
}

impl SubApplication for ProcessSubApp {
    fn init(&mut self) -> Result<()> {
        if self.entry.parent().is_none() {
            return Err(anyhow!("{} entry {:?} has no parent directory", self.kind, self.entry).into());
        }
        Ok(())
    }

    fn run<'a>(&'a mut self, app: &'a AppHandle, port: u16) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut descriptor = SpawnDescriptor::new(self.runtime.as_str())
                .arg(self.entry.to_string_lossy())
                .env("PORT", port.to_string())
                .env("QUASAR_API_URL", app.base_url.as_str())
                .detached(true);
            if let Some(dir) = self.entry.parent() {
                descriptor = descriptor.current_dir(dir);
            }

            match self.gateway.spawn(descriptor).await? {
                SpawnOutcome::Running(handle) => {
                    let pid = handle.detach();
                    info!(app = %self.kind, pid = ?pid, port, "sub-application started");
                }
                SpawnOutcome::Completed(exit) => {
                    info!(app = %self.kind, %exit, "sub-application exited");
                }
            }
            Ok(())
        })
    }
}
