// src/context.rs

//! Process-wide state shared by every dispatch.
//!
//! One [`Context`] is created per process and shared through an `Arc`. It
//! owns the collaborators, the lazily created web host (one per process, no
//! matter how many steps ask for it) and the handles that keep long-lived
//! activations running.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cli::LogLevel;
use crate::config::ConfigFile;
use crate::exec::{RealSpawnGateway, SpawnGateway};
use crate::fs::{FileSystem, RealFileSystem};
use crate::launch::{ProcessSubAppLoader, SubAppLoader};
use crate::prompt::{DialoguerPrompter, Prompter};
use crate::runtime::{LocalTaskRuntime, TaskRuntime};
use crate::watch::JobWatcherHandle;
use crate::web::{AxumWebHost, WebHost, WebHostFactory};

pub struct Context {
    pub cfg: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
    pub gateway: Arc<dyn SpawnGateway>,
    pub runtime: Arc<dyn TaskRuntime>,
    pub prompter: Arc<dyn Prompter>,
    pub loader: Arc<dyn SubAppLoader>,

    /// Executable started for out-of-process jobs.
    pub sibling_exe: PathBuf,
    /// Forwarded to sibling instances.
    pub log_level: Option<LogLevel>,

    web_factory: WebHostFactory,
    web_host: OnceLock<Arc<dyn WebHost>>,

    watchers: Mutex<Vec<JobWatcherHandle>>,
    servers: Mutex<Vec<JoinHandle<()>>>,
}

impl Context {
    /// The web host, created on first use with `port`. Later calls return
    /// the same host whatever port they pass.
    pub fn web_host(&self, port: u16) -> Arc<dyn WebHost> {
        let host = self.web_host.get_or_init(|| {
            debug!(port, "creating web host");
            (self.web_factory)(port)
        });
        Arc::clone(host)
    }

    pub fn has_web_host(&self) -> bool {
        self.web_host.get().is_some()
    }

    pub fn keep_watcher(&self, handle: JobWatcherHandle) {
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.push(handle);
        }
    }

    pub fn keep_server(&self, handle: JoinHandle<()>) {
        if let Ok(mut servers) = self.servers.lock() {
            servers.push(handle);
        }
    }

    /// True once a watcher or server is running that should keep the
    /// process alive.
    pub fn has_long_lived(&self) -> bool {
        let watchers = self.watchers.lock().map(|w| !w.is_empty()).unwrap_or(false);
        let servers = self.servers.lock().map(|s| !s.is_empty()).unwrap_or(false);
        watchers || servers
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("application_root", &self.cfg.paths.application_root)
            .field("sibling_exe", &self.sibling_exe)
            .field("has_web_host", &self.has_web_host())
            .finish()
    }
}

/// Builds a [`Context`] with the production collaborators unless told
/// otherwise.
pub struct ContextBuilder {
    cfg: ConfigFile,
    fs: Option<Arc<dyn FileSystem>>,
    gateway: Option<Arc<dyn SpawnGateway>>,
    runtime: Option<Arc<dyn TaskRuntime>>,
    prompter: Option<Arc<dyn Prompter>>,
    loader: Option<Arc<dyn SubAppLoader>>,
    web_factory: Option<WebHostFactory>,
    sibling_exe: Option<PathBuf>,
    log_level: Option<LogLevel>,
}

impl ContextBuilder {
    pub fn new(cfg: ConfigFile) -> Self {
        Self {
            cfg,
            fs: None,
            gateway: None,
            runtime: None,
            prompter: None,
            loader: None,
            web_factory: None,
            sibling_exe: None,
            log_level: None,
        }
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn SpawnGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn runtime(mut self, runtime: Arc<dyn TaskRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn SubAppLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn web_factory(mut self, factory: WebHostFactory) -> Self {
        self.web_factory = Some(factory);
        self
    }

    pub fn sibling_exe(mut self, exe: impl Into<PathBuf>) -> Self {
        self.sibling_exe = Some(exe.into());
        self
    }

    pub fn log_level(mut self, level: Option<LogLevel>) -> Self {
        self.log_level = level;
        self
    }

    pub fn build(self) -> Context {
        let fs = self
            .fs
            .unwrap_or_else(|| Arc::new(RealFileSystem) as Arc<dyn FileSystem>);
        let gateway = self
            .gateway
            .unwrap_or_else(|| Arc::new(RealSpawnGateway::new()) as Arc<dyn SpawnGateway>);
        let runtime = self.runtime.unwrap_or_else(|| {
            Arc::new(LocalTaskRuntime::new(
                self.cfg.clone(),
                Arc::clone(&gateway),
                Arc::clone(&fs),
            )) as Arc<dyn TaskRuntime>
        });
        let prompter = self
            .prompter
            .unwrap_or_else(|| Arc::new(DialoguerPrompter) as Arc<dyn Prompter>);
        let loader = self.loader.unwrap_or_else(|| {
            Arc::new(ProcessSubAppLoader::new(
                self.cfg.runtime.node.clone(),
                Arc::clone(&gateway),
            )) as Arc<dyn SubAppLoader>
        });
        let sibling_exe = self.sibling_exe.unwrap_or_else(|| {
            std::env::current_exe().unwrap_or_else(|_| PathBuf::from("quasar"))
        });

        Context {
            cfg: self.cfg,
            fs,
            gateway,
            runtime,
            prompter,
            loader,
            sibling_exe,
            log_level: self.log_level,
            web_factory: self.web_factory.unwrap_or_else(AxumWebHost::factory),
            web_host: OnceLock::new(),
            watchers: Mutex::new(Vec::new()),
            servers: Mutex::new(Vec::new()),
        }
    }
}
