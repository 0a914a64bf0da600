#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use quasar::config::ConfigFile;
use quasar::context::{Context, ContextBuilder};
use quasar::dispatch::Dispatcher;
use quasar::fs::mock::MockFileSystem;

use crate::fakes::{FakePrompter, FakeSpawnGateway, FakeSubAppLoader, FakeTaskRuntime, FakeWebHosts};

/// A dispatcher wired to fakes only, plus clones of every fake for
/// assertions.
pub struct Harness {
    pub cfg: ConfigFile,
    pub fs: MockFileSystem,
    pub gateway: FakeSpawnGateway,
    pub runtime: FakeTaskRuntime,
    pub prompter: FakePrompter,
    pub web: FakeWebHosts,
    pub loader: FakeSubAppLoader,
    pub ctx: Arc<Context>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    pub const SIBLING_EXE: &'static str = "/usr/local/bin/quasar";

    pub fn new(cfg: ConfigFile) -> Self {
        Self::with_runtime(cfg, FakeTaskRuntime::new())
    }

    pub fn with_runtime(cfg: ConfigFile, runtime: FakeTaskRuntime) -> Self {
        let fs = MockFileSystem::new();
        let gateway = FakeSpawnGateway::new();
        let prompter = FakePrompter::new();
        let web = FakeWebHosts::new();
        let loader = FakeSubAppLoader::new();

        let ctx = Arc::new(
            ContextBuilder::new(cfg.clone())
                .fs(Arc::new(fs.clone()))
                .gateway(Arc::new(gateway.clone()))
                .runtime(Arc::new(runtime.clone()))
                .prompter(Arc::new(prompter.clone()))
                .loader(Arc::new(loader.clone()))
                .web_factory(web.factory())
                .sibling_exe(Self::SIBLING_EXE)
                .build(),
        );
        let dispatcher = Dispatcher::new(Arc::clone(&ctx));

        Self {
            cfg,
            fs,
            gateway,
            runtime,
            prompter,
            web,
            loader,
            ctx,
            dispatcher,
        }
    }

    pub fn app_root(&self) -> &Path {
        &self.cfg.paths.application_root
    }

    pub fn web_form_entry(&self) -> PathBuf {
        self.app_root().join(&self.cfg.runtime.web_form_entry)
    }

    pub fn web_app_entry(&self) -> PathBuf {
        self.app_root().join(&self.cfg.runtime.web_app_entry)
    }

    /// Put the web form entry file in place, as a finished build would.
    pub fn build_web_form(&self) {
        self.fs.add_file(self.web_form_entry(), "module.exports = {}");
    }

    pub fn build_web_app(&self) {
        self.fs.add_file(self.web_app_entry(), "module.exports = {}");
    }

    /// Make the runtime create the web form entry when its build task runs.
    pub fn build_task_creates_web_form(&self) {
        let fs = self.fs.clone();
        let entry = self.web_form_entry();
        self.runtime
            .on_task(&self.cfg.runtime.web_form_build_task, move || {
                fs.add_file(&entry, "module.exports = {}");
            });
    }

    pub fn build_task_creates_web_app(&self) {
        let fs = self.fs.clone();
        let entry = self.web_app_entry();
        self.runtime
            .on_task(&self.cfg.runtime.web_app_build_task, move || {
                fs.add_file(&entry, "module.exports = {}");
            });
    }
}
