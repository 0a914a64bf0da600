#![allow(dead_code)]

//! Fake collaborators. Each fake is `Clone` and shares its state between
//! clones, so a test keeps one clone for assertions and hands another to the
//! code under test.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::task::JoinHandle;

use quasar::errors::{QuasarError, Result};
use quasar::exec::{ExitInfo, ProcessEvent, ProcessHandle, SpawnDescriptor, SpawnGateway, SpawnOutcome};
use quasar::launch::{SubAppLoader, SubApplication};
use quasar::prompt::Prompter;
use quasar::runtime::TaskRuntime;
use quasar::types::{BoxFuture, ExecMode, SubAppKind};
use quasar::web::{AppHandle, WebHost, WebHostFactory};

type SpawnHook = Arc<dyn Fn(&SpawnDescriptor) + Send + Sync>;

/// A fake spawn gateway that:
/// - records every descriptor it is asked to spawn
/// - "runs" nothing; async children immediately report `Close`
/// - fails to start programs marked as missing
#[derive(Clone, Default)]
pub struct FakeSpawnGateway {
    inner: Arc<Mutex<GatewayState>>,
}

#[derive(Default)]
struct GatewayState {
    spawned: Vec<SpawnDescriptor>,
    exit_code: i32,
    missing: HashSet<String>,
    next_pid: u32,
    hook: Option<SpawnHook>,
}

impl FakeSpawnGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit code every spawned child reports.
    pub fn exit_code(self, code: i32) -> Self {
        self.inner.lock().unwrap().exit_code = code;
        self
    }

    /// Spawning `program` fails as if it was not installed.
    pub fn missing(self, program: &str) -> Self {
        self.inner.lock().unwrap().missing.insert(program.to_string());
        self
    }

    /// Called with each descriptor before the child "closes".
    pub fn on_spawn(&self, hook: impl Fn(&SpawnDescriptor) + Send + Sync + 'static) {
        self.inner.lock().unwrap().hook = Some(Arc::new(hook));
    }

    pub fn spawned(&self) -> Vec<SpawnDescriptor> {
        self.inner.lock().unwrap().spawned.clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.spawned().into_iter().map(|d| d.program).collect()
    }
}

impl SpawnGateway for FakeSpawnGateway {
    fn spawn(&self, descriptor: SpawnDescriptor) -> BoxFuture<'_, Result<SpawnOutcome>> {
        Box::pin(async move {
            let (hook, exit_code, missing, pid) = {
                let mut state = self.inner.lock().unwrap();
                state.spawned.push(descriptor.clone());
                state.next_pid += 1;
                (
                    state.hook.clone(),
                    state.exit_code,
                    state.missing.contains(&descriptor.program),
                    1000 + state.next_pid,
                )
            };

            if missing {
                return Err(QuasarError::SpawnFailed {
                    program: descriptor.program,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }

            if let Some(hook) = hook {
                hook(&descriptor);
            }

            let exit = ExitInfo::with_code(exit_code);
            if descriptor.mode == ExecMode::Synchronous {
                return Ok(SpawnOutcome::Completed(exit));
            }

            let (tx, handle) = ProcessHandle::channel(descriptor.program.clone(), Some(pid));
            let _ = tx.send(ProcessEvent::Close(exit));
            Ok(SpawnOutcome::Running(handle))
        })
    }
}

/// One call made on a [`FakeTaskRuntime`].
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    CreateOutputFolders,
    CleanOutputFolders { all: bool },
    CleanDevFolders,
    LoadTasks { explicit: Vec<String>, load_defaults: bool },
    RunTask { name: String, args: Value },
    RunFromArgsFile(PathBuf),
    RunLastSuccessfulBuild,
    PackageApp,
}

type TaskHook = Arc<dyn Fn() + Send + Sync>;

/// A fake task runtime that records calls. Tasks succeed unless marked as
/// failing; a hook can run when a given task runs (e.g. to "build" a
/// sub-application by creating its entry file).
#[derive(Clone, Default)]
pub struct FakeTaskRuntime {
    inner: Arc<Mutex<RuntimeState>>,
}

#[derive(Default)]
struct RuntimeState {
    calls: Vec<RuntimeCall>,
    task_names: Vec<String>,
    failing: HashSet<String>,
    hooks: HashMap<String, TaskHook>,
}

impl FakeTaskRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_names(self, names: &[&str]) -> Self {
        self.inner.lock().unwrap().task_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn fail_task(&self, name: &str) {
        self.inner.lock().unwrap().failing.insert(name.to_string());
    }

    pub fn on_task(&self, name: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.inner
            .lock()
            .unwrap()
            .hooks
            .insert(name.to_string(), Arc::new(hook));
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Names of the tasks run so far, in order.
    pub fn task_runs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RuntimeCall::RunTask { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Calls other than the startup `CreateOutputFolders`.
    pub fn action_calls(&self) -> Vec<RuntimeCall> {
        self.calls()
            .into_iter()
            .filter(|c| *c != RuntimeCall::CreateOutputFolders)
            .collect()
    }

    fn record(&self, call: RuntimeCall) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl TaskRuntime for FakeTaskRuntime {
    fn create_output_folders(&self) -> Result<()> {
        self.record(RuntimeCall::CreateOutputFolders);
        Ok(())
    }

    fn clean_output_folders(&self, all: bool) -> Result<PathBuf> {
        self.record(RuntimeCall::CleanOutputFolders { all });
        Ok(PathBuf::from(if all { "/out" } else { "/out/output" }))
    }

    fn clean_dev_folders(&self) -> Result<()> {
        self.record(RuntimeCall::CleanDevFolders);
        Ok(())
    }

    fn load_tasks(&self, explicit: &[String], load_defaults: bool) {
        self.record(RuntimeCall::LoadTasks {
            explicit: explicit.to_vec(),
            load_defaults,
        });
    }

    fn available_task_names(&self) -> Vec<String> {
        self.inner.lock().unwrap().task_names.clone()
    }

    fn run_task<'a>(&'a self, name: &'a str, args: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(RuntimeCall::RunTask {
                name: name.to_string(),
                args,
            });

            let (hook, failing) = {
                let state = self.inner.lock().unwrap();
                (state.hooks.get(name).cloned(), state.failing.contains(name))
            };
            if let Some(hook) = hook {
                hook();
            }

            if failing {
                return Err(QuasarError::TaskFailed {
                    task: name.to_string(),
                    reason: "exit code 1".to_string(),
                });
            }
            Ok(())
        })
    }

    fn run_from_args_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(RuntimeCall::RunFromArgsFile(path.to_path_buf()));
            Ok(())
        })
    }

    fn run_last_successful_build(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record(RuntimeCall::RunLastSuccessfulBuild);
            Ok(())
        })
    }

    fn package_app(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record(RuntimeCall::PackageApp);
            Ok(())
        })
    }
}

/// A fake prompter that answers with a fixed choice, or the first offered
/// choice when none is set.
#[derive(Clone, Default)]
pub struct FakePrompter {
    inner: Arc<Mutex<PrompterState>>,
}

#[derive(Default)]
struct PrompterState {
    answer: Option<String>,
    prompts: Vec<(String, Vec<String>)>,
}

impl FakePrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, choice: &str) {
        self.inner.lock().unwrap().answer = Some(choice.to_string());
    }

    pub fn prompts(&self) -> Vec<(String, Vec<String>)> {
        self.inner.lock().unwrap().prompts.clone()
    }
}

impl Prompter for FakePrompter {
    fn select(&self, message: &str, choices: Vec<String>) -> BoxFuture<'_, Result<String>> {
        let message = message.to_string();
        Box::pin(async move {
            let mut state = self.inner.lock().unwrap();
            state.prompts.push((message, choices.clone()));
            state
                .answer
                .clone()
                .or_else(|| choices.first().cloned())
                .ok_or(QuasarError::NoTaskSelected)
        })
    }
}

/// Counts web hosts created through [`FakeWebHosts::factory`] and the ports
/// they were asked to serve on.
#[derive(Clone, Default)]
pub struct FakeWebHosts {
    created: Arc<AtomicUsize>,
    runs: Arc<Mutex<Vec<u16>>>,
}

impl FakeWebHosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> WebHostFactory {
        let created = Arc::clone(&self.created);
        let runs = Arc::clone(&self.runs);
        Arc::new(move |port| {
            created.fetch_add(1, Ordering::SeqCst);
            Arc::new(FakeWebHost {
                port,
                runs: Arc::clone(&runs),
            }) as Arc<dyn WebHost>
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> Vec<u16> {
        self.runs.lock().unwrap().clone()
    }
}

struct FakeWebHost {
    port: u16,
    runs: Arc<Mutex<Vec<u16>>>,
}

impl WebHost for FakeWebHost {
    fn app(&self) -> AppHandle {
        AppHandle::local(self.port)
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn run(&self, port: u16) -> BoxFuture<'_, Result<JoinHandle<()>>> {
        Box::pin(async move {
            self.runs.lock().unwrap().push(port);
            Ok(tokio::spawn(async {}))
        })
    }
}

/// A fake sub-application loader. Every load and every `run` is recorded;
/// nothing is started.
#[derive(Clone, Default)]
pub struct FakeSubAppLoader {
    loads: Arc<AtomicUsize>,
    launches: Arc<Mutex<Vec<(SubAppKind, u16)>>>,
}

impl FakeSubAppLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn launches(&self) -> Vec<(SubAppKind, u16)> {
        self.launches.lock().unwrap().clone()
    }
}

impl SubAppLoader for FakeSubAppLoader {
    fn load(&self, kind: SubAppKind, _entry: &Path) -> Result<Box<dyn SubApplication>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSubApp {
            kind,
            initialised: false,
            launches: Arc::clone(&self.launches),
        }))
    }
}

struct FakeSubApp {
    kind: SubAppKind,
    initialised: bool,
    launches: Arc<Mutex<Vec<(SubAppKind, u16)>>>,
}

impl SubApplication for FakeSubApp {
    fn init(&mut self) -> Result<()> {
        self.initialised = true;
        Ok(())
    }

    fn run<'a>(&'a mut self, _app: &'a AppHandle, port: u16) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            assert!(self.initialised, "run() before init()");
            self.launches.lock().unwrap().push((self.kind, port));
            Ok(())
        })
    }
}
