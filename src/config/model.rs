// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// application_root = "."
/// jobs_folder = "jobs"
///
/// [runtime]
/// port = 3000
/// package_manager = "yarn"
///
/// [task.quasar-webform]
/// cmd = "npm run build:webform"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub runtime: RuntimeSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[paths]` section. Relative paths are resolved against
/// `application_root` (which itself is resolved against the working
/// directory).
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_application_root")]
    pub application_root: PathBuf,

    /// Defaults to `<application_root>/jobs`.
    #[serde(default)]
    pub jobs_folder: Option<PathBuf>,

    /// Defaults to `~/Documents/quasar`.
    #[serde(default)]
    pub output_root: Option<PathBuf>,

    /// Defaults to `<output_root>/output`.
    #[serde(default)]
    pub output_folder: Option<PathBuf>,

    /// Where package manager scripts are looked up when `package_manager`
    /// is a relative path. Defaults to `application_root`.
    #[serde(default)]
    pub module_root: Option<PathBuf>,

    /// Development folders removed by `--clean-dev-folders`.
    #[serde(default = "default_dev_folders")]
    pub dev_folders: Vec<PathBuf>,
}

fn default_application_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_dev_folders() -> Vec<PathBuf> {
    vec![PathBuf::from("dev")]
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            application_root: default_application_root(),
            jobs_folder: None,
            output_root: None,
            output_folder: None,
            module_root: None,
            dev_folders: default_dev_folders(),
        }
    }
}

/// `[runtime]` section: ports, executables and sub-application layout.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    /// Default port; the `PORT` environment variable wins over this.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_package_manager")]
    pub package_manager: String,

    /// Runtime used to launch sub-application entry files.
    #[serde(default = "default_node")]
    pub node: String,

    /// Desktop shell started by `--run-electron-app`.
    #[serde(default = "default_desktop_shell")]
    pub desktop_shell: String,

    /// Shell command run by `--package-app`.
    #[serde(default = "default_package_cmd")]
    pub package_cmd: String,

    /// File-name glob for job descriptors in `<jobs>/created`.
    #[serde(default = "default_job_pattern")]
    pub job_pattern: String,

    #[serde(default = "default_web_form_entry")]
    pub web_form_entry: PathBuf,

    #[serde(default = "default_web_form_build_task")]
    pub web_form_build_task: String,

    /// Port the web form listens on. Defaults to the API port + 1, so it
    /// never competes with the web API for the same socket.
    #[serde(default)]
    pub web_form_port: Option<u16>,

    /// Where `<package_manager> install` runs after building the web form.
    #[serde(default = "default_web_form_install_dir")]
    pub web_form_install_dir: Option<PathBuf>,

    #[serde(default = "default_web_app_entry")]
    pub web_app_entry: PathBuf,

    #[serde(default = "default_web_app_build_task")]
    pub web_app_build_task: String,

    /// Defaults to the API port + 2.
    #[serde(default)]
    pub web_app_port: Option<u16>,

    #[serde(default)]
    pub web_app_install_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    3000
}

fn default_package_manager() -> String {
    "yarn".to_string()
}

fn default_node() -> String {
    "node".to_string()
}

fn default_desktop_shell() -> String {
    "electron".to_string()
}

fn default_package_cmd() -> String {
    "electron-packager . quasar --out=dist --overwrite".to_string()
}

fn default_job_pattern() -> String {
    "*.json".to_string()
}

fn default_web_form_entry() -> PathBuf {
    PathBuf::from("app/webform/app.js")
}

fn default_web_form_build_task() -> String {
    "quasar-webform".to_string()
}

fn default_web_form_install_dir() -> Option<PathBuf> {
    Some(PathBuf::from("app/webform"))
}

fn default_web_app_entry() -> PathBuf {
    PathBuf::from("app/app.js")
}

fn default_web_app_build_task() -> String {
    "quasar-webapp".to_string()
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            package_manager: default_package_manager(),
            node: default_node(),
            desktop_shell: default_desktop_shell(),
            package_cmd: default_package_cmd(),
            job_pattern: default_job_pattern(),
            web_form_entry: default_web_form_entry(),
            web_form_build_task: default_web_form_build_task(),
            web_form_port: None,
            web_form_install_dir: default_web_form_install_dir(),
            web_app_entry: default_web_app_entry(),
            web_app_build_task: default_web_app_build_task(),
            web_app_port: None,
            web_app_install_dir: None,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to execute.
    pub cmd: String,

    /// Whether the task shows up in the menu when default tasks are loaded.
    #[serde(default = "default_true")]
    pub default: bool,
}

fn default_true() -> bool {
    true
}

/// Absolute locations derived from `[paths]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub application_root: PathBuf,
    pub jobs_folder: PathBuf,
    pub output_root: PathBuf,
    pub output_folder: PathBuf,
    pub module_root: PathBuf,
    pub dev_folders: Vec<PathBuf>,
}

impl ResolvedPaths {
    /// Folder watched for new job descriptors.
    pub fn job_queue_folder(&self) -> PathBuf {
        self.jobs_folder.join("created")
    }
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: ResolvedPaths,
    pub runtime: RuntimeSection,
    pub task: BTreeMap<String, TaskConfig>,
    /// Absolute path of the file this was loaded from; `None` for the
    /// built-in defaults.
    pub source: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        paths: ResolvedPaths,
        runtime: RuntimeSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            paths,
            runtime,
            task,
            source: None,
        }
    }

    /// Package manager executable. A relative path with a directory part is
    /// looked up under `module_root`; a bare name is left to `PATH`.
    pub fn package_manager_program(&self) -> String {
        let pm = Path::new(&self.runtime.package_manager);
        if pm.is_relative() && pm.components().count() > 1 {
            self.paths.module_root.join(pm).to_string_lossy().into_owned()
        } else {
            self.runtime.package_manager.clone()
        }
    }

    /// Built-in defaults, used when no config file exists.
    pub fn defaults() -> crate::errors::Result<Self> {
        Self::try_from(RawConfigFile::default())
    }
}
