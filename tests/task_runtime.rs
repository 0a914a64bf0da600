// tests/task_runtime.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use quasar::config::ConfigFile;
use quasar::errors::QuasarError;
use quasar::fs::FileSystem;
use quasar::fs::mock::MockFileSystem;
use quasar::runtime::local::{LAST_RUN_FILE, LastRun};
use quasar::runtime::{JobDescriptor, JobStatus, LocalTaskRuntime, TaskRuntime, inspect_status};
use quasar_test_utils::{ConfigBuilder, FakeSpawnGateway, init_tracing};

fn config() -> ConfigFile {
    ConfigBuilder::new("/srv/app")
        .task("report", "echo report")
        .task_with_default("quasar-webform", "npm run build:webform", false)
        .task("publish", "echo publish")
        .build()
}

fn runtime(gateway: &FakeSpawnGateway, fs: &MockFileSystem) -> LocalTaskRuntime {
    LocalTaskRuntime::new(config(), Arc::new(gateway.clone()), Arc::new(fs.clone()))
}

#[tokio::test]
async fn run_task_runs_the_configured_command_with_task_env() {
    init_tracing();
    let gateway = FakeSpawnGateway::new();
    let fs = MockFileSystem::new();
    let rt = runtime(&gateway, &fs);

    rt.run_task("report", json!({"id": 7})).await.unwrap();

    let spawned = gateway.spawned();
    assert_eq!(spawned.len(), 1);
    let cmd = &spawned[0];
    assert!(cmd.args.iter().any(|a| a == "echo report"));
    assert_eq!(cmd.current_dir, Some(PathBuf::from("/srv/app")));
    assert!(cmd.env.contains(&("QUASAR_TASK".to_string(), "report".to_string())));
    assert!(cmd.env.contains(&("QUASAR_ARGS".to_string(), r#"{"id":7}"#.to_string())));
}

#[tokio::test]
async fn unknown_task_is_an_error_and_spawns_nothing() {
    init_tracing();
    let gateway = FakeSpawnGateway::new();
    let rt = runtime(&gateway, &MockFileSystem::new());

    let err = rt.run_task("nope", json!(null)).await.unwrap_err();
    assert!(matches!(err, QuasarError::TaskNotFound(name) if name == "nope"));
    assert!(gateway.spawned().is_empty());
}

#[tokio::test]
async fn non_zero_exit_is_a_task_failure() {
    init_tracing();
    let gateway = FakeSpawnGateway::new().exit_code(3);
    let rt = runtime(&gateway, &MockFileSystem::new());

    match rt.run_task("report", json!(null)).await {
        Err(QuasarError::TaskFailed { task, reason }) => {
            assert_eq!(task, "report");
            assert!(reason.contains('3'));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn successful_job_file_becomes_the_last_run() {
    init_tracing();
    let gateway = FakeSpawnGateway::new();
    let fs = MockFileSystem::new();
    let rt = runtime(&gateway, &fs);
    let job = Path::new("/srv/app/jobs/created/x.json");
    fs.add_file(job, r#"{"task":"publish","args":{"target":"web"}}"#);

    rt.run_from_args_file(job).await.unwrap();

    let raw = fs
        .read_to_string(&Path::new("/srv/app/out").join(LAST_RUN_FILE))
        .unwrap();
    let last: LastRun = serde_json::from_str(&raw).unwrap();
    assert_eq!(last.task, "publish");
    assert_eq!(last.args, json!({"target": "web"}));
    assert_eq!(last.job, Some(job.to_path_buf()));
    assert_eq!(inspect_status(&fs, job).unwrap(), JobStatus::Ok);

    // Replaying runs the same task again.
    rt.run_last_successful_build().await.unwrap();
    let runs: Vec<_> = gateway
        .spawned()
        .into_iter()
        .filter(|d| d.env.contains(&("QUASAR_TASK".to_string(), "publish".to_string())))
        .collect();
    assert_eq!(runs.len(), 2);
}

#[tokio::test]
async fn failed_job_writes_its_error_back_into_the_file() {
    init_tracing();
    let gateway = FakeSpawnGateway::new().exit_code(1);
    let fs = MockFileSystem::new();
    let rt = runtime(&gateway, &fs);
    let job = Path::new("/srv/app/jobs/created/x.json");
    fs.add_file(job, r#"{"task":"report","args":{}}"#);

    assert!(rt.run_from_args_file(job).await.is_err());

    match inspect_status(&fs, job).unwrap() {
        JobStatus::Failed(msg) => assert!(msg.contains("report")),
        other => panic!("expected Failed, got {other:?}"),
    }
    // The rest of the payload is kept.
    let after = JobDescriptor::read(&fs, job).unwrap();
    assert_eq!(after.task(), Some("report"));
    assert!(!fs.is_file(&Path::new("/srv/app/out").join(LAST_RUN_FILE)));
}

#[tokio::test]
async fn job_without_a_task_is_rejected_and_marked() {
    init_tracing();
    let gateway = FakeSpawnGateway::new();
    let fs = MockFileSystem::new();
    let rt = runtime(&gateway, &fs);
    let job = Path::new("/srv/app/jobs/created/x.json");
    fs.add_file(job, r#"{"args":{}}"#);

    assert!(matches!(
        rt.run_from_args_file(job).await,
        Err(QuasarError::JobError { .. })
    ));
    assert!(matches!(inspect_status(&fs, job).unwrap(), JobStatus::Failed(_)));
    assert!(gateway.spawned().is_empty());
}

#[tokio::test]
async fn replay_without_a_recorded_run_is_an_error() {
    init_tracing();
    let rt = runtime(&FakeSpawnGateway::new(), &MockFileSystem::new());
    assert!(matches!(
        rt.run_last_successful_build().await,
        Err(QuasarError::ConfigError(_))
    ));
}

#[test]
fn task_catalog_combines_explicit_and_default_tasks() {
    let rt = runtime(&FakeSpawnGateway::new(), &MockFileSystem::new());

    rt.load_tasks(&["quasar-webform".to_string(), "missing".to_string()], true);
    assert_eq!(
        rt.available_task_names(),
        vec![
            "quasar-webform".to_string(),
            "publish".to_string(),
            "report".to_string()
        ]
    );

    rt.load_tasks(&[], false);
    assert!(rt.available_task_names().is_empty());

    rt.load_tasks(&[], true);
    assert_eq!(
        rt.available_task_names(),
        vec!["publish".to_string(), "report".to_string()]
    );
}

#[test]
fn output_folders_are_created_and_cleaned() {
    let fs = MockFileSystem::new();
    let rt = runtime(&FakeSpawnGateway::new(), &fs);

    rt.create_output_folders().unwrap();
    assert!(fs.is_dir(Path::new("/srv/app/out")));
    assert!(fs.is_dir(Path::new("/srv/app/out/output")));
    assert!(fs.is_dir(Path::new("/srv/app/jobs/created")));

    fs.add_file("/srv/app/out/output/result.txt", "x");
    fs.add_file("/srv/app/out/keep.txt", "y");

    let cleaned = rt.clean_output_folders(false).unwrap();
    assert_eq!(cleaned, PathBuf::from("/srv/app/out/output"));
    assert!(!fs.is_file(Path::new("/srv/app/out/output/result.txt")));
    assert!(fs.is_file(Path::new("/srv/app/out/keep.txt")));
    assert!(fs.is_dir(Path::new("/srv/app/out/output")));

    let cleaned = rt.clean_output_folders(true).unwrap();
    assert_eq!(cleaned, PathBuf::from("/srv/app/out"));
    assert!(!fs.is_file(Path::new("/srv/app/out/keep.txt")));
    assert!(fs.is_dir(Path::new("/srv/app/out/output")));
}

#[test]
fn dev_folders_are_removed() {
    let fs = MockFileSystem::new();
    let rt = runtime(&FakeSpawnGateway::new(), &fs);
    fs.add_file("/srv/app/dev/cache.bin", "x");
    fs.add_file("/srv/app/src/main.js", "y");

    rt.clean_dev_folders().unwrap();

    assert!(!fs.exists(Path::new("/srv/app/dev")));
    assert!(fs.is_file(Path::new("/srv/app/src/main.js")));
}

#[tokio::test]
async fn package_app_starts_the_packager_detached() {
    init_tracing();
    let gateway = FakeSpawnGateway::new();
    let rt = runtime(&gateway, &MockFileSystem::new());

    rt.package_app().await.unwrap();

    let spawned = gateway.spawned();
    assert_eq!(spawned.len(), 1);
    assert!(spawned[0].detached);
    assert!(spawned[0].args.iter().any(|a| a.contains("electron-packager")));
}

#[test]
fn job_descriptor_fields() {
    let job = JobDescriptor::parse("/q/a.json", r#"{"qType":"report","error":""}"#).unwrap();
    assert_eq!(job.task(), Some("report"));
    assert_eq!(job.error(), None);
    // Without `args` the whole payload is the arguments.
    assert_eq!(job.args(), json!({"qType": "report", "error": ""}));

    let failed = JobDescriptor::parse("/q/b.json", r#"{"error":{"code":2}}"#).unwrap();
    assert_eq!(failed.error(), Some(r#"{"code":2}"#.to_string()));

    assert!(JobDescriptor::parse("/q/c.json", "42").is_err());
}

#[test]
fn status_of_a_missing_job_file() {
    let fs = MockFileSystem::new();
    assert_eq!(
        inspect_status(&fs, Path::new("/q/none.json")).unwrap(),
        JobStatus::Missing
    );
}
