// tests/spawn_gateway.rs
#![cfg(unix)]

use quasar::errors::QuasarError;
use quasar::exec::{
    OutputStream, ProcessEvent, RealSpawnGateway, SpawnDescriptor, SpawnGateway, SpawnOutcome,
};
use quasar::types::StdioMode;
use quasar_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn async_child_reports_data_then_close() {
    init_tracing();
    let gateway = RealSpawnGateway::new();
    let descriptor =
        SpawnDescriptor::shell_command("echo hello; echo oops 1>&2").stdio(StdioMode::Piped);

    let outcome = gateway.spawn(descriptor).await.unwrap();
    let SpawnOutcome::Running(mut handle) = outcome else {
        panic!("asynchronous spawn must return a running handle");
    };
    assert!(handle.pid().is_some());

    let mut events = Vec::new();
    with_timeout(async {
        while let Some(event) = handle.next_event().await {
            let done = matches!(event, ProcessEvent::Close(_));
            events.push(event);
            if done {
                break;
            }
        }
    })
    .await;

    assert!(events.contains(&ProcessEvent::Data {
        stream: OutputStream::Stdout,
        line: "hello".to_string(),
    }));
    assert!(events.contains(&ProcessEvent::Data {
        stream: OutputStream::Stderr,
        line: "oops".to_string(),
    }));
    match events.last() {
        Some(ProcessEvent::Close(exit)) => {
            assert!(exit.success);
            assert_eq!(exit.code, Some(0));
        }
        other => panic!("last event must be Close, got {other:?}"),
    }
}

#[tokio::test]
async fn synchronous_child_returns_its_exit_status() {
    init_tracing();
    let gateway = RealSpawnGateway::new();
    let descriptor = SpawnDescriptor::shell_command("exit 3").synchronous(true);

    match gateway.spawn(descriptor).await.unwrap() {
        SpawnOutcome::Completed(exit) => {
            assert_eq!(exit.code, Some(3));
            assert!(!exit.success);
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn finish_waits_for_an_async_child() {
    init_tracing();
    let gateway = RealSpawnGateway::new();
    let descriptor = SpawnDescriptor::shell_command("exit 4");

    let exit = with_timeout(async { gateway.spawn(descriptor).await.unwrap().finish().await })
        .await
        .unwrap();
    assert_eq!(exit.code, Some(4));
}

#[tokio::test]
async fn detached_child_runs_in_its_working_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let gateway = RealSpawnGateway::new();
    let descriptor = SpawnDescriptor::shell_command("touch marker")
        .current_dir(dir.path())
        .detached(true);

    let exit = with_timeout(async { gateway.spawn(descriptor).await.unwrap().finish().await })
        .await
        .unwrap();
    assert!(exit.success);
    assert!(dir.path().join("marker").is_file());
}

#[tokio::test]
async fn missing_executable_is_a_spawn_failure() {
    init_tracing();
    let gateway = RealSpawnGateway::new();
    let descriptor = SpawnDescriptor::new("/definitely/not/a/real/binary");

    match gateway.spawn(descriptor).await {
        Err(QuasarError::SpawnFailed { program, .. }) => {
            assert_eq!(program, "/definitely/not/a/real/binary");
        }
        other => panic!("expected SpawnFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn environment_overrides_reach_the_child() {
    init_tracing();
    let gateway = RealSpawnGateway::new();
    let descriptor = SpawnDescriptor::shell_command("test \"$QUASAR_PROBE\" = yes")
        .env("QUASAR_PROBE", "yes");

    let exit = with_timeout(async { gateway.spawn(descriptor).await.unwrap().finish().await })
        .await
        .unwrap();
    assert!(exit.success);
}
