// tests/build_retry.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use quasar::build::{BuildRetryCoordinator, RetryEvent, RetryLedger, RetryState};
use quasar::dispatch::DispatchOutcome;
use quasar::errors::QuasarError;
use quasar::exec::PROCESS_RUNTIME_ENV;
use quasar::launch::SubAppSpec;
use quasar::types::SubAppKind;
use quasar_test_utils::{
    ConfigBuilder, FakeSpawnGateway, FakeTaskRuntime, Harness, OptionsBuilder, init_tracing,
};

fn harness() -> Harness {
    Harness::new(ConfigBuilder::new("/srv/app").build())
}

#[tokio::test]
async fn unbuilt_web_form_without_auto_build_rejects_without_building() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg).batch().run_web_form().build();

    let outcome = h.dispatcher.run(&opts).await;

    match outcome {
        DispatchOutcome::Rejected(msg) => {
            assert!(msg.contains("has not been built yet"), "{msg}");
            assert!(msg.contains("--auto-build-web-form=true"), "{msg}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(h.runtime.task_runs().is_empty());
    assert!(h.gateway.spawned().is_empty());
    assert_eq!(h.loader.loads(), 0);
}

#[tokio::test]
async fn auto_build_web_form_builds_installs_and_retries_once() {
    init_tracing();
    let h = harness();
    h.build_task_creates_web_form();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .run_web_form()
        .auto_build_web_form()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    assert_eq!(h.runtime.task_runs(), vec!["quasar-webform".to_string()]);

    let spawned = h.gateway.spawned();
    assert_eq!(spawned.len(), 1);
    let install = &spawned[0];
    assert_eq!(install.program, "yarn");
    assert_eq!(install.args, vec!["install".to_string()]);
    assert_eq!(
        install.current_dir,
        Some(PathBuf::from("/srv/app/app/webform"))
    );
    assert!(install.detached);
    let (key, value) = PROCESS_RUNTIME_ENV;
    assert!(install.env.contains(&(key.to_string(), value.to_string())));

    assert_eq!(h.loader.launches(), vec![(SubAppKind::WebForm, 3001)]);
}

#[tokio::test]
async fn auto_build_web_app_has_no_install_step() {
    init_tracing();
    let h = harness();
    h.build_task_creates_web_app();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .run_web_app()
        .auto_build_web_app()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    assert_eq!(h.runtime.task_runs(), vec!["quasar-webapp".to_string()]);
    assert!(h.gateway.spawned().is_empty());
    assert_eq!(h.loader.launches(), vec![(SubAppKind::WebApp, 3002)]);
}

#[tokio::test]
async fn build_that_produces_nothing_fails_after_exactly_one_retry() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .run_web_app()
        .auto_build_web_app()
        .build();

    match h.dispatcher.run(&opts).await {
        DispatchOutcome::Rejected(msg) => assert!(msg.contains("still cannot launch"), "{msg}"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(h.runtime.task_runs(), vec!["quasar-webapp".to_string()]);
    assert!(h.loader.launches().is_empty());
}

#[tokio::test]
async fn build_failure_is_logged_and_the_retry_still_happens() {
    init_tracing();
    let h = harness();
    h.build_task_creates_web_app();
    h.runtime.fail_task("quasar-webapp");
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .run_web_app()
        .auto_build_web_app()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);
    assert_eq!(h.loader.launches(), vec![(SubAppKind::WebApp, 3002)]);
}

#[tokio::test]
async fn built_sub_application_never_reaches_the_coordinator() {
    init_tracing();
    let h = harness();
    h.build_web_form();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .run_web_form()
        .auto_build_web_form()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);
    assert!(h.runtime.task_runs().is_empty());
    assert!(h.gateway.spawned().is_empty());
    assert_eq!(h.loader.launches().len(), 1);
}

#[tokio::test]
async fn coordinator_relaunches_once_and_the_token_is_single_use() {
    init_tracing();
    let cfg = ConfigBuilder::new("/srv/app").build();
    let runtime = FakeTaskRuntime::new();
    let gateway = FakeSpawnGateway::new();
    let coordinator =
        BuildRetryCoordinator::new(&runtime, &gateway, cfg.package_manager_program());
    let spec = SubAppSpec::for_kind(SubAppKind::WebForm, &cfg, cfg.runtime.port);

    let relaunches = Arc::new(AtomicUsize::new(0));
    let mut ledger = RetryLedger::new();

    let counter = Arc::clone(&relaunches);
    let first = coordinator
        .recover(&spec, true, &mut ledger, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        })
        .await;
    assert!(matches!(first, Err(QuasarError::StillCannotLaunch { .. })));
    assert_eq!(relaunches.load(Ordering::SeqCst), 1);
    assert!(ledger.is_spent(SubAppKind::WebForm));

    let counter = Arc::clone(&relaunches);
    let second = coordinator
        .recover(&spec, true, &mut ledger, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
        .await;
    assert!(matches!(second, Err(QuasarError::RetryExhausted(SubAppKind::WebForm))));
    assert_eq!(relaunches.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.task_runs(), vec!["quasar-webform".to_string()]);
    assert_eq!(gateway.spawned().len(), 1);
}

#[tokio::test]
async fn coordinator_without_permission_never_relaunches() {
    init_tracing();
    let cfg = ConfigBuilder::new("/srv/app").build();
    let runtime = FakeTaskRuntime::new();
    let gateway = FakeSpawnGateway::new();
    let coordinator = BuildRetryCoordinator::new(&runtime, &gateway, "yarn");
    let spec = SubAppSpec::for_kind(SubAppKind::WebApp, &cfg, cfg.runtime.port);
    let mut ledger = RetryLedger::new();
    let relaunches = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&relaunches);
    let result = coordinator
        .recover(&spec, false, &mut ledger, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
        .await;

    match result {
        Err(QuasarError::NotBuilt { app, entry, flag }) => {
            assert_eq!(app, SubAppKind::WebApp);
            assert_eq!(entry, PathBuf::from("/srv/app/app/app.js"));
            assert_eq!(flag, "auto-build-web-app");
        }
        other => panic!("expected NotBuilt, got {other:?}"),
    }
    assert_eq!(relaunches.load(Ordering::SeqCst), 0);
    assert!(!ledger.is_spent(SubAppKind::WebApp));
    assert!(runtime.calls().is_empty());
}

#[test]
fn retry_state_machine_follows_the_single_build_path() {
    let mut state = RetryState::NotBuilt;
    for event in [
        RetryEvent::BuildStarted,
        RetryEvent::BuildFinished,
        RetryEvent::RetryStarted,
    ] {
        state = state.next(event).unwrap();
        assert!(!state.is_terminal());
    }
    assert_eq!(state, RetryState::RetryAttempted);
    assert_eq!(
        state.next(RetryEvent::Launched(true)),
        Some(RetryState::Succeeded)
    );
    assert_eq!(
        state.next(RetryEvent::Launched(false)),
        Some(RetryState::Failed)
    );

    // No second build, no retry from a terminal state.
    assert_eq!(RetryState::RetryAttempted.next(RetryEvent::BuildStarted), None);
    assert_eq!(RetryState::Failed.next(RetryEvent::RetryStarted), None);
    assert_eq!(RetryState::Succeeded.next(RetryEvent::BuildStarted), None);
    assert_eq!(
        RetryState::NotBuilt.next(RetryEvent::PermissionDenied),
        Some(RetryState::Failed)
    );
}

#[test]
fn ledger_hands_out_one_token_per_sub_application() {
    let mut ledger = RetryLedger::new();
    assert!(ledger.acquire(SubAppKind::WebForm).is_some());
    assert!(ledger.acquire(SubAppKind::WebForm).is_none());
    assert!(ledger.acquire(SubAppKind::WebApp).is_some());
}
