// tests/dispatch_batch.rs

use std::path::PathBuf;
use std::sync::Arc;

use quasar::cli::{APP_ROOT_ENV, CONFIG_ENV, NO_LOGO_ENV};
use quasar::config::{ConfigFile, ResolvedOptions, load_and_validate};
use quasar::context::ContextBuilder;
use quasar::dispatch::{BatchStep, DispatchOutcome, Dispatcher, plan};
use quasar::exec::PROCESS_RUNTIME_ENV;
use quasar::fs::mock::MockFileSystem;
use quasar::types::SubAppKind;
use quasar_test_utils::{
    ConfigBuilder, FakeSpawnGateway, FakeTaskRuntime, FakeWebHosts, Harness, OptionsBuilder,
    RuntimeCall, init_tracing,
};

fn harness() -> Harness {
    Harness::new(ConfigBuilder::new("/srv/app").build())
}

#[tokio::test]
async fn clean_output_only_cleans_and_spawns_nothing() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg).batch().clean_output().build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    assert_eq!(
        h.runtime.action_calls(),
        vec![RuntimeCall::CleanOutputFolders { all: false }]
    );
    assert!(h.gateway.spawned().is_empty());
    assert_eq!(h.web.created(), 0);
}

#[tokio::test]
async fn args_file_spawns_a_sibling_and_waits_for_it() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .args_file("/jobs/created/x.json")
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    let spawned = h.gateway.spawned();
    assert_eq!(spawned.len(), 1);
    let sibling = &spawned[0];
    assert_eq!(sibling.program, Harness::SIBLING_EXE);
    assert_eq!(
        sibling.args,
        vec![
            "--run-process=true".to_string(),
            "--no-prompt=true".to_string(),
            "--args-file=/jobs/created/x.json".to_string(),
        ]
    );
    let (key, value) = PROCESS_RUNTIME_ENV;
    assert!(sibling.env.contains(&(key.to_string(), value.to_string())));
    assert!(sibling.env.contains(&(APP_ROOT_ENV.to_string(), "/srv/app".to_string())));
    assert!(sibling.env.contains(&(NO_LOGO_ENV.to_string(), "true".to_string())));
    // Built-in config: nothing to point the sibling at.
    assert!(!sibling.env.iter().any(|(k, _)| k == CONFIG_ENV));
    assert!(!sibling.detached);

    // Out-of-process: the runtime never ran the job itself.
    assert!(
        !h.runtime
            .calls()
            .iter()
            .any(|c| matches!(c, RuntimeCall::RunFromArgsFile(_)))
    );
}

#[tokio::test]
async fn args_file_in_the_sibling_runs_in_process() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .run_process()
        .args_file("/jobs/created/x.json")
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    assert_eq!(
        h.runtime.action_calls(),
        vec![RuntimeCall::RunFromArgsFile(PathBuf::from("/jobs/created/x.json"))]
    );
    assert!(h.gateway.spawned().is_empty());
}

#[tokio::test]
async fn failing_job_steps_are_swallowed() {
    init_tracing();
    let h = harness();
    h.runtime.fail_task("report");

    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .q_type("report")
        .clean_dev()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);
    assert_eq!(
        h.runtime.action_calls(),
        vec![
            RuntimeCall::CleanDevFolders,
            RuntimeCall::RunTask {
                name: "report".to_string(),
                args: serde_json::to_value(&opts).unwrap(),
            },
        ]
    );
}

#[tokio::test]
async fn q_type_receives_the_options_as_arguments() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg).batch().q_type("report").build();

    h.dispatcher.run(&opts).await;

    match &h.runtime.action_calls()[0] {
        RuntimeCall::RunTask { name, args } => {
            assert_eq!(name, "report");
            assert_eq!(args["qType"], serde_json::json!("report"));
            assert_eq!(args["noPrompt"], serde_json::json!(true));
        }
        other => panic!("expected RunTask, got {other:?}"),
    }
}

#[tokio::test]
async fn electron_step_ends_the_batch() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .clean_output()
        .run_electron_app()
        .args_file("/jobs/created/x.json")
        .run_web_api()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    let spawned = h.gateway.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].program, "electron");
    assert_eq!(spawned[0].args, vec![".".to_string()]);
    assert_eq!(spawned[0].current_dir, Some(PathBuf::from("/srv/app")));
    assert!(spawned[0].detached);

    assert_eq!(
        h.runtime.action_calls(),
        vec![RuntimeCall::CleanOutputFolders { all: false }]
    );
    assert_eq!(h.web.created(), 0);
}

/// A dispatcher on fakes, except for the given gateway.
fn dispatcher_with_gateway(cfg: &ConfigFile, gateway: &FakeSpawnGateway) -> Dispatcher {
    let ctx = ContextBuilder::new(cfg.clone())
        .fs(Arc::new(MockFileSystem::new()))
        .gateway(Arc::new(gateway.clone()))
        .runtime(Arc::new(FakeTaskRuntime::new()))
        .web_factory(FakeWebHosts::new().factory())
        .sibling_exe(Harness::SIBLING_EXE)
        .build();
    Dispatcher::new(Arc::new(ctx))
}

#[tokio::test]
async fn sibling_receives_the_config_file_the_parent_loaded() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("custom.toml");
    std::fs::write(
        &config_path,
        format!(
            "[paths]\napplication_root = {root:?}\noutput_root = \"out\"\n\n[task.report]\ncmd = \"echo report\"\n",
            root = dir.path().display().to_string()
        ),
    )
    .unwrap();
    let cfg = load_and_validate(&config_path).unwrap();
    assert_eq!(cfg.source.as_deref(), Some(config_path.as_path()));

    let gateway = FakeSpawnGateway::new();
    let dispatcher = dispatcher_with_gateway(&cfg, &gateway);
    let opts = OptionsBuilder::new(&cfg)
        .batch()
        .args_file("/jobs/created/x.json")
        .build();

    assert_eq!(dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    let spawned = gateway.spawned();
    assert_eq!(spawned.len(), 1);
    let env = &spawned[0].env;
    assert!(env.contains(&(
        CONFIG_ENV.to_string(),
        config_path.display().to_string()
    )));
    assert!(env.contains(&(
        APP_ROOT_ENV.to_string(),
        dir.path().display().to_string()
    )));
    // The argument vector stays the fixed sibling shape.
    assert_eq!(spawned[0].args.len(), 3);
}

#[tokio::test]
async fn desktop_shell_that_cannot_start_rejects() {
    init_tracing();
    let cfg = ConfigBuilder::new("/srv/app").build();
    let gateway = FakeSpawnGateway::new().missing("electron");
    let dispatcher = dispatcher_with_gateway(&cfg, &gateway);

    let opts = OptionsBuilder::new(&cfg).batch().run_electron_app().build();

    match dispatcher.run(&opts).await {
        DispatchOutcome::Rejected(msg) => assert!(msg.contains("electron")),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(gateway.programs(), vec!["electron".to_string()]);
}

#[tokio::test]
async fn sibling_that_cannot_start_is_swallowed() {
    init_tracing();
    let cfg = ConfigBuilder::new("/srv/app").build();
    let gateway = FakeSpawnGateway::new().missing(Harness::SIBLING_EXE);
    let dispatcher = dispatcher_with_gateway(&cfg, &gateway);

    let opts = OptionsBuilder::new(&cfg)
        .batch()
        .args_file("/jobs/created/x.json")
        .build();

    assert_eq!(dispatcher.run(&opts).await, DispatchOutcome::Resolved);
    assert_eq!(gateway.programs(), vec![Harness::SIBLING_EXE.to_string()]);
}

#[tokio::test]
async fn failing_sibling_job_is_swallowed() {
    init_tracing();
    let cfg = ConfigBuilder::new("/srv/app").build();
    let gateway = FakeSpawnGateway::new().exit_code(2);
    let dispatcher = dispatcher_with_gateway(&cfg, &gateway);

    let opts = OptionsBuilder::new(&cfg)
        .batch()
        .args_file("/jobs/created/x.json")
        .build();

    assert_eq!(dispatcher.run(&opts).await, DispatchOutcome::Resolved);
}

#[tokio::test]
async fn clean_steps_run_in_fixed_order() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .clean_dev()
        .q_type("report")
        .clean_output()
        .clean_all_output()
        .build();

    h.dispatcher.run(&opts).await;

    let calls: Vec<_> = h
        .runtime
        .action_calls()
        .into_iter()
        .map(|c| match c {
            RuntimeCall::RunTask { name, .. } => format!("task:{name}"),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(
        calls,
        vec![
            "CleanOutputFolders { all: true }".to_string(),
            "CleanOutputFolders { all: false }".to_string(),
            "CleanDevFolders".to_string(),
            "task:report".to_string(),
        ]
    );
}

#[tokio::test]
async fn web_api_and_built_web_form_share_one_web_host() {
    init_tracing();
    let h = harness();
    h.build_web_form();
    h.build_web_app();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .port(4100)
        .run_web_api()
        .run_web_form()
        .run_web_app()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);

    assert_eq!(h.web.created(), 1);
    assert_eq!(h.web.runs(), vec![4100]);
    // The web API keeps its port; each sub-application gets its own.
    assert_eq!(
        h.loader.launches(),
        vec![(SubAppKind::WebForm, 4101), (SubAppKind::WebApp, 4102)]
    );
    assert!(h.ctx.has_long_lived());
    // Already built: no build task, no install.
    assert!(h.runtime.task_runs().is_empty());
    assert!(h.gateway.spawned().is_empty());
}

#[tokio::test]
async fn configured_sub_application_port_is_used() {
    init_tracing();
    let mut raw = ConfigBuilder::new("/srv/app").raw();
    raw.runtime.web_form_port = Some(8080);
    let h = Harness::new(ConfigFile::try_from(raw).unwrap());
    h.build_web_form();
    let opts = OptionsBuilder::new(&h.cfg)
        .batch()
        .port(4100)
        .run_web_api()
        .run_web_form()
        .build();

    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);
    assert_eq!(h.web.runs(), vec![4100]);
    assert_eq!(h.loader.launches(), vec![(SubAppKind::WebForm, 8080)]);
}

#[tokio::test]
async fn nothing_selected_resolves_without_action() {
    init_tracing();
    let h = harness();
    let opts = OptionsBuilder::new(&h.cfg).batch().build();

    assert!(plan(&opts).is_empty());
    assert_eq!(h.dispatcher.run(&opts).await, DispatchOutcome::Resolved);
    assert!(h.runtime.action_calls().is_empty());
    assert!(!h.ctx.has_long_lived());
}

#[test]
fn plan_lists_steps_in_execution_order() {
    let cfg = ConfigBuilder::new("/srv/app").build();
    let opts: ResolvedOptions = OptionsBuilder::new(&cfg)
        .batch()
        .run_web_app()
        .run_web_form()
        .watch_jobs()
        .run_web_api()
        .q_type("report")
        .args_file("/jobs/created/a.json")
        .clean_dev()
        .build();

    assert_eq!(
        plan(&opts),
        vec![
            BatchStep::CleanDev,
            BatchStep::RunArgsFile(PathBuf::from("/jobs/created/a.json")),
            BatchStep::RunQType("report".to_string()),
            BatchStep::AcquireWebHost,
            BatchStep::RunWebApi,
            BatchStep::WatchJobs,
            BatchStep::LaunchSubApp(SubAppKind::WebForm),
            BatchStep::LaunchSubApp(SubAppKind::WebApp),
        ]
    );
}
