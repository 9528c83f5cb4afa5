// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bf_adapters::{FakeProcessAdapter, SpawnBehavior};
use bf_core::test_support::launch_request;
use bf_core::FakeClock;

fn config() -> LauncherConfig {
    LauncherConfig {
        program: PathBuf::from("/bin/sh"),
        grace: Duration::from_millis(20),
        ..LauncherConfig::default()
    }
}

fn launcher_with(config: LauncherConfig) -> (Launcher<FakeProcessAdapter, FakeClock>, FakeProcessAdapter) {
    let process = FakeProcessAdapter::new();
    let launcher = Launcher::new(
        process.clone(),
        FakeClock::new(),
        config,
        Arc::new(ProcessRegistry::new()),
    );
    (launcher, process)
}

fn tenant() -> TenantId {
    TenantId::new("42")
}

#[test]
fn env_channel_keeps_credentials_out_of_argv() {
    let (launcher, _) = launcher_with(config());
    let cmd = launcher.build_command(&tenant(), &launch_request("42")).unwrap();

    assert_eq!(
        cmd.exposed_args(),
        vec![
            "--user-id",
            "42",
            "--collection",
            "user_42",
            "--qdrant-url",
            "http://localhost:6333"
        ]
    );
    let env: Vec<(&str, &str)> = cmd
        .env
        .iter()
        .map(|(k, v)| (k.as_str(), v.expose()))
        .collect();
    assert_eq!(env, vec![(BOT_TOKEN_ENV, "tok42"), (MODEL_KEY_ENV, "sk-42")]);
}

#[test]
fn args_channel_passes_legacy_flags_masked_in_display() {
    let (launcher, _) = launcher_with(LauncherConfig {
        credential_channel: CredentialChannel::Args,
        ..config()
    });
    let request = LaunchRequest::new("123456789:ABCDEFGH", "sk-abcdefghijkl", "notes");
    let cmd = launcher.build_command(&tenant(), &request).unwrap();

    assert_eq!(
        cmd.exposed_args(),
        vec![
            "--user-id",
            "42",
            "--bot-token",
            "123456789:ABCDEFGH",
            "--openai-key",
            "sk-abcdefghijkl",
            "--collection",
            "notes",
            "--qdrant-url",
            "http://localhost:6333"
        ]
    );
    assert!(cmd.env.is_empty());
    let shown = cmd.display();
    assert!(shown.contains("--bot-token 1234****"), "{shown}");
    assert!(!shown.contains("ABCDEFGH"), "{shown}");
    assert!(!shown.contains("abcdefghijkl"), "{shown}");
}

#[test]
fn request_endpoint_overrides_default() {
    let (launcher, _) = launcher_with(config());
    let request = launch_request("42").with_endpoint("http://qdrant:6333");
    let cmd = launcher.build_command(&tenant(), &request).unwrap();
    assert_eq!(cmd.exposed_args().last(), Some(&"http://qdrant:6333"));

    let blank = launch_request("42").with_endpoint("  ");
    let cmd = launcher.build_command(&tenant(), &blank).unwrap();
    assert_eq!(cmd.exposed_args().last(), Some(&DEFAULT_VECTOR_ENDPOINT));
}

#[test]
fn entry_point_and_extra_args_lead_the_argv() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
    let (launcher, _) = launcher_with(LauncherConfig {
        entry_point: Some(PathBuf::from("main.py")),
        extra_args: vec!["-u".to_string()],
        cwd: Some(dir.path().to_path_buf()),
        ..config()
    });

    let cmd = launcher.build_command(&tenant(), &launch_request("42")).unwrap();
    assert_eq!(&cmd.exposed_args()[..3], &["main.py", "-u", "--user-id"]);
    assert_eq!(cmd.cwd.as_deref(), Some(dir.path()));
}

#[test]
fn missing_entry_point_is_worker_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (launcher, _) = launcher_with(LauncherConfig {
        entry_point: Some(PathBuf::from("main.py")),
        cwd: Some(dir.path().to_path_buf()),
        ..config()
    });

    let err = launcher
        .build_command(&tenant(), &launch_request("42"))
        .unwrap_err();
    assert!(matches!(err, SpawnError::WorkerNotFound(p) if p == dir.path().join("main.py")));
}

#[yare::parameterized(
    absolute_missing = { "/nonexistent/bin/worker", false },
    bare_missing = { "bf-no-such-worker-binary", false },
    absolute_present = { "/bin/sh", true },
    bare_on_path = { "sh", true },
)]
fn program_resolution(program: &str, found: bool) {
    let (launcher, _) = launcher_with(LauncherConfig {
        program: PathBuf::from(program),
        ..config()
    });
    let result = launcher.build_command(&tenant(), &launch_request("42"));
    assert_eq!(result.is_ok(), found, "{program}: {result:?}");
    if let Err(err) = result {
        assert!(matches!(err, SpawnError::WorkerNotFound(_)));
    }
}

#[tokio::test]
async fn spawn_registers_live_worker() {
    let (launcher, process) = launcher_with(config());
    let handle = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap();

    assert!(handle.is_alive());
    assert_eq!(handle.started_at_ms(), 1_000_000);
    assert!(!handle.command_line().contains("tok42"));
    assert_eq!(process.spawn_count(), 1);
    assert_eq!(launcher.registry.lookup(&tenant()).unwrap().pid(), handle.pid());
    assert!(!launcher.registry.is_starting(&tenant()));
}

#[tokio::test]
async fn spawn_reuses_live_worker() {
    let (launcher, process) = launcher_with(config());
    let first = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap();
    let second = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap();

    assert_eq!(first.pid(), second.pid());
    assert_eq!(process.spawn_count(), 1);
}

#[tokio::test]
async fn spawn_replaces_terminated_worker() {
    let (launcher, process) = launcher_with(config());
    let first = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap();
    process.exit(first.pid(), 1);

    let second = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap();
    assert_ne!(first.pid(), second.pid());
    assert_eq!(launcher.registry.len(), 1);
    assert_eq!(launcher.registry.count(), 1);
}

#[tokio::test]
async fn early_exit_is_reported_redacted_and_not_registered() {
    let (launcher, process) = launcher_with(config());
    let request = LaunchRequest::new("123456789:ABCDEFGH", "sk-abcdefghijkl", "user_42");
    process.push_behavior(SpawnBehavior::crash(
        2,
        "Unauthorized token 123456789:ABCDEFGH\n",
    ));

    let err = launcher.spawn(&tenant(), &request).await.unwrap_err();
    match err {
        SpawnError::EarlyExit {
            exit_code, stderr, ..
        } => {
            assert_eq!(exit_code, Some(2));
            assert!(stderr.contains("Unauthorized token 1234****"), "{stderr}");
            assert!(!stderr.contains("ABCDEFGH"));
        }
        other => panic!("expected early exit, got {other:?}"),
    }
    assert!(launcher.registry.is_empty());
    assert!(!launcher.registry.is_starting(&tenant()));
}

#[tokio::test]
async fn early_exit_output_is_truncated() {
    let (launcher, process) = launcher_with(config());
    process.push_behavior(SpawnBehavior::crash(1, &"x".repeat(MAX_DIAGNOSTIC_CHARS * 2)));

    let err = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap_err();
    let diagnostics = err.diagnostics().unwrap();
    assert_eq!(diagnostics.chars().count(), MAX_DIAGNOSTIC_CHARS);
}

#[tokio::test]
async fn adapter_failure_is_os_error() {
    let (launcher, process) = launcher_with(config());
    process.set_default_behavior(SpawnBehavior::Fail("permission denied".into()));

    let err = launcher.spawn(&tenant(), &launch_request("42")).await.unwrap_err();
    assert!(matches!(err, SpawnError::Os(_)));
    assert!(launcher.registry.is_empty());
}
