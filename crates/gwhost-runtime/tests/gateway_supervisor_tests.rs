//! End-to-end supervisor runs against small shell-script gateways.

#![cfg(unix)]

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::{Duration, Instant};

use gwhost_core::{GatewayPaths, GatewayState, SupervisorSettings};
use gwhost_runtime::{GatewayCommand, GatewaySupervisor};
use tempfile::tempdir;
use tokio::net::TcpListener;

fn quick_settings(readiness: Duration) -> SupervisorSettings {
    SupervisorSettings {
        preferred_port: 0,
        readiness_timeout: readiness,
        poll_interval: Duration::from_millis(50),
        probe_timeout: Duration::from_millis(100),
        termination_grace: Duration::from_millis(500),
        ..SupervisorSettings::default()
    }
}

fn script(body: &str) -> GatewayCommand {
    GatewayCommand::new("sh").arg("-c").arg(body)
}

fn supervisor(state_dir: &Path, readiness: Duration, command: GatewayCommand) -> GatewaySupervisor {
    GatewaySupervisor::new(
        quick_settings(readiness),
        GatewayPaths::from_state_dir(state_dir),
        command,
    )
}

fn details_of(state: &GatewayState) -> &str {
    match state {
        GatewayState::Failed { details, .. } => details,
        other => panic!("expected failed state, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_executable_fails_with_logs_dir() {
    let temp = tempdir().unwrap();
    let sup = supervisor(
        temp.path(),
        Duration::from_secs(5),
        GatewayCommand::new(temp.path().join("no-such-gateway")),
    );
    let mut states = sup.subscribe();

    let state = sup.start().await.unwrap();

    let starting = states.recv().await.unwrap();
    assert_eq!(starting.phase(), "starting");
    assert_eq!(states.recv().await.unwrap(), state);

    let details = details_of(&state);
    assert!(details.contains("Failed to spawn gateway"));
    assert!(details.contains(&sup.paths().logs_dir.display().to_string()));
    assert_eq!(state.token(), starting.token());
    assert!(!state.token().is_empty());
}

#[tokio::test]
async fn readiness_timeout_reports_stderr_tail() {
    let temp = tempdir().unwrap();
    let sup = supervisor(
        temp.path(),
        Duration::from_millis(600),
        script("echo boom-from-gateway >&2; sleep 30"),
    );

    let state = sup.start().await.unwrap();
    let details = details_of(&state);

    assert!(details.contains("did not open port"));
    assert!(details.contains("boom-from-gateway"));
    assert!(details.contains(&sup.paths().logs_dir.display().to_string()));

    // The child keeps running until shutdown
    assert!(sup.child_pid().await.is_some());
    sup.shutdown().await;
    assert!(sup.child_pid().await.is_none());
    assert!(!sup.paths().pid_path().exists());
}

#[tokio::test]
async fn unterminated_stderr_is_captured_on_timeout() {
    let temp = tempdir().unwrap();
    let sup = supervisor(
        temp.path(),
        Duration::from_millis(800),
        script("printf 'FATAL: bad config' >&2; sleep 30"),
    );

    let state = sup.start().await.unwrap();
    let details = details_of(&state);

    assert_eq!(sup.stderr_tail(), "FATAL: bad config");
    assert!(details.contains("Last stderr output:\nFATAL: bad config"));
    assert!(!details.contains("no stderr output captured"));

    sup.shutdown().await;
    let err_log = fs::read_to_string(sup.paths().stderr_log()).unwrap();
    assert_eq!(err_log, "FATAL: bad config");
}

#[tokio::test]
async fn early_exit_fails_fast() {
    let temp = tempdir().unwrap();
    let sup = supervisor(
        temp.path(),
        Duration::from_secs(20),
        script("echo fatal-config-error >&2; exit 3"),
    );

    let started = Instant::now();
    let state = sup.start().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    let details = details_of(&state);
    assert!(details.contains("exited before opening port"));
    assert!(details.contains("exit code 3"));
    assert!(details.contains("fatal-config-error"));

    let err_log = fs::read_to_string(sup.paths().stderr_log()).unwrap();
    assert!(err_log.contains("fatal-config-error"));
}

#[tokio::test]
async fn child_receives_port_and_token() {
    let temp = tempdir().unwrap();
    let sup = supervisor(
        temp.path(),
        Duration::from_secs(5),
        script("echo \"$GATEWAY_PORT $GATEWAY_TOKEN $NO_COLOR\"; exit 1"),
    );

    let state = sup.start().await.unwrap();
    let out_log = fs::read_to_string(sup.paths().stdout_log()).unwrap();

    assert_eq!(
        out_log.trim(),
        format!("{} {} 1", state.port(), state.token())
    );
}

#[tokio::test]
async fn ready_once_port_opens_and_shutdown_stops_child() {
    let temp = tempdir().unwrap();
    let sup = supervisor(temp.path(), Duration::from_secs(10), script("sleep 30"));
    let mut states = sup.subscribe();

    // Stand in for the gateway: listen on the published port
    let listener = tokio::spawn(async move {
        let starting = states.recv().await.unwrap();
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, starting.port()))
            .await
            .unwrap();
        let terminal = states.recv().await.unwrap();
        drop(listener);
        terminal
    });

    let state = sup.start().await.unwrap();
    assert_eq!(state.phase(), "ready");
    match &state {
        GatewayState::Ready { url, port, .. } => {
            assert_eq!(url, &format!("http://127.0.0.1:{port}/"));
        }
        other => panic!("expected ready, got {other:?}"),
    }
    assert_eq!(listener.await.unwrap(), state);

    let pid = sup.child_pid().await.unwrap();
    let recorded = fs::read_to_string(sup.paths().pid_path()).unwrap();
    assert!(recorded.starts_with(&format!("{pid}\n")));

    sup.shutdown().await;
    sup.shutdown().await;
    assert!(sup.child_pid().await.is_none());
    assert!(!sup.paths().pid_path().exists());
}

#[tokio::test]
async fn token_is_reused_across_runs() {
    let temp = tempdir().unwrap();

    let first = supervisor(temp.path(), Duration::from_secs(5), script("exit 1"))
        .start()
        .await
        .unwrap();
    let second = supervisor(temp.path(), Duration::from_secs(5), script("exit 1"))
        .start()
        .await
        .unwrap();

    assert_eq!(first.token(), second.token());

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("gateway.json")).unwrap())
            .unwrap();
    assert_eq!(config["gateway"]["auth"]["token"], first.token());
}

#[tokio::test]
async fn existing_config_is_migrated_not_replaced() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("gateway.json");
    fs::write(
        &config_path,
        r#"{"gateway":{"authToken":"legacy-token"},"plugins":["keep"]}"#,
    )
    .unwrap();

    let state = supervisor(temp.path(), Duration::from_secs(5), script("exit 1"))
        .start()
        .await
        .unwrap();

    assert_eq!(state.token(), "legacy-token");

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
    assert_eq!(config["gateway"]["auth"]["token"], "legacy-token");
    assert_eq!(config["gateway"]["mode"], "local");
    assert_eq!(config["plugins"][0], "keep");
    assert!(config["gateway"].get("authToken").is_none());

    let marker: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("config-state.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(marker["configVersion"], 3);
}

#[tokio::test]
async fn logs_append_across_runs() {
    let temp = tempdir().unwrap();
    for _ in 0..2 {
        supervisor(temp.path(), Duration::from_secs(5), script("echo run-line; exit 1"))
            .start()
            .await
            .unwrap();
    }

    let out_log = fs::read_to_string(temp.path().join("logs").join("gateway.out.log")).unwrap();
    assert_eq!(out_log.matches("run-line").count(), 2);
}

#[cfg(target_os = "linux")]
fn spawn_shell_sleeper() -> (tokio::process::Child, u32) {
    let child = tokio::process::Command::new("sh")
        .args(["-c", "sleep 30; true"])
        .kill_on_drop(true)
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();
    (child, pid)
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn unrelated_process_at_recorded_pid_survives_start() {
    use gwhost_runtime::pidfile::{PidFileData, process_start_time, write_pidfile};

    let temp = tempdir().unwrap();
    let sup = supervisor(temp.path(), Duration::from_millis(300), script("exit 1"));

    // An unrelated shell now holds the PID a previous gateway ran under.
    let (mut bystander, pid) = spawn_shell_sleeper();
    let stale_start = process_start_time(pid).unwrap() + 1;
    write_pidfile(
        &sup.paths().pid_path(),
        PidFileData {
            pid,
            port: 4242,
            started_at: Some(stale_start),
        },
    )
    .unwrap();

    sup.start().await.unwrap();

    assert!(bystander.try_wait().unwrap().is_none());
    bystander.kill().await.unwrap();
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn orphaned_gateway_from_previous_run_is_reaped() {
    use gwhost_runtime::pidfile::{PidFileData, process_start_time, write_pidfile};

    let temp = tempdir().unwrap();
    let sup = supervisor(temp.path(), Duration::from_millis(300), script("exit 1"));

    let (mut orphan, pid) = spawn_shell_sleeper();
    let started_at = process_start_time(pid);
    let reaper = tokio::spawn(async move { orphan.wait().await });
    write_pidfile(
        &sup.paths().pid_path(),
        PidFileData {
            pid,
            port: 4242,
            started_at,
        },
    )
    .unwrap();

    sup.start().await.unwrap();

    let status = tokio::time::timeout(Duration::from_secs(5), reaper)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn failing_migration_does_not_block_startup() {
    use gwhost_core::{ConfigMigration, ConfigMigrationEngine, MigrationSet};

    let temp = tempdir().unwrap();
    let migrations = MigrationSet::new([
        ConfigMigration::new(1, "Set plugin flag", |doc| {
            Ok(doc.set_if_absent(&["plugins", "enabled"], serde_json::json!(true))?)
        }),
        ConfigMigration::new(2, "Always fails", |_| anyhow::bail!("unsupported layout")),
    ])
    .unwrap();

    let sup = supervisor(temp.path(), Duration::from_secs(5), script("echo spawned; exit 1"))
        .with_migrations(ConfigMigrationEngine::new(migrations));
    sup.start().await.unwrap();

    let out_log = fs::read_to_string(sup.paths().stdout_log()).unwrap();
    assert_eq!(out_log.trim(), "spawned");

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sup.paths().config_path).unwrap()).unwrap();
    assert_eq!(config["plugins"]["enabled"], true);

    let marker: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("config-state.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(marker["configVersion"], 1);
}
