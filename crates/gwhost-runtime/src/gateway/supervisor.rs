//! Gateway supervisor: one run of `Starting → Ready | Failed`.
//!
//! The supervisor owns the child process internally. Adapters (CLI, desktop
//! shell) call `start`, observe states, and call `shutdown` on exit without
//! holding process handles themselves.
//!
//! Key behaviors:
//! - **Single run**: `start` succeeds once per supervisor; retry is a relaunch
//! - **Token first**: every published state carries the resolved token
//! - **Early exit**: a child that dies before opening its port fails fast
//!   instead of waiting out the readiness timeout
//! - **Failures are states**: nothing but `AlreadyStarted` escapes `start`

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use gwhost_core::paths::{DirectoryCreationStrategy, ensure_directory};
use gwhost_core::{
    ConfigMigrationEngine, GatewayBootstrap, GatewayError, GatewayPaths, GatewayState,
    MigrationOutcome, SupervisorSettings, TokenProvisioner, ensure_gateway_config_file,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::broadcaster::{StateBroadcaster, StateSubscription};
use super::diagnostics::failure_details;
use super::env::gateway_environment;
use crate::pidfile::{
    PidFileData, SweepOutcome, delete_pidfile, process_start_time, reap_stale_gateway,
    write_pidfile,
};
use crate::process::{
    ProcessSpec, ReadinessPolicy, SupervisedProcess, TailBuffer, describe_exit, pick_port,
    spawn_process, wait_for_tcp_ready,
};

/// How often the child is checked for an early exit during startup.
const STARTUP_EXIT_POLL: Duration = Duration::from_millis(100);

/// How often a ready gateway is checked for an unexpected exit.
const MONITOR_EXIT_POLL: Duration = Duration::from_secs(1);

/// Time allowed for the stderr pump to drain after an early exit.
const OUTPUT_SETTLE: Duration = Duration::from_millis(500);

/// Error from supervisor operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SupervisorError {
    /// `start` was already called on this supervisor.
    #[error("Gateway supervisor has already been started; relaunch to retry")]
    AlreadyStarted,
}

/// Executable and arguments of the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
    /// Extra variables; the supervisor's own `GATEWAY_*` values win.
    pub env: Vec<(OsString, OsString)>,
}

impl GatewayCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Supervises a single gateway run.
///
/// # Example
///
/// ```ignore
/// let supervisor = GatewaySupervisor::new(settings, paths, GatewayCommand::new("gateway"));
/// let mut states = supervisor.subscribe();
/// let state = supervisor.start().await?;
/// supervisor.shutdown().await;
/// ```
pub struct GatewaySupervisor {
    settings: SupervisorSettings,
    paths: GatewayPaths,
    command: GatewayCommand,
    migrations: ConfigMigrationEngine,
    states: StateBroadcaster,
    tail: TailBuffer,
    started: AtomicBool,
    stopping: AtomicBool,
    process: Mutex<Option<Arc<SupervisedProcess>>>,
    monitor: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl GatewaySupervisor {
    /// Create a supervisor using the built-in config migrations.
    pub fn new(settings: SupervisorSettings, paths: GatewayPaths, command: GatewayCommand) -> Self {
        let tail = TailBuffer::new(settings.tail_budget);
        Self {
            settings,
            paths,
            command,
            migrations: ConfigMigrationEngine::builtin(),
            states: StateBroadcaster::new(),
            tail,
            started: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            process: Mutex::new(None),
            monitor: std::sync::Mutex::new(None),
        }
    }

    /// Replace the migration registry.
    #[must_use]
    pub fn with_migrations(mut self, migrations: ConfigMigrationEngine) -> Self {
        self.migrations = migrations;
        self
    }

    pub const fn paths(&self) -> &GatewayPaths {
        &self.paths
    }

    pub const fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Latest published state, if `start` has begun.
    pub fn current_state(&self) -> Option<GatewayState> {
        self.states.current()
    }

    /// Subscribe to state changes, starting from the current state.
    pub fn subscribe(&self) -> StateSubscription {
        self.states.subscribe()
    }

    /// Captured stderr tail of the child.
    pub fn stderr_tail(&self) -> String {
        self.tail.read()
    }

    /// PID of the live child, if one was spawned and not yet shut down.
    pub async fn child_pid(&self) -> Option<u32> {
        self.process.lock().await.as_ref().map(|p| p.pid())
    }

    /// Resolve when the live child exits on its own.
    ///
    /// Returns `None` right away if no child is running, or once the child
    /// is stopped through [`shutdown`](Self::shutdown).
    pub async fn wait_for_child_exit(&self) -> Option<ExitStatus> {
        let process = self.process.lock().await.as_ref().map(Arc::clone)?;
        process.wait_for_exit(MONITOR_EXIT_POLL).await
    }

    /// Run startup to a terminal state.
    ///
    /// Returns the terminal state (`Ready` or `Failed`); both are also
    /// published to subscribers. Errors only if called twice.
    pub async fn start(&self) -> Result<GatewayState, SupervisorError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SupervisorError::AlreadyStarted);
        }
        Ok(self.run().await)
    }

    async fn run(&self) -> GatewayState {
        let preferred = self.settings.preferred_port;

        if let Err(e) = self.prepare_directories() {
            return self.fail_before_spawn(preferred, "", &e);
        }

        self.reap_stale().await;

        let token = match TokenProvisioner::resolve(&self.paths.config_path) {
            Ok(token) => token.value,
            Err(e) => {
                return self.fail_before_spawn(
                    preferred,
                    "",
                    &GatewayError::Bootstrap(e.to_string()),
                );
            }
        };

        let port = match pick_port(preferred).await {
            Ok(port) => port,
            Err(e) => return self.fail_before_spawn(preferred, &token, &e),
        };

        if let Err(e) = ensure_gateway_config_file(
            &self.paths.config_path,
            GatewayBootstrap {
                port,
                token: &token,
            },
        ) {
            return self.fail_before_spawn(port, &token, &GatewayError::Bootstrap(e.to_string()));
        }

        self.run_migrations();

        let spec = self.process_spec(port, &token);
        self.publish(GatewayState::starting(port, &self.paths.logs_dir, &token));

        let process = match self.spawn(&spec, port).await {
            Ok(process) => process,
            Err(e) => return self.fail(port, &token, &e, Some(&spec)),
        };

        match self.await_readiness(&process, port).await {
            Ok(()) => {
                self.watch_for_exit(&process);
                let ready = GatewayState::ready(&self.settings.host, port, &self.paths.logs_dir, &token);
                info!(port = %port, pid = %process.pid(), "Gateway ready");
                self.publish(ready)
            }
            Err(e) => self.fail(port, &token, &e, Some(&spec)),
        }
    }

    fn prepare_directories(&self) -> Result<(), GatewayError> {
        for dir in [&self.paths.state_dir, &self.paths.logs_dir] {
            ensure_directory(dir, DirectoryCreationStrategy::AutoCreate)
                .map_err(|e| GatewayError::Bootstrap(e.to_string()))?;
        }
        Ok(())
    }

    async fn reap_stale(&self) {
        match reap_stale_gateway(&self.paths.pid_path(), &self.command.program).await {
            Ok(SweepOutcome::Killed { pid, port }) => {
                info!(pid = %pid, port = %port, "Stopped gateway left over from a previous run");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Stale gateway check failed"),
        }
    }

    fn run_migrations(&self) {
        match self
            .migrations
            .run(&self.paths.config_path, &self.paths.state_dir)
        {
            Ok(MigrationOutcome::Applied(report)) => {
                if let Some(failure) = &report.failure {
                    warn!(
                        version = %failure.version,
                        reason = %failure.reason,
                        "Config migration failed; continuing with partially migrated config"
                    );
                }
                info!(
                    from = %report.previous_version,
                    to = %report.applied_version,
                    changed = %report.document_changed,
                    "Config migrations applied"
                );
            }
            Ok(outcome) => debug!(?outcome, "Config migrations skipped"),
            Err(e) => warn!(error = %e, "Config migrations could not be saved"),
        }
    }

    fn process_spec(&self, port: u16, token: &str) -> ProcessSpec {
        ProcessSpec {
            program: self.command.program.clone(),
            args: self.command.args.clone(),
            working_dir: self.command.working_dir.clone(),
            env: gateway_environment(port, token, &self.paths, &self.command.env),
            stdout_log: self.paths.stdout_log(),
            stderr_log: self.paths.stderr_log(),
        }
    }

    async fn spawn(&self, spec: &ProcessSpec, port: u16) -> Result<Arc<SupervisedProcess>, GatewayError> {
        // Held across the spawn so shutdown either sees the child or
        // prevents it.
        let mut slot = self.process.lock().await;
        if self.stopping.load(Ordering::SeqCst) {
            return Err(GatewayError::Spawn {
                program: spec.program.display().to_string(),
                reason: "supervisor is shutting down".to_string(),
            });
        }

        let process = Arc::new(spawn_process(spec, &self.tail).await?);
        *slot = Some(Arc::clone(&process));
        drop(slot);

        let record = PidFileData {
            pid: process.pid(),
            port,
            started_at: process_start_time(process.pid()),
        };
        if let Err(e) = write_pidfile(&self.paths.pid_path(), record) {
            debug!("Failed to write PID file: {}", e);
        }

        Ok(process)
    }

    async fn await_readiness(&self, process: &SupervisedProcess, port: u16) -> Result<(), GatewayError> {
        let policy = ReadinessPolicy {
            timeout: self.settings.readiness_timeout,
            interval: self.settings.poll_interval,
            probe_timeout: self.settings.probe_timeout,
        };

        tokio::select! {
            ready = wait_for_tcp_ready(&self.settings.host, port, policy) => {
                if ready {
                    Ok(())
                } else {
                    Err(GatewayError::ReadinessTimeout {
                        port,
                        timeout_ms: policy.timeout.as_millis(),
                    })
                }
            }
            status = process.wait_for_exit(STARTUP_EXIT_POLL) => {
                process.settle_output(OUTPUT_SETTLE).await;
                Err(GatewayError::ExitedBeforeReady {
                    port,
                    status: status.map_or_else(|| "terminated by supervisor".to_string(), describe_exit),
                })
            }
        }
    }

    fn watch_for_exit(&self, process: &Arc<SupervisedProcess>) {
        let process = Arc::clone(process);
        let handle = tokio::spawn(async move {
            if let Some(status) = process.wait_for_exit(MONITOR_EXIT_POLL).await {
                warn!(
                    pid = %process.pid(),
                    status = %describe_exit(status),
                    "Gateway exited after becoming ready"
                );
            }
        });

        let mut monitor = self.monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = monitor.replace(handle) {
            old.abort();
        }
    }

    /// Publish `Starting` then `Failed` for a failure before any spawn.
    fn fail_before_spawn(&self, port: u16, token: &str, error: &GatewayError) -> GatewayState {
        self.publish(GatewayState::starting(port, &self.paths.logs_dir, token));
        self.fail(port, token, error, None)
    }

    fn fail(
        &self,
        port: u16,
        token: &str,
        error: &GatewayError,
        spec: Option<&ProcessSpec>,
    ) -> GatewayState {
        error!(port = %port, error = %error, "Gateway failed to start");
        let details = failure_details(error, spec, &self.paths, &self.tail.read());
        self.publish(GatewayState::failed(port, &self.paths.logs_dir, details, token))
    }

    fn publish(&self, state: GatewayState) -> GatewayState {
        match self.states.publish(state.clone()) {
            Ok(()) => debug!(
                phase = %state.phase(),
                subscribers = %self.states.subscriber_count(),
                "Published gateway state"
            ),
            Err(e) => warn!(error = %e, "Dropped gateway state"),
        }
        state
    }

    /// Terminate the child, if any, and remove its PID file.
    ///
    /// Safe to call in any state and more than once.
    pub async fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);

        if let Some(monitor) = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            monitor.abort();
        }

        let Some(process) = self.process.lock().await.take() else {
            return;
        };

        info!(pid = %process.pid(), "Stopping gateway");
        process.terminate(self.settings.termination_grace).await;

        if let Err(e) = delete_pidfile(&self.paths.pid_path()) {
            debug!("Failed to delete PID file: {}", e);
        }
    }
}

impl Drop for GatewaySupervisor {
    fn drop(&mut self) {
        if let Some(monitor) = self
            .monitor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            monitor.abort();
        }
    }
}
