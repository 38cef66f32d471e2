//! Run command handler: supervise one gateway run from the terminal.

use std::ffi::{OsStr, OsString};
use std::process::ExitCode;

use anyhow::Result;
use gwhost_core::{GatewayPaths, GatewayState, HostControl, validate_settings};
use gwhost_runtime::GatewaySupervisor;
use gwhost_runtime::process::describe_exit;
use tracing::{info, warn};

use crate::commands::RunArgs;
use crate::error::CliError;

/// One-line progress message for a state.
pub fn progress_line(state: &GatewayState) -> String {
    match state {
        GatewayState::Starting { port, .. } => format!("Starting gateway on port {port}..."),
        GatewayState::Ready { url, .. } => format!("Gateway ready at {url}"),
        GatewayState::Failed { port, .. } => format!("Gateway failed to start on port {port}"),
    }
}

/// Exit code for a terminal state.
pub fn exit_code(state: &GatewayState) -> ExitCode {
    match state {
        GatewayState::Ready { .. } => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Flag that turns a failed run into one relaunch.
pub const RELAUNCH_FLAG: &str = "--relaunch-on-failure";

/// Arguments for the relaunched copy: `args` without [`RELAUNCH_FLAG`],
/// so a retry happens at most once. Everything after `--` belongs to the
/// gateway and is kept as is.
pub fn relaunch_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut gateway_args = false;
    args.into_iter()
        .filter(|arg| {
            if gateway_args {
                return true;
            }
            if arg == OsStr::new("--") {
                gateway_args = true;
                return true;
            }
            arg != OsStr::new(RELAUNCH_FLAG)
        })
        .collect()
}

/// Execute the run command.
///
/// Prints each transition, then either the failure details or keeps the
/// gateway running until Ctrl-C or until it exits on its own. With
/// `--relaunch-on-failure`, a failed run is shut down and `control`
/// relaunches the host.
pub async fn execute(
    paths: GatewayPaths,
    args: &RunArgs,
    control: &dyn HostControl,
) -> Result<ExitCode> {
    let settings = args.settings();
    validate_settings(&settings).map_err(CliError::from)?;
    let command = args
        .gateway_command()
        .ok_or_else(|| CliError::Arguments("missing gateway command".to_string()))?;

    let supervisor = GatewaySupervisor::new(settings, paths, command);

    let mut states = supervisor.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(state) = states.recv().await {
            println!("{}", progress_line(&state));
            if state.is_terminal() {
                break;
            }
        }
    });

    let state = supervisor.start().await?;
    let _ = printer.await;

    if let GatewayState::Failed { details, .. } = &state {
        eprintln!("\n{details}");
        supervisor.shutdown().await;
        if args.relaunch_on_failure {
            info!("Relaunching after failed start");
            println!("Relaunching to retry...");
            control.relaunch().map_err(CliError::from)?;
        }
        return Ok(exit_code(&state));
    }

    println!("Press Ctrl-C to stop.");
    let code = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown requested");
            exit_code(&state)
        }
        status = supervisor.wait_for_child_exit() => {
            let status = status.map_or_else(|| "stopped".to_string(), describe_exit);
            eprintln!(
                "Gateway exited ({status}); see {}",
                supervisor.paths().logs_dir.display()
            );
            ExitCode::FAILURE
        }
    };

    supervisor.shutdown().await;
    Ok(code)
}
