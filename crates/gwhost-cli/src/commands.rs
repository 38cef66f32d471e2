//! Available subcommands.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use gwhost_core::settings::{DEFAULT_GATEWAY_HOST, DEFAULT_GATEWAY_PORT, DEFAULT_TAIL_BUDGET};
use gwhost_core::SupervisorSettings;
use gwhost_runtime::GatewayCommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway, wait for readiness and supervise it until Ctrl-C
    Run(RunArgs),

    /// Apply pending config migrations and print what happened
    Migrate,

    /// Print the token the next run would hand to the gateway
    Token,

    /// Show resolved paths for the gateway state directory
    Paths,

    /// Open the gateway logs directory in the file manager
    OpenLogs,
}

/// Options for `gwhost run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Preferred gateway port (0 lets the OS choose)
    #[arg(long, env = "GWHOST_PORT", default_value_t = DEFAULT_GATEWAY_PORT)]
    pub port: u16,

    /// Loopback host used for readiness probes and the gateway URL
    #[arg(long, env = "GWHOST_HOST", default_value = DEFAULT_GATEWAY_HOST)]
    pub host: String,

    /// Seconds to wait for the gateway to open its port
    #[arg(long = "ready-timeout", env = "GWHOST_READY_TIMEOUT", default_value_t = 30)]
    pub ready_timeout_secs: u64,

    /// Milliseconds between readiness probes
    #[arg(long = "poll-interval", env = "GWHOST_POLL_INTERVAL_MS", default_value_t = 250)]
    pub poll_interval_ms: u64,

    /// Milliseconds allowed for one readiness probe
    #[arg(long = "probe-timeout", env = "GWHOST_PROBE_TIMEOUT_MS", default_value_t = 500)]
    pub probe_timeout_ms: u64,

    /// Milliseconds between SIGTERM and a forced kill on shutdown
    #[arg(long = "grace", env = "GWHOST_GRACE_MS", default_value_t = 1500)]
    pub grace_ms: u64,

    /// Characters of stderr kept for failure diagnostics
    #[arg(long = "tail-budget", env = "GWHOST_TAIL_BUDGET", default_value_t = DEFAULT_TAIL_BUDGET)]
    pub tail_budget: usize,

    /// Working directory for the gateway process
    #[arg(long = "cwd")]
    pub working_dir: Option<PathBuf>,

    /// On startup failure, stop and relaunch gwhost once to retry
    #[arg(long = "relaunch-on-failure")]
    pub relaunch_on_failure: bool,

    /// Gateway executable followed by its arguments
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<OsString>,
}

impl RunArgs {
    /// Supervisor settings from the flags (not yet validated).
    pub fn settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            preferred_port: self.port,
            host: self.host.clone(),
            readiness_timeout: Duration::from_secs(self.ready_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            termination_grace: Duration::from_millis(self.grace_ms),
            tail_budget: self.tail_budget,
        }
    }

    /// Gateway command from the trailing arguments.
    pub fn gateway_command(&self) -> Option<GatewayCommand> {
        let (program, args) = self.command.split_first()?;
        let mut command = GatewayCommand::new(program).args(args.iter().cloned());
        if let Some(dir) = &self.working_dir {
            command = command.current_dir(dir);
        }
        Some(command)
    }
}
