//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for supervising a local gateway.
#[derive(Parser, Debug)]
#[command(name = "gwhost")]
#[command(about = "Launch, health-check and supervise a local gateway process")]
#[command(version)]
pub struct Cli {
    /// Override the gateway state directory for this invocation
    #[arg(long = "state-dir", env = "GWHOST_DATA_DIR", global = true)]
    pub state_dir: Option<String>,

    /// Override the gateway config file location
    #[arg(long = "config", env = "GWHOST_CONFIG_PATH", global = true)]
    pub config: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
