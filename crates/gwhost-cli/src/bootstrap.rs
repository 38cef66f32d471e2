//! Resolve where the gateway state lives for this invocation.

use std::path::PathBuf;

use gwhost_core::paths::normalize_user_path;
use gwhost_core::{GatewayPaths, PathError};

use crate::parser::Cli;

/// Path overrides collected from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub state_dir: Option<String>,
    pub config: Option<String>,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            state_dir: cli.state_dir.clone(),
            config: cli.config.clone(),
        }
    }

    /// Gateway paths with overrides applied.
    pub fn resolve_paths(&self) -> Result<GatewayPaths, PathError> {
        let paths = match self.state_dir.as_deref() {
            Some(raw) => GatewayPaths::from_state_dir(normalize_user_path(raw)?),
            None => GatewayPaths::resolve()?,
        };

        Ok(match self.config.as_deref() {
            Some(raw) => paths.with_config_path(normalize_user_path(raw)?),
            None => paths,
        })
    }

    /// Logs directory to use even when resolution fails.
    pub fn logs_dir_or_fallback(&self) -> PathBuf {
        self.resolve_paths()
            .map_or_else(|_| PathBuf::from("."), |paths| paths.logs_dir)
    }
}
