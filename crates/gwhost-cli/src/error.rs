//! CLI-specific error types and exit codes.

use std::process::ExitCode;

use gwhost_core::{ControlError, MigrationError, PathError, SettingsError, TokenError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid flag values.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// State directory could not be resolved.
    #[error("Path error: {0}")]
    Paths(#[from] PathError),

    /// Migration results could not be persisted.
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    /// Token could not be minted.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// A host-control pass-through failed.
    #[error("{0}")]
    Control(#[from] ControlError),
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl CliError {
    /// Map error to an exit code: 2 for usage errors, 1 otherwise.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            _ => 1,
        }
    }
}

/// Exit code for an `anyhow` error escaping a handler.
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(err.downcast_ref::<CliError>().map_or(1, CliError::exit_code))
}
