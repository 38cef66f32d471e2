//! Token command handler.

use anyhow::Result;
use gwhost_core::{GatewayPaths, TokenProvisioner, TokenSource};

use crate::error::CliError;

/// Print the token a run would use. A minted token is not persisted; the
/// next run mints its own.
pub fn execute(paths: &GatewayPaths) -> Result<()> {
    let resolved = TokenProvisioner::resolve(&paths.config_path).map_err(CliError::from)?;
    if resolved.source == TokenSource::Minted {
        eprintln!(
            "No token in {}; showing a fresh one (not saved).",
            paths.config_path.display()
        );
    }
    println!("{}", resolved.value);
    Ok(())
}
