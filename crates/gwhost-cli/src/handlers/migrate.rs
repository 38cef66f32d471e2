//! Migrate command handler.

use anyhow::Result;
use gwhost_core::{ConfigMigrationEngine, GatewayPaths, MigrationOutcome};

use crate::error::CliError;

/// Human summary of a migration run.
pub fn describe(outcome: &MigrationOutcome) -> String {
    match outcome {
        MigrationOutcome::NoConfig => "No config file; nothing to migrate.".to_string(),
        MigrationOutcome::UpToDate { version } => {
            format!("Config is up to date (version {version}).")
        }
        MigrationOutcome::Unparsable { reason } => {
            format!("Config could not be parsed; migrations skipped: {reason}")
        }
        MigrationOutcome::Applied(report) => {
            let mut out = format!(
                "Migrated config from version {} to {}",
                report.previous_version, report.applied_version
            );
            if report.document_changed {
                out.push_str(" (document updated)");
            } else {
                out.push_str(" (no document changes)");
            }
            if let Some(failure) = &report.failure {
                out.push_str(&format!(
                    "\nMigration {} failed and will be retried next run: {}",
                    failure.version, failure.reason
                ));
            }
            out
        }
    }
}

/// Execute the migrate command.
pub fn execute(paths: &GatewayPaths) -> Result<()> {
    let engine = ConfigMigrationEngine::builtin();
    let outcome = engine
        .run(&paths.config_path, &paths.state_dir)
        .map_err(CliError::from)?;
    println!("{}", describe(&outcome));
    Ok(())
}
