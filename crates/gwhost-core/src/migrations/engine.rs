//! Migration runner.

use std::path::Path;

use tracing::{debug, info, warn};

use super::error::MigrationError;
use super::marker::{read_marker, write_marker};
use super::migration::{ConfigMigration, MigrationSet};
use crate::config::ConfigDocument;

/// What a single `run` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No config file exists; nothing to migrate.
    NoConfig,
    /// The marker is already at or past every registered migration.
    UpToDate { version: u32 },
    /// The config is not a JSON object; nothing was touched.
    Unparsable { reason: String },
    /// Pending migrations were attempted.
    Applied(MigrationReport),
}

/// Result of attempting the pending batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Marker value read at the start of the run.
    pub previous_version: u32,
    /// Marker value after the run (last successfully completed migration).
    pub applied_version: u32,
    /// Versions whose `apply` returned normally, in order.
    pub applied: Vec<u32>,
    /// Whether any completed migration reported a change.
    pub document_changed: bool,
    /// The migration that stopped the batch, if any.
    pub failure: Option<MigrationFailure>,
}

/// A migration that returned an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    pub version: u32,
    pub reason: String,
}

impl From<MigrationFailure> for MigrationError {
    fn from(failure: MigrationFailure) -> Self {
        Self::Apply {
            version: failure.version,
            reason: failure.reason,
        }
    }
}

/// Applies pending migrations to the gateway config exactly once each.
#[derive(Debug)]
pub struct ConfigMigrationEngine {
    migrations: MigrationSet,
}

impl ConfigMigrationEngine {
    /// Engine over an explicit registry.
    pub const fn new(migrations: MigrationSet) -> Self {
        Self { migrations }
    }

    /// Engine over the migrations shipped with this release.
    pub fn builtin() -> Self {
        Self::new(super::builtin_migrations())
    }

    /// Apply every migration newer than the marker in `state_dir` to the
    /// config at `config_path`.
    ///
    /// A failing migration halts the batch; completed work before it is
    /// still persisted and the marker stops at the last completed version.
    /// Partial edits made by the failing migration are discarded. `Err` is
    /// only returned when persisting the document or marker fails.
    pub fn run(
        &self,
        config_path: &Path,
        state_dir: &Path,
    ) -> Result<MigrationOutcome, MigrationError> {
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config to migrate");
            return Ok(MigrationOutcome::NoConfig);
        }

        let previous_version = read_marker(state_dir);
        let pending: Vec<&ConfigMigration> = self.migrations.pending(previous_version).collect();
        if pending.is_empty() {
            debug!(version = %previous_version, "Config migrations up to date");
            return Ok(MigrationOutcome::UpToDate {
                version: previous_version,
            });
        }

        let mut doc = match ConfigDocument::read(config_path) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(path = %config_path.display(), error = %e, "Skipping migrations for unparsable config");
                return Ok(MigrationOutcome::Unparsable {
                    reason: e.to_string(),
                });
            }
        };

        let mut report = MigrationReport {
            previous_version,
            applied_version: previous_version,
            applied: Vec::with_capacity(pending.len()),
            document_changed: false,
            failure: None,
        };

        for migration in pending {
            let mut candidate = doc.clone();
            match migration.apply(&mut candidate) {
                Ok(changed) => {
                    debug!(
                        version = %migration.version(),
                        changed = %changed,
                        "Applied config migration: {}",
                        migration.description()
                    );
                    doc = candidate;
                    report.document_changed |= changed;
                    report.applied_version = migration.version();
                    report.applied.push(migration.version());
                }
                Err(e) => {
                    warn!(
                        version = %migration.version(),
                        error = %e,
                        "Config migration failed; remaining migrations deferred to next run"
                    );
                    report.failure = Some(MigrationFailure {
                        version: migration.version(),
                        reason: format!("{e:#}"),
                    });
                    break;
                }
            }
        }

        if report.document_changed {
            doc.write(config_path)?;
        }

        if report.applied_version > previous_version {
            write_marker(state_dir, report.applied_version)?;
            info!(
                from = %previous_version,
                to = %report.applied_version,
                changed = %report.document_changed,
                "Config migrations applied"
            );
        }

        Ok(MigrationOutcome::Applied(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::marker::write_marker;
    use anyhow::bail;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    const CONFIG: &str = "{\n  \"gateway\": {\n    \"port\": 1\n  }\n}\n";

    fn setup(config: Option<&str>) -> (TempDir, std::path::PathBuf) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gateway.json");
        if let Some(text) = config {
            fs::write(&path, text).unwrap();
        }
        (temp, path)
    }

    fn engine(migrations: Vec<ConfigMigration>) -> ConfigMigrationEngine {
        ConfigMigrationEngine::new(MigrationSet::new(migrations).unwrap())
    }

    fn set_flag(version: u32, key: &'static str) -> ConfigMigration {
        ConfigMigration::new(version, format!("set {key}"), move |doc| {
            Ok(doc.set_if_absent(&["gateway", key], json!(true))?)
        })
    }

    fn failing(version: u32) -> ConfigMigration {
        ConfigMigration::new(version, "always fails", |doc| {
            doc.set(&["gateway", "partial"], json!("leaked"))?;
            bail!("boom")
        })
    }

    #[test]
    fn missing_config_is_a_no_op() {
        let (temp, path) = setup(None);
        let outcome = engine(vec![set_flag(1, "a")]).run(&path, temp.path()).unwrap();

        assert_eq!(outcome, MigrationOutcome::NoConfig);
        assert!(!path.exists());
        assert_eq!(read_marker(temp.path()), 0);
    }

    #[test]
    fn applies_pending_in_order_and_advances_marker() {
        let (temp, path) = setup(Some(CONFIG));
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = |v: u32| {
            let order = Arc::clone(&order);
            ConfigMigration::new(v, "record", move |_| {
                order.lock().unwrap().push(v);
                Ok(false)
            })
        };

        let outcome = engine(vec![record(2), set_flag(3, "c"), record(1)])
            .run(&path, temp.path())
            .unwrap();

        let MigrationOutcome::Applied(report) = outcome else {
            panic!("expected applied outcome, got {outcome:?}");
        };
        assert_eq!(report.applied, vec![1, 2, 3]);
        assert_eq!(report.applied_version, 3);
        assert!(report.document_changed);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
        assert_eq!(read_marker(temp.path()), 3);

        let doc = ConfigDocument::read(&path).unwrap();
        assert_eq!(doc.get(&["gateway", "c"]), Some(&json!(true)));
        assert_eq!(doc.get(&["gateway", "port"]), Some(&json!(1)));
    }

    #[test]
    fn second_run_is_idempotent() {
        let (temp, path) = setup(Some(CONFIG));
        let engine = engine(vec![set_flag(1, "a"), set_flag(2, "b")]);

        engine.run(&path, temp.path()).unwrap();
        let after_first = fs::read_to_string(&path).unwrap();

        let outcome = engine.run(&path, temp.path()).unwrap();
        assert_eq!(outcome, MigrationOutcome::UpToDate { version: 2 });
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
        assert_eq!(read_marker(temp.path()), 2);
    }

    #[test]
    fn satisfied_migration_advances_marker_without_rewriting() {
        let (temp, path) = setup(Some(CONFIG));
        let outcome = engine(vec![ConfigMigration::new(1, "already satisfied", |_| Ok(false))])
            .run(&path, temp.path())
            .unwrap();

        let MigrationOutcome::Applied(report) = outcome else {
            panic!("expected applied outcome");
        };
        assert!(!report.document_changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG);
        assert_eq!(read_marker(temp.path()), 1);
    }

    #[test]
    fn first_migration_failing_leaves_everything_untouched() {
        let (temp, path) = setup(Some(CONFIG));
        let outcome = engine(vec![failing(1), set_flag(2, "b")])
            .run(&path, temp.path())
            .unwrap();

        let MigrationOutcome::Applied(report) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(
            report.failure,
            Some(MigrationFailure {
                version: 1,
                reason: "boom".to_string(),
            })
        );
        assert!(report.applied.is_empty());
        assert_eq!(report.applied_version, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG);
        assert_eq!(read_marker(temp.path()), 0);
    }

    #[test]
    fn failure_keeps_earlier_work_and_discards_partial_edits() {
        let (temp, path) = setup(Some(CONFIG));
        let later_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&later_calls);
        let later = ConfigMigration::new(3, "never reached", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        });

        engine(vec![set_flag(1, "a"), failing(2), later])
            .run(&path, temp.path())
            .unwrap();

        let doc = ConfigDocument::read(&path).unwrap();
        assert_eq!(doc.get(&["gateway", "a"]), Some(&json!(true)));
        assert_eq!(doc.get(&["gateway", "partial"]), None);
        assert_eq!(read_marker(temp.path()), 1);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_migration_is_retried_on_next_run() {
        let (temp, path) = setup(Some(CONFIG));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let flaky = ConfigMigration::new(1, "fails once", move |doc| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                bail!("transient");
            }
            Ok(doc.set_if_absent(&["gateway", "flaky"], json!(1))?)
        });
        let engine = engine(vec![flaky]);

        engine.run(&path, temp.path()).unwrap();
        assert_eq!(read_marker(temp.path()), 0);

        engine.run(&path, temp.path()).unwrap();
        assert_eq!(read_marker(temp.path()), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn marker_never_decreases() {
        let (temp, path) = setup(Some(CONFIG));
        write_marker(temp.path(), 5).unwrap();

        let outcome = engine(vec![set_flag(3, "old"), failing(6)])
            .run(&path, temp.path())
            .unwrap();

        let MigrationOutcome::Applied(report) = outcome else {
            panic!("expected applied outcome");
        };
        assert_eq!(report.previous_version, 5);
        assert_eq!(report.applied_version, 5);
        assert_eq!(read_marker(temp.path()), 5);
        assert_eq!(ConfigDocument::read(&path).unwrap().get(&["gateway", "old"]), None);
    }

    #[test]
    fn unparsable_config_is_skipped_silently() {
        for text in ["{ nope", "[1, 2, 3]"] {
            let (temp, path) = setup(Some(text));
            let outcome = engine(vec![set_flag(1, "a")]).run(&path, temp.path()).unwrap();

            assert!(matches!(outcome, MigrationOutcome::Unparsable { .. }));
            assert_eq!(fs::read_to_string(&path).unwrap(), text);
            assert_eq!(read_marker(temp.path()), 0);
        }
    }

    #[test]
    fn corrupt_marker_restarts_from_zero() {
        let (temp, path) = setup(Some(CONFIG));
        fs::write(temp.path().join("config-state.json"), "garbage").unwrap();

        let outcome = engine(vec![set_flag(1, "a")]).run(&path, temp.path()).unwrap();
        assert!(matches!(outcome, MigrationOutcome::Applied(_)));
        assert_eq!(read_marker(temp.path()), 1);
    }
}
