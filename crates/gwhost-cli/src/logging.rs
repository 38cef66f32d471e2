//! Tracing setup for the CLI.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a compact stderr layer plus a daily-rotated, non-ANSI file layer
/// under `log_dir`.
///
/// `RUST_LOG` wins over `verbose`. The returned guard flushes the file
/// writer and must be held until exit; `None` means file logging is off.
pub fn init_tracing(log_dir: &Path, verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .compact();

    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, "gwhost");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .compact();
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Failed to create log directory {}: {e}", log_dir.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok();

    guard
}
