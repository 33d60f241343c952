//! File-based logging.
//!
//! The terminal UI owns stdout, so logs only ever go to
//! `~/.local/state/ringside/ringside.log`. `RUST_LOG` overrides the default
//! `info` filter.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_dirs::AppDirs;

/// Initialize logging into the application state dir.
///
/// The returned guard must be held for the lifetime of the program so that
/// buffered lines are flushed on exit. Returns `None` (and logs nothing) when
/// the log directory is unavailable.
pub fn init() -> Option<WorkerGuard> {
    let dir = AppDirs::state_dir()?;
    init_in(&dir)
}

pub fn init_in(dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("ringside: logging disabled, cannot create {}: {}", dir.display(), e);
        return None;
    }

    let file_appender = tracing_appender::rolling::never(dir, "ringside.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (tests, embedding); keep it.
    if tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!(log_dir = ?dir, "ringside logging initialized");
    Some(guard)
}
