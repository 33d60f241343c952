use thiserror::Error;

use crate::config::ConfigError;
use crate::cue::CueError;

/// Errors surfaced by the application shell.
///
/// Nothing in the timing core is fatal; these come from settings and the
/// terminal.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sound error: {0}")]
    Cue(#[from] CueError),
}

pub type Result<T> = std::result::Result<T, AppError>;
