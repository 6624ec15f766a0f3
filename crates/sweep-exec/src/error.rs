//! Executor error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from launching children and driving the pool.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] sweep_core::CoreError),

    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("concurrency limit must be at least 1, got {0}")]
    InvalidConcurrency(usize),
}

pub type ExecResult<T> = Result<T, ExecError>;
