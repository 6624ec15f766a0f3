//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from descriptor loading, template rendering, and word splitting.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor {path}: {reason}")]
    MalformedDescriptor { path: PathBuf, reason: String },

    #[error("template references {{{key}}} which is not in the descriptor")]
    MissingSubstitution { key: String },

    #[error("template has an unterminated {{placeholder}}")]
    UnterminatedPlaceholder,

    #[error("unclosed {0} quote in command")]
    UnclosedQuote(char),

    #[error("command ends with an unfinished backslash escape")]
    TrailingEscape,

    #[error("rendered command is empty")]
    EmptyCommand,
}

pub type CoreResult<T> = Result<T, CoreError>;
