//! Error types for CourseGraph.
//!
//! Library crates use [`CourseGraphError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CourseGraph operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseGraphError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching the catalog or calling Spotlight.
    #[error("network error: {0}")]
    Network(String),

    /// Catalog markup does not match the expected course listing shape.
    #[error("unrecognized listing format: {message} (in {snippet:?})")]
    UnrecognizedListing { message: String, snippet: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tabular (CSV) input or cache error.
    #[error("csv error at {path:?}: {message}")]
    Csv { path: PathBuf, message: String },

    /// Data validation error (unknown grade letter, bad identifier, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Graph store load or query error.
    #[error("graph error: {0}")]
    Graph(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseGraphError>;

impl CourseGraphError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an unrecognized-listing error, keeping a short snippet of the offending text.
    pub fn listing(msg: impl Into<String>, snippet: &str) -> Self {
        Self::UnrecognizedListing {
            message: msg.into(),
            snippet: snippet.chars().take(80).collect(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a CSV error for the given file.
    pub fn csv(path: impl Into<PathBuf>, msg: impl std::fmt::Display) -> Self {
        Self::Csv {
            path: path.into(),
            message: msg.to_string(),
        }
    }
}
