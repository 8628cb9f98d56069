//! Error types for searchable-core

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for searchable operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mapping, synthesizing or syncing content.
///
/// Configuration gaps (unmapped data types, relations to models without the
/// indexable capability, unresolvable fields) are not errors; they are skipped
/// by the schema builder and the document synthesizer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O error bound to a path (attachment reads, index directories).
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid model or service configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A named model or instance does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up ("model", "instance", ...).
        kind: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// The external search engine rejected an operation.
    #[error("Search engine error: {0}")]
    Engine(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Creates a new not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new search engine error.
    pub fn engine<S: Into<String>>(message: S) -> Self {
        Error::Engine(message.into())
    }
}
