//! Error types for RegoSlice

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for RegoSlice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in RegoSlice operations
#[derive(Error, Debug)]
pub enum Error {
    /// Source table could not be parsed, had no rows, or is missing a
    /// column the render configuration binds
    #[error("input error: {0}")]
    Input(String),

    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Index or metadata artifact missing at the expected path
    #[error("index artifact not found: {}", .0.display())]
    IndexNotFound(PathBuf),

    /// Artifact cannot be decoded, or the index and metadata store disagree
    #[error("index corrupt: {0}")]
    IndexCorrupt(String),

    /// Vector dimension differs from the dimension the index was built with
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid retrieval request
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Record field or configuration cannot be rendered into the template
    #[error("render error: {0}")]
    Render(String),

    /// Failed to encode an artifact for writing
    #[error("persist error: {0}")]
    Persist(String),

    /// Filesystem failure while reading or writing artifacts
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
