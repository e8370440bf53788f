//! Error types for cloudmesh operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cloudmesh operations.
///
/// Malformed coordinate lines are not represented here: they are skipped
/// during parsing and surfaced only as an aggregate count on the load
/// report.
#[derive(Error, Debug)]
pub enum Error {
    /// A source file could not be opened or read.
    #[error("failed to access {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input does not contain enough data for the requested operation,
    /// e.g. a file with zero valid points or fewer than three points handed
    /// to the reconstructor.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A pipeline run was cancelled at a batch boundary. This is a normal
    /// termination state; results delivered before the cancellation remain
    /// valid.
    #[error("operation cancelled")]
    Cancelled,

    /// A mesh file violated the structural contract of its format.
    #[error("mesh format error at {location}: {message}")]
    CodecFormat { location: String, message: String },

    /// An allocation failed on a very large input. The operation's partial
    /// progress is discarded; previously accumulated state is preserved.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    /// Any other I/O error not tied to a specific source path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cloudmesh operations
pub type Result<T> = std::result::Result<T, Error>;
