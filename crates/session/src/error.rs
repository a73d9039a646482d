//! Session error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by session state and catalogs
#[derive(Debug, Error)]
pub enum SessionError {
    /// Menu selection does not name a catalog entry or command
    #[error("unknown catalog entry: {0}")]
    UnknownEntry(String),

    /// Catalog document is not a JSON object of entries
    #[error("invalid catalog")]
    Catalog(#[from] serde_json::Error),

    /// A single catalog entry has the wrong shape
    #[error("invalid catalog entry '{id}'")]
    InvalidEntry {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Only the scorekeeper may change the score
    #[error("only the scorekeeper can change the score")]
    NotScorekeeper,

    /// Another user already holds the scorekeeper seat
    #[error("the scorekeeper seat is already taken")]
    SeatTaken,

    /// Score change outside the allowed range
    #[error("invalid point change: {0} (expected -3..=3, not 0)")]
    InvalidPoints(i32),

    /// Host engine refused an operation
    #[error(transparent)]
    Stage(#[from] anyhow::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
