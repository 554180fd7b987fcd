//! Error types for asciitab-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in asciitab-core
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed user input (dimensions, indices, choices)
    #[error("invalid input: {0}")]
    Validation(String),

    /// Row or column index outside the current table bounds
    #[error("{what} index {index} is out of range (size {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// An edit would duplicate a key that already exists in the table
    #[error("key '{0}' already exists")]
    DuplicateKey(String),

    /// Operation attempted before any data was loaded or generated
    #[error("table is empty, load or generate a table first")]
    EmptyTable,

    /// No backing file exists for the session
    #[error("no file associated with table '{0}'")]
    NoFile(String),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn row_out_of_range(index: usize, len: usize) -> Self {
        Error::IndexOutOfRange {
            what: "row",
            index,
            len,
        }
    }

    pub(crate) fn col_out_of_range(index: usize, len: usize) -> Self {
        Error::IndexOutOfRange {
            what: "column",
            index,
            len,
        }
    }
}
