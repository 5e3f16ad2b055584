//! Error types for rename and delete operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a batch rename.
///
/// Contention-class failures never surface here; they are always
/// resolved through the verdict protocol first.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The batch was empty.
    #[error("No files to rename")]
    EmptyBatch,

    /// The naming prefix cannot form a valid filename.
    #[error("Invalid prefix: {reason}")]
    InvalidPrefix { reason: String },

    /// A source already carries the reserved staging prefix.
    #[error("Reserved staging name in batch: {path}")]
    ReservedName { path: PathBuf },

    /// The user cancelled while a conflict on this file was pending.
    /// Renames completed before the cancel are kept.
    #[error("Cancelled while renaming {basename}")]
    Cancelled { basename: String },

    /// A structural filesystem failure (missing file, bad path, ...).
    #[error("Rename failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking rename task died.
    #[error("Rename task failed: {message}")]
    Task { message: String },
}

impl EngineError {
    /// True when the batch ended through the cancel verdict rather
    /// than a failure of its own.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Errors surfaced by the delete path.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Still locked after the automatic retries were exhausted.
    #[error("{path} is still in use after {attempts} attempts")]
    Busy { path: PathBuf, attempts: u32 },

    /// A structural failure; not retried.
    #[error("Delete failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
