//! Error types for folder listing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while listing a media folder.
///
/// Listing failures are surfaced directly, never retried.
#[derive(Debug, Error)]
pub enum ListError {
    /// Permission denied for the directory.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Directory not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// The path exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ListError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::NotADirectory => Self::NotADirectory { path },
            _ => Self::Io { path, source },
        }
    }
}
