//! File deletion with bounded retry for transient locks.
//!
//! Unlike renames, deletion has no meaningful "skip to next" step, so
//! a short automatic backoff stands in for the verdict protocol: it
//! covers the typical transient lock (an indexer briefly opening the
//! file) without a human round-trip.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::engine::is_contention;
use crate::error::DeleteError;

/// Attempts made before a locked file's deletion is surfaced as failed.
pub const DELETE_RETRY_ATTEMPTS: u32 = 5;

/// Delay between deletion attempts.
pub const DELETE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Delete a file, retrying a fixed number of times while it is held by
/// another process. Structural errors surface immediately.
pub async fn delete_file(path: &Path) -> Result<(), DeleteError> {
    for attempt in 1..=DELETE_RETRY_ATTEMPTS {
        let target = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || fs::remove_file(&target)).await;

        match result {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(error)) if is_contention(&error) => {
                tracing::debug!(path = %path.display(), attempt, "delete blocked, retrying");
                if attempt < DELETE_RETRY_ATTEMPTS {
                    tokio::time::sleep(DELETE_RETRY_DELAY).await;
                }
            }
            Ok(Err(error)) => {
                return Err(DeleteError::Io {
                    path: path.to_path_buf(),
                    source: error,
                });
            }
            Err(join_error) => {
                return Err(DeleteError::Io {
                    path: path.to_path_buf(),
                    source: io::Error::other(join_error.to_string()),
                });
            }
        }
    }

    Err(DeleteError::Busy {
        path: path.to_path_buf(),
        attempts: DELETE_RETRY_ATTEMPTS,
    })
}
