//! Two-phase batch rename engine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use snapsort_core::NamingScheme;

use crate::conflict::{ConflictEvent, ConflictResolver, RenamePhase, Verdict};
use crate::error::EngineError;
use crate::plan::RenamePlan;

/// Outcome of a single rename step.
enum StepOutcome {
    Renamed,
    Skipped,
}

/// Rename `paths` to `scheme`-derived names, in order, collision-free.
///
/// Phase 1 stages every entry to a reserved hidden name; phase 2
/// commits staged entries to their final names in the same order. A
/// step blocked by another process holding the file suspends on
/// `resolver` until a verdict arrives: retry loops the step, skip
/// abandons the entry at whatever name it has, cancel aborts the whole
/// batch keeping renames already made.
///
/// Returns the final paths of the entries that reached them, in input
/// order; skipped entries are omitted and their numbers stay unused.
/// Renames run strictly sequentially; the only suspension point per
/// step is the resolver round-trip.
pub async fn reorder<R>(
    paths: &[PathBuf],
    scheme: &NamingScheme,
    resolver: &R,
) -> Result<Vec<PathBuf>, EngineError>
where
    R: ConflictResolver + Sync,
{
    let plan = RenamePlan::build(paths, scheme)?;
    tracing::debug!(count = plan.len(), dir = %plan.dir().display(), "starting batch rename");

    let mut skipped = vec![false; plan.len()];

    for (index, entry) in plan.entries().iter().enumerate() {
        let basename = basename_of(&entry.source);
        let outcome = rename_step(
            &entry.source,
            &entry.staging,
            &basename,
            RenamePhase::Stage,
            index,
            resolver,
        )
        .await?;
        if matches!(outcome, StepOutcome::Skipped) {
            skipped[index] = true;
        }
    }

    let mut renamed = Vec::with_capacity(plan.len());
    for (index, entry) in plan.entries().iter().enumerate() {
        if skipped[index] {
            continue;
        }
        let basename = basename_of(&entry.source);
        let outcome = rename_step(
            &entry.staging,
            &entry.target,
            &basename,
            RenamePhase::Commit,
            index,
            resolver,
        )
        .await?;
        if matches!(outcome, StepOutcome::Renamed) {
            renamed.push(entry.target.clone());
        }
    }

    tracing::debug!(renamed = renamed.len(), "batch rename finished");
    Ok(renamed)
}

/// Attempt one rename, looping through the resolver on contention.
async fn rename_step<R>(
    from: &Path,
    to: &Path,
    basename: &str,
    phase: RenamePhase,
    index: usize,
    resolver: &R,
) -> Result<StepOutcome, EngineError>
where
    R: ConflictResolver + Sync,
{
    loop {
        let result = {
            let from = from.to_path_buf();
            let to = to.to_path_buf();
            tokio::task::spawn_blocking(move || fs::rename(&from, &to)).await
        };

        match result {
            Ok(Ok(())) => return Ok(StepOutcome::Renamed),
            Ok(Err(error)) if is_contention(&error) => {
                tracing::warn!(file = basename, ?phase, index, "rename blocked by another process");
                let event = ConflictEvent {
                    basename: basename.to_string(),
                    phase,
                    index,
                };
                match resolver.resolve(event).await {
                    Verdict::Retry => continue,
                    Verdict::Skip => {
                        tracing::debug!(file = basename, "entry skipped");
                        return Ok(StepOutcome::Skipped);
                    }
                    Verdict::Cancel => {
                        tracing::debug!(file = basename, "batch cancelled");
                        return Err(EngineError::Cancelled {
                            basename: basename.to_string(),
                        });
                    }
                }
            }
            Ok(Err(error)) => {
                return Err(EngineError::Io {
                    path: from.to_path_buf(),
                    source: error,
                });
            }
            Err(join_error) => {
                return Err(EngineError::Task {
                    message: join_error.to_string(),
                });
            }
        }
    }
}

/// Whether a rename failure means the file is held by another process
/// (recoverable through the verdict protocol) rather than structural.
pub(crate) fn is_contention(error: &io::Error) -> bool {
    if matches!(
        error.kind(),
        io::ErrorKind::PermissionDenied
            | io::ErrorKind::ResourceBusy
            | io::ErrorKind::ExecutableFileBusy
    ) {
        return true;
    }

    match error.raw_os_error() {
        // ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION
        #[cfg(windows)]
        Some(32) | Some(33) => true,
        // EBUSY / ETXTBSY
        #[cfg(unix)]
        Some(16) | Some(26) => true,
        _ => false,
    }
}

fn basename_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Boundary-shaped outcome of a reorder, for front ends that want the
/// `{success, newPaths | error}` form instead of a `Result`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderReport {
    pub success: bool,
    pub new_paths: Vec<PathBuf>,
    pub error: Option<String>,
    /// Distinguishes "the user cancelled part-way" from other
    /// failures, since completed renames are kept either way.
    pub cancelled: bool,
}

impl ReorderReport {
    /// Fold an engine result into the boundary shape.
    pub fn from_result(result: &Result<Vec<PathBuf>, EngineError>) -> Self {
        match result {
            Ok(paths) => Self {
                success: true,
                new_paths: paths.clone(),
                error: None,
                cancelled: false,
            },
            Err(error) => Self {
                success: false,
                new_paths: Vec::new(),
                error: Some(error.to_string()),
                cancelled: error.is_cancelled(),
            },
        }
    }
}
