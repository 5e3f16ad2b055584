//! Single-directory media enumeration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use snapsort_core::{ListError, MediaEntry, MediaKind, SortMode};

use crate::natural::natural_cmp;

/// Options for listing a media folder.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ListOptions {
    /// Directory to list.
    pub root: PathBuf,

    /// Listing order.
    #[builder(default)]
    #[serde(default)]
    pub sort: SortMode,

    /// Include video files as well as images.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_videos: bool,
}

impl ListOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl ListOptions {
    /// Create a new list options builder.
    pub fn builder() -> ListOptionsBuilder {
        ListOptionsBuilder::default()
    }

    /// Simple options for listing a path: images only, sorted by name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sort: SortMode::default(),
            include_videos: false,
        }
    }
}

/// List the media files of a single directory in the requested order.
///
/// Subdirectories, unrecognized extensions, and entries whose metadata
/// cannot be read are skipped. An unreadable directory is surfaced as
/// a [`ListError`], never retried.
pub fn list_folder(options: &ListOptions) -> Result<Vec<MediaEntry>, ListError> {
    let read_dir = fs::read_dir(&options.root).map_err(|e| ListError::io(&options.root, e))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let Ok(dir_entry) = dir_entry else { continue };
        let path = dir_entry.path();

        let Some(kind) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(MediaKind::from_extension)
        else {
            continue;
        };
        if kind == MediaKind::Video && !options.include_videos {
            continue;
        }

        let Ok(metadata) = dir_entry.metadata() else {
            tracing::debug!(path = %path.display(), "skipping unreadable entry");
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        entries.push(MediaEntry::new(
            path,
            kind,
            metadata.created().ok(),
            metadata.modified().unwrap_or(UNIX_EPOCH),
        ));
    }

    match options.sort {
        SortMode::Name => {
            entries.sort_by(|a, b| natural_cmp(&a.basename(), &b.basename()));
        }
        // Stable sort keeps enumeration order for equal timestamps.
        SortMode::Created => entries.sort_by_key(MediaEntry::sort_timestamp),
    }

    Ok(entries)
}

/// Byte size of a file, or `None` when it cannot be read.
pub fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|metadata| metadata.len())
}
