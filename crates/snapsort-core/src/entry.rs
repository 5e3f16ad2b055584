//! Media file entries and sort modes.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// File extensions recognized as images (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// File extensions recognized as videos (lowercase).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// The kind of media a file holds, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify an extension (case-insensitive).
    ///
    /// Returns `None` for anything outside the media allow-lists.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// How a folder listing is ordered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Natural-order comparison on the filename (`img2` before `img10`).
    #[default]
    Name,
    /// Ascending creation time, falling back to modification time.
    Created,
}

/// One media file on disk, as seen at enumeration time.
///
/// An entry goes stale the moment any rename or delete touches its
/// directory; the rename engine's returned paths supersede it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Media classification derived from the extension.
    pub kind: MediaKind,
    /// Creation time, when the filesystem reports one.
    pub created: Option<SystemTime>,
    /// Modification time.
    pub modified: SystemTime,
}

impl MediaEntry {
    /// Create a new entry.
    pub fn new(
        path: impl Into<PathBuf>,
        kind: MediaKind,
        created: Option<SystemTime>,
        modified: SystemTime,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            created,
            modified,
        }
    }

    /// The file's basename.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Timestamp used by [`SortMode::Created`].
    ///
    /// A creation time at the epoch counts as unavailable.
    pub fn sort_timestamp(&self) -> SystemTime {
        self.created
            .filter(|time| *time != UNIX_EPOCH)
            .unwrap_or(self.modified)
    }
}
