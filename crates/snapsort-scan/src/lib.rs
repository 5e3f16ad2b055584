//! Media folder enumeration for snapsort.
//!
//! This crate lists a single directory level, keeps only recognized
//! media files, and orders them for display.
//!
//! # Example
//!
//! ```rust,no_run
//! use snapsort_scan::{ListOptions, list_folder};
//!
//! let options = ListOptions::new("/media/photos");
//! let entries = list_folder(&options).unwrap();
//!
//! for entry in &entries {
//!     println!("{}", entry.basename());
//! }
//! ```

mod list;
mod natural;

pub use list::{ListOptions, ListOptionsBuilder, file_size, list_folder};
pub use natural::natural_cmp;

// Re-export core types for convenience
pub use snapsort_core::{ListError, MediaEntry, MediaKind, SortMode};
