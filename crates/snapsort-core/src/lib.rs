//! Core types and traits for snapsort.
//!
//! This crate provides the fundamental data structures shared across
//! the snapsort ecosystem: media entries, sort modes, naming schemes,
//! and listing errors.

mod entry;
mod error;
mod scheme;

pub use entry::{IMAGE_EXTENSIONS, MediaEntry, MediaKind, SortMode, VIDEO_EXTENSIONS};
pub use error::ListError;
pub use scheme::{NamingScheme, NamingSchemeBuilder, STAGING_PREFIX, validate_prefix};
