//! Batch rename engine for snapsort.
//!
//! This crate renames an ordered batch of media files to a numbered
//! sequence without ever colliding with itself, using a two-phase
//! protocol: every file is first staged to a reserved hidden name,
//! then committed to its final name. A rename step blocked by another
//! process holding the file is suspended on the verdict protocol
//! (retry / skip / cancel) until the interactive front end answers.

mod conflict;
mod delete;
mod engine;
mod error;
mod plan;

pub use conflict::{
    ChannelResolver, ConflictEvent, ConflictRequest, ConflictResolver, FixedResolver, RenamePhase,
    Verdict, conflict_channel,
};
pub use delete::{DELETE_RETRY_ATTEMPTS, DELETE_RETRY_DELAY, delete_file};
pub use engine::{ReorderReport, reorder};
pub use error::{DeleteError, EngineError};
pub use plan::{PlanEntry, RenamePlan};
