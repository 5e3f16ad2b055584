//! Bounded-concurrency preview scheduling for snapsort.
//!
//! Preview generation (thumbnails, probe reads) is cheap per task but a
//! folder can hold thousands of files; this crate throttles how many
//! tasks run at once and provides the flush barrier a front end needs
//! before discarding its result storage.
//!
//! # Example
//!
//! ```rust,no_run
//! use snapsort_preview::PreviewScheduler;
//!
//! # async fn demo() {
//! let scheduler = PreviewScheduler::new();
//! let thumb = scheduler.submit(async { /* decode */ 42u32 });
//!
//! assert_eq!(thumb.await, Some(42));
//! scheduler.flush().await;
//! # }
//! ```

mod scheduler;

pub use scheduler::{MAX_CONCURRENT, PreviewScheduler, Submission};
