//! Conflict events and the verdict protocol for locked files.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::{mpsc, oneshot};

/// Which phase of the two-phase rename a conflict occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenamePhase {
    /// Phase 1: source to hidden staging name.
    Stage,
    /// Phase 2: staging name to final name.
    Commit,
}

/// A single rename step failed because another process holds the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictEvent {
    /// Basename the user knows the file by (the original source name,
    /// in both phases).
    pub basename: String,
    /// Phase the failing step belongs to.
    pub phase: RenamePhase,
    /// Index of the entry within the rename plan.
    pub index: usize,
}

/// The decision resolving one conflict.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Re-attempt the same rename step.
    Retry,
    /// Abandon this entry and continue with the rest of the plan.
    Skip,
    /// Abort the whole operation, keeping renames already made.
    Cancel,
}

/// Decides what to do when a rename step hits a locked file.
///
/// The engine suspends the failing step on [`resolve`] and acts on the
/// verdict; it never retries on its own. One request is outstanding at
/// a time per engine invocation.
///
/// [`resolve`]: ConflictResolver::resolve
pub trait ConflictResolver {
    fn resolve(&self, event: ConflictEvent) -> impl Future<Output = Verdict> + Send;
}

/// A conflict awaiting a verdict from the interactive front end.
///
/// Delivered over the receiver half of [`conflict_channel`]; answer
/// with [`ConflictRequest::respond`]. Dropping the request without
/// responding counts as a cancel.
#[derive(Debug)]
pub struct ConflictRequest {
    /// Monotonic id keying this request.
    pub id: u64,
    /// The conflict to present to the user.
    pub event: ConflictEvent,
    reply: oneshot::Sender<Verdict>,
}

impl ConflictRequest {
    /// Deliver the user's verdict back to the suspended engine.
    pub fn respond(self, verdict: Verdict) {
        let _ = self.reply.send(verdict);
    }
}

/// Resolver that forwards each conflict to an interactive front end
/// and suspends the engine's current step until the reply arrives.
#[derive(Debug)]
pub struct ChannelResolver {
    requests: mpsc::Sender<ConflictRequest>,
    next_id: AtomicU64,
}

/// Create a connected resolver/receiver pair.
///
/// The engine holds the resolver; the front end drains the receiver
/// and answers each request. A dropped receiver resolves outstanding
/// and future conflicts as [`Verdict::Cancel`], so an orphaned engine
/// invocation terminates instead of hanging forever.
pub fn conflict_channel(capacity: usize) -> (ChannelResolver, mpsc::Receiver<ConflictRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ChannelResolver {
            requests: tx,
            next_id: AtomicU64::new(0),
        },
        rx,
    )
}

impl ConflictResolver for ChannelResolver {
    fn resolve(&self, event: ConflictEvent) -> impl Future<Output = Verdict> + Send {
        let requests = self.requests.clone();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        async move {
            let (reply_tx, reply_rx) = oneshot::channel();
            let request = ConflictRequest {
                id,
                event,
                reply: reply_tx,
            };
            if requests.send(request).await.is_err() {
                return Verdict::Cancel;
            }
            reply_rx.await.unwrap_or(Verdict::Cancel)
        }
    }
}

/// Resolver that answers every conflict with one fixed verdict, for
/// non-interactive callers.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub Verdict);

impl ConflictResolver for FixedResolver {
    fn resolve(&self, _event: ConflictEvent) -> impl Future<Output = Verdict> + Send {
        let verdict = self.0;
        async move { verdict }
    }
}
