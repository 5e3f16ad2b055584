//! Concurrency-limited task queue with a drain barrier.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

/// Default number of preview tasks allowed in flight at once.
pub const MAX_CONCURRENT: usize = 50;

/// A concurrency-limited queue for preview generation tasks.
///
/// Up to the admission limit tasks run at once; further submissions
/// wait in FIFO order and are admitted as running tasks finish, in
/// submission order. [`PreviewScheduler::flush`] refuses new work and
/// drains the queue, so a consumer can tear down its result storage
/// without a task resolving into it afterwards.
///
/// One task's failure is carried in its own artifact type and never
/// affects other tasks.
pub struct PreviewScheduler<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for PreviewScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    limit: usize,
    state: Mutex<State<T>>,
}

struct State<T> {
    in_flight: usize,
    pending: VecDeque<Job<T>>,
    flushing: bool,
    flush_waiters: Vec<oneshot::Sender<()>>,
}

struct Job<T> {
    task: BoxFuture<'static, T>,
    done: oneshot::Sender<Option<T>>,
}

impl<T: Send + 'static> PreviewScheduler<T> {
    /// Scheduler with the default admission limit.
    pub fn new() -> Self {
        Self::with_limit(MAX_CONCURRENT)
    }

    /// Scheduler with a custom admission limit.
    pub fn with_limit(limit: usize) -> Self {
        assert!(limit > 0, "admission limit must be positive");
        Self {
            inner: Arc::new(Inner {
                limit,
                state: Mutex::new(State {
                    in_flight: 0,
                    pending: VecDeque::new(),
                    flushing: false,
                    flush_waiters: Vec::new(),
                }),
            }),
        }
    }

    /// Submit a preview task.
    ///
    /// The task starts immediately while fewer than the limit are in
    /// flight, otherwise it queues in FIFO order. While a flush is
    /// outstanding the submission is refused: it resolves `None`
    /// without ever running.
    pub fn submit<F>(&self, task: F) -> Submission<T>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job = Job {
            task: task.boxed(),
            done: done_tx,
        };

        let admitted = {
            let mut state = self.inner.state.lock().unwrap();
            if state.flushing {
                let Job { task: _, done } = job;
                let _ = done.send(None);
                None
            } else if state.in_flight < self.inner.limit {
                state.in_flight += 1;
                Some(job)
            } else {
                state.pending.push_back(job);
                None
            }
        };

        if let Some(job) = admitted {
            run_job(Arc::clone(&self.inner), job);
        }

        Submission { done: done_rx }
    }

    /// Wait until no task is queued or in flight.
    ///
    /// While the flush is outstanding, new submissions resolve `None`
    /// instead of being queued; pending tasks are still drained.
    /// Admission re-opens once the queue is empty. A flush on an idle
    /// scheduler completes immediately.
    pub async fn flush(&self) {
        let waiter = {
            let mut state = self.inner.state.lock().unwrap();
            if state.in_flight == 0 && state.pending.is_empty() {
                return;
            }
            state.flushing = true;
            let (tx, rx) = oneshot::channel();
            state.flush_waiters.push(tx);
            rx
        };
        let _ = waiter.await;
    }

    /// Number of tasks currently running.
    pub fn in_flight(&self) -> usize {
        self.inner.state.lock().unwrap().in_flight
    }

    /// Number of tasks waiting for admission.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().unwrap().pending.len()
    }
}

impl<T: Send + 'static> Default for PreviewScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one admitted job; on completion, admit the next pending job or
/// release a finished flush.
fn run_job<T: Send + 'static>(inner: Arc<Inner<T>>, job: Job<T>) {
    tokio::spawn(async move {
        let Job { task, done } = job;
        let artifact = task.await;
        // A dropped Submission just means nobody is listening.
        let _ = done.send(Some(artifact));

        let next = {
            let mut state = inner.state.lock().unwrap();
            state.in_flight -= 1;
            match state.pending.pop_front() {
                Some(next) => {
                    state.in_flight += 1;
                    Some(next)
                }
                None => {
                    if state.in_flight == 0 && state.flushing {
                        state.flushing = false;
                        for waiter in state.flush_waiters.drain(..) {
                            let _ = waiter.send(());
                        }
                    }
                    None
                }
            }
        };

        if let Some(next) = next {
            run_job(inner, next);
        }
    });
}

/// Pending result of a submitted preview task.
///
/// Resolves `Some(artifact)` when the task ran to completion, or
/// `None` when the submission was refused by an outstanding flush or
/// abandoned before running.
pub struct Submission<T> {
    done: oneshot::Receiver<Option<T>>,
}

impl<T> Future for Submission<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.done)
            .poll(cx)
            .map(|result| result.unwrap_or(None))
    }
}
