//! Completion tracking for work whose total count is not known up front.
//!
//! Every item is registered when it is produced and completed exactly once
//! when its processing ends. `wait()` returns only after the producer has
//! closed the tracker and the outstanding count has dropped back to zero.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct TrackerState {
    outstanding: AtomicUsize,
    closed: AtomicBool,
    idle: Notify,
}

impl TrackerState {
    fn is_done(&self) -> bool {
        self.closed.load(Ordering::SeqCst) && self.outstanding.load(Ordering::SeqCst) == 0
    }
}

/// Outstanding-count join point shared by the producer, the work units and
/// the driver.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    state: Arc<TrackerState>,
}

/// Proof that one registered item has not finished yet.
///
/// Completing consumes the handle, so an item can only complete once. If the
/// handle is dropped without `complete()` (an early return, a panic unwinding
/// through the work unit) it completes on drop.
#[derive(Debug)]
#[must_use = "dropping a completion handle completes its item immediately"]
pub struct CompletionHandle {
    state: Arc<TrackerState>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more outstanding item.
    ///
    /// Must be called before the item is handed to anything that could
    /// finish it.
    pub fn register(&self) -> CompletionHandle {
        self.state.outstanding.fetch_add(1, Ordering::SeqCst);
        CompletionHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Mark end of production. No `register()` may follow.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::SeqCst);
        if self.state.outstanding.load(Ordering::SeqCst) == 0 {
            self.state.idle.notify_waiters();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Items registered but not yet completed.
    pub fn outstanding(&self) -> usize {
        self.state.outstanding.load(Ordering::SeqCst)
    }

    /// Block until production is closed and every registered item completed.
    pub async fn wait(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a notify between the
            // check and the await is not lost.
            notified.as_mut().enable();

            if self.state.is_done() {
                return;
            }
            notified.await;
        }
    }
}

impl CompletionHandle {
    /// Signal that this item's processing has ended.
    pub fn complete(self) {}
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        let previous = self.state.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "completion without registration");
        if previous == 1 && self.state.closed.load(Ordering::SeqCst) {
            self.state.idle.notify_waiters();
        }
    }
}
