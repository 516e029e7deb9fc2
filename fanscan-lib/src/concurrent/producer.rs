//! Producer: pulls items lazily from a stream and registers each one before
//! handing it out.

use super::tracker::{CompletionHandle, CompletionTracker};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;

/// One unit of work: the payload plus the handle that must be completed when
/// its processing ends.
#[derive(Debug)]
pub struct WorkItem<T> {
    pub payload: T,
    pub handle: CompletionHandle,
}

/// Lazily yields [`WorkItem`]s from any stream.
///
/// Registration happens inside `next()`, before the item is returned, so the
/// tracker can never observe zero outstanding items while production is still
/// running. When the stream ends the tracker is closed exactly once.
pub struct Producer<T> {
    source: Pin<Box<dyn Stream<Item = T> + Send>>,
    tracker: CompletionTracker,
    produced: usize,
    finished: bool,
}

impl<T> Producer<T> {
    pub fn new<S>(source: S, tracker: CompletionTracker) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            source: Box::pin(source),
            tracker,
            produced: 0,
            finished: false,
        }
    }

    /// Next registered work item, or `None` once the source is exhausted.
    pub async fn next(&mut self) -> Option<WorkItem<T>> {
        if self.finished {
            return None;
        }

        match self.source.next().await {
            Some(payload) => {
                let handle = self.tracker.register();
                self.produced += 1;
                Some(WorkItem { payload, handle })
            }
            None => {
                self.finished = true;
                self.tracker.close();
                tracing::debug!(produced = self.produced, "producer exhausted");
                None
            }
        }
    }

    /// Number of items produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }
}
