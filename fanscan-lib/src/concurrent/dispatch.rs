//! The driver: dispatch every produced item, wait for all of them, read the
//! total.
//!
//! For each item the dispatcher takes a permit from the admission gate and
//! spawns a unit that runs the processor, adds a successful contribution to
//! the accumulator, reports the outcome, then releases the permit and
//! completes the item. The last two steps run on every path, including a
//! processor that panics.

use super::accumulator::Accumulator;
use super::gate::{AdmissionGate, Permit};
use super::producer::{Producer, WorkItem};
use super::tracker::CompletionTracker;
use crate::types::RunSummary;
use futures::stream::Stream;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// The per-item work function.
///
/// Returns a non-negative contribution, or an error that the dispatcher
/// reports and counts as zero.
pub trait ItemProcessor<T>: Send + Sync + 'static {
    type Error: fmt::Display + Send;

    fn process(&self, item: &T) -> impl Future<Output = Result<u64, Self::Error>> + Send;
}

/// Receives the outcome of every item.
pub trait Reporter<T>: Send + Sync + 'static {
    fn success(&self, item: &T, contribution: u64);

    fn failure(&self, item: &T, error: &dyn fmt::Display);
}

impl<T, R: Reporter<T>> Reporter<T> for Arc<R> {
    fn success(&self, item: &T, contribution: u64) {
        (**self).success(item, contribution)
    }

    fn failure(&self, item: &T, error: &dyn fmt::Display) {
        (**self).failure(item, error)
    }
}

/// Logs outcomes through `tracing`: successes at info, failures at warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl<T: fmt::Display> Reporter<T> for TracingReporter {
    fn success(&self, item: &T, contribution: u64) {
        tracing::info!(item = %item, contribution, "item processed");
    }

    fn failure(&self, item: &T, error: &dyn fmt::Display) {
        tracing::warn!(item = %item, error = %error, "processing error");
    }
}

/// Discards every outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl<T> Reporter<T> for SilentReporter {
    fn success(&self, _item: &T, _contribution: u64) {}

    fn failure(&self, _item: &T, _error: &dyn fmt::Display) {}
}

/// Adapter returned by [`processor_fn`].
#[derive(Clone)]
pub struct ProcessorFn<F> {
    f: F,
}

/// Use a closure `Fn(T) -> impl Future<Output = Result<u64, E>>` as an
/// [`ItemProcessor`]. The closure receives its own clone of each item.
///
/// ```rust
/// use fanscan_lib::{processor_fn, run_bounded, SilentReporter};
///
/// # tokio_test::block_on(async {
/// let double = processor_fn(|n: u64| async move { Ok::<_, String>(n * 2) });
/// let items = futures::stream::iter(vec![1u64, 2, 3]);
/// let summary = run_bounded(items, 2, double, SilentReporter).await;
/// assert_eq!(summary.total, 12);
/// # });
/// ```
pub fn processor_fn<F>(f: F) -> ProcessorFn<F> {
    ProcessorFn { f }
}

impl<T, F, Fut, E> ItemProcessor<T> for ProcessorFn<F>
where
    T: Clone,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<u64, E>> + Send,
    E: fmt::Display + Send,
{
    type Error = E;

    fn process(&self, item: &T) -> impl Future<Output = Result<u64, E>> + Send {
        (self.f)(item.clone())
    }
}

#[derive(Debug, Default)]
struct Tally {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Bounded fan-out driver. Reusable across runs; the gate is shared by all of
/// them.
pub struct Dispatcher<P, R> {
    gate: AdmissionGate,
    processor: Arc<P>,
    reporter: Arc<R>,
}

impl<P, R> Dispatcher<P, R> {
    pub fn new(concurrency: usize, processor: P, reporter: R) -> Self {
        Self {
            gate: AdmissionGate::new(concurrency),
            processor: Arc::new(processor),
            reporter: Arc::new(reporter),
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Dispatch every item of `items`, wait for all of them and return the
    /// summed contributions.
    ///
    /// Must be called from within a Tokio runtime. There is no cancellation:
    /// a processor call that never returns keeps its permit and this future
    /// never resolves.
    pub async fn run<S, T>(&self, items: S) -> RunSummary
    where
        S: Stream<Item = T> + Send + 'static,
        T: Send + Sync + 'static,
        P: ItemProcessor<T>,
        R: Reporter<T>,
    {
        let started = Instant::now();
        let tracker = CompletionTracker::new();
        let total = Accumulator::new();
        let tally = Arc::new(Tally::default());
        let mut producer = Producer::new(items, tracker.clone());

        while let Some(work) = producer.next().await {
            let permit = self.gate.acquire().await;
            tracing::debug!(
                in_flight = self.gate.in_use(),
                capacity = self.gate.capacity(),
                "dispatching item"
            );
            tokio::spawn(execute(
                work,
                permit,
                Arc::clone(&self.processor),
                Arc::clone(&self.reporter),
                total.clone(),
                Arc::clone(&tally),
            ));
        }

        tracker.wait().await;

        let summary = RunSummary {
            total: total.get(),
            items: producer.produced(),
            succeeded: tally.succeeded.load(Ordering::SeqCst),
            failed: tally.failed.load(Ordering::SeqCst),
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            total = summary.total,
            items = summary.items,
            failed = summary.failed,
            "run complete"
        );
        summary
    }
}

/// One work unit. `permit` and `work.handle` are released/completed at the
/// end; if anything here unwinds they are dropped, which does the same.
async fn execute<T, P, R>(
    work: WorkItem<T>,
    permit: Permit,
    processor: Arc<P>,
    reporter: Arc<R>,
    total: Accumulator,
    tally: Arc<Tally>,
) where
    T: Send + Sync + 'static,
    P: ItemProcessor<T>,
    R: Reporter<T>,
{
    let WorkItem { payload, handle } = work;

    let outcome = AssertUnwindSafe(processor.process(&payload))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(contribution)) => {
            total.add(contribution);
            tally.succeeded.fetch_add(1, Ordering::SeqCst);
            reporter.success(&payload, contribution);
        }
        Ok(Err(error)) => {
            tally.failed.fetch_add(1, Ordering::SeqCst);
            reporter.failure(&payload, &error);
        }
        Err(panic) => {
            tally.failed.fetch_add(1, Ordering::SeqCst);
            let message = format!("processor panicked: {}", panic_message(panic.as_ref()));
            reporter.failure(&payload, &message);
        }
    }

    permit.release();
    handle.complete();
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Run `processor` over every item with at most `concurrency` calls in
/// flight, and return the sum of successful contributions.
///
/// Failed items are passed to `reporter` and contribute zero; they do not
/// stop the run. An empty stream returns a zero total without blocking.
pub async fn run_bounded<S, T, P, R>(
    items: S,
    concurrency: usize,
    processor: P,
    reporter: R,
) -> RunSummary
where
    S: Stream<Item = T> + Send + 'static,
    T: Send + Sync + 'static,
    P: ItemProcessor<T>,
    R: Reporter<T>,
{
    Dispatcher::new(concurrency, processor, reporter)
        .run(items)
        .await
}
