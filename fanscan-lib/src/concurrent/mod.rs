//! Bounded-concurrency fan-out with a shared result accumulator.
//!
//! The pieces, leaves first:
//!
//! - [`Accumulator`]: shared running total
//! - [`AdmissionGate`]: fixed pool of permits capping in-flight work
//! - [`CompletionTracker`]: outstanding-count join for work of unknown size
//! - [`Producer`]: lazy item source that registers each item as it yields it
//! - [`Dispatcher`] / [`run_bounded`]: dispatch everything, wait, read total
//!
//! Nothing here knows what an item is. Processing and reporting are supplied
//! through [`ItemProcessor`] and [`Reporter`].

mod accumulator;
mod dispatch;
mod gate;
mod producer;
mod tracker;

pub use accumulator::Accumulator;
pub use dispatch::{
    processor_fn, run_bounded, Dispatcher, ItemProcessor, ProcessorFn, Reporter, SilentReporter,
    TracingReporter,
};
pub use gate::{AdmissionGate, Permit};
pub use producer::{Producer, WorkItem};
pub use tracker::{CompletionHandle, CompletionTracker};
