//! # fanscan library
//!
//! Bounded-concurrency fan-out: run a processing function over a stream of
//! items with at most K calls in flight, sum the per-item results into one
//! shared total, and wait until every item (including items produced after
//! dispatch began) has finished.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fanscan_lib::{open_lines, run_bounded, ScanConfig, TracingReporter, WordCounter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::default().with_query("Rust").with_concurrency(8);
//!     let counter = WordCounter::new(&config)?;
//!     let urls = open_lines("urls.txt").await?;
//!
//!     let summary = run_bounded(urls, config.concurrency, counter, TracingReporter).await;
//!     println!("Total: {}", summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Admission gate**: fixed pool of permits caps in-flight work
//! - **Completion tracking**: works without knowing the item count up front
//! - **Failure isolation**: failing or panicking items count as zero and are reported
//! - **Pluggable processing**: anything implementing [`ItemProcessor`]

// Re-export main public API types and functions
pub use concurrent::{
    processor_fn, run_bounded, Accumulator, AdmissionGate, CompletionHandle, CompletionTracker,
    Dispatcher, ItemProcessor, Permit, ProcessorFn, Producer, Reporter, SilentReporter,
    TracingReporter, WorkItem,
};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig,
};
pub use error::ScanError;
#[cfg(feature = "fetch")]
pub use fetch::{count_occurrences, WordCounter, USER_AGENT};
pub use source::{lines_from_reader, open_lines};
pub use types::{RunSummary, ScanConfig, UrlCount, MAX_CONCURRENCY};

// Public modules
pub mod concurrent;

// Internal modules - these are not part of the public API
mod config;
mod error;
#[cfg(feature = "fetch")]
mod fetch;
mod source;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScanError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "fetch")]
    features.push("fetch");

    features
}
