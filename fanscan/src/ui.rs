//! Console output for fanscan: per-URL lines, the final total, and the JSON
//! report. Uses only the `console` crate for styling.

use console::style;
use fanscan_lib::{Reporter, RunSummary, UrlCount};
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// How results reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One line per URL as it completes, then the total
    Text,
    /// Nothing until the run ends, then a single JSON document
    Json,
}

/// Prints each outcome as it arrives and keeps a copy for the final report.
pub struct ConsoleReporter {
    mode: OutputMode,
    results: Mutex<Vec<UrlCount>>,
}

impl ConsoleReporter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            results: Mutex::new(Vec::new()),
        }
    }

    /// Results collected so far, in completion order.
    pub fn results(&self) -> Vec<UrlCount> {
        match self.results.lock() {
            Ok(results) => results.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, result: UrlCount) {
        match self.results.lock() {
            Ok(mut results) => results.push(result),
            Err(poisoned) => poisoned.into_inner().push(result),
        }
    }
}

impl Reporter<String> for ConsoleReporter {
    fn success(&self, url: &String, contribution: u64) {
        if self.mode == OutputMode::Text {
            println!("{}", format_count_line(url, contribution));
        }
        self.record(UrlCount::counted(url.as_str(), contribution));
    }

    fn failure(&self, url: &String, error: &dyn fmt::Display) {
        tracing::debug!(url = %url, error = %error, "processing error");
        if self.mode == OutputMode::Text {
            println!("{}", format_error_line(url, error));
        }
        self.record(UrlCount::failed(url.as_str(), error));
    }
}

/// `Count for <url>: <n>`
pub fn format_count_line(url: &str, count: u64) -> String {
    format!("Count for {}: {}", url, style(count).green().bold())
}

/// `processing error - <url>: <error>`
pub fn format_error_line(url: &str, error: &dyn fmt::Display) -> String {
    format!(
        "{} - {}: {}",
        style("processing error").yellow(),
        url,
        style(error).dim()
    )
}

/// Print the total line, plus a one-line breakdown for multi-URL runs.
pub fn print_summary(summary: &RunSummary) {
    println!("Total: {}", style(summary.total).bold());

    if summary.items > 1 {
        println!(
            "  {} URLs in {:.1}s  {}  {}  {}  {}",
            style(summary.items).bold(),
            summary.elapsed.as_secs_f64(),
            style("|").dim(),
            style(format!("{} counted", summary.succeeded)).green(),
            style("|").dim(),
            style(format!("{} failed", summary.failed)).yellow(),
        );
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    query: &'a str,
    concurrency: usize,
    total: u64,
    items: usize,
    succeeded: usize,
    failed: usize,
    elapsed_ms: u128,
    results: Vec<UrlCount>,
}

/// Render the whole run as one JSON document.
pub fn render_json(
    summary: &RunSummary,
    results: Vec<UrlCount>,
    query: &str,
    concurrency: usize,
) -> serde_json::Result<String> {
    let report = JsonReport {
        query,
        concurrency,
        total: summary.total,
        items: summary.items,
        succeeded: summary.succeeded,
        failed: summary.failed,
        elapsed_ms: summary.elapsed.as_millis(),
        results,
    };
    serde_json::to_string_pretty(&report)
}
