//! Core data types: run configuration, run summary, and per-URL results.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the concurrency setting.
pub const MAX_CONCURRENCY: usize = 1000;

/// Settings for one scanning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of requests in flight at once
    /// Default: 5, Range: 1-1000
    pub concurrency: usize,

    /// Word counted in each fetched page (case-sensitive, non-overlapping)
    /// Default: "Go"
    pub query: String,

    /// Timeout for each individual request
    /// Default: 30 seconds
    #[serde(skip)] // Don't serialize Duration directly
    pub timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            query: "Go".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ScanConfig {
    /// Set concurrency, clamped to `1..=MAX_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    pub fn with_query<Q: Into<String>>(mut self, query: Q) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the settings before any work is dispatched.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ScanError::config(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }
        if self.query.is_empty() {
            return Err(ScanError::config("Query word cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::config("Timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Sum of the contributions of every item that succeeded
    pub total: u64,

    /// Items produced by the source
    pub items: usize,

    /// Items whose processing returned a contribution
    pub succeeded: usize,

    /// Items whose processing failed (contributed zero)
    pub failed: usize,

    /// Wall-clock time from first dispatch to final completion
    pub elapsed: Duration,
}

/// Result of scanning one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlCount {
    /// The URL as read from the input
    pub url: String,

    /// Occurrences of the query word, `None` if the fetch failed
    pub count: Option<u64>,

    /// Why the fetch failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl UrlCount {
    pub fn counted<U: Into<String>>(url: U, count: u64) -> Self {
        Self {
            url: url.into(),
            count: Some(count),
            error_message: None,
        }
    }

    pub fn failed<U: Into<String>, E: ToString>(url: U, error: E) -> Self {
        Self {
            url: url.into(),
            count: None,
            error_message: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.query, "Go");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_concurrency_clamps() {
        assert_eq!(ScanConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(
            ScanConfig::default().with_concurrency(50_000).concurrency,
            MAX_CONCURRENCY
        );
        assert_eq!(ScanConfig::default().with_concurrency(8).concurrency, 8);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let empty_query = ScanConfig::default().with_query("");
        assert!(empty_query.validate().unwrap_err().is_setup_error());

        let mut zero = ScanConfig::default();
        zero.concurrency = 0;
        assert!(zero.validate().is_err());

        let no_timeout = ScanConfig::default().with_timeout(Duration::ZERO);
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_url_count_json_shape() {
        let ok = serde_json::to_value(UrlCount::counted("http://a/", 3)).unwrap();
        assert_eq!(ok["count"], 3);
        assert!(ok.get("error_message").is_none());

        let err = serde_json::to_value(UrlCount::failed("http://b/", "refused")).unwrap();
        assert!(err["count"].is_null());
        assert_eq!(err["error_message"], "refused");
    }
}
