//! Error handling for fan-out scanning operations.
//!
//! Two classes of failure matter to callers. Per-item processing errors are
//! reported and counted as zero; they never abort a run. Setup errors (the
//! input cannot be opened, the configuration is invalid) are fatal and are
//! raised before any work is dispatched.

use std::fmt;

/// Main error type for scanning operations.
#[derive(Debug, Clone)]
pub enum ScanError {
    /// The item could not be turned into a request (malformed URL, etc.)
    InvalidUrl {
        url: String,
        reason: String,
    },

    /// Network-related errors (connection refused, DNS, TLS, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The response arrived but its body could not be read
    HttpError {
        message: String,
        status_code: Option<u16>,
    },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when opening or reading the item source
    FileError {
        path: String,
        message: String,
    },

    /// Timeout errors when a request takes too long
    Timeout {
        operation: String,
        duration: Option<std::time::Duration>,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl ScanError {
    /// Create a new invalid URL error.
    pub fn invalid_url<U: Into<String>, R: Into<String>>(url: U, reason: R) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Option<std::time::Duration>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error belongs to the fatal class that must stop a run
    /// before anything is dispatched.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::FileError { .. } | Self::ConfigError { .. })
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => {
                write!(f, "Invalid URL '{}': {}", url, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::HttpError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error (status {}): {}", code, message)
                } else {
                    write!(f, "HTTP error: {}", message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => match duration {
                Some(d) => write!(f, "Timeout after {:?} during: {}", d, operation),
                None => write!(f, "Timeout during: {}", operation),
            },
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ScanError {}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        if err.is_timeout() {
            Self::timeout(format!("GET {}", url), None)
        } else if err.is_builder() {
            Self::invalid_url(url, err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::HttpError {
                message: format!("Failed to read response body: {}", err),
                status_code: err.status().map(|s| s.as_u16()),
            }
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
