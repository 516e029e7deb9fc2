//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables, and merging them with proper precedence rules.

use crate::error::ScanError;
use crate::types::{ScanConfig, MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Default concurrency level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default query word
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Default request timeout (as string, e.g., "5s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl FileConfig {
    /// Apply this file's defaults on top of `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(concurrency) = defaults.concurrency {
                config.concurrency = concurrency;
            }
            if let Some(query) = &defaults.query {
                config.query = query.clone();
            }
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config.timeout = Duration::from_secs(timeout);
            }
        }
        config
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were found
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScanError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory file, then the local
    /// file in the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, ScanError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                }
            }
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./fanscan.toml", "./.fanscan.toml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Some(path.to_path_buf());
            }
        }

        None
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".fanscan.toml", "fanscan.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("fanscan").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.query.is_some() {
                        lower_defaults.query = higher_defaults.query;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    Some(lower_defaults)
                }
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ScanError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                return Err(ScanError::config(format!(
                    "Concurrency must be between 1 and {}",
                    MAX_CONCURRENCY
                )));
            }
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_timeout_string(timeout_str).is_none() {
                return Err(ScanError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                    timeout_str
                )));
            }
        }

        if let Some(query) = &defaults.query {
            if query.is_empty() {
                return Err(ScanError::config("Query word cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `FANSCAN_*` variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub query: Option<String>,
    pub timeout: Option<String>,
    pub file: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Apply the environment settings on top of `config`.
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(query) = &self.query {
            config.query = query.clone();
        }
        if let Some(timeout) = self.timeout.as_deref().and_then(parse_timeout_string) {
            config.timeout = Duration::from_secs(timeout);
        }
        config
    }
}

/// Load configuration from `FANSCAN_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // FANSCAN_CONCURRENCY - max requests in flight
    if let Some(val) = lookup("FANSCAN_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= MAX_CONCURRENCY => {
                env_config.concurrency = Some(concurrency);
                tracing::debug!(concurrency, "using FANSCAN_CONCURRENCY");
            }
            _ => {
                tracing::warn!(
                    value = %val,
                    "invalid FANSCAN_CONCURRENCY, must be 1-{}",
                    MAX_CONCURRENCY
                );
            }
        }
    }

    // FANSCAN_QUERY - word to count
    if let Some(query) = lookup("FANSCAN_QUERY") {
        if query.is_empty() {
            tracing::warn!("ignoring empty FANSCAN_QUERY");
        } else {
            tracing::debug!(query = %query, "using FANSCAN_QUERY");
            env_config.query = Some(query);
        }
    }

    // FANSCAN_TIMEOUT - per-request timeout
    if let Some(timeout_str) = lookup("FANSCAN_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            tracing::debug!(timeout = %timeout_str, "using FANSCAN_TIMEOUT");
            env_config.timeout = Some(timeout_str);
        } else {
            tracing::warn!(
                value = %timeout_str,
                "invalid FANSCAN_TIMEOUT, use format like '5s', '30s', '2m'"
            );
        }
    }

    // FANSCAN_FILE - default input file
    if let Some(file_path) = lookup("FANSCAN_FILE") {
        if !file_path.trim().is_empty() {
            env_config.file = Some(file_path);
        }
    }

    // FANSCAN_CONFIG - explicit config file
    if let Some(config_path) = lookup("FANSCAN_CONFIG") {
        if !config_path.trim().is_empty() {
            env_config.config = Some(config_path);
        }
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let seconds = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }?;

    (seconds > 0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30S"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("0s"), None);
        assert_eq!(parse_timeout_string("invalid"), None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[defaults]
concurrency = 25
query = "Rust"
timeout = "10s"
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();
        let defaults = config.defaults.as_ref().unwrap();
        assert_eq!(defaults.concurrency, Some(25));
        assert_eq!(defaults.query.as_deref(), Some("Rust"));

        let scan = config.apply_to(ScanConfig::default());
        assert_eq!(scan.concurrency, 25);
        assert_eq!(scan.query, "Rust");
        assert_eq!(scan.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_concurrency() {
        let temp_file = write_config("[defaults]\nconcurrency = 0\n");
        let manager = ConfigManager::new(false);
        let err = manager.load_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Concurrency"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_file = write_config("[defaults\nconcurrency = ");
        let manager = ConfigManager::new(false);
        let err = manager.load_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, ScanError::ConfigError { .. }));
    }

    #[test]
    fn test_missing_file() {
        let manager = ConfigManager::new(false);
        let err = manager.load_file("/no/such/fanscan.toml").unwrap_err();
        assert!(matches!(err, ScanError::FileError { .. }));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(10),
                query: Some("Go".to_string()),
                timeout: None,
            }),
        };
        let higher = FileConfig {
            defaults: Some(DefaultsConfig {
                concurrency: Some(20),
                query: None,
                timeout: Some("3s".to_string()),
            }),
        };

        let merged = manager.merge_configs(lower, higher);
        let defaults = merged.defaults.unwrap();
        assert_eq!(defaults.concurrency, Some(20));
        assert_eq!(defaults.query.as_deref(), Some("Go"));
        assert_eq!(defaults.timeout.as_deref(), Some("3s"));
    }

    #[test]
    fn test_env_config_parsing() {
        let vars: HashMap<&str, &str> = [
            ("FANSCAN_CONCURRENCY", "12"),
            ("FANSCAN_QUERY", "async"),
            ("FANSCAN_TIMEOUT", "1m"),
            ("FANSCAN_FILE", "urls.txt"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(env_config.concurrency, Some(12));
        assert_eq!(env_config.file.as_deref(), Some("urls.txt"));
        assert!(env_config.config.is_none());

        let scan = env_config.apply_to(ScanConfig::default());
        assert_eq!(scan.query, "async");
        assert_eq!(scan.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_env_config_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("FANSCAN_CONCURRENCY", "0"),
            ("FANSCAN_QUERY", ""),
            ("FANSCAN_TIMEOUT", "soon"),
        ]
        .into_iter()
        .collect();

        let env_config = load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));
        assert!(env_config.concurrency.is_none());
        assert!(env_config.query.is_none());
        assert!(env_config.timeout.is_none());
    }
}
