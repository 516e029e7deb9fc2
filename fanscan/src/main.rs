//! fanscan CLI Application
//!
//! Counts how often a word appears across many web pages, with a cap on the
//! number of requests in flight. Thin front end over fanscan-lib.

mod logging;
mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use fanscan_lib::{load_env_config, open_lines, ConfigManager, EnvConfig, FileConfig};
use fanscan_lib::{parse_timeout_string, run_bounded, ScanConfig, WordCounter, MAX_CONCURRENCY};
use futures::stream::{self, BoxStream, StreamExt};
use logging::Verbosity;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use ui::{ConsoleReporter, OutputMode};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for fanscan
#[derive(Parser, Debug)]
#[command(name = "fanscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Count a word across many web pages with bounded concurrency")]
#[command(
    long_about = "Fetch every URL (one per line in --file, or given as arguments), count the\nnon-overlapping occurrences of a word in each page, and print per-URL counts\nplus the grand total. At most --concurrency requests run at once."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// URLs to scan, in addition to any read from --file
    #[arg(value_name = "URLS", help_heading = "Input")]
    pub urls: Vec<String>,

    /// Input file with URLs (one per line, '#' starts a comment)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Input"
    )]
    pub file: Option<String>,

    /// Word to count in each page (case-sensitive) [default: Go]
    #[arg(short = 'q', long = "query", value_name = "WORD", help_heading = "Input")]
    pub query: Option<String>,

    /// Max requests in flight (default: 5, max: 1000)
    #[arg(
        short = 'k',
        long = "concurrency",
        value_name = "K",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Per-request timeout, e.g. "5s", "2m" [default: 30s]
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Output results as a single JSON document
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Disable colored output
    #[arg(long = "no-color", help_heading = "Output Format")]
    pub no_color: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Trace-level logging plus build info and resolved settings
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long = "quiet", help_heading = "Configuration")]
    pub quiet: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    logging::init_subscriber(
        Verbosity::from_flags(args.verbose, args.debug, args.quiet),
        args.no_color,
    );
    if args.no_color {
        console::set_colors_enabled(false);
    }

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_scan(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    if let Some(query) = &args.query {
        if query.is_empty() {
            return Err("Query word cannot be empty".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    if args.quiet && (args.verbose || args.debug) {
        return Err("Cannot combine --quiet with --verbose or --debug".to_string());
    }

    Ok(())
}

/// Resolve settings: CLI > environment > config file > defaults.
fn build_config(args: &Args, env_config: &EnvConfig) -> Result<ScanConfig, String> {
    let config_manager = ConfigManager::new(args.verbose);

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?,
        None => config_manager.discover_and_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config discovery failed, using defaults");
            FileConfig::default()
        }),
    };

    let mut config = file_config.apply_to(ScanConfig::default());
    config = env_config.apply_to(config);
    config = apply_cli_args(config, args);

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn apply_cli_args(mut config: ScanConfig, args: &Args) -> ScanConfig {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(query) = &args.query {
        config.query = query.clone();
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config.timeout = Duration::from_secs(secs);
    }
    config
}

/// Positional URLs first, then the lines of the input file.
///
/// The file is opened here, before anything is dispatched, so a missing file
/// aborts the run without touching the network.
async fn get_items(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<BoxStream<'static, String>, Box<dyn std::error::Error>> {
    let file = args.file.as_ref().or(env_config.file.as_ref());

    if args.urls.is_empty() && file.is_none() {
        return Err("No URLs to scan. Pass URLs as arguments or use --file".into());
    }

    let positional = stream::iter(args.urls.clone());
    match file {
        Some(path) => {
            let lines = open_lines(path).await?;
            Ok(positional.chain(lines).boxed())
        }
        None => Ok(positional.boxed()),
    }
}

async fn run_scan(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let config = build_config(&args, &env_config)?;

    if args.debug {
        let info = fanscan_lib::info();
        eprintln!(
            "fanscan v{} (features: {})",
            info.version,
            info.features.join(", ")
        );
        eprintln!(
            "query={:?} concurrency={} timeout={}s",
            config.query,
            config.concurrency,
            config.timeout.as_secs()
        );
    }

    let items = get_items(&args, &env_config).await?;
    let counter = WordCounter::new(&config)?;

    let mode = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let reporter = Arc::new(ConsoleReporter::new(mode));

    tracing::debug!(
        query = %config.query,
        concurrency = config.concurrency,
        "starting scan"
    );
    let summary = run_bounded(items, config.concurrency, counter, Arc::clone(&reporter)).await;

    match mode {
        OutputMode::Json => {
            let json = ui::render_json(
                &summary,
                reporter.results(),
                &config.query,
                config.concurrency,
            )?;
            println!("{}", json);
        }
        OutputMode::Text => ui::print_summary(&summary),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_args() -> Args {
        Args {
            urls: vec![],
            file: None,
            query: None,
            concurrency: None,
            timeout: None,
            json: false,
            no_color: false,
            config: None,
            debug: false,
            verbose: false,
            quiet: false,
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_args_parse_short_flags() {
        let args =
            Args::try_parse_from(["fanscan", "-k", "3", "-q", "Rust", "-f", "urls.txt"]).unwrap();
        assert_eq!(args.concurrency, Some(3));
        assert_eq!(args.query.as_deref(), Some("Rust"));
        assert_eq!(args.file.as_deref(), Some("urls.txt"));
        assert!(args.urls.is_empty());
    }

    #[test]
    fn test_validate_args() {
        let mut args = create_test_args();
        assert!(validate_args(&args).is_ok());

        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());
        args.concurrency = Some(MAX_CONCURRENCY + 1);
        assert!(validate_args(&args).is_err());
        args.concurrency = Some(10);
        assert!(validate_args(&args).is_ok());

        args.query = Some(String::new());
        assert!(validate_args(&args).unwrap_err().contains("Query"));
        args.query = None;

        args.timeout = Some("later".to_string());
        assert!(validate_args(&args).is_err());
        args.timeout = Some("10s".to_string());
        assert!(validate_args(&args).is_ok());

        args.verbose = true;
        args.quiet = true;
        assert!(validate_args(&args).is_err());

        args.verbose = false;
        args.debug = true;
        assert!(validate_args(&args).unwrap_err().contains("--debug"));

        args.quiet = false;
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_build_config_precedence() {
        let config_file = write_config(
            r#"
[defaults]
concurrency = 8
query = "File"
timeout = "20s"
"#,
        );

        let mut args = create_test_args();
        args.config = Some(config_file.path().to_string_lossy().to_string());
        args.query = Some("Cli".to_string());

        let env_config = EnvConfig {
            concurrency: Some(12),
            ..EnvConfig::default()
        };

        let config = build_config(&args, &env_config).unwrap();
        assert_eq!(config.query, "Cli");
        assert_eq!(config.concurrency, 12);
        assert_eq!(config.timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_build_config_missing_explicit_file() {
        let mut args = create_test_args();
        args.config = Some("/no/such/fanscan.toml".to_string());
        let err = build_config(&args, &EnvConfig::default()).unwrap_err();
        assert!(err.contains("Failed to load config file"));
    }

    #[tokio::test]
    async fn test_get_items_requires_input() {
        let args = create_test_args();
        assert!(get_items(&args, &EnvConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_get_items_chains_args_and_file() {
        let input = write_config("http://b.example/\n# skipped\n\nhttp://c.example/\n");
        let mut args = create_test_args();
        args.urls = vec!["http://a.example/".to_string()];

        let env_config = EnvConfig {
            file: Some(input.path().to_string_lossy().to_string()),
            ..EnvConfig::default()
        };

        let items: Vec<String> = get_items(&args, &env_config)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(
            items,
            vec![
                "http://a.example/".to_string(),
                "http://b.example/".to_string(),
                "http://c.example/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_items_missing_file() {
        let mut args = create_test_args();
        args.file = Some("/no/such/urls.txt".to_string());
        let err = get_items(&args, &EnvConfig::default()).await.err().unwrap();
        assert!(err.to_string().contains("/no/such/urls.txt"));
    }
}
