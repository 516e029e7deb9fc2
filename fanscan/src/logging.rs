//! Log setup for the fanscan binary.
//!
//! Logs go to stderr; stdout is reserved for counts, the total and JSON.
//! `FANSCAN_LOG` wins over `RUST_LOG`, which wins over the CLI flags.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Crates whose events belong to fanscan itself.
const OWN_TARGETS: [&str; 2] = ["fanscan", "fanscan_lib"];

/// How much the run logs, chosen by `--quiet`, `-v` and `-d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings: failed config files, unreadable input lines
    Normal,
    /// Per-item dispatch and fetch events from fanscan
    Verbose,
    /// Everything from fanscan plus HTTP client internals
    Debug,
}

impl Verbosity {
    /// `-d` beats `-v`, which beats `--quiet`. The CLI rejects `--quiet`
    /// alongside either of the others before this is called.
    pub const fn from_flags(verbose: bool, debug: bool, quiet: bool) -> Self {
        if debug {
            Self::Debug
        } else if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Filter directives used when neither env var is set.
    pub fn directives(self) -> String {
        let (base, own, http) = match self {
            Self::Quiet => return "error".to_string(),
            Self::Normal => return "warn".to_string(),
            Self::Verbose => ("warn", "debug", None),
            Self::Debug => ("info", "trace", Some("reqwest=debug,hyper=info")),
        };

        let mut directives = vec![base.to_string()];
        directives.extend(OWN_TARGETS.iter().map(|target| format!("{}={}", target, own)));
        directives.extend(http.map(str::to_string));
        directives.join(",")
    }
}

/// Install the global subscriber. Does nothing if one is already set.
pub fn init_subscriber(verbosity: Verbosity, no_color: bool) {
    let filter = env_filter(verbosity);
    let ansi = !no_color && std::io::IsTerminal::is_terminal(&std::io::stderr());

    let layer = fmt::layer().with_writer(std::io::stderr).with_ansi(ansi);

    // Debug runs interleave many requests, so they get timestamps and thread
    // ids; everything else stays one short line per event.
    let installed = if verbosity == Verbosity::Debug {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_timer(fmt::time::uptime()).with_thread_ids(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time().with_target(verbosity >= Verbosity::Verbose).compact())
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}

fn env_filter(verbosity: Verbosity) -> EnvFilter {
    let from_env = ["FANSCAN_LOG", "RUST_LOG"]
        .into_iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|directives| EnvFilter::try_new(directives).ok());

    from_env.unwrap_or_else(|| {
        EnvFilter::try_new(verbosity.directives()).unwrap_or_else(|_| EnvFilter::new("warn"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags_precedence() {
        assert_eq!(Verbosity::from_flags(false, false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, false, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true, false), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, true, false), Verbosity::Debug);
    }

    #[test]
    fn test_directives() {
        assert_eq!(Verbosity::Quiet.directives(), "error");
        assert_eq!(Verbosity::Normal.directives(), "warn");
        assert_eq!(
            Verbosity::Verbose.directives(),
            "warn,fanscan=debug,fanscan_lib=debug"
        );
        assert_eq!(
            Verbosity::Debug.directives(),
            "info,fanscan=trace,fanscan_lib=trace,reqwest=debug,hyper=info"
        );
    }

    #[test]
    fn test_every_level_yields_a_valid_filter() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::Debug,
        ] {
            assert!(EnvFilter::try_new(verbosity.directives()).is_ok());
        }
    }
}
