//! Logging initialization (§4.13).
//!
//! `tracing` + `tracing-subscriber`, with verbosity driven by `-d`/`-v` and
//! falling back to `RUST_LOG`/`CrawlConfig::log_level` when neither flag is
//! given.

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Requested verbosity from the CLI's `-d`/`-v` flags, highest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Debug,
    Info,
    Default,
}

impl Verbosity {
    pub fn from_flags(debug: bool, verbose: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Info
        } else {
            Verbosity::Default
        }
    }

    fn directive(self, config_log_level: &str) -> String {
        match self {
            Verbosity::Debug => "debug".to_string(),
            Verbosity::Info => "info".to_string(),
            Verbosity::Default => config_log_level.to_string(),
        }
    }
}

/// Initialize the global subscriber once, before config validation. `-d`/
/// `-v` override whatever `RUST_LOG` or the config's `log_level` says;
/// otherwise `RUST_LOG` wins if set, falling back to `config_log_level`.
pub fn init(verbosity: Verbosity, config_log_level: &str) {
    let filter = if verbosity == Verbosity::Default {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive(config_log_level)))
    } else {
        EnvFilter::new(verbosity.directive(config_log_level))
    };

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}
