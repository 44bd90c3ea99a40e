// src/logging.rs
// =============================================================================
// Tracing subscriber setup.
//
// - `RUST_LOG` controls filtering (default: "info")
//   e.g. RUST_LOG=web_spider=debug,reqwest=warn
// - Logs go to stderr so `--json` output on stdout stays machine-readable
// - Text (compact) or JSON lines, picked by the caller
// =============================================================================

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Builds the filter from `RUST_LOG`, falling back to `fallback`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(format: LogFormat) -> Result<(), TryInitError> {
    let output = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(env_filter(DEFAULT_FILTER))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fallback_still_builds_a_filter() {
        // Must not panic whatever RUST_LOG holds in the test environment
        let _ = env_filter("not[a valid=filter");
        let _ = env_filter("debug");
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever call comes first wins; the other reports an error.
        let first = init_logging(LogFormat::Text);
        let second = init_logging(LogFormat::Json);
        assert!(first.is_err() || second.is_err());
    }
}
