//! Diagnostic logging setup.
//!
//! Library code only emits `tracing` events; binaries call [`init`] once to
//! route them to stderr so they never interleave with streamed reply text.

use std::env;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

/// Install the global subscriber.
///
/// `filter` is usually `ASSIST_LOG`; without it `RUST_LOG` is consulted,
/// then [`DEFAULT_FILTER`].
pub fn init(filter: Option<&str>) -> Result<(), LoggingError> {
    let directives = resolve_filter(filter, env::var("RUST_LOG").ok());
    let env_filter =
        EnvFilter::try_new(&directives).map_err(|source| LoggingError::InvalidFilter {
            filter: directives.clone(),
            source,
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

fn resolve_filter(filter: Option<&str>, rust_log: Option<String>) -> String {
    filter
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned)
        .or_else(|| rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(
            resolve_filter(Some("assist_transport=debug"), Some("info".to_owned())),
            "assist_transport=debug"
        );
    }

    #[test]
    fn blank_filter_falls_back_to_rust_log() {
        assert_eq!(resolve_filter(Some("  "), Some("info".to_owned())), "info");
        assert_eq!(resolve_filter(None, Some("debug".to_owned())), "debug");
    }

    #[test]
    fn default_applies_when_nothing_is_set() {
        assert_eq!(resolve_filter(Some(""), Some(" ".to_owned())), DEFAULT_FILTER);
        assert_eq!(resolve_filter(None, None), DEFAULT_FILTER);
    }

    #[test]
    fn invalid_filter_is_reported() {
        let error = init(Some("assist_transport=notalevel")).unwrap_err();
        assert!(matches!(error, LoggingError::InvalidFilter { .. }));
    }

    #[test]
    fn second_init_is_an_error() {
        // Another test in this binary may already own the global logger.
        let _ = init(Some("off"));
        assert!(matches!(
            init(Some("off")),
            Err(LoggingError::AlreadyInitialized)
        ));
    }
}
