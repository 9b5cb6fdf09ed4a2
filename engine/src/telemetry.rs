//! Telemetry and Observability
//!
//! Handles setting up `tracing-subscriber` for structured logging.
//! Log lines always go to stderr so that `--json` output on stdout stays
//! machine readable.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-oriented output
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

/// Build the filter used by the subscriber.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
fn build_filter(log_level: &str) -> EnvFilter {
    let default_filter = format!("warn,forkcast_engine={},forkcast={}", log_level, log_level);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize the tracing subscriber with the given level and format.
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_telemetry_with_level(log_level: &str, format: LogFormat) {
    let env_filter = build_filter(log_level);
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok(),
    };
}

/// Initialize the tracing subscriber with default settings.
///
/// Falls back to "warn" if no `RUST_LOG` env var is set, so the interactive
/// front end is quiet unless asked otherwise.
pub fn init_telemetry() {
    init_telemetry_with_level("warn", LogFormat::Compact);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: LogFormat,
        }

        let w: Wrapper = toml::from_str(r#"format = "json""#).unwrap();
        assert_eq!(w.format, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
        assert_eq!(LogFormat::Pretty.as_str(), "pretty");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_telemetry_with_level("debug", LogFormat::Compact);
        init_telemetry();
    }
}
