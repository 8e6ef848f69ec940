//! Structured logging on `tracing`.
//!
//! `RUST_LOG` takes precedence over the configured level. Output goes to
//! stderr so stdout stays free for exported records and command results.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Log format for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for machine parsing.
    Json,
    /// Human-readable format.
    #[default]
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = std::convert::Infallible;

    /// Parse from string, case-insensitive. Defaults to Pretty for unknown values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        })
    }
}

/// Parse log level from string.
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber.
///
/// A subscriber installed earlier stays in place.
pub fn init_tracing(level: Level, format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

/// Install the global subscriber from the observability section.
pub fn init_tracing_from_config(config: &ObservabilityConfig) {
    let level = parse_level(&config.log_level);
    let format: LogFormat = config.log_format.parse().unwrap_or_default();
    init_tracing(level, format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("Info"), Level::INFO);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("unknown"), Level::INFO);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("unknown".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing_from_config(&ObservabilityConfig::default());
        init_tracing(Level::DEBUG, LogFormat::Json);
    }
}
