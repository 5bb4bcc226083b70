//! Tracing subscriber setup.

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_subscriber::util::TryInitError;

/// Filter used when neither `RUST_LOG` nor configuration gives one.
pub const DEFAULT_FILTER: &str = "info";

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Human => write!(f, "human"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "human" | "pretty" => Ok(Self::Human),
            other => Err(format!("unknown log format '{}' (expected json or human)", other)),
        }
    }
}

/// Build the event filter. `RUST_LOG` wins over `filter`; an unparsable
/// filter falls back to [`DEFAULT_FILTER`].
pub fn build_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat, filter: &str) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(build_filter(filter));

    match format {
        LogFormat::Json => {
            let json_layer = fmt_layer::layer()
                .with_target(true)
                .with_writer(io::stdout)
                .json();
            registry.with(json_layer).try_init()
        }
        LogFormat::Human => {
            let human_layer = fmt_layer::layer()
                .with_target(false)
                .with_writer(io::stdout);
            registry.with(human_layer).try_init()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Human".parse::<LogFormat>(), Ok(LogFormat::Human));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Human));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str("\"human\"").unwrap();
        assert_eq!(format, LogFormat::Human);
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_init_twice_fails() {
        let _ = init_tracing(LogFormat::Human, "debug");
        assert!(init_tracing(LogFormat::Json, "info").is_err());
    }
}
