//! Logging setup on top of `tracing-subscriber`.
//!
//! Three output formats are supported:
//!
//! - `json` for log aggregation
//! - `pretty` for development
//! - `compact` for terminals
//!
//! `RUST_LOG`, when set, overrides the configured level.

use crate::errors::SupportflowError;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as layer_fmt, prelude::*, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line, human-readable output.
    Pretty,
    /// Single-line, human-readable output.
    #[default]
    Compact,
}

impl LogFormat {
    /// Returns the format name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "unknown log format '{other}' (expected json, pretty or compact)"
            )),
        }
    }
}

/// Builds the level filter, letting `RUST_LOG` take precedence.
///
/// # Errors
///
/// Returns an error if the directive cannot be parsed.
pub fn build_filter(level: &str) -> Result<EnvFilter, SupportflowError> {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    EnvFilter::try_new(&directives).map_err(|err| {
        SupportflowError::Config(format!("invalid log filter '{directives}': {err}"))
    })
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), SupportflowError> {
    let filter = build_filter(level)?;
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => subscriber
            .with(layer_fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => subscriber
            .with(layer_fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => subscriber
            .with(
                layer_fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|err| SupportflowError::Config(format!("failed to install logger: {err}")))
}
