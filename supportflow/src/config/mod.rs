//! Engine configuration.

use crate::abilities::DEFAULT_ABILITY_TIMEOUT;
use crate::errors::SupportflowError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Configuration for a pipeline agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportflowConfig {
    /// Upper bound on a single ability invocation, in seconds.
    #[serde(default = "default_ability_timeout")]
    pub ability_timeout_seconds: f64,
    /// Maximum number of result entries kept in an `ability_end` summary.
    #[serde(default = "default_summary_cap")]
    pub trace_summary_cap: usize,
    /// Default number of knowledge-base hits to request.
    #[serde(default = "default_kb_top_k")]
    pub kb_top_k: usize,
    /// Priority applied to requests that omit one.
    #[serde(default = "default_priority")]
    pub default_priority: String,
}

fn default_ability_timeout() -> f64 {
    30.0
}

fn default_summary_cap() -> usize {
    8
}

fn default_kb_top_k() -> usize {
    3
}

fn default_priority() -> String {
    "Normal".to_string()
}

impl Default for SupportflowConfig {
    fn default() -> Self {
        Self {
            ability_timeout_seconds: default_ability_timeout(),
            trace_summary_cap: default_summary_cap(),
            kb_top_k: default_kb_top_k(),
            default_priority: default_priority(),
        }
    }
}

impl SupportflowConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a YAML file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_yaml_file(path: &Path) -> Result<Self, SupportflowError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|err| SupportflowError::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the ability timeout.
    #[must_use]
    pub fn with_ability_timeout(mut self, seconds: f64) -> Self {
        self.ability_timeout_seconds = seconds;
        self
    }

    /// Sets the trace summary cap.
    #[must_use]
    pub fn with_trace_summary_cap(mut self, cap: usize) -> Self {
        self.trace_summary_cap = cap;
        self
    }

    /// Sets the default knowledge-base `top_k`.
    #[must_use]
    pub fn with_kb_top_k(mut self, top_k: usize) -> Self {
        self.kb_top_k = top_k;
        self
    }

    /// Sets the default priority.
    #[must_use]
    pub fn with_default_priority(mut self, priority: impl Into<String>) -> Self {
        self.default_priority = priority.into();
        self
    }

    /// Returns the ability timeout as a `Duration`.
    ///
    /// Values that are not a positive, representable duration fall back to
    /// [`DEFAULT_ABILITY_TIMEOUT`].
    #[must_use]
    pub fn ability_timeout(&self) -> Duration {
        match self.checked_ability_timeout() {
            Some(timeout) => timeout,
            None => {
                warn!(
                    ability_timeout_seconds = self.ability_timeout_seconds,
                    "Unusable ability timeout, using default"
                );
                DEFAULT_ABILITY_TIMEOUT
            }
        }
    }

    fn checked_ability_timeout(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.ability_timeout_seconds)
            .ok()
            .filter(|timeout| !timeout.is_zero())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-positive timeout, a zero `kb_top_k` or an
    /// empty default priority.
    pub fn validate(&self) -> Result<(), SupportflowError> {
        if self.checked_ability_timeout().is_none() {
            return Err(SupportflowError::Config(format!(
                "ability_timeout_seconds must be a positive number of seconds, got {}",
                self.ability_timeout_seconds
            )));
        }
        if self.kb_top_k == 0 {
            return Err(SupportflowError::Config("kb_top_k must be > 0".to_string()));
        }
        if self.default_priority.trim().is_empty() {
            return Err(SupportflowError::Config(
                "default_priority must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
