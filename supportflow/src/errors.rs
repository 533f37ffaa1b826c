//! Error types for the supportflow engine.
//!
//! Only [`ValidationError`] and [`WorkflowLoadError`] are surfaced to callers
//! as hard failures. [`AbilityError`] is always absorbed by the router and
//! recorded in the trace log.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The umbrella error type for supportflow operations.
#[derive(Debug, Error)]
pub enum SupportflowError {
    /// The inbound request failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The workflow document could not be loaded.
    #[error("{0}")]
    WorkflowLoad(#[from] WorkflowLoadError),

    /// An ability failed. Only surfaced when calling handlers directly.
    #[error("{0}")]
    Ability(#[from] AbilityError),

    /// The knowledge base could not be queried.
    #[error("{0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    /// Configuration could not be read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error raised when an inbound request is missing required identity fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// The error message.
    pub message: String,
    /// The names of the missing or blank fields.
    pub missing_fields: Vec<String>,
}

impl ValidationError {
    /// Creates a validation error for a set of missing fields.
    #[must_use]
    pub fn missing(fields: Vec<String>) -> Self {
        Self {
            message: format!("Missing required fields: {}", fields.join(", ")),
            missing_fields: fields,
        }
    }

    /// Creates a validation error with a free-form message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            missing_fields: Vec::new(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), json!("ValidationError"));
        map.insert("message".to_string(), json!(self.message));
        map.insert("missing_fields".to_string(), json!(self.missing_fields));
        map
    }
}

/// Error raised when the workflow document is absent or structurally invalid.
#[derive(Debug, Error)]
pub enum WorkflowLoadError {
    /// The workflow file could not be read.
    #[error("Failed to read workflow {path}: {source}")]
    Io {
        /// The path that was read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The workflow document could not be parsed.
    #[error("Failed to parse workflow: {0}")]
    Parse(String),

    /// The workflow parsed but violates a structural invariant.
    #[error("Invalid workflow: {message}")]
    Invalid {
        /// The error message.
        message: String,
        /// The stages involved in the error.
        stages: Vec<String>,
    },
}

impl WorkflowLoadError {
    /// Creates an invalid-workflow error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Creates an invalid-workflow error naming the stages involved.
    #[must_use]
    pub fn invalid_stages(message: impl Into<String>, stages: Vec<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            stages,
        }
    }
}

impl From<serde_yaml::Error> for WorkflowLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for WorkflowLoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors raised while invoking an ability handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbilityError {
    /// The handler reported a failure.
    #[error("Ability execution failed: {name} - {reason}")]
    Failed {
        /// The ability name.
        name: String,
        /// The reason for failure.
        reason: String,
    },

    /// The handler did not finish within the router's time bound.
    #[error("Ability timed out: {name} after {timeout_ms}ms")]
    Timeout {
        /// The ability name.
        name: String,
        /// The time bound in milliseconds.
        timeout_ms: u64,
    },

    /// The handler panicked.
    #[error("Ability panicked: {name} - {message}")]
    Panicked {
        /// The ability name.
        name: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// The ability's params were not usable.
    #[error("Invalid params for ability {name}: {reason}")]
    InvalidParams {
        /// The ability name.
        name: String,
        /// What was wrong with the params.
        reason: String,
    },
}

impl AbilityError {
    /// Creates an execution failed error.
    #[must_use]
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(name: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            name: name.into(),
            timeout_ms,
        }
    }

    /// Creates a panicked error.
    #[must_use]
    pub fn panicked(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Panicked {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid params error.
    #[must_use]
    pub fn invalid_params(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns a short machine-readable kind for trace payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "failed",
            Self::Timeout { .. } => "timeout",
            Self::Panicked { .. } => "panicked",
            Self::InvalidParams { .. } => "invalid_params",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

/// Errors raised by a knowledge base collaborator.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// The backing index could not be reached.
    #[error("Knowledge base unavailable: {0}")]
    Unavailable(String),

    /// An FAQ source file could not be read.
    #[error("Failed to read knowledge base source: {0}")]
    Io(#[from] std::io::Error),

    /// An FAQ source file could not be parsed.
    #[error("Failed to parse knowledge base source: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_fields() {
        let err = ValidationError::missing(vec!["email".to_string(), "query".to_string()]);

        assert_eq!(err.to_string(), "Missing required fields: email, query");
        assert_eq!(err.missing_fields.len(), 2);
    }

    #[test]
    fn test_validation_error_to_dict() {
        let dict = ValidationError::missing(vec!["customer_name".to_string()]).to_dict();

        assert_eq!(dict.get("type").unwrap(), "ValidationError");
        assert_eq!(dict.get("missing_fields").unwrap(), &json!(["customer_name"]));
    }

    #[test]
    fn test_workflow_load_error_from_yaml() {
        let yaml_err = serde_yaml::from_str::<Vec<String>>("{not: [a list").unwrap_err();
        let err: WorkflowLoadError = yaml_err.into();

        assert!(matches!(err, WorkflowLoadError::Parse(_)));
        assert!(err.to_string().starts_with("Failed to parse workflow"));
    }

    #[test]
    fn test_ability_error_kinds() {
        assert_eq!(AbilityError::failed("a", "boom").kind(), "failed");
        assert_eq!(AbilityError::timeout("a", 10).kind(), "timeout");
        assert_eq!(AbilityError::panicked("a", "oops").kind(), "panicked");

        let dict = AbilityError::timeout("slow", 250).to_dict();
        assert_eq!(dict.get("kind").unwrap(), "timeout");
        assert!(dict.get("message").unwrap().as_str().unwrap().contains("250ms"));
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: SupportflowError = ValidationError::invalid("bad").into();
        assert!(matches!(err, SupportflowError::Validation(_)));
    }
}
