//! Stage condition evaluation.
//!
//! Conditions are a closed vocabulary of predicates over [`SharedState`].
//! Condition text is matched by substring, not parsed as an expression.

use crate::state::SharedState;
use serde_json::Value;
use std::fmt;

/// Score assumed by `low_confidence` when no score has been written.
pub const DEFAULT_CONFIDENCE_SCORE: f64 = 100.0;

/// Scores strictly below this are low confidence.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 80.0;

/// A stage gate predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Always true; produced by an empty condition string.
    Always,
    /// True when `entities` is absent or empty.
    MissingEntities,
    /// True when `solution_score` is below the low-confidence threshold.
    LowConfidence,
    /// Text outside the vocabulary; always false.
    Unrecognized(String),
}

impl Condition {
    /// Maps condition text onto the vocabulary. First match wins.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if lowered.contains("missing_entities") {
            Self::MissingEntities
        } else if lowered.contains("low_confidence") {
            Self::LowConfidence
        } else if lowered.trim().is_empty() {
            Self::Always
        } else {
            Self::Unrecognized(text.to_string())
        }
    }

    /// Evaluates the predicate against the current state.
    #[must_use]
    pub fn evaluate(&self, state: &SharedState) -> bool {
        match self {
            Self::Always => true,
            Self::MissingEntities => state.get("entities").map_or(true, |v| is_empty_value(&v)),
            Self::LowConfidence => {
                state
                    .get_f64("solution_score")
                    .unwrap_or(DEFAULT_CONFIDENCE_SCORE)
                    < LOW_CONFIDENCE_THRESHOLD
            }
            Self::Unrecognized(_) => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::MissingEntities => write!(f, "missing_entities"),
            Self::LowConfidence => write!(f, "low_confidence"),
            Self::Unrecognized(text) => write!(f, "unrecognized({text})"),
        }
    }
}

/// Evaluates raw condition text against the state.
#[must_use]
pub fn evaluate(condition_text: &str, state: &SharedState) -> bool {
    Condition::parse(condition_text).evaluate(state)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_vocabulary() {
        assert_eq!(Condition::parse("missing_entities"), Condition::MissingEntities);
        assert_eq!(Condition::parse("IF LOW_CONFIDENCE"), Condition::LowConfidence);
        assert_eq!(Condition::parse(""), Condition::Always);
        assert_eq!(Condition::parse("   "), Condition::Always);
        assert_eq!(
            Condition::parse("customer_is_vip"),
            Condition::Unrecognized("customer_is_vip".to_string())
        );
    }

    #[test]
    fn test_first_predicate_wins() {
        assert_eq!(
            Condition::parse("low_confidence or missing_entities"),
            Condition::MissingEntities
        );
    }

    #[test]
    fn test_missing_entities() {
        let mut state = SharedState::new();
        assert!(evaluate("missing_entities", &state));

        state.set("entities", json!({}));
        assert!(evaluate("missing_entities", &state));

        state.set("entities", json!([]));
        assert!(evaluate("missing_entities", &state));

        state.set("entities", json!({"intent": "refund_request"}));
        assert!(!evaluate("missing_entities", &state));
    }

    #[test]
    fn test_low_confidence_defaults_to_confident() {
        let mut state = SharedState::new();
        assert!(!evaluate("low_confidence", &state));

        state.set("solution_score", json!(79.9));
        assert!(evaluate("low_confidence", &state));

        state.set("solution_score", json!(80));
        assert!(!evaluate("low_confidence", &state));
    }

    #[test]
    fn test_empty_and_unknown() {
        let state = SharedState::new();
        assert!(evaluate("", &state));
        assert!(!evaluate("weather_is_nice", &state));
    }
}
