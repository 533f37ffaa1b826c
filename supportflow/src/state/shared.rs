//! The single-owner shared state aggregate for one run.

use super::{TraceEvent, TraceLog, ValidatedRequest};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Keys backed by typed fields rather than the extension map.
pub const RESERVED_KEYS: [&str; 8] = [
    "customer_name",
    "email",
    "query",
    "priority",
    "ticket_id",
    "status",
    "response",
    "solution_score",
];

/// The key under which the trace log is serialized.
pub const LOGS_KEY: &str = "logs";

/// Final ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The request was answered.
    Resolved,
    /// The request was handed to a human.
    Escalated,
    /// Work on the request is still open.
    InProgress,
}

impl Disposition {
    /// Returns the snake-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Escalated => "escalated",
            Self::InProgress => "in_progress",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resolved" => Ok(Self::Resolved),
            "escalated" => Ok(Self::Escalated),
            "in_progress" => Ok(Self::InProgress),
            other => Err(format!("unknown disposition '{other}'")),
        }
    }
}

/// Mutable record accumulating all ability outputs for one run.
///
/// Reserved keys live in typed slots; every other key lives in an open
/// extension map. [`SharedState::set`] keeps the two exclusive so that
/// [`SharedState::get`] always returns the most recent write for a key.
#[derive(Debug, Default, PartialEq)]
pub struct SharedState {
    customer_name: Option<String>,
    email: Option<String>,
    query: Option<String>,
    priority: Option<String>,
    ticket_id: Option<String>,
    status: Option<Disposition>,
    response: Option<String>,
    solution_score: Option<f64>,
    extensions: Map<String, Value>,
    logs: TraceLog,
}

impl SharedState {
    /// Creates an empty state with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state seeded from a validated request.
    #[must_use]
    pub fn seeded(request: ValidatedRequest) -> Self {
        let mut state = Self {
            customer_name: Some(request.customer_name),
            email: Some(request.email),
            query: Some(request.query),
            priority: Some(request.priority),
            ticket_id: Some(request.ticket_id),
            ..Self::default()
        };
        for (key, value) in request.extra {
            state.set(key, value);
        }
        state
    }

    /// Customer display name.
    #[must_use]
    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    /// Customer contact address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// The support query text.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Request priority.
    #[must_use]
    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    /// Ticket identifier.
    #[must_use]
    pub fn ticket_id(&self) -> Option<&str> {
        self.ticket_id.as_deref()
    }

    /// Ticket disposition.
    #[must_use]
    pub fn status(&self) -> Option<Disposition> {
        self.status
    }

    /// Customer-facing response text.
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Solution confidence score in `[0, 100]`.
    #[must_use]
    pub fn solution_score(&self) -> Option<f64> {
        self.solution_score
    }

    /// The extension map holding every non-reserved key.
    #[must_use]
    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// The trace log.
    #[must_use]
    pub fn logs(&self) -> &TraceLog {
        &self.logs
    }

    /// Appends a trace event.
    pub(crate) fn record(&mut self, event: TraceEvent) {
        self.logs.push(event);
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let typed = match key {
            "customer_name" => self.customer_name.as_ref().map(|v| json!(v)),
            "email" => self.email.as_ref().map(|v| json!(v)),
            "query" => self.query.as_ref().map(|v| json!(v)),
            "priority" => self.priority.as_ref().map(|v| json!(v)),
            "ticket_id" => self.ticket_id.as_ref().map(|v| json!(v)),
            "status" => self.status.map(|v| json!(v.as_str())),
            "response" => self.response.as_ref().map(|v| json!(v)),
            "solution_score" => self.solution_score.map(|v| json!(v)),
            LOGS_KEY => return serde_json::to_value(&self.logs).ok(),
            _ => None,
        };
        typed.or_else(|| self.extensions.get(key).cloned())
    }

    /// Returns the string stored under `key`, if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(String::from))
    }

    /// Returns the number stored under `key`, if it is numeric.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    /// Returns the boolean stored under `key`, if it is a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Checks if a key holds a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// Writes to `logs` are refused: the trace log is append-only.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key == LOGS_KEY {
            warn!("Refusing to overwrite the trace log through a state write");
            return;
        }

        let fitted = match key.as_str() {
            "customer_name" => fit_string(&mut self.customer_name, &value),
            "email" => fit_string(&mut self.email, &value),
            "query" => fit_string(&mut self.query, &value),
            "priority" => fit_string(&mut self.priority, &value),
            "ticket_id" => fit_string(&mut self.ticket_id, &value),
            "response" => fit_string(&mut self.response, &value),
            "status" => fit_parsed(&mut self.status, &value),
            "solution_score" => fit_number(&mut self.solution_score, &value),
            _ => false,
        };

        if fitted {
            self.extensions.remove(&key);
        } else {
            self.extensions.insert(key, value);
        }
    }

    /// Writes every entry of `result` into the state.
    pub fn merge(&mut self, result: &Map<String, Value>) {
        for (key, value) in result {
            self.set(key.clone(), value.clone());
        }
    }

    /// Returns all keys holding a value, sorted, excluding `logs`.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.extensions.keys().cloned().collect();
        for key in RESERVED_KEYS {
            if self.get(key).is_some() {
                keys.insert(key.to_string());
            }
        }
        keys.into_iter().collect()
    }

    /// Converts the state into one flat JSON object including `logs`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = self.data_map();
        map.insert(
            LOGS_KEY.to_string(),
            serde_json::to_value(&self.logs).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        Value::Object(map)
    }

    /// Converts the state into a JSON object without `logs`.
    #[must_use]
    pub fn data_map(&self) -> Map<String, Value> {
        let mut map = self.extensions.clone();
        for key in RESERVED_KEYS {
            if let Some(value) = self.get(key) {
                map.insert(key.to_string(), value);
            }
        }
        map
    }
}

impl Serialize for SharedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Stores a string or clears on null; returns false when the value does not fit.
fn fit_string(slot: &mut Option<String>, value: &Value) -> bool {
    match value {
        Value::String(s) => {
            *slot = Some(s.clone());
            true
        }
        Value::Null => {
            *slot = None;
            true
        }
        _ => {
            *slot = None;
            false
        }
    }
}

fn fit_number(slot: &mut Option<f64>, value: &Value) -> bool {
    match value {
        Value::Null => {
            *slot = None;
            true
        }
        other => {
            *slot = other.as_f64();
            slot.is_some()
        }
    }
}

fn fit_parsed<T: FromStr>(slot: &mut Option<T>, value: &Value) -> bool {
    match value {
        Value::Null => {
            *slot = None;
            true
        }
        other => {
            *slot = other.as_str().and_then(|s| s.parse().ok());
            slot.is_some()
        }
    }
}
