//! Trace events and the append-only trace log.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// The kind of a trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    /// A run began.
    RunStarted,
    /// A stage began.
    StageStart,
    /// A stage finished (including skipped stages).
    StageEnd,
    /// An ability is about to be dispatched.
    AbilityStart,
    /// An ability finished, was simulated, or failed.
    AbilityEnd,
    /// A run finished.
    RunCompleted,
}

impl TraceEventKind {
    /// Returns the snake-case name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::StageStart => "stage_start",
            Self::StageEnd => "stage_end",
            Self::AbilityStart => "ability_start",
            Self::AbilityEnd => "ability_end",
            Self::RunCompleted => "run_completed",
        }
    }
}

impl fmt::Display for TraceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single auditable record of a state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// The event kind.
    #[serde(rename = "event")]
    pub kind: TraceEventKind,

    /// When the event occurred (RFC 3339).
    pub timestamp: String,

    /// The event payload.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl TraceEvent {
    /// Creates a new event with an empty payload.
    #[must_use]
    pub fn new(kind: TraceEventKind) -> Self {
        Self {
            kind,
            timestamp: crate::utils::iso_timestamp(),
            payload: Map::new(),
        }
    }

    /// Adds a payload field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Returns a payload field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Returns the `stage` payload field as a string.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.get("stage").and_then(Value::as_str)
    }

    /// Returns the `ability` payload field as a string.
    #[must_use]
    pub fn ability(&self) -> Option<&str> {
        self.get("ability").and_then(Value::as_str)
    }

    /// Converts the event into a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.clone();
        map.insert("event".to_string(), json!(self.kind.as_str()));
        map.insert("timestamp".to_string(), json!(self.timestamp));
        Value::Object(map)
    }

    /// Creates a `stage_start` event.
    #[must_use]
    pub fn stage_start(stage: &str, mode: &str) -> Self {
        Self::new(TraceEventKind::StageStart)
            .add_data("stage", json!(stage))
            .add_data("mode", json!(mode))
    }

    /// Creates a `stage_end` event.
    #[must_use]
    pub fn stage_end(stage: &str, mode: &str, abilities_run: usize) -> Self {
        Self::new(TraceEventKind::StageEnd)
            .add_data("stage", json!(stage))
            .add_data("mode", json!(mode))
            .add_data("abilities_run", json!(abilities_run))
    }

    /// Creates an `ability_start` event.
    #[must_use]
    pub fn ability_start(stage: &str, ability: &str, backend: &str) -> Self {
        Self::new(TraceEventKind::AbilityStart)
            .add_data("stage", json!(stage))
            .add_data("ability", json!(ability))
            .add_data("backend", json!(backend))
    }

    /// Creates an `ability_end` event without a result summary.
    #[must_use]
    pub fn ability_end(stage: &str, ability: &str, backend: &str, outcome: &str) -> Self {
        Self::new(TraceEventKind::AbilityEnd)
            .add_data("stage", json!(stage))
            .add_data("ability", json!(ability))
            .add_data("backend", json!(backend))
            .add_data("outcome", json!(outcome))
    }
}

/// An append-only, ordered sequence of trace events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
}

impl TraceLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub(crate) fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// Returns the events in order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Iterates over the events in order.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the first event.
    #[must_use]
    pub fn first(&self) -> Option<&TraceEvent> {
        self.events.first()
    }

    /// Returns the last event.
    #[must_use]
    pub fn last(&self) -> Option<&TraceEvent> {
        self.events.last()
    }

    /// Returns the kinds of all events in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<TraceEventKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    /// Returns all events of the given kind.
    #[must_use]
    pub fn of_kind(&self, kind: TraceEventKind) -> Vec<&TraceEvent> {
        self.events.iter().filter(|e| e.kind == kind).collect()
    }

    /// Returns all events recorded for a stage.
    #[must_use]
    pub fn for_stage(&self, stage: &str) -> Vec<&TraceEvent> {
        self.events.iter().filter(|e| e.stage() == Some(stage)).collect()
    }

    /// Returns the abilities that were dispatched, as `(stage, ability)` pairs.
    #[must_use]
    pub fn dispatched_abilities(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter(|e| e.kind == TraceEventKind::AbilityStart)
            .filter_map(|e| Some((e.stage()?.to_string(), e.ability()?.to_string())))
            .collect()
    }
}

impl<'a> IntoIterator for &'a TraceLog {
    type Item = &'a TraceEvent;
    type IntoIter = std::slice::Iter<'a, TraceEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
