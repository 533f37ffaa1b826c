//! Mock ability handlers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::abilities::{AbilityCall, AbilityHandler};
use crate::errors::AbilityError;
use crate::workflow::Backend;

/// A handler that always returns the same value.
#[derive(Debug, Clone)]
pub struct StaticAbility {
    value: Value,
}

impl StaticAbility {
    /// Creates a handler returning `value`.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Creates a handler returning an empty object.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

#[async_trait]
impl AbilityHandler for StaticAbility {
    async fn invoke(&self, _call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        Ok(self.value.clone())
    }
}

/// A handler that always fails.
#[derive(Debug, Clone)]
pub struct FailingAbility {
    reason: String,
}

impl FailingAbility {
    /// Creates a failing handler.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AbilityHandler for FailingAbility {
    async fn invoke(&self, call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        Err(AbilityError::failed(call.ability, &self.reason))
    }
}

/// A handler that sleeps before answering.
#[derive(Debug, Clone)]
pub struct SlowAbility {
    delay: Duration,
    value: Value,
}

impl SlowAbility {
    /// Creates a slow handler returning an empty object.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            value: Value::Object(Map::new()),
        }
    }

    /// Creates a slow handler with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Sets the value returned after the delay.
    #[must_use]
    pub fn returning(mut self, value: Value) -> Self {
        self.value = value;
        self
    }
}

#[async_trait]
impl AbilityHandler for SlowAbility {
    async fn invoke(&self, _call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.value.clone())
    }
}

/// A handler that panics.
#[derive(Debug, Clone)]
pub struct PanickingAbility {
    message: String,
}

impl PanickingAbility {
    /// Creates a panicking handler.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl AbilityHandler for PanickingAbility {
    async fn invoke(&self, _call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        panic!("{}", self.message);
    }
}

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Backend the call was dispatched to.
    pub backend: Backend,
    /// Ability name.
    pub ability: String,
    /// Parameters passed.
    pub params: Map<String, Value>,
    /// State keys visible at call time.
    pub state_keys: Vec<String>,
}

/// A handler that records every call and returns a configurable value.
#[derive(Debug)]
pub struct RecordingAbility {
    value: Value,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for RecordingAbility {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingAbility {
    /// Creates a recording handler returning an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::returning(Value::Object(Map::new()))
    }

    /// Creates a recording handler returning `value`.
    #[must_use]
    pub fn returning(value: Value) -> Self {
        Self {
            value,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Clears recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl AbilityHandler for RecordingAbility {
    async fn invoke(&self, call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        self.calls.lock().push(RecordedCall {
            backend: call.backend,
            ability: call.ability.to_string(),
            params: call.params.clone(),
            state_keys: call.state.keys(),
        });
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_ability() {
        let state = SharedState::new();
        let params = Map::new();
        let value = StaticAbility::new(json!({"a": 1}))
            .invoke(AbilityCall::new(Backend::Common, "x", &params, &state))
            .await
            .unwrap();

        assert_eq!(value, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_failing_ability() {
        let state = SharedState::new();
        let params = Map::new();
        let err = FailingAbility::new("boom")
            .invoke(AbilityCall::new(Backend::Common, "x", &params, &state))
            .await
            .unwrap_err();

        assert_eq!(err, AbilityError::failed("x", "boom"));
    }

    #[tokio::test]
    async fn test_slow_ability() {
        let state = SharedState::new();
        let params = Map::new();
        let start = std::time::Instant::now();
        SlowAbility::with_delay_ms(10)
            .invoke(AbilityCall::new(Backend::Common, "x", &params, &state))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_recording_ability() {
        let mut state = SharedState::new();
        state.set("query", json!("hi"));
        let mut params = Map::new();
        params.insert("top_k".to_string(), json!(2));

        let handler = RecordingAbility::returning(json!("done"));
        handler
            .invoke(AbilityCall::new(Backend::Atlas, "x", &params, &state))
            .await
            .unwrap();

        assert_eq!(handler.call_count(), 1);
        let call = &handler.calls()[0];
        assert_eq!(call.backend, Backend::Atlas);
        assert_eq!(call.params["top_k"], 2);
        assert_eq!(call.state_keys, vec!["query"]);

        handler.clear();
        assert_eq!(handler.call_count(), 0);
    }
}
