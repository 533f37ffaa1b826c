//! Ability handler trait and closure adapter.

use crate::errors::AbilityError;
use crate::state::SharedState;
use crate::workflow::Backend;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::{self, Debug};

/// Everything a handler gets to see for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct AbilityCall<'a> {
    /// The backend namespace the ability was dispatched to.
    pub backend: Backend,
    /// The ability name.
    pub ability: &'a str,
    /// Parameters declared on the ability in the workflow.
    pub params: &'a Map<String, Value>,
    /// Read-only view of the run's shared state.
    pub state: &'a SharedState,
}

impl<'a> AbilityCall<'a> {
    /// Creates a new call.
    #[must_use]
    pub fn new(
        backend: Backend,
        ability: &'a str,
        params: &'a Map<String, Value>,
        state: &'a SharedState,
    ) -> Self {
        Self {
            backend,
            ability,
            params,
            state,
        }
    }

    /// Returns a parameter by name.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&'a Value> {
        self.params.get(key)
    }

    /// Returns a string parameter, or an `InvalidParams` error if it has another type.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is present but not a string.
    pub fn str_param(&self, key: &str) -> Result<Option<&'a str>, AbilityError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(AbilityError::invalid_params(
                self.ability,
                format!("'{key}' must be a string"),
            )),
        }
    }

    /// Returns an unsigned integer parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is present but not a non-negative integer.
    pub fn u64_param(&self, key: &str) -> Result<Option<u64>, AbilityError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                AbilityError::invalid_params(
                    self.ability,
                    format!("'{key}' must be a non-negative integer"),
                )
            }),
        }
    }
}

/// Trait for ability implementations.
///
/// Handlers read the shared state through the call but never write to it;
/// the returned value is merged into the state by the executor.
#[async_trait]
pub trait AbilityHandler: Send + Sync {
    /// Invokes the ability.
    async fn invoke(&self, call: AbilityCall<'_>) -> Result<Value, AbilityError>;
}

/// A handler backed by a synchronous function.
pub struct FnAbility<F>
where
    F: Fn(&AbilityCall<'_>) -> Result<Value, AbilityError> + Send + Sync,
{
    func: F,
}

impl<F> FnAbility<F>
where
    F: Fn(&AbilityCall<'_>) -> Result<Value, AbilityError> + Send + Sync,
{
    /// Wraps a function as a handler.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnAbility<F>
where
    F: Fn(&AbilityCall<'_>) -> Result<Value, AbilityError> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAbility").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> AbilityHandler for FnAbility<F>
where
    F: Fn(&AbilityCall<'_>) -> Result<Value, AbilityError> + Send + Sync,
{
    async fn invoke(&self, call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        (self.func)(&call)
    }
}
