//! Ability dispatch with simulation fallback and bounded execution time.

use super::{AbilityCall, AbilityRegistry};
use crate::errors::AbilityError;
use crate::state::SharedState;
use crate::workflow::Backend;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default upper bound on one handler invocation.
pub const DEFAULT_ABILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// How a dispatch produced its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOrigin {
    /// A registered handler returned a value.
    Handler,
    /// No handler was registered; a placeholder was produced.
    Simulated,
    /// The handler failed, panicked or timed out.
    Failed(AbilityError),
}

impl DispatchOrigin {
    /// Returns the trace outcome label.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Handler => "ok",
            Self::Simulated => "simulated",
            Self::Failed(_) => "failed",
        }
    }

    /// Returns the error for failed dispatches.
    #[must_use]
    pub fn error(&self) -> Option<&AbilityError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// The result of dispatching one ability.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// The value to merge into shared state.
    pub result: Value,
    /// Where the value came from.
    pub origin: DispatchOrigin,
}

impl Dispatch {
    fn handled(result: Value) -> Self {
        Self {
            result,
            origin: DispatchOrigin::Handler,
        }
    }

    fn simulated(backend: Backend, name: &str) -> Self {
        Self {
            result: simulated_result(backend, name),
            origin: DispatchOrigin::Simulated,
        }
    }

    fn failed(error: AbilityError) -> Self {
        Self {
            result: Value::Object(Map::new()),
            origin: DispatchOrigin::Failed(error),
        }
    }

    /// Returns true if the dispatch failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.origin, DispatchOrigin::Failed(_))
    }
}

/// The placeholder produced for an ability with no registered handler.
#[must_use]
pub fn simulated_result(backend: Backend, name: &str) -> Value {
    json!({ format!("{name}_status"): format!("simulated_{}_done", backend.tag()) })
}

/// Routes ability invocations to registered handlers.
///
/// Dispatch never fails outward: missing handlers are simulated and handler
/// failures are folded into [`DispatchOrigin::Failed`].
#[derive(Debug, Clone)]
pub struct AbilityRouter {
    registry: Arc<AbilityRegistry>,
    timeout: Duration,
}

impl AbilityRouter {
    /// Creates a router with the default timeout.
    #[must_use]
    pub fn new(registry: Arc<AbilityRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_ABILITY_TIMEOUT,
        }
    }

    /// Sets the per-invocation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<AbilityRegistry> {
        &self.registry
    }

    /// Returns the per-invocation timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Dispatches `name` on `backend`.
    pub async fn dispatch(
        &self,
        backend: Backend,
        name: &str,
        params: &Map<String, Value>,
        state: &SharedState,
    ) -> Dispatch {
        let Some(handler) = self.registry.resolve(backend, name) else {
            debug!(ability = %name, backend = %backend, "No handler registered, simulating");
            return Dispatch::simulated(backend, name);
        };

        let call = AbilityCall::new(backend, name, params, state);
        let invocation = AssertUnwindSafe(handler.invoke(call)).catch_unwind();

        let dispatch = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(Ok(Ok(value))) => Dispatch::handled(value),
            Ok(Ok(Err(err))) => Dispatch::failed(err),
            Ok(Err(payload)) => {
                Dispatch::failed(AbilityError::panicked(name, panic_message(payload.as_ref())))
            }
            Err(_) => Dispatch::failed(AbilityError::timeout(
                name,
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        if let DispatchOrigin::Failed(err) = &dispatch.origin {
            warn!(
                ability = %name,
                backend = %backend,
                kind = err.kind(),
                error = %err,
                "Ability failed"
            );
        }

        dispatch
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
