//! Immutable ability registry and its builder.

use super::AbilityHandler;
use crate::workflow::Backend;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builder collecting handler registrations before the registry is frozen.
#[derive(Default)]
pub struct AbilityRegistryBuilder {
    handlers: HashMap<(Backend, String), Arc<dyn AbilityHandler>>,
}

impl AbilityRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `name` on one backend.
    ///
    /// A later registration for the same `(backend, name)` replaces the earlier one.
    #[must_use]
    pub fn register(
        self,
        backend: Backend,
        name: impl Into<String>,
        handler: impl AbilityHandler + 'static,
    ) -> Self {
        self.register_arc(backend, name, Arc::new(handler))
    }

    /// Registers an already shared handler.
    #[must_use]
    pub fn register_arc(
        mut self,
        backend: Backend,
        name: impl Into<String>,
        handler: Arc<dyn AbilityHandler>,
    ) -> Self {
        self.handlers.insert((backend, name.into()), handler);
        self
    }

    /// Registers one handler under `name` on every backend.
    #[must_use]
    pub fn register_everywhere(
        self,
        name: impl Into<String>,
        handler: impl AbilityHandler + 'static,
    ) -> Self {
        let name = name.into();
        let handler: Arc<dyn AbilityHandler> = Arc::new(handler);
        Backend::ALL.iter().fold(self, |builder, backend| {
            builder.register_arc(*backend, name.clone(), Arc::clone(&handler))
        })
    }

    /// Returns the number of registrations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> AbilityRegistry {
        AbilityRegistry {
            handlers: self.handlers,
        }
    }
}

impl fmt::Debug for AbilityRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityRegistryBuilder")
            .field("registrations", &self.handlers.len())
            .finish()
    }
}

/// Read-only map from `(backend, ability name)` to handler.
#[derive(Default)]
pub struct AbilityRegistry {
    handlers: HashMap<(Backend, String), Arc<dyn AbilityHandler>>,
}

impl AbilityRegistry {
    /// Starts a new builder.
    #[must_use]
    pub fn builder() -> AbilityRegistryBuilder {
        AbilityRegistryBuilder::new()
    }

    /// Creates a registry with no handlers; every ability is simulated.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks up the handler for an ability.
    #[must_use]
    pub fn resolve(&self, backend: Backend, name: &str) -> Option<Arc<dyn AbilityHandler>> {
        self.handlers.get(&(backend, name.to_string())).cloned()
    }

    /// Checks whether a handler is registered.
    #[must_use]
    pub fn contains(&self, backend: Backend, name: &str) -> bool {
        self.handlers.contains_key(&(backend, name.to_string()))
    }

    /// Lists the ability names registered on a backend, sorted.
    #[must_use]
    pub fn names(&self, backend: Backend) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .keys()
            .filter(|(b, _)| *b == backend)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Returns the total number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for AbilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityRegistry")
            .field("common", &self.names(Backend::Common))
            .field("atlas", &self.names(Backend::Atlas))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{AbilityCall, FnAbility};
    use crate::errors::AbilityError;
    use serde_json::{json, Value};

    fn constant(
        value: Value,
    ) -> FnAbility<impl Fn(&AbilityCall<'_>) -> Result<Value, AbilityError> + Send + Sync> {
        FnAbility::new(move |_call: &AbilityCall<'_>| Ok(value.clone()))
    }

    #[test]
    fn test_register_is_per_backend() {
        let registry = AbilityRegistry::builder()
            .register(Backend::Common, "accept_payload", constant(json!({})))
            .build();

        assert!(registry.contains(Backend::Common, "accept_payload"));
        assert!(!registry.contains(Backend::Atlas, "accept_payload"));
        assert!(registry.resolve(Backend::Atlas, "accept_payload").is_none());
    }

    #[test]
    fn test_register_everywhere() {
        let registry = AbilityRegistry::builder()
            .register_everywhere("faq_query", constant(json!({})))
            .register(Backend::Atlas, "enrich_records", constant(json!({})))
            .build();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(Backend::Common), vec!["faq_query"]);
        assert_eq!(registry.names(Backend::Atlas), vec!["enrich_records", "faq_query"]);
    }

    #[test]
    fn test_later_registration_replaces() {
        let builder = AbilityRegistryBuilder::new()
            .register(Backend::Common, "x", constant(json!(1)))
            .register(Backend::Common, "x", constant(json!(2)));

        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_empty_registry() {
        let registry = AbilityRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.names(Backend::Common).is_empty());
    }
}
