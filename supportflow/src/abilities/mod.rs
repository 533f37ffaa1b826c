//! Ability handlers, the backend-keyed registry and the dispatch router.
//!
//! An ability is looked up by `(backend, name)`. When nothing is registered
//! the router produces a simulated result instead of failing, so workflows
//! can reference abilities that have no implementation yet.

pub mod builtin;
mod handler;
mod registry;
mod router;

#[cfg(test)]
mod router_tests;

pub use builtin::{register_defaults, KnowledgeBaseSearch, BUILTIN_ABILITIES};
pub use handler::{AbilityCall, AbilityHandler, FnAbility};
pub use registry::{AbilityRegistry, AbilityRegistryBuilder};
pub use router::{
    simulated_result, AbilityRouter, Dispatch, DispatchOrigin, DEFAULT_ABILITY_TIMEOUT,
};
