//! # Supportflow
//!
//! A stage orchestration engine for customer-support workflows.
//!
//! A request is routed through an ordered list of named stages. Each stage
//! invokes abilities against one of two backends (`COMMON`, `ATLAS`), and
//! every result is merged into a single shared state that ends with a
//! response and a ticket disposition. Supportflow provides:
//!
//! - **Declarative workflows**: stages and abilities loaded from YAML or JSON
//! - **Stage modes**: deterministic, conditional and non-deterministic policies
//! - **Ability routing**: typed registry with simulated fallbacks and timeouts
//! - **Auditable traces**: every transition recorded in the state's `logs`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use supportflow::prelude::*;
//!
//! let agent = PipelineAgent::with_builtins(
//!     load_workflow(Path::new("config/stages.yaml"))?,
//!     Arc::new(InMemoryKnowledgeBase::sample()),
//!     SupportflowConfig::default(),
//! );
//!
//! let state = agent
//!     .run(InboundRequest::new("Alice", "alice@example.com", "My order #123 hasn't arrived"))
//!     .await?;
//! println!("{}", state.to_json());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod abilities;
pub mod agent;
pub mod conditions;
pub mod config;
pub mod errors;
pub mod events;
pub mod executor;
pub mod knowledge;
pub mod observability;
pub mod state;
pub mod testing;
pub mod utils;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::abilities::{
        register_defaults, AbilityCall, AbilityHandler, AbilityRegistry, AbilityRegistryBuilder,
        AbilityRouter, FnAbility,
    };
    pub use crate::agent::PipelineAgent;
    pub use crate::conditions::Condition;
    pub use crate::config::SupportflowConfig;
    pub use crate::errors::{
        AbilityError, KnowledgeBaseError, SupportflowError, ValidationError, WorkflowLoadError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::executor::StageExecutor;
    pub use crate::knowledge::{InMemoryKnowledgeBase, KbHit, KnowledgeBase};
    pub use crate::state::{
        Disposition, InboundRequest, SharedState, TraceEvent, TraceEventKind, TraceLog,
    };
    pub use crate::workflow::{
        load_workflow, AbilitySpec, Backend, Stage, StageMode, WorkflowDefinition,
    };
}
