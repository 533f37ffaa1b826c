//! Declarative workflow definitions.
//!
//! This module provides:
//! - Stage mode and backend enums
//! - Workflow, stage and ability descriptors
//! - YAML / JSON loading with structural validation

mod definition;
mod loader;
mod mode;

pub use definition::{AbilitySpec, Stage, WorkflowDefinition};
pub use loader::{load_workflow, parse_workflow_json, parse_workflow_yaml};
pub use mode::{Backend, StageMode};
