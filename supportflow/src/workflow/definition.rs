//! Workflow, stage and ability descriptors.

use super::{Backend, StageMode};
use crate::conditions::Condition;
use crate::errors::WorkflowLoadError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

fn default_workflow_name() -> String {
    "workflow".to_string()
}

/// An ordered, immutable list of stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// The workflow name.
    #[serde(default = "default_workflow_name")]
    pub name: String,
    /// Optional document version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Stages in execution order.
    pub stages: Vec<Stage>,
}

impl WorkflowDefinition {
    /// Creates an empty workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            stages: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Finds a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Checks the structural invariants of the workflow.
    ///
    /// # Errors
    ///
    /// Returns an error on empty or duplicate stage names, empty ability
    /// names, or a conditional stage without a condition.
    pub fn validate(&self) -> Result<(), WorkflowLoadError> {
        let mut seen = HashSet::new();

        for stage in &self.stages {
            stage.validate()?;
            if !seen.insert(stage.name.as_str()) {
                return Err(WorkflowLoadError::invalid_stages(
                    format!("duplicate stage name '{}'", stage.name),
                    vec![stage.name.clone()],
                ));
            }
        }

        Ok(())
    }
}

/// A named unit of workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique stage name.
    pub name: String,
    /// Execution policy. Required; unrecognized strings load as
    /// [`StageMode::Unknown`].
    pub mode: StageMode,
    /// Gate for conditional stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Abilities in declaration order. Required, but may be empty.
    pub abilities: Vec<AbilitySpec>,
}

impl Stage {
    /// Creates a stage with the given mode and no abilities.
    #[must_use]
    pub fn new(name: impl Into<String>, mode: StageMode) -> Self {
        Self {
            name: name.into(),
            mode,
            condition: None,
            abilities: Vec::new(),
        }
    }

    /// Creates a deterministic stage.
    #[must_use]
    pub fn deterministic(name: impl Into<String>) -> Self {
        Self::new(name, StageMode::Deterministic)
    }

    /// Creates a conditional stage gated on `condition`.
    #[must_use]
    pub fn conditional(name: impl Into<String>, condition: impl Into<String>) -> Self {
        let mut stage = Self::new(name, StageMode::Conditional);
        stage.condition = Some(condition.into());
        stage
    }

    /// Creates a non-deterministic stage.
    #[must_use]
    pub fn non_deterministic(name: impl Into<String>) -> Self {
        Self::new(name, StageMode::NonDeterministic)
    }

    /// Appends an ability.
    #[must_use]
    pub fn with_ability(mut self, ability: AbilitySpec) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Returns the parsed condition. Stages without one are unconditional.
    #[must_use]
    pub fn parsed_condition(&self) -> Condition {
        self.condition
            .as_deref()
            .map_or(Condition::Always, Condition::parse)
    }

    /// Returns the first ability with the given name.
    #[must_use]
    pub fn find_ability(&self, name: &str) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|a| a.name == name)
    }

    fn validate(&self) -> Result<(), WorkflowLoadError> {
        if self.name.trim().is_empty() {
            return Err(WorkflowLoadError::invalid("stage name must not be empty"));
        }

        if self.mode == StageMode::Conditional && self.condition.is_none() {
            return Err(WorkflowLoadError::invalid_stages(
                format!("conditional stage '{}' has no condition", self.name),
                vec![self.name.clone()],
            ));
        }

        if self.mode != StageMode::Conditional && self.condition.is_some() {
            warn!(
                stage = %self.name,
                mode = %self.mode,
                "Ignoring condition on non-conditional stage"
            );
        }

        if let Some(index) = self.abilities.iter().position(|a| a.name.trim().is_empty()) {
            return Err(WorkflowLoadError::invalid_stages(
                format!("stage '{}' ability #{index} has an empty name", self.name),
                vec![self.name.clone()],
            ));
        }

        Ok(())
    }
}

/// A single ability invocation bound to a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySpec {
    /// The ability name used for registry lookup.
    pub name: String,
    /// The backend namespace.
    #[serde(rename = "server", alias = "backend")]
    pub backend: Backend,
    /// Handler parameters.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl AbilitySpec {
    /// Creates an ability bound to `backend`.
    #[must_use]
    pub fn new(name: impl Into<String>, backend: Backend) -> Self {
        Self {
            name: name.into(),
            backend,
            params: Map::new(),
        }
    }

    /// Creates a COMMON ability.
    #[must_use]
    pub fn common(name: impl Into<String>) -> Self {
        Self::new(name, Backend::Common)
    }

    /// Creates an ATLAS ability.
    #[must_use]
    pub fn atlas(name: impl Into<String>) -> Self {
        Self::new(name, Backend::Atlas)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}
