//! The pipeline agent: validates a request and drives it through every stage.


use crate::abilities::{register_defaults, AbilityRegistry, AbilityRouter};
use crate::config::SupportflowConfig;
use crate::errors::{ValidationError, WorkflowLoadError};
use crate::events::EventSink;
use crate::executor::StageExecutor;
use crate::knowledge::KnowledgeBase;
use crate::state::{InboundRequest, SharedState, TraceEvent, TraceEventKind};
use crate::workflow::{load_workflow, WorkflowDefinition};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};

/// Runs support requests through a workflow.
///
/// The workflow and registry are immutable and shared, so one agent can
/// serve concurrent runs; each run owns its own [`SharedState`].
#[derive(Debug, Clone)]
pub struct PipelineAgent {
    workflow: Arc<WorkflowDefinition>,
    executor: StageExecutor,
    config: SupportflowConfig,
}

impl PipelineAgent {
    /// Creates an agent over an already loaded workflow.
    ///
    /// An unusable ability timeout in `config` falls back to the default
    /// rather than failing; call [`SupportflowConfig::validate`] to reject it.
    #[must_use]
    pub fn new(
        workflow: WorkflowDefinition,
        registry: Arc<AbilityRegistry>,
        config: SupportflowConfig,
    ) -> Self {
        let router = AbilityRouter::new(registry).with_timeout(config.ability_timeout());
        let executor = StageExecutor::new(router).with_summary_cap(config.trace_summary_cap);
        Self {
            workflow: Arc::new(workflow),
            executor,
            config,
        }
    }

    /// Loads the workflow at `path` and creates an agent over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is missing, malformed or invalid.
    pub fn from_path(
        path: &Path,
        registry: Arc<AbilityRegistry>,
        config: SupportflowConfig,
    ) -> Result<Self, WorkflowLoadError> {
        let workflow = load_workflow(path)?;
        Ok(Self::new(workflow, registry, config))
    }

    /// Creates an agent whose registry holds every built-in ability.
    #[must_use]
    pub fn with_builtins(
        workflow: WorkflowDefinition,
        knowledge_base: Arc<dyn KnowledgeBase>,
        config: SupportflowConfig,
    ) -> Self {
        let registry =
            register_defaults(AbilityRegistry::builder(), knowledge_base, &config).build();
        Self::new(workflow, Arc::new(registry), config)
    }

    /// Mirrors every trace event to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.executor = self.executor.with_event_sink(sink);
        self
    }

    /// Returns the workflow.
    #[must_use]
    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SupportflowConfig {
        &self.config
    }

    /// Runs a request through every stage and returns the final state.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] before any stage runs if a required
    /// field is missing or blank.
    pub async fn run(&self, request: InboundRequest) -> Result<SharedState, ValidationError> {
        let request = request.validate(&self.config.default_priority)?;
        let run_id = crate::utils::generate_uuid().to_string();
        let span = tracing::info_span!(
            "pipeline_run",
            run_id = %run_id,
            ticket_id = %request.ticket_id,
            workflow = %self.workflow.name,
        );

        let state = SharedState::seeded(request);
        Ok(self.drive(run_id, state).instrument(span).await)
    }

    /// Runs a raw JSON payload, validating its shape first.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the payload is not an object, has
    /// wrongly typed fields, or misses required fields.
    pub async fn run_json(&self, payload: Value) -> Result<SharedState, ValidationError> {
        let request = InboundRequest::from_json(payload)?;
        self.run(request).await
    }

    async fn drive(&self, run_id: String, mut state: SharedState) -> SharedState {
        let started = Instant::now();
        let ticket_id = state.ticket_id().unwrap_or_default().to_string();

        info!(stages = self.workflow.stage_count(), "Run started");
        let mut started_event = TraceEvent::new(TraceEventKind::RunStarted)
            .add_data("run_id", json!(run_id))
            .add_data("workflow", json!(self.workflow.name))
            .add_data("ticket_id", json!(ticket_id))
            .add_data("stage_count", json!(self.workflow.stage_count()));
        if let Some(version) = self.workflow.version {
            started_event = started_event.add_data("version", json!(version));
        }
        self.executor.record(&mut state, started_event).await;

        let mut abilities_run = 0;
        for stage in &self.workflow.stages {
            abilities_run += self.executor.run_stage(stage, &mut state).await;
        }

        let completed = TraceEvent::new(TraceEventKind::RunCompleted)
            .add_data("run_id", json!(run_id))
            .add_data("keys", json!(state.keys()));
        self.executor.record(&mut state, completed).await;

        info!(
            abilities_run,
            status = state.status().map_or("none", |s| s.as_str()),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Run completed"
        );

        state
    }
}
