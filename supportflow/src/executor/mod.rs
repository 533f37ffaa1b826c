//! Stage execution policies.
//!
//! The executor drives one stage at a time against a run's shared state:
//! - `deterministic` stages run every ability in order
//! - `conditional` stages run every ability only when their condition holds
//! - `non_deterministic` stages run a fixed evaluate/escalate/update policy
//!
//! Stages with an unrecognized mode are skipped with a warning.

mod summary;

#[cfg(test)]
mod executor_tests;

pub use summary::{summarize_result, synthesized_key, DEFAULT_SUMMARY_CAP};

use crate::abilities::AbilityRouter;
use crate::events::{EventSink, NoOpEventSink};
use crate::state::{SharedState, TraceEvent};
use crate::workflow::{AbilitySpec, Stage, StageMode};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ability run first in a non-deterministic stage.
pub const EVALUATION_ABILITY: &str = "solution_evaluation";

/// Ability run in a non-deterministic stage when the score is below the threshold.
pub const ESCALATION_ABILITY: &str = "escalation_decision";

/// Ability run last in a non-deterministic stage.
pub const UPDATE_ABILITY: &str = "update_payload";

/// Scores at or above this skip escalation in a non-deterministic stage.
pub const ESCALATION_THRESHOLD: f64 = 90.0;

/// Executes stages and abilities, recording trace events as it goes.
#[derive(Clone)]
pub struct StageExecutor {
    router: AbilityRouter,
    sink: Arc<dyn EventSink>,
    summary_cap: usize,
}

impl fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageExecutor")
            .field("router", &self.router)
            .field("summary_cap", &self.summary_cap)
            .finish_non_exhaustive()
    }
}

impl StageExecutor {
    /// Creates an executor with no event sink and the default summary cap.
    #[must_use]
    pub fn new(router: AbilityRouter) -> Self {
        Self {
            router,
            sink: Arc::new(NoOpEventSink),
            summary_cap: DEFAULT_SUMMARY_CAP,
        }
    }

    /// Mirrors every trace event to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets how many result entries an `ability_end` summary keeps.
    #[must_use]
    pub fn with_summary_cap(mut self, cap: usize) -> Self {
        self.summary_cap = cap;
        self
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &AbilityRouter {
        &self.router
    }

    /// Appends an event to the trace log and mirrors it to the sink.
    pub async fn record(&self, state: &mut SharedState, event: TraceEvent) {
        self.sink.emit(&event).await;
        state.record(event);
    }

    /// Runs one stage according to its mode. Returns the number of abilities run.
    pub async fn run_stage(&self, stage: &Stage, state: &mut SharedState) -> usize {
        let mode = stage.mode.as_str().to_string();
        self.record(state, TraceEvent::stage_start(&stage.name, &mode)).await;

        let (abilities_run, extra) = match &stage.mode {
            StageMode::Deterministic => {
                (self.run_all(stage, state).await, json!({"skipped": false}))
            }
            StageMode::Conditional => {
                let condition_text = stage.condition.clone().unwrap_or_default();
                let passed = stage.parsed_condition().evaluate(state);
                debug!(
                    stage = %stage.name,
                    condition = %condition_text,
                    passed,
                    "Condition evaluated"
                );

                let run = if passed {
                    self.run_all(stage, state).await
                } else {
                    0
                };
                (run, json!({"skipped": !passed, "condition": condition_text}))
            }
            StageMode::NonDeterministic => (
                self.run_non_deterministic(stage, state).await,
                json!({"skipped": false}),
            ),
            StageMode::Unknown(raw) => {
                warn!(stage = %stage.name, mode = %raw, "Unknown stage mode, skipping stage");
                (0, json!({"skipped": true, "reason": "unknown_mode"}))
            }
        };

        let mut end = TraceEvent::stage_end(&stage.name, &mode, abilities_run);
        if let Value::Object(fields) = extra {
            for (key, value) in fields {
                end = end.add_data(key, value);
            }
        }
        self.record(state, end).await;

        abilities_run
    }

    async fn run_all(&self, stage: &Stage, state: &mut SharedState) -> usize {
        for ability in &stage.abilities {
            self.execute_ability(&stage.name, ability, state).await;
        }
        stage.abilities.len()
    }

    async fn run_non_deterministic(&self, stage: &Stage, state: &mut SharedState) -> usize {
        let mut run = 0;

        if let Some(ability) = stage.find_ability(EVALUATION_ABILITY) {
            self.execute_ability(&stage.name, ability, state).await;
            run += 1;
        }

        let score = state.get_f64("solution_score").unwrap_or(0.0);
        if score < ESCALATION_THRESHOLD {
            if let Some(ability) = stage.find_ability(ESCALATION_ABILITY) {
                self.execute_ability(&stage.name, ability, state).await;
                run += 1;
            }
        } else {
            debug!(stage = %stage.name, score, "Score meets threshold, not escalating");
        }

        if let Some(ability) = stage.find_ability(UPDATE_ABILITY) {
            self.execute_ability(&stage.name, ability, state).await;
            run += 1;
        }

        run
    }

    /// Dispatches one ability, merges its result and records the trace.
    ///
    /// Object results are merged key by key. Any other value is stored under
    /// `<stage>_<ability>`. Failed dispatches merge nothing. Returns the raw
    /// result.
    pub async fn execute_ability(
        &self,
        stage_name: &str,
        ability: &AbilitySpec,
        state: &mut SharedState,
    ) -> Value {
        let backend = ability.backend.to_string();
        self.record(
            state,
            TraceEvent::ability_start(stage_name, &ability.name, &backend),
        )
        .await;

        let dispatch = self
            .router
            .dispatch(ability.backend, &ability.name, &ability.params, state)
            .await;

        if !dispatch.is_failed() {
            match &dispatch.result {
                Value::Object(fields) => state.merge(fields),
                other => state.set(synthesized_key(stage_name, &ability.name), other.clone()),
            }
        }

        let mut end = TraceEvent::ability_end(
            stage_name,
            &ability.name,
            &backend,
            dispatch.origin.outcome(),
        )
        .add_data(
            "result",
            summarize_result(stage_name, &ability.name, &dispatch.result, self.summary_cap),
        );
        if let Some(err) = dispatch.origin.error() {
            end = end
                .add_data("error", json!(err.to_string()))
                .add_data("error_kind", json!(err.kind()));
        }
        self.record(state, end).await;

        debug!(
            stage = %stage_name,
            ability = %ability.name,
            outcome = dispatch.origin.outcome(),
            "Ability finished"
        );

        dispatch.result
    }
}
