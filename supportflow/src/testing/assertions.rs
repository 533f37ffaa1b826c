//! Assertions over a run's trace log.

use crate::state::{SharedState, TraceEventKind};

/// Asserts that `run_started` is the first event and `run_completed` the last.
pub fn assert_run_bookends(state: &SharedState) {
    let kinds = state.logs().kinds();
    assert_eq!(
        kinds.first(),
        Some(&TraceEventKind::RunStarted),
        "Expected run_started first, got {kinds:?}"
    );
    assert_eq!(
        kinds.last(),
        Some(&TraceEventKind::RunCompleted),
        "Expected run_completed last, got {kinds:?}"
    );
}

/// Asserts one `stage_start`/`stage_end` pair per stage, in the given order.
pub fn assert_stage_order(state: &SharedState, expected: &[&str]) {
    let starts: Vec<&str> = state
        .logs()
        .of_kind(TraceEventKind::StageStart)
        .into_iter()
        .filter_map(|e| e.stage())
        .collect();
    let ends: Vec<&str> = state
        .logs()
        .of_kind(TraceEventKind::StageEnd)
        .into_iter()
        .filter_map(|e| e.stage())
        .collect();

    assert_eq!(starts, expected, "Unexpected stage_start order");
    assert_eq!(ends, expected, "Unexpected stage_end order");
}

/// Asserts that an ability was dispatched in a stage.
pub fn assert_ability_run(state: &SharedState, stage: &str, ability: &str) {
    let dispatched = state.logs().dispatched_abilities();
    assert!(
        dispatched.iter().any(|(s, a)| s == stage && a == ability),
        "Expected '{ability}' to run in stage '{stage}'. Dispatched: {dispatched:?}"
    );
}

/// Asserts that an ability was not dispatched in a stage.
pub fn assert_ability_not_run(state: &SharedState, stage: &str, ability: &str) {
    let dispatched = state.logs().dispatched_abilities();
    assert!(
        !dispatched.iter().any(|(s, a)| s == stage && a == ability),
        "Expected '{ability}' not to run in stage '{stage}'. Dispatched: {dispatched:?}"
    );
}

/// Asserts the `outcome` recorded on an ability's `ability_end` event.
pub fn assert_ability_outcome(state: &SharedState, stage: &str, ability: &str, outcome: &str) {
    let event = state
        .logs()
        .iter()
        .find(|e| {
            e.kind == TraceEventKind::AbilityEnd
                && e.stage() == Some(stage)
                && e.ability() == Some(ability)
        })
        .unwrap_or_else(|| panic!("No ability_end for '{ability}' in stage '{stage}'"));

    assert_eq!(
        event.get("outcome").and_then(|v| v.as_str()),
        Some(outcome),
        "Unexpected outcome for '{ability}' in stage '{stage}'"
    );
}

/// Asserts that a stage was recorded as skipped.
pub fn assert_stage_skipped(state: &SharedState, stage: &str) {
    let end = state
        .logs()
        .iter()
        .find(|e| e.kind == TraceEventKind::StageEnd && e.stage() == Some(stage))
        .unwrap_or_else(|| panic!("No stage_end for stage '{stage}'"));

    assert_eq!(
        end.get("skipped").and_then(serde_json::Value::as_bool),
        Some(true),
        "Expected stage '{stage}' to be skipped"
    );
}
