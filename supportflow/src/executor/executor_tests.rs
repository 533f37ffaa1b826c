//! Stage policy tests for the executor.

#[cfg(test)]
mod tests {
    use crate::abilities::{AbilityRegistry, AbilityRouter};
    use crate::events::CollectingEventSink;
    use crate::executor::StageExecutor;
    use crate::state::{SharedState, TraceEventKind};
    use crate::testing::{FailingAbility, RecordingAbility, StaticAbility};
    use crate::workflow::{AbilitySpec, Backend, Stage, StageMode};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn executor(registry: AbilityRegistry) -> StageExecutor {
        StageExecutor::new(AbilityRouter::new(Arc::new(registry)))
    }

    fn dispatched(state: &SharedState) -> Vec<String> {
        state
            .logs()
            .dispatched_abilities()
            .into_iter()
            .map(|(_, ability)| ability)
            .collect()
    }

    #[tokio::test]
    async fn test_deterministic_runs_all_in_order() {
        let executor = executor(AbilityRegistry::empty());
        let stage = Stage::deterministic("understand")
            .with_ability(AbilitySpec::common("parse_request_text"))
            .with_ability(AbilitySpec::atlas("extract_entities"));
        let mut state = SharedState::new();

        let run = executor.run_stage(&stage, &mut state).await;

        assert_eq!(run, 2);
        assert_eq!(dispatched(&state), vec!["parse_request_text", "extract_entities"]);
        assert_eq!(
            state.logs().kinds(),
            vec![
                TraceEventKind::StageStart,
                TraceEventKind::AbilityStart,
                TraceEventKind::AbilityEnd,
                TraceEventKind::AbilityStart,
                TraceEventKind::AbilityEnd,
                TraceEventKind::StageEnd,
            ]
        );
        assert_eq!(
            state.get_str("parse_request_text_status").as_deref(),
            Some("simulated_common_done")
        );
        assert_eq!(
            state.get_str("extract_entities_status").as_deref(),
            Some("simulated_atlas_done")
        );
    }

    #[tokio::test]
    async fn test_conditional_false_runs_nothing() {
        let executor = executor(AbilityRegistry::empty());
        let stage = Stage::conditional("clarify", "missing_entities")
            .with_ability(AbilitySpec::atlas("ask_clarifying_question"));
        let mut state = SharedState::new();
        state.set("entities", json!({"intent": "refund_request"}));

        let run = executor.run_stage(&stage, &mut state).await;

        assert_eq!(run, 0);
        assert!(dispatched(&state).is_empty());
        let end = state.logs().last().unwrap();
        assert_eq!(end.kind, TraceEventKind::StageEnd);
        assert_eq!(end.get("skipped"), Some(&json!(true)));
        assert_eq!(end.get("condition"), Some(&json!("missing_entities")));
        assert_eq!(end.get("abilities_run"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_conditional_true_runs_all() {
        let executor = executor(AbilityRegistry::empty());
        let stage = Stage::conditional("clarify", "missing_entities")
            .with_ability(AbilitySpec::atlas("ask_clarifying_question"))
            .with_ability(AbilitySpec::common("store_customer_answer"));
        let mut state = SharedState::new();

        let run = executor.run_stage(&stage, &mut state).await;

        assert_eq!(run, 2);
        assert_eq!(state.logs().last().unwrap().get("skipped"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_conditional_empty_condition_always_runs() {
        let executor = executor(AbilityRegistry::empty());
        let stage = Stage::conditional("gate", "").with_ability(AbilitySpec::common("x"));
        let mut state = SharedState::new();

        assert_eq!(executor.run_stage(&stage, &mut state).await, 1);
    }

    #[tokio::test]
    async fn test_conditional_unrecognized_condition_skips() {
        let executor = executor(AbilityRegistry::empty());
        let stage =
            Stage::conditional("gate", "customer_is_vip").with_ability(AbilitySpec::common("x"));
        let mut state = SharedState::new();

        assert_eq!(executor.run_stage(&stage, &mut state).await, 0);
    }

    fn decide_stage() -> Stage {
        Stage::non_deterministic("decide")
            .with_ability(AbilitySpec::common("log_decision"))
            .with_ability(AbilitySpec::atlas("escalation_decision"))
            .with_ability(AbilitySpec::common("update_payload"))
            .with_ability(AbilitySpec::common("solution_evaluation"))
    }

    #[tokio::test]
    async fn test_non_deterministic_high_score_skips_escalation() {
        let registry = AbilityRegistry::builder()
            .register(
                Backend::Common,
                "solution_evaluation",
                StaticAbility::new(json!({"solution_score": 95, "decision": "resolve"})),
            )
            .build();
        let executor = executor(registry);
        let mut state = SharedState::new();

        let run = executor.run_stage(&decide_stage(), &mut state).await;

        assert_eq!(run, 2);
        assert_eq!(dispatched(&state), vec!["solution_evaluation", "update_payload"]);
        assert_eq!(state.solution_score(), Some(95.0));
    }

    #[tokio::test]
    async fn test_non_deterministic_low_score_escalates() {
        let registry = AbilityRegistry::builder()
            .register(
                Backend::Common,
                "solution_evaluation",
                StaticAbility::new(json!({"solution_score": 89.5})),
            )
            .build();
        let executor = executor(registry);
        let mut state = SharedState::new();

        let run = executor.run_stage(&decide_stage(), &mut state).await;

        assert_eq!(run, 3);
        assert_eq!(
            dispatched(&state),
            vec!["solution_evaluation", "escalation_decision", "update_payload"]
        );
    }

    #[tokio::test]
    async fn test_non_deterministic_missing_score_defaults_to_zero() {
        let executor = executor(AbilityRegistry::empty());
        let stage = Stage::non_deterministic("decide")
            .with_ability(AbilitySpec::atlas("escalation_decision"));
        let mut state = SharedState::new();

        assert_eq!(executor.run_stage(&stage, &mut state).await, 1);
        assert_eq!(dispatched(&state), vec!["escalation_decision"]);
    }

    #[tokio::test]
    async fn test_non_deterministic_without_known_slots_runs_nothing() {
        let executor = executor(AbilityRegistry::empty());
        let stage =
            Stage::non_deterministic("decide").with_ability(AbilitySpec::common("log_decision"));
        let mut state = SharedState::new();

        assert_eq!(executor.run_stage(&stage, &mut state).await, 0);
        assert_eq!(state.logs().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_mode_is_skipped() {
        let executor = executor(AbilityRegistry::empty());
        let stage =
            Stage::new("later", StageMode::from("parallel")).with_ability(AbilitySpec::common("x"));
        let mut state = SharedState::new();

        assert_eq!(executor.run_stage(&stage, &mut state).await, 0);
        let end = state.logs().last().unwrap();
        assert_eq!(end.get("mode"), Some(&json!("parallel")));
        assert_eq!(end.get("skipped"), Some(&json!(true)));
        assert_eq!(end.get("reason"), Some(&json!("unknown_mode")));
    }

    #[tokio::test]
    async fn test_non_object_result_stored_under_synthesized_key() {
        let registry = AbilityRegistry::builder()
            .register(Backend::Common, "render", StaticAbility::new(json!("Hello Alice")))
            .build();
        let executor = executor(registry);
        let mut state = SharedState::new();

        let result = executor
            .execute_ability("respond", &AbilitySpec::common("render"), &mut state)
            .await;

        assert_eq!(result, json!("Hello Alice"));
        assert_eq!(state.get_str("respond_render").as_deref(), Some("Hello Alice"));
        let end = state.logs().last().unwrap();
        assert_eq!(end.get("result"), Some(&json!({"respond_render": "Hello Alice"})));
        assert_eq!(end.get("outcome"), Some(&json!("ok")));
    }

    #[tokio::test]
    async fn test_empty_result_changes_nothing() {
        let registry = AbilityRegistry::builder()
            .register(Backend::Common, "noop", StaticAbility::empty())
            .build();
        let executor = executor(registry);
        let mut state = SharedState::new();
        state.set("decision", json!("resolve"));
        let before = state.data_map();

        executor
            .execute_ability("s", &AbilitySpec::common("noop"), &mut state)
            .await;

        assert_eq!(state.data_map(), before);
    }

    #[tokio::test]
    async fn test_failed_ability_merges_nothing_and_records_error() {
        let registry = AbilityRegistry::builder()
            .register(Backend::Atlas, "knowledge_base_search", FailingAbility::new("index offline"))
            .build();
        let executor = executor(registry);
        let mut state = SharedState::new();
        state.set("query", json!("hi"));
        let before = state.data_map();

        let result = executor
            .execute_ability("retrieve", &AbilitySpec::atlas("knowledge_base_search"), &mut state)
            .await;

        assert_eq!(result, json!({}));
        assert_eq!(state.data_map(), before);
        let end = state.logs().last().unwrap();
        assert_eq!(end.get("outcome"), Some(&json!("failed")));
        assert_eq!(end.get("error_kind"), Some(&json!("failed")));
        assert!(end.get("error").and_then(|e| e.as_str()).unwrap().contains("index offline"));
    }

    #[tokio::test]
    async fn test_params_reach_handler() {
        let recorder = Arc::new(RecordingAbility::new());
        let registry = AbilityRegistry::builder()
            .register_arc(Backend::Atlas, "knowledge_base_search", recorder.clone())
            .build();
        let executor = executor(registry);
        let mut state = SharedState::new();

        executor
            .execute_ability(
                "retrieve",
                &AbilitySpec::atlas("knowledge_base_search").with_param("top_k", json!(2)),
                &mut state,
            )
            .await;

        assert_eq!(recorder.calls()[0].params["top_k"], 2);
        assert_eq!(recorder.calls()[0].backend, Backend::Atlas);
    }

    #[tokio::test]
    async fn test_summary_cap_applies() {
        let registry = AbilityRegistry::builder()
            .register(Backend::Common, "wide", StaticAbility::new(json!({"a": 1, "b": 2, "c": 3})))
            .build();
        let executor = executor(registry).with_summary_cap(1);
        let mut state = SharedState::new();

        executor
            .execute_ability("s", &AbilitySpec::common("wide"), &mut state)
            .await;

        let result = state.logs().last().unwrap().get("result").unwrap().clone();
        assert_eq!(result["truncated_keys"], 2);
        assert_eq!(state.get("c"), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_events_mirrored_to_sink() {
        let sink = Arc::new(CollectingEventSink::new());
        let executor = executor(AbilityRegistry::empty()).with_event_sink(sink.clone());
        let stage =
            Stage::deterministic("intake").with_ability(AbilitySpec::common("accept_payload"));
        let mut state = SharedState::new();

        executor.run_stage(&stage, &mut state).await;

        assert_eq!(sink.len(), state.logs().len());
        assert_eq!(sink.events(), state.logs().events().to_vec());
    }
}
