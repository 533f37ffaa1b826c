//! Dispatch tests for the ability router.

#[cfg(test)]
mod tests {
    use crate::abilities::{AbilityRegistry, AbilityRouter, DispatchOrigin};
    use crate::errors::AbilityError;
    use crate::state::SharedState;
    use crate::testing::{
        FailingAbility, PanickingAbility, RecordingAbility, SlowAbility, StaticAbility,
    };
    use crate::workflow::Backend;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};
    use std::sync::Arc;
    use std::time::Duration;

    fn router(registry: AbilityRegistry) -> AbilityRouter {
        AbilityRouter::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_unregistered_common_ability_is_simulated() {
        let router = router(AbilityRegistry::empty());
        let dispatch = router
            .dispatch(Backend::Common, "foo", &Map::new(), &SharedState::new())
            .await;

        assert_eq!(dispatch.origin, DispatchOrigin::Simulated);
        assert_eq!(dispatch.result, json!({"foo_status": "simulated_common_done"}));
    }

    #[tokio::test]
    async fn test_unregistered_atlas_ability_is_simulated() {
        let router = router(AbilityRegistry::empty());
        let dispatch = router
            .dispatch(Backend::Atlas, "enrich_records", &Map::new(), &SharedState::new())
            .await;

        assert_eq!(
            dispatch.result,
            json!({"enrich_records_status": "simulated_atlas_done"})
        );
    }

    #[tokio::test]
    async fn test_registered_on_other_backend_is_simulated() {
        let router = router(
            AbilityRegistry::builder()
                .register(Backend::Common, "lookup", StaticAbility::new(json!({"hit": true})))
                .build(),
        );
        let dispatch = router
            .dispatch(Backend::Atlas, "lookup", &Map::new(), &SharedState::new())
            .await;

        assert_eq!(dispatch.origin, DispatchOrigin::Simulated);
    }

    #[tokio::test]
    async fn test_handler_result_passes_through() {
        let recorder = Arc::new(RecordingAbility::returning(json!({"hit": true})));
        let router = router(
            AbilityRegistry::builder()
                .register_arc(Backend::Atlas, "lookup", recorder.clone())
                .build(),
        );

        let mut params = Map::new();
        params.insert("top_k".to_string(), json!(1));
        let dispatch = router
            .dispatch(Backend::Atlas, "lookup", &params, &SharedState::new())
            .await;

        assert_eq!(dispatch.origin, DispatchOrigin::Handler);
        assert_eq!(dispatch.result, json!({"hit": true}));
        assert_eq!(recorder.call_count(), 1);
        assert_eq!(recorder.calls()[0].params["top_k"], 1);
    }

    #[tokio::test]
    async fn test_handler_error_becomes_failed_dispatch() {
        let router = router(
            AbilityRegistry::builder()
                .register(Backend::Common, "lookup", FailingAbility::new("index offline"))
                .build(),
        );
        let dispatch = router
            .dispatch(Backend::Common, "lookup", &Map::new(), &SharedState::new())
            .await;

        assert!(dispatch.is_failed());
        assert_eq!(dispatch.result, json!({}));
        assert_eq!(
            dispatch.origin.error(),
            Some(&AbilityError::failed("lookup", "index offline"))
        );
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let router = router(
            AbilityRegistry::builder()
                .register(Backend::Common, "boom", PanickingAbility::new("handler exploded"))
                .build(),
        );
        let dispatch = router
            .dispatch(Backend::Common, "boom", &Map::new(), &SharedState::new())
            .await;

        assert_eq!(dispatch.origin.outcome(), "failed");
        assert!(matches!(
            dispatch.origin.error(),
            Some(AbilityError::Panicked { message, .. }) if message == "handler exploded"
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_enforced() {
        let router = router(
            AbilityRegistry::builder()
                .register(Backend::Common, "slow", SlowAbility::with_delay_ms(500))
                .build(),
        )
        .with_timeout(Duration::from_millis(20));

        let dispatch = router
            .dispatch(Backend::Common, "slow", &Map::new(), &SharedState::new())
            .await;

        assert_eq!(
            dispatch.origin.error(),
            Some(&AbilityError::timeout("slow", 20))
        );
    }

    #[tokio::test]
    async fn test_fast_handler_within_timeout() {
        let router = router(
            AbilityRegistry::builder()
                .register(
                    Backend::Common,
                    "quick",
                    SlowAbility::with_delay_ms(1).returning(json!({"done": true})),
                )
                .build(),
        )
        .with_timeout(Duration::from_secs(5));

        let dispatch = router
            .dispatch(Backend::Common, "quick", &Map::new(), &SharedState::new())
            .await;

        assert_eq!(dispatch.origin, DispatchOrigin::Handler);
        assert_eq!(dispatch.result, json!({"done": true}));
    }
}
