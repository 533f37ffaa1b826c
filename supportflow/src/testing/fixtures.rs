//! Request and workflow fixtures.

use crate::state::InboundRequest;
use crate::workflow::{AbilitySpec, Stage, WorkflowDefinition};

/// Path of the workflow file shipped in `config/`.
pub const SHIPPED_WORKFLOW_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../config/stages.yaml");

/// The reference support workflow as a YAML document.
pub const SUPPORT_WORKFLOW_YAML: &str = r"name: customer-support
version: 1
stages:
  - name: intake
    mode: deterministic
    abilities:
      - { name: accept_payload, server: COMMON }
  - name: understand
    mode: deterministic
    abilities:
      - { name: parse_request_text, server: COMMON }
      - { name: extract_entities, server: ATLAS }
  - name: clarify
    mode: conditional
    condition: missing_entities
    abilities:
      - { name: ask_clarifying_question, server: ATLAS }
      - { name: store_customer_answer, server: COMMON }
  - name: retrieve
    mode: deterministic
    abilities:
      - { name: knowledge_base_search, server: ATLAS }
  - name: decide
    mode: non_deterministic
    abilities:
      - { name: solution_evaluation, server: COMMON }
      - { name: escalation_decision, server: ATLAS }
      - { name: update_payload, server: COMMON }
  - name: update
    mode: deterministic
    abilities:
      - { name: update_ticket, server: ATLAS }
  - name: respond
    mode: deterministic
    abilities:
      - { name: generate_customer_response, server: COMMON }
      - { name: trigger_notifications, server: ATLAS }
  - name: complete
    mode: deterministic
    abilities:
      - { name: output_payload, server: COMMON }
";

/// Alice's delayed-order request, ticket `TKT-5678`.
#[must_use]
pub fn sample_request() -> InboundRequest {
    InboundRequest::new("Alice", "alice@example.com", "My order #123 hasn't arrived")
        .with_priority("High")
        .with_ticket_id("TKT-5678")
}

/// The reference support workflow, equal to [`SUPPORT_WORKFLOW_YAML`].
#[must_use]
pub fn support_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new("customer-support")
        .with_version(1)
        .with_stage(
            Stage::deterministic("intake").with_ability(AbilitySpec::common("accept_payload")),
        )
        .with_stage(
            Stage::deterministic("understand")
                .with_ability(AbilitySpec::common("parse_request_text"))
                .with_ability(AbilitySpec::atlas("extract_entities")),
        )
        .with_stage(
            Stage::conditional("clarify", "missing_entities")
                .with_ability(AbilitySpec::atlas("ask_clarifying_question"))
                .with_ability(AbilitySpec::common("store_customer_answer")),
        )
        .with_stage(
            Stage::deterministic("retrieve")
                .with_ability(AbilitySpec::atlas("knowledge_base_search")),
        )
        .with_stage(
            Stage::non_deterministic("decide")
                .with_ability(AbilitySpec::common("solution_evaluation"))
                .with_ability(AbilitySpec::atlas("escalation_decision"))
                .with_ability(AbilitySpec::common("update_payload")),
        )
        .with_stage(
            Stage::deterministic("update").with_ability(AbilitySpec::atlas("update_ticket")),
        )
        .with_stage(
            Stage::deterministic("respond")
                .with_ability(AbilitySpec::common("generate_customer_response"))
                .with_ability(AbilitySpec::atlas("trigger_notifications")),
        )
        .with_stage(
            Stage::deterministic("complete").with_ability(AbilitySpec::common("output_payload")),
        )
}
