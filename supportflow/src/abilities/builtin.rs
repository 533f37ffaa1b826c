//! Built-in customer-support abilities.
//!
//! Every built-in is registered on both backends by [`register_defaults`].
//! Handlers read the shared state through [`AbilityCall`] and return an
//! object whose keys are merged into the state by the executor.

use super::{AbilityCall, AbilityHandler, AbilityRegistryBuilder, FnAbility};
use crate::config::SupportflowConfig;
use crate::errors::AbilityError;
use crate::knowledge::KnowledgeBase;
use crate::state::Disposition;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

/// Names of every built-in ability.
pub const BUILTIN_ABILITIES: [&str; 14] = [
    "accept_payload",
    "parse_request_text",
    "extract_entities",
    "ask_clarifying_question",
    "store_customer_answer",
    "knowledge_base_search",
    "faq_query",
    "solution_evaluation",
    "escalation_decision",
    "update_payload",
    "update_ticket",
    "trigger_notifications",
    "generate_customer_response",
    "output_payload",
];

const IDENTITY_FIELDS: [&str; 5] = ["customer_name", "email", "query", "priority", "ticket_id"];

/// Confidence reported when at least one entity was found.
pub const ENTITY_CONFIDENCE: f64 = 0.9;

/// Confidence reported when no entity was found.
pub const NO_ENTITY_CONFIDENCE: f64 = 0.5;

static ORDER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\border\b[^0-9]{0,12}?#?\s*(\d+)").expect("order id pattern is valid")
});

/// Registers every built-in on both backends.
#[must_use]
pub fn register_defaults(
    builder: AbilityRegistryBuilder,
    knowledge_base: Arc<dyn KnowledgeBase>,
    config: &SupportflowConfig,
) -> AbilityRegistryBuilder {
    let search = KnowledgeBaseSearch::new(knowledge_base, config.kb_top_k);

    builder
        .register_everywhere("accept_payload", FnAbility::new(accept_payload))
        .register_everywhere("parse_request_text", FnAbility::new(parse_request_text))
        .register_everywhere("extract_entities", FnAbility::new(extract_entities))
        .register_everywhere("ask_clarifying_question", FnAbility::new(ask_clarifying_question))
        .register_everywhere("store_customer_answer", FnAbility::new(store_customer_answer))
        .register_everywhere("knowledge_base_search", search.clone())
        .register_everywhere("faq_query", search)
        .register_everywhere("solution_evaluation", FnAbility::new(solution_evaluation))
        .register_everywhere("escalation_decision", FnAbility::new(escalation_decision))
        .register_everywhere("update_payload", FnAbility::new(update_status))
        .register_everywhere("update_ticket", FnAbility::new(update_status))
        .register_everywhere("trigger_notifications", FnAbility::new(trigger_notifications))
        .register_everywhere(
            "generate_customer_response",
            FnAbility::new(generate_customer_response),
        )
        .register_everywhere("output_payload", FnAbility::new(output_payload))
}

/// Records intake and lists identity fields that are absent or blank.
pub fn accept_payload(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let missing: Vec<&str> = IDENTITY_FIELDS
        .into_iter()
        .filter(|field| {
            call.state
                .get_str(field)
                .map_or(true, |value| value.trim().is_empty())
        })
        .collect();

    if !missing.is_empty() {
        warn!(missing = ?missing, "Payload accepted with missing fields");
    }

    Ok(json!({
        "intake_status": "accepted",
        "missing_fields": missing,
    }))
}

/// Splits the query into whitespace tokens.
pub fn parse_request_text(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let query = call.state.query().unwrap_or_default();
    let tokens: Vec<&str> = query.split_whitespace().collect();

    Ok(json!({
        "parsed_query": tokens,
        "raw_query": query,
    }))
}

/// Extracts intent, issue, product and order id from the query by keyword.
pub fn extract_entities(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let query = call.state.query().unwrap_or_default();
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut entities = Map::new();
    if lowered.contains("refund") {
        entities.insert("intent".to_string(), json!("refund_request"));
    }
    if ["delay", "arrived", "delivery", "shipping"]
        .iter()
        .any(|kw| lowered.contains(kw))
        || words.contains(&"late")
    {
        entities.insert("issue".to_string(), json!("delivery_delay"));
    }
    if lowered.contains("invoice") {
        entities.insert("product".to_string(), json!("invoice_service"));
    }
    if let Some(order_id) = ORDER_ID.captures(query).and_then(|c| c.get(1)) {
        entities.insert("order_id".to_string(), json!(order_id.as_str()));
    }

    let found = !entities.is_empty();
    let confidence = if found {
        ENTITY_CONFIDENCE
    } else {
        NO_ENTITY_CONFIDENCE
    };
    Ok(json!({
        "entities": entities,
        "confidence": confidence,
        "missing_entities": !found,
    }))
}

/// Produces a follow-up question for the customer.
pub fn ask_clarifying_question(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let question = if call.state.get_bool("missing_entities").unwrap_or(false) {
        "Could you please provide more details about the issue?"
    } else {
        "Can you clarify your request further?"
    };
    Ok(json!({ "clarification_question": question }))
}

/// Stores the customer's answer from `params.answer`, falling back to `customer_answer`.
pub fn store_customer_answer(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let answer = match call.str_param("answer")? {
        Some(answer) => json!(answer),
        None => call.state.get("customer_answer").unwrap_or(Value::Null),
    };
    Ok(json!({ "clarification_answer": answer }))
}

/// Scores the retrieved solution and decides whether it resolves the request.
pub fn solution_evaluation(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let hits = call.state.get_f64("kb_hits").unwrap_or(0.0).max(0.0);
    let confidence = call.state.get_f64("confidence");

    let mut score = if hits < 1.0 {
        40.0
    } else {
        (70.0 + 10.0 * hits.floor()).min(100.0)
    };
    if confidence.is_some_and(|c| c < 0.6) {
        score -= 10.0;
    }

    let decision = if hits >= 1.0 { "resolve" } else { "escalate" };
    Ok(json!({
        "solution_score": score,
        "decision": decision,
    }))
}

/// Decides whether a human has to take over.
pub fn escalation_decision(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let resolved = call.state.get_str("decision").as_deref() == Some("resolve");
    let reason = if resolved {
        "Solution found in knowledge base"
    } else {
        "No knowledge base results or low confidence"
    };
    Ok(json!({
        "escalation": !resolved,
        "reason": reason,
    }))
}

/// Derives the ticket disposition from `escalation` and `decision`.
#[must_use]
pub fn disposition_for(escalation: bool, decision: Option<&str>) -> Disposition {
    if escalation {
        Disposition::Escalated
    } else if decision == Some("resolve") {
        Disposition::Resolved
    } else {
        Disposition::InProgress
    }
}

fn update_status(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let escalation = call.state.get_bool("escalation").unwrap_or(false);
    let decision = call.state.get_str("decision");
    let status = disposition_for(escalation, decision.as_deref());
    Ok(json!({ "status": status.as_str() }))
}

/// Simulates notifying stakeholders about the ticket state.
pub fn trigger_notifications(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let ticket_id = call.state.ticket_id().unwrap_or("unknown");
    let status = call
        .state
        .get_str("status")
        .unwrap_or_else(|| "unknown".to_string());
    let message = format!("Notification sent: Ticket {ticket_id} is {status}.");
    info!(ticket_id = %ticket_id, status = %status, "{message}");
    Ok(json!({ "notification": message }))
}

/// Writes the customer-facing response.
pub fn generate_customer_response(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let name = call.state.customer_name().unwrap_or("there");
    let resolved = call.state.get_str("decision").as_deref() == Some("resolve");
    let top_answer = call
        .state
        .get("kb_results")
        .and_then(|results| results.get(0)?.get("answer")?.as_str().map(String::from));

    let response = match (resolved, top_answer) {
        (true, Some(answer)) => format!("Hi {name}, {answer}"),
        (true, None) => {
            format!("Hi {name}, we have resolved your issue. Thank you for your patience.")
        }
        (false, _) => format!(
            "Hi {name}, your issue has been escalated to our support team. We will get back to you shortly."
        ),
    };
    Ok(json!({ "response": response }))
}

/// Collects the final structured output.
pub fn output_payload(call: &AbilityCall<'_>) -> Result<Value, AbilityError> {
    let state = call.state;
    Ok(json!({
        "output": {
            "ticket_id": state.ticket_id(),
            "status": state.get("status"),
            "response": state.response(),
            "escalation": state.get_bool("escalation").unwrap_or(false),
            "reason": state.get_str("reason").unwrap_or_default(),
        }
    }))
}

/// Searches the knowledge base with the current query.
#[derive(Clone)]
pub struct KnowledgeBaseSearch {
    knowledge_base: Arc<dyn KnowledgeBase>,
    default_top_k: usize,
}

impl KnowledgeBaseSearch {
    /// Creates a search handler.
    #[must_use]
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>, default_top_k: usize) -> Self {
        Self {
            knowledge_base,
            default_top_k,
        }
    }
}

impl fmt::Debug for KnowledgeBaseSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBaseSearch")
            .field("default_top_k", &self.default_top_k)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AbilityHandler for KnowledgeBaseSearch {
    async fn invoke(&self, call: AbilityCall<'_>) -> Result<Value, AbilityError> {
        let top_k = call
            .u64_param("top_k")?
            .map_or(self.default_top_k, |k| usize::try_from(k).unwrap_or(usize::MAX));
        let query = call.state.query().unwrap_or_default();

        let hits = self
            .knowledge_base
            .search(query, top_k)
            .await
            .map_err(|err| AbilityError::failed(call.ability, err.to_string()))?;

        Ok(json!({
            "kb_hits": hits.len(),
            "kb_results": hits,
        }))
    }
}
