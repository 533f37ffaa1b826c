//! Inbound support requests and their validation.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An inbound request as received from a caller.
///
/// Every field is optional at this layer so that validation can report all
/// missing fields at once instead of failing on the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    /// Customer display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Customer contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The support query text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Request priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Caller-supplied ticket identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Any other request fields, carried into shared state as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundRequest {
    /// Creates a request with the three required identity fields.
    #[must_use]
    pub fn new(
        customer_name: impl Into<String>,
        email: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            customer_name: Some(customer_name.into()),
            email: Some(email.into()),
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Sets the ticket identifier.
    #[must_use]
    pub fn with_ticket_id(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    /// Adds an extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Parses a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the payload is not an object or a known
    /// field has the wrong type.
    pub fn from_json(payload: Value) -> Result<Self, ValidationError> {
        if !payload.is_object() {
            return Err(ValidationError::invalid("Request payload must be a JSON object"));
        }
        serde_json::from_value(payload)
            .map_err(|err| ValidationError::invalid(format!("Malformed request payload: {err}")))
    }

    /// Checks required fields and fills defaults.
    ///
    /// A blank value counts as missing. `priority` falls back to
    /// `default_priority`; `ticket_id` falls back to a generated identifier.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming every missing required field.
    pub fn validate(self, default_priority: &str) -> Result<ValidatedRequest, ValidationError> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let customer_name = present(self.customer_name);
        let email = present(self.email);
        let query = present(self.query);

        let missing: Vec<String> = [
            ("customer_name", customer_name.is_none()),
            ("email", email.is_none()),
            ("query", query.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name.to_string())
        .collect();

        match (customer_name, email, query) {
            (Some(customer_name), Some(email), Some(query)) => Ok(ValidatedRequest {
                customer_name,
                email,
                query,
                priority: present(self.priority).unwrap_or_else(|| default_priority.to_string()),
                ticket_id: present(self.ticket_id).unwrap_or_else(crate::utils::generate_ticket_id),
                extra: self.extra,
            }),
            _ => Err(ValidationError::missing(missing)),
        }
    }
}

/// A request that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Customer display name.
    pub customer_name: String,
    /// Customer contact address.
    pub email: String,
    /// The support query text.
    pub query: String,
    /// Request priority.
    pub priority: String,
    /// Ticket identifier.
    pub ticket_id: String,
    /// Extra request fields.
    pub extra: Map<String, Value>,
}
