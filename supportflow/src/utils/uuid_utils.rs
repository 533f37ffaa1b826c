//! Run and ticket identifiers.

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a ticket identifier of the form `TKT-XXXXXXXX`.
#[must_use]
pub fn generate_ticket_id() -> String {
    let simple = generate_uuid().simple().to_string();
    format!("TKT-{}", simple[..8].to_uppercase())
}
