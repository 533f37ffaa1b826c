//! Utility functions for identifiers and timestamps.

pub mod timestamps;
mod uuid_utils;

pub use timestamps::iso_timestamp;
pub use uuid_utils::{generate_ticket_id, generate_uuid};
