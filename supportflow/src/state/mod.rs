//! Per-run shared state.
//!
//! This module provides:
//! - Inbound request parsing and validation
//! - The typed shared state aggregate with its extension map
//! - Trace events and the append-only trace log

mod request;
mod shared;
mod trace;

pub use request::{InboundRequest, ValidatedRequest};
pub use shared::{Disposition, SharedState, LOGS_KEY, RESERVED_KEYS};
pub use trace::{TraceEvent, TraceEventKind, TraceLog};
