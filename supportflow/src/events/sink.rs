//! Event sink trait and implementations.

use crate::state::{TraceEvent, TraceEventKind};
use async_trait::async_trait;
use tracing::{debug, info, Level};

/// Trait for sinks that observe trace events as they are recorded.
///
/// Every event appended to a run's trace log is mirrored to the sink. Sinks
/// must not fail; errors are logged and suppressed.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Receives an event.
    async fn emit(&self, event: &TraceEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: &TraceEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &TraceEvent) {
        let stage = event.stage().unwrap_or("-");
        let ability = event.ability().unwrap_or("-");
        if self.level == Level::DEBUG {
            debug!(
                event = %event.kind,
                stage = %stage,
                ability = %ability,
                payload = ?event.payload,
                "Trace: {}", event.kind
            );
        } else {
            info!(
                event = %event.kind,
                stage = %stage,
                ability = %ability,
                "Trace: {}", event.kind
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &TraceEvent) {
        self.log_event(event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<TraceEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events of a given kind.
    #[must_use]
    pub fn events_of_kind(&self, kind: TraceEventKind) -> Vec<TraceEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: &TraceEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(&TraceEvent::new(TraceEventKind::RunStarted)).await;
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit(&TraceEvent::stage_start("intake", "deterministic")).await;
        LoggingEventSink::debug()
            .emit(&TraceEvent::ability_start("intake", "accept_payload", "COMMON"))
            .await;
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&TraceEvent::stage_start("a", "deterministic")).await;
        sink.emit(&TraceEvent::stage_end("a", "deterministic", 0)).await;

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[0].kind, TraceEventKind::StageStart);
        assert_eq!(sink.events_of_kind(TraceEventKind::StageEnd).len(), 1);
    }

    #[tokio::test]
    async fn test_collecting_sink_clear() {
        let sink = CollectingEventSink::new();
        sink.emit(&TraceEvent::new(TraceEventKind::RunCompleted)).await;
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
