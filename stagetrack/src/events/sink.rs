//! Event sink trait and implementations.

use crate::core::TrackerEvent;
use async_trait::async_trait;
use tracing::{debug, info, warn, Level};

/// Trait for event sinks that can receive tracker events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: TrackerEvent);

    /// Emits an event without blocking.
    ///
    /// This method must never panic. Errors are logged but suppressed.
    fn try_emit(&self, event: TrackerEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: TrackerEvent) {}

    fn try_emit(&self, _event: TrackerEvent) {}
}

/// Logs every event through tracing, tagged with its run id.
///
/// `run.failed` is always logged at warn level.
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

    fn log_event(&self, event: &TrackerEvent) {
        let run_id = event
            .data
            .get("run_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("-");
        let data = event.data_value();
        if event.event_type == TrackerEvent::RUN_FAILED {
            warn!(event = %event.event_type, run_id, data = %data, "Tracker event");
        } else if self.level == Level::DEBUG || self.level == Level::TRACE {
            debug!(event = %event.event_type, run_id, data = %data, "Tracker event");
        } else {
            info!(event = %event.event_type, run_id, data = %data, "Tracker event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: TrackerEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: TrackerEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<TrackerEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
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

    /// Returns events whose type matches exactly.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<TrackerEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: TrackerEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: TrackerEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(TrackerEvent::new("test")).await;
        sink.try_emit(TrackerEvent::new("test"));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit(TrackerEvent::run_started("r", "g", 4)).await;
        LoggingEventSink::debug().try_emit(TrackerEvent::trigger_ignored("done"));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(TrackerEvent::new("event1")).await;
        sink.try_emit(TrackerEvent::new("event2"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["event1", "event2"]);
    }

    #[tokio::test]
    async fn test_collecting_sink_filter_and_clear() {
        let sink = CollectingEventSink::new();
        sink.try_emit(TrackerEvent::step_applied("r", 0, 0, 1));
        sink.try_emit(TrackerEvent::step_applied("r", 1, 1000, 2));
        sink.try_emit(TrackerEvent::run_completed("r", 3000.0));

        assert_eq!(sink.events_of_type(TrackerEvent::STEP_APPLIED).len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }
}
