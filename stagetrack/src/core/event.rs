//! Tracker event records emitted over the lifetime of a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event emitted by the simulation driver.
///
/// Events are consumed by event sinks for logging or analytics; they never
/// feed back into the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerEvent {
    /// The event type (e.g., "run.started", "run.step_applied").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl TrackerEvent {
    /// Event type for a run that has accepted its trigger.
    pub const RUN_STARTED: &'static str = "run.started";
    /// Event type for a step batch that has been applied to the graph.
    pub const STEP_APPLIED: &'static str = "run.step_applied";
    /// Event type for a run that reached its final step.
    pub const RUN_COMPLETED: &'static str = "run.completed";
    /// Event type for a run torn down before completion.
    pub const RUN_CANCELLED: &'static str = "run.cancelled";
    /// Event type for a run aborted by an unresolvable mutation.
    pub const RUN_FAILED: &'static str = "run.failed";
    /// Event type for a trigger that arrived while a run was not idle.
    pub const TRIGGER_IGNORED: &'static str = "run.trigger_ignored";

    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the payload as a JSON object.
    #[must_use]
    pub fn data_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.data.clone().into_iter().collect())
    }

    /// Creates a "run.started" event.
    #[must_use]
    pub fn run_started(run_id: &str, graph: &str, steps: usize) -> Self {
        Self::new(Self::RUN_STARTED)
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("graph", serde_json::json!(graph))
            .add_data("steps", serde_json::json!(steps))
    }

    /// Creates a "run.step_applied" event.
    #[must_use]
    pub fn step_applied(run_id: &str, index: usize, offset_ms: u64, revision: u64) -> Self {
        Self::new(Self::STEP_APPLIED)
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("step", serde_json::json!(index))
            .add_data("offset_ms", serde_json::json!(offset_ms))
            .add_data("revision", serde_json::json!(revision))
    }

    /// Creates a "run.completed" event.
    #[must_use]
    pub fn run_completed(run_id: &str, duration_ms: f64) -> Self {
        Self::new(Self::RUN_COMPLETED)
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }

    /// Creates a "run.cancelled" event.
    #[must_use]
    pub fn run_cancelled(run_id: &str, reason: &str, dropped_steps: usize) -> Self {
        Self::new(Self::RUN_CANCELLED)
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("reason", serde_json::json!(reason))
            .add_data("dropped_steps", serde_json::json!(dropped_steps))
    }

    /// Creates a "run.failed" event.
    #[must_use]
    pub fn run_failed(run_id: &str, error: &str) -> Self {
        Self::new(Self::RUN_FAILED)
            .add_data("run_id", serde_json::json!(run_id))
            .add_data("error", serde_json::json!(error))
    }

    /// Creates a "run.trigger_ignored" event.
    #[must_use]
    pub fn trigger_ignored(state: &str) -> Self {
        Self::new(Self::TRIGGER_IGNORED).add_data("state", serde_json::json!(state))
    }
}
