//! Driver fixture for tests.

use std::sync::Arc;

use crate::events::CollectingEventSink;
use crate::graph::StageGraph;
use crate::render::RecordingAdapter;
use crate::simulation::{SimulationDriver, Timeline};

/// A driver together with the observers recording what it did.
pub struct TestTracker {
    /// The driver under test.
    pub driver: SimulationDriver,
    /// Every snapshot handed to adapters.
    pub frames: Arc<RecordingAdapter>,
    /// Every lifecycle event emitted.
    pub events: Arc<CollectingEventSink>,
}

impl TestTracker {
    /// Wires the reference pipeline on the reference timeline.
    #[must_use]
    pub fn reference() -> Self {
        Self::wire(SimulationDriver::reference())
    }

    /// Wires `graph` on `timeline`.
    ///
    /// # Panics
    ///
    /// Panics if the timeline does not fit the graph.
    #[must_use]
    pub fn with_graph(graph: StageGraph, timeline: Timeline) -> Self {
        let driver = SimulationDriver::with_timeline(graph, timeline)
            .unwrap_or_else(|e| panic!("Invalid test timeline: {e}"));
        Self::wire(driver)
    }

    fn wire(driver: SimulationDriver) -> Self {
        let frames = Arc::new(RecordingAdapter::new());
        let events = Arc::new(CollectingEventSink::new());
        let driver = driver
            .with_adapter(frames.clone())
            .with_event_sink(events.clone());
        Self {
            driver,
            frames,
            events,
        }
    }
}

impl std::fmt::Debug for TestTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestTracker")
            .field("driver", &self.driver)
            .field("frames", &self.frames.len())
            .field("events", &self.events.len())
            .finish()
    }
}
