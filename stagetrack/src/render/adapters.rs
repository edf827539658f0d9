//! Adapter trait and built-in adapters.

use super::render_diagram;
use crate::graph::GraphSnapshot;
use parking_lot::Mutex;
use std::io::Write;
use tracing::{info, warn};

/// Receives a snapshot after every applied mutation batch.
pub trait VisualAdapter: Send + Sync {
    /// Presents the snapshot.
    fn render(&self, snapshot: &GraphSnapshot);
}

/// Writes one text diagram line per snapshot.
pub struct TextDiagramAdapter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TextDiagramAdapter {
    /// Creates an adapter writing to `out`.
    #[must_use]
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Creates an adapter writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl VisualAdapter for TextDiagramAdapter {
    fn render(&self, snapshot: &GraphSnapshot) {
        let line = render_diagram(snapshot);
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %e, "Failed to write pipeline diagram");
        }
    }
}

impl std::fmt::Debug for TextDiagramAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDiagramAdapter").finish_non_exhaustive()
    }
}

/// Logs each snapshot through tracing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAdapter;

impl VisualAdapter for LoggingAdapter {
    fn render(&self, snapshot: &GraphSnapshot) {
        info!(
            graph = %snapshot.name,
            revision = snapshot.revision,
            active_stages = ?snapshot.active_stages(),
            active_transitions = ?snapshot.active_transitions(),
            "{}",
            render_diagram(snapshot)
        );
    }
}

/// Keeps every snapshot it is shown, for tests and replay.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    frames: Mutex<Vec<GraphSnapshot>>,
}

impl RecordingAdapter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded snapshots in order.
    #[must_use]
    pub fn frames(&self) -> Vec<GraphSnapshot> {
        self.frames.lock().clone()
    }

    /// Returns the most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<GraphSnapshot> {
        self.frames.lock().last().cloned()
    }

    /// Returns the number of recorded snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

impl VisualAdapter for RecordingAdapter {
    fn render(&self, snapshot: &GraphSnapshot) {
        self.frames.lock().push(snapshot.clone());
    }
}
