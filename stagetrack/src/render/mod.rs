//! Visual adapters that present graph snapshots.
//!
//! Adapters are read-only consumers: the driver hands them a snapshot after
//! every applied step and they never get a way to write back.

mod adapters;
mod diagram;

pub use adapters::{LoggingAdapter, RecordingAdapter, TextDiagramAdapter, VisualAdapter};
pub use diagram::render_diagram;
