//! Event sink system for run observability.
//!
//! The simulation driver reports its lifecycle through an [`EventSink`].
//! Sinks are write-only from the driver's point of view; nothing they do can
//! influence a run.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
