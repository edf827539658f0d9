//! # Stagetrack
//!
//! Progress tracking for linear document-processing pipelines.
//!
//! Stagetrack models a pipeline as a chain of stages joined by transitions and
//! animates it through a scripted timeline once a trigger (typically a
//! successful upload) arrives:
//!
//! - **Stage graph model**: validated linear graphs with atomic, all-or-nothing
//!   mutation batches and read-only snapshots
//! - **Simulation driver**: a tokio-timed run state machine that ignores
//!   re-triggers, cancels cleanly and can be reset to a fresh graph
//! - **Visual adapters**: snapshot consumers such as a text diagram renderer
//! - **Upload collaborator**: multipart submission to an extraction service
//!   that starts the run on success
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stagetrack::prelude::*;
//!
//! let driver = SimulationDriver::reference()
//!     .with_adapter(Arc::new(TextDiagramAdapter::stdout()));
//!
//! driver.trigger(TriggerEvent::new("upload").with_reference("invoice.pdf"));
//! let state = driver.wait().await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod graph;
pub mod observability;
pub mod render;
pub mod simulation;
pub mod testing;
pub mod utils;

#[cfg(feature = "upload")]
pub mod upload;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{AppConfig, TrackerConfig, UploadConfig};
    pub use crate::core::{StageRole, StageStatus, TrackerEvent};
    pub use crate::errors::{
        ConfigError, EntityKind, GraphValidationError, TrackerError, UnknownEntityError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::graph::{
        reference_pipeline, GraphReader, GraphSnapshot, Mutation, SharedStageGraph,
        StageDefinition, StageGraph, StageGraphBuilder, StageId, TransitionId,
    };
    pub use crate::render::{LoggingAdapter, TextDiagramAdapter, VisualAdapter};
    pub use crate::simulation::{
        RunId, RunState, SimulationDriver, Timeline, TriggerEvent, TriggerOutcome,
    };
    #[cfg(feature = "upload")]
    pub use crate::upload::{
        ExtractionResult, HttpUploadCollaborator, UploadCollaborator, UploadError, UploadSession,
    };
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
