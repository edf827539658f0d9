//! The stage graph model.
//!
//! This module provides:
//! - Stage and transition entities with a narrow mutation API
//! - A validating builder that chains stages linearly
//! - Read-only snapshots, a lock-guarded shared handle and its read-only view
//! - The reference document-processing pipeline

mod builder;
mod model;
mod reference;
mod snapshot;

pub use builder::{StageDefinition, StageGraphBuilder};
pub use model::{Mutation, Stage, StageGraph, StageId, StageLabels, Transition, TransitionId};
pub use reference::{reference_definitions, reference_pipeline, REFERENCE_PIPELINE_NAME};
pub use snapshot::{GraphReader, GraphSnapshot, SharedStageGraph};
