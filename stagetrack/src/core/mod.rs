//! Core domain model types for the stage tracker.
//!
//! This module contains the fundamental value types shared by the graph
//! model, the simulation driver and the observability layers:
//! - Stage status and role enums
//! - Tracker event records

mod event;
mod status;

pub use event::TrackerEvent;
pub use status::{StageRole, StageStatus};
