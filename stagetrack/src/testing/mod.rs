//! Testing utilities for stage tracker code.
//!
//! This module provides:
//! - Assertions over graph snapshots
//! - A driver fixture wired to recording observers

mod assertions;
mod fixtures;

pub use assertions::{
    assert_complete, assert_pristine, assert_stage, assert_stage_status, assert_transition_active,
};
pub use fixtures::TestTracker;
