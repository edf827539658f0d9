//! The simulation driver.
//!
//! This module provides:
//! - Timelines of fixed step offsets
//! - Step planning: the mutation batch each step applies
//! - The run state machine and the driver that executes it on tokio timers

mod driver;
mod plan;
mod state;
mod timeline;

pub use driver::SimulationDriver;
pub use plan::{plan_steps, schedule_run, ScheduledStep, StepKey};
pub use state::{RunId, RunState, TriggerEvent, TriggerOutcome};
pub use timeline::Timeline;
