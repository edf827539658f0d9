//! Cooperative cancellation for scheduled runs.

mod token;

pub use token::{CancelCallback, CancellationToken};
