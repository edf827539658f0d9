//! Observability utilities.

mod spans;
mod subscriber;

pub use spans::RunSpanAttributes;
pub use subscriber::{init_tracing, LogFormat, ENV_LOG};
