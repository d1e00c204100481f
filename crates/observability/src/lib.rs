//! Tracing and logging setup shared by every binary.

pub mod tracing;

pub use tracing::{LogFormat, init};
