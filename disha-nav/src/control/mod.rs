//! Control-side plumbing: latency compensation for issued commands.

pub mod latency_compensator;

pub use latency_compensator::{CommandRecord, LatencyCompensator, LatencyCompensatorConfig};
