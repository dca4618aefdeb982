//! Foundation layer: value types, angular math, seeded randomness.

pub mod math;
pub mod sampling;
pub mod types;

pub use sampling::Sampler;
pub use types::{LaserScan, Pose2D, VelocityCommand};
