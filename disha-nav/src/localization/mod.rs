//! Monte Carlo localization against the prior vector map.
//!
//! - [`MotionModel`]: odometry-driven particle propagation with
//!   motion-proportional Gaussian noise
//! - [`SensorModel`]: ray-cast laser likelihood with short/long clamping
//! - [`ParticleFilter`]: the filter itself (gating, reweighting,
//!   low-variance resampling, pose estimate)

pub mod motion_model;
pub mod particle_filter;
pub mod sensor_model;

pub use motion_model::{MotionModel, MotionModelConfig};
pub use particle_filter::{Particle, ParticleFilter, ParticleFilterConfig};
pub use sensor_model::{PredictedRay, SensorModel, SensorModelConfig};
