//! Odometry motion model for the particle filter.
//!
//! Propagates a particle by the reported odometry delta, rotated into the
//! particle's own map-frame heading basis, with additive Gaussian noise
//! proportional to the commanded motion. Unlike the classic
//! rot-trans-rot decomposition, noise is drawn independently per Cartesian
//! axis, which matches holonomic odometry sources and keeps the update a
//! single rotation plus three draws.

use rekha_map::Point2D;

use crate::core::math::{angle_diff, normalize_angle};
use crate::core::sampling::Sampler;
use crate::core::types::Pose2D;

/// Noise constants for the motion model.
///
/// Standard deviations grow linearly with motion:
/// - translation: `σ_t = k1·‖Δtrans‖ + k2·|Δθ|`
/// - rotation:    `σ_r = k3·‖Δtrans‖ + k4·|Δθ|`
#[derive(Debug, Clone, Copy)]
pub struct MotionModelConfig {
    /// Translation error per unit translation (m/m).
    pub k1: f32,
    /// Translation error per unit rotation (m/rad).
    pub k2: f32,
    /// Angular error per unit translation (rad/m).
    pub k3: f32,
    /// Angular error per unit rotation (rad/rad).
    pub k4: f32,
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self {
            k1: 0.50,
            k2: 0.25,
            k3: 0.50,
            k4: 0.75,
        }
    }
}

impl MotionModelConfig {
    /// Noise-free configuration, useful for deterministic tests.
    pub fn noiseless() -> Self {
        Self {
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            k4: 0.0,
        }
    }
}

/// Odometry motion model.
#[derive(Debug, Clone)]
pub struct MotionModel {
    config: MotionModelConfig,
}

impl MotionModel {
    /// Create a new motion model.
    pub fn new(config: MotionModelConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MotionModelConfig {
        &self.config
    }

    /// Propagate a particle by an odometry delta.
    ///
    /// `odom_delta` is the translation reported in the odometry frame and
    /// `dtheta` the heading change. The translation is rotated by the
    /// offset between the particle's heading and the previous odometry
    /// heading, so each particle interprets the same odometry through its
    /// own hypothesis of the map-to-odom alignment.
    pub fn propagate(
        &self,
        pose: &Pose2D,
        odom_delta: Point2D,
        dtheta: f32,
        prev_odom_angle: f32,
        sampler: &mut Sampler,
    ) -> Pose2D {
        let heading_offset = angle_diff(prev_odom_angle, pose.theta);
        let map_delta = odom_delta.rotated(heading_offset);

        let trans = odom_delta.length();
        let sigma_trans = self.config.k1 * trans + self.config.k2 * dtheta.abs();
        let sigma_rot = self.config.k3 * trans + self.config.k4 * dtheta.abs();

        let noise_x = sampler.gaussian(0.0, sigma_trans);
        let noise_y = sampler.gaussian(0.0, sigma_trans);
        let noise_theta = sampler.gaussian(0.0, sigma_rot);

        Pose2D::new(
            pose.x + map_delta.x + noise_x,
            pose.y + map_delta.y + noise_y,
            normalize_angle(pose.theta + dtheta + noise_theta),
        )
    }
}
