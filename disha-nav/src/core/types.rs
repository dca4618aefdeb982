//! Core value types shared by the localization and navigation layers.

use rekha_map::Point2D;
use serde::{Deserialize, Serialize};

use super::math::normalize_angle;

/// Robot pose in the map frame.
///
/// Position (x, y) in meters and heading theta in radians, normalized
/// to [-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters.
    pub x: f32,
    /// Y position in meters.
    pub y: f32,
    /// Heading in radians, normalized to [-π, π].
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized.
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose at the origin.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Position as a point.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Compose two poses: apply `other` in this pose's frame.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Inverse transform: `self.compose(&self.inverse())` is the identity.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Transform a point from this pose's local frame to the map frame.
    #[inline]
    pub fn transform_point(&self, point: Point2D) -> Point2D {
        Point2D::new(self.x, self.y) + point.rotated(self.theta)
    }

    /// Transform a map-frame point into this pose's local frame.
    #[inline]
    pub fn inverse_transform_point(&self, point: Point2D) -> Point2D {
        (point - self.position()).rotated(-self.theta)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// A single laser sweep.
///
/// `ranges[0]` corresponds to `angle_min`, the last entry to `angle_max`,
/// with uniform angular spacing in between. Angles are in the sensor frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LaserScan {
    /// Measured ranges in meters.
    pub ranges: Vec<f32>,
    /// Minimum usable range.
    pub range_min: f32,
    /// Maximum usable range.
    pub range_max: f32,
    /// Angle of the first ray, radians.
    pub angle_min: f32,
    /// Angle of the last ray, radians.
    pub angle_max: f32,
}

impl LaserScan {
    /// Create a new scan.
    pub fn new(
        ranges: Vec<f32>,
        range_min: f32,
        range_max: f32,
        angle_min: f32,
        angle_max: f32,
    ) -> Self {
        Self {
            ranges,
            range_min,
            range_max,
            angle_min,
            angle_max,
        }
    }

    /// Angle of ray `i` in the sensor frame.
    #[inline]
    pub fn angle_of(&self, i: usize) -> f32 {
        if self.ranges.len() < 2 {
            return self.angle_min;
        }
        let step = (self.angle_max - self.angle_min) / (self.ranges.len() - 1) as f32;
        self.angle_min + step * i as f32
    }

    /// True when a measured range falls inside the usable band.
    ///
    /// Readings at the sensor limits are discounted: anything above
    /// 0.95·range_max or below 1.05·range_min is treated as invalid.
    #[inline]
    pub fn is_range_usable(&self, range: f32) -> bool {
        range <= 0.95 * self.range_max && range >= 1.05 * self.range_min
    }
}

/// Velocity command handed to the drive: forward speed plus turn rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Longitudinal speed in m/s.
    pub linear: f32,
    /// Angular rate in rad/s, CCW positive.
    pub angular: f32,
}

impl VelocityCommand {
    /// Create a new command.
    #[inline]
    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }

    /// Zero command (hold position).
    #[inline]
    pub fn stop() -> Self {
        Self {
            linear: 0.0,
            angular: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_pose_new_normalizes_theta() {
        let p = Pose2D::new(0.0, 0.0, 3.0 * std::f32::consts::PI);
        assert_relative_eq!(p.theta, std::f32::consts::PI, epsilon = 1e-6);
    }

    #[test]
    fn test_pose_compose_inverse_identity() {
        let p = Pose2D::new(1.5, -2.0, 0.8);
        let result = p.compose(&p.inverse());

        assert_relative_eq!(result.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(result.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(result.theta, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_transform_point_roundtrip() {
        let pose = Pose2D::new(1.0, 2.0, 0.7);
        let point = Point2D::new(3.0, -1.0);

        let mapped = pose.transform_point(point);
        let back = pose.inverse_transform_point(mapped);

        assert_relative_eq!(back.x, point.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, point.y, epsilon = 1e-5);
    }

    #[test]
    fn test_transform_point_rotation() {
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let mapped = pose.transform_point(Point2D::new(1.0, 0.0));

        assert_relative_eq!(mapped.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(mapped.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scan_angle_of() {
        let scan = LaserScan::new(vec![1.0; 5], 0.1, 10.0, -1.0, 1.0);
        assert_relative_eq!(scan.angle_of(0), -1.0);
        assert_relative_eq!(scan.angle_of(2), 0.0);
        assert_relative_eq!(scan.angle_of(4), 1.0);
    }

    #[test]
    fn test_scan_usable_band() {
        let scan = LaserScan::new(vec![], 0.1, 10.0, -1.0, 1.0);
        assert!(scan.is_range_usable(5.0));
        assert!(!scan.is_range_usable(9.9));
        assert!(!scan.is_range_usable(0.1));
    }
}
