//! Laser observation model against the vector map.
//!
//! For each particle the model ray-casts a subsampled fan of virtual laser
//! rays into the map and scores the measured ranges against the predicted
//! ones with a clamped quadratic log-likelihood. Clamping at `d_short` /
//! `d_long` bounds the penalty of unexpected obstacles (people, unmapped
//! furniture) and of missed returns.

use rekha_map::{LineSegment2D, MapHit, Point2D, VectorMap};

use crate::core::types::{LaserScan, Pose2D};

/// Configuration for the laser observation model.
#[derive(Debug, Clone, Copy)]
pub struct SensorModelConfig {
    /// Clamp for measurements shorter than predicted (meters).
    pub d_short: f32,

    /// Clamp for measurements longer than predicted (meters).
    pub d_long: f32,

    /// Observation variance σ²_obs (m²).
    pub var_obs: f32,

    /// One virtual ray is cast per this many measured ranges.
    pub num_rays_divisor: usize,

    /// Forward offset of the laser from the base link (meters).
    pub laser_offset: f32,
}

impl Default for SensorModelConfig {
    fn default() -> Self {
        Self {
            d_short: 0.5,
            d_long: 0.5,
            var_obs: 1.0,
            num_rays_divisor: 10,
            laser_offset: 0.2,
        }
    }
}

/// One ray of the predicted scan.
#[derive(Debug, Clone, Copy)]
pub struct PredictedRay {
    /// Absolute ray angle in the map frame.
    pub angle: f32,
    /// Nearest map intersection, if any within the usable range band.
    /// The hit distance is measured from the laser origin.
    pub hit: Option<MapHit>,
}

/// Ray-casting observation model.
#[derive(Debug, Clone)]
pub struct SensorModel {
    config: SensorModelConfig,
}

impl SensorModel {
    /// Create a new sensor model.
    pub fn new(config: SensorModelConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SensorModelConfig {
        &self.config
    }

    /// Laser origin for a given base-link pose: the pose shifted forward
    /// along its heading by the mounting offset.
    #[inline]
    pub fn laser_origin(&self, pose: &Pose2D) -> Point2D {
        pose.position() + Point2D::new(pose.theta.cos(), pose.theta.sin()) * self.config.laser_offset
    }

    /// Predict the scan a laser at `pose` would return in `map`.
    ///
    /// Casts `num_ranges / num_rays_divisor` rays uniformly spaced across
    /// `[angle_min, angle_max)`. Each ray is a segment from `range_min` to
    /// `range_max` along its direction, so returns closer than `range_min`
    /// are ignored, and the reported hit distance is relative to the laser
    /// origin.
    pub fn predicted_scan(
        &self,
        map: &VectorMap,
        pose: &Pose2D,
        num_ranges: usize,
        range_min: f32,
        range_max: f32,
        angle_min: f32,
        angle_max: f32,
    ) -> Vec<PredictedRay> {
        let num_rays = (num_ranges / self.config.num_rays_divisor).max(1);
        let origin = self.laser_origin(pose);

        let mut rays = Vec::with_capacity(num_rays);
        for i in 0..num_rays {
            let angle =
                pose.theta + angle_min + (i as f32 / num_rays as f32) * (angle_max - angle_min);
            let dir = Point2D::new(angle.cos(), angle.sin());
            let ray = LineSegment2D::new(origin + dir * range_min, origin + dir * range_max);

            let hit = map.first_hit(&ray).map(|h| MapHit {
                point: h.point,
                distance: h.point.distance(&origin),
            });
            rays.push(PredictedRay { angle, hit });
        }
        rays
    }

    /// Log-likelihood of `scan` observed from `pose`.
    ///
    /// Measured ranges are subsampled in lockstep with the predicted rays.
    /// A ray contributes nothing when either range is outside the usable
    /// band; otherwise the range error is clamped to `[-d_short, d_long]`
    /// and scored as `-d²/σ²_obs`.
    pub fn log_likelihood(&self, map: &VectorMap, pose: &Pose2D, scan: &LaserScan) -> f64 {
        if scan.ranges.is_empty() {
            return 0.0;
        }

        let predicted = self.predicted_scan(
            map,
            pose,
            scan.ranges.len(),
            scan.range_min,
            scan.range_max,
            scan.angle_min,
            scan.angle_max,
        );
        let stride = scan.ranges.len() / predicted.len();

        let mut log_sum = 0.0f64;
        for (i, ray) in predicted.iter().enumerate() {
            let measured = scan.ranges[stride * i];

            let predicted_range = match &ray.hit {
                Some(hit) => hit.distance,
                None => continue,
            };
            if predicted_range > scan.range_max
                || predicted_range < scan.range_min
                || !scan.is_range_usable(measured)
            {
                continue;
            }

            let diff = (measured - predicted_range).clamp(-self.config.d_short, self.config.d_long);
            log_sum += -f64::from(diff * diff) / f64::from(self.config.var_obs);
        }
        log_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> VectorMap {
        VectorMap::from_lines(vec![
            LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0),
            LineSegment2D::from_coords(1.0, 0.0, 1.0, 1.0),
            LineSegment2D::from_coords(1.0, 1.0, 0.0, 1.0),
            LineSegment2D::from_coords(0.0, 1.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn test_laser_origin_forward_offset() {
        let model = SensorModel::new(SensorModelConfig::default());
        let origin = model.laser_origin(&Pose2D::new(0.5, 0.5, 0.0));

        assert_relative_eq!(origin.x, 0.7, epsilon = 1e-6);
        assert_relative_eq!(origin.y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_predicted_ray_in_unit_square() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();

        // One ray straight ahead from the center of the square.
        let rays = model.predicted_scan(
            &map,
            &Pose2D::new(0.5, 0.5, 0.0),
            10,
            0.02,
            10.0,
            0.0,
            0.1,
        );

        assert_eq!(rays.len(), 1);
        let hit = rays[0].hit.expect("ray should hit the east wall");
        assert_relative_eq!(hit.point.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(hit.point.y, 0.5, epsilon = 1e-5);
        assert_relative_eq!(hit.distance, 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_predicted_scan_subsampling() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();

        let rays = model.predicted_scan(
            &map,
            &Pose2D::new(0.5, 0.5, 0.0),
            100,
            0.02,
            10.0,
            -1.0,
            1.0,
        );
        assert_eq!(rays.len(), 10);
    }

    #[test]
    fn test_predicted_scan_miss_outside_map() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();

        // Facing away from the square, far outside it.
        let rays = model.predicted_scan(
            &map,
            &Pose2D::new(5.0, 5.0, 0.0),
            10,
            0.02,
            2.0,
            0.0,
            0.1,
        );
        assert!(rays[0].hit.is_none());
    }

    #[test]
    fn test_log_likelihood_prefers_true_pose() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();

        // Scan consistent with standing in the center facing east.
        let scan = LaserScan::new(vec![0.3; 10], 0.02, 10.0, 0.0, 0.1);

        let at_center = model.log_likelihood(&map, &Pose2D::new(0.5, 0.5, 0.0), &scan);
        let shifted = model.log_likelihood(&map, &Pose2D::new(0.2, 0.5, 0.0), &scan);

        assert!(
            at_center > shifted,
            "true pose {} should beat shifted {}",
            at_center,
            shifted
        );
    }

    #[test]
    fn test_log_likelihood_clamps_outliers() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();

        // Wildly long reading, still inside the usable band.
        let scan = LaserScan::new(vec![5.0; 10], 0.02, 10.0, 0.0, 0.1);
        let log_w = model.log_likelihood(&map, &Pose2D::new(0.5, 0.5, 0.0), &scan);

        // Clamped at d_long = 0.5 -> -0.25 / var_obs.
        assert_relative_eq!(log_w as f32, -0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_log_likelihood_skips_limit_readings() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();

        // Readings at the sensor maximum are discounted entirely.
        let scan = LaserScan::new(vec![10.0; 10], 0.02, 10.0, 0.0, 0.1);
        let log_w = model.log_likelihood(&map, &Pose2D::new(0.5, 0.5, 0.0), &scan);

        assert_eq!(log_w, 0.0);
    }

    #[test]
    fn test_log_likelihood_empty_scan() {
        let model = SensorModel::new(SensorModelConfig::default());
        let map = unit_square();
        let scan = LaserScan::new(vec![], 0.02, 10.0, 0.0, 0.1);

        assert_eq!(model.log_likelihood(&map, &Pose2D::identity(), &scan), 0.0);
    }
}
