//! Particle-filter localizer against a prior vector map.
//!
//! Fuses wheel odometry (motion model) with laser scans (sensor model) to
//! track the robot pose. Weights are kept in log space and are meaningful
//! only relative to the maximum of their generation; systematic low-variance
//! resampling runs every few sensor updates to concentrate particles on the
//! well-supported hypotheses.

use std::sync::Arc;

use rekha_map::{Point2D, VectorMap};

use crate::core::math::angle_diff;
use crate::core::sampling::Sampler;
use crate::core::types::{LaserScan, Pose2D};

use super::motion_model::{MotionModel, MotionModelConfig};
use super::sensor_model::{SensorModel, SensorModelConfig};

/// A single pose hypothesis with its unnormalized log-likelihood.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    /// Hypothesized robot pose.
    pub pose: Pose2D,
    /// Log-weight; comparable only within one generation.
    pub log_weight: f64,
}

impl Particle {
    /// Create a particle with zero log-weight.
    pub fn new(pose: Pose2D) -> Self {
        Self {
            pose,
            log_weight: 0.0,
        }
    }
}

/// Configuration for the particle filter.
#[derive(Debug, Clone)]
pub struct ParticleFilterConfig {
    /// Number of particles.
    pub num_particles: usize,

    /// Initial position spread (standard deviation, meters).
    pub init_spread_xy: f32,

    /// Initial heading spread (standard deviation, radians).
    pub init_spread_theta: f32,

    /// Resample every this many sensor updates.
    pub resample_interval: u32,

    /// Minimum travel since the last sensor update before the next one
    /// runs (suppresses weight churn while standing still).
    pub min_update_dist: f32,

    /// Maximum plausible travel between sensor updates; larger jumps are
    /// treated as timing errors and skipped.
    pub max_update_dist: f32,

    /// Maximum plausible odometry translation per message; anything larger
    /// is a teleport and re-baselines the filter instead of propagating.
    pub odom_jump_limit: f32,

    /// Motion model noise constants.
    pub motion: MotionModelConfig,

    /// Sensor model parameters.
    pub sensor: SensorModelConfig,

    /// Random seed (0 picks a time-based seed).
    pub seed: u64,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            num_particles: 50,
            init_spread_xy: 0.25,
            init_spread_theta: std::f32::consts::PI / 6.0,
            resample_interval: 5,
            min_update_dist: 0.1,
            max_update_dist: 1.0,
            odom_jump_limit: 1.0,
            motion: MotionModelConfig::default(),
            sensor: SensorModelConfig::default(),
            seed: 0,
        }
    }
}

/// Monte Carlo localizer over a line-segment map.
#[derive(Debug, Clone)]
pub struct ParticleFilter {
    config: ParticleFilterConfig,
    particles: Vec<Particle>,
    map: Option<Arc<VectorMap>>,
    motion_model: MotionModel,
    sensor_model: SensorModel,
    sampler: Sampler,

    prev_odom_loc: Point2D,
    prev_odom_angle: f32,
    odom_initialized: bool,

    last_update_loc: Point2D,
    updates_since_resample: u32,
    max_log_weight: f64,
}

impl ParticleFilter {
    /// Create an empty filter; call [`initialize`](Self::initialize) before
    /// feeding observations.
    pub fn new(config: ParticleFilterConfig) -> Self {
        let seed = if config.seed == 0 {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(12345)
        } else {
            config.seed
        };

        let motion_model = MotionModel::new(config.motion);
        let sensor_model = SensorModel::new(config.sensor);

        Self {
            config,
            particles: Vec::new(),
            map: None,
            motion_model,
            sensor_model,
            sampler: Sampler::new(seed),
            prev_odom_loc: Point2D::zero(),
            prev_odom_angle: 0.0,
            odom_initialized: false,
            last_update_loc: Point2D::zero(),
            updates_since_resample: 0,
            max_log_weight: 0.0,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParticleFilterConfig {
        &self.config
    }

    /// Current particles (for visualization).
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// The shared map, once initialized.
    pub fn map(&self) -> Option<&Arc<VectorMap>> {
        self.map.as_ref()
    }

    /// Whether the filter has been initialized with a pose and a map.
    pub fn is_initialized(&self) -> bool {
        !self.particles.is_empty()
    }

    /// (Re)initialize the filter at a pose estimate on the given map.
    ///
    /// Seeds N particles from Gaussians around `loc` and `angle`, clears
    /// all weights and resets the odometry baseline. Any previous particle
    /// set and in-flight state is discarded.
    pub fn initialize(&mut self, map: Arc<VectorMap>, loc: Point2D, angle: f32) {
        self.particles.clear();
        for _ in 0..self.config.num_particles {
            let x = self.sampler.gaussian(loc.x, self.config.init_spread_xy);
            let y = self.sampler.gaussian(loc.y, self.config.init_spread_xy);
            let theta = self.sampler.gaussian(angle, self.config.init_spread_theta);
            self.particles.push(Particle::new(Pose2D::new(x, y, theta)));
        }

        self.map = Some(map);
        self.odom_initialized = false;
        self.prev_odom_loc = loc;
        self.prev_odom_angle = angle;
        self.last_update_loc = loc;
        self.updates_since_resample = 0;
        self.max_log_weight = 0.0;

        log::info!(
            "particle filter initialized at ({:.2}, {:.2}, {:.2}) with {} particles",
            loc.x,
            loc.y,
            angle,
            self.particles.len()
        );
    }

    /// Propagate the particle set by a new odometry reading.
    ///
    /// The first reading after initialization, and any reading whose
    /// translation exceeds the teleport limit, only re-baselines the
    /// odometry frame without moving particles.
    pub fn observe_odometry(&mut self, odom_loc: Point2D, odom_angle: f32) {
        let trans_delta = odom_loc - self.prev_odom_loc;

        if self.odom_initialized && trans_delta.length() < self.config.odom_jump_limit {
            let dtheta = angle_diff(self.prev_odom_angle, odom_angle);

            for particle in &mut self.particles {
                particle.pose = self.motion_model.propagate(
                    &particle.pose,
                    trans_delta,
                    dtheta,
                    self.prev_odom_angle,
                    &mut self.sampler,
                );
            }
            self.prev_odom_loc = odom_loc;
            self.prev_odom_angle = odom_angle;
        } else {
            log::warn!(
                "odometry re-baselined ({})",
                if self.odom_initialized {
                    "teleport"
                } else {
                    "first reading"
                }
            );
            self.reset_odom(odom_loc, odom_angle);
            self.odom_initialized = true;
        }
    }

    /// Reweight particles against a laser scan.
    ///
    /// Runs only once the filter has traveled far enough since the last
    /// update, and not implausibly far. Every `resample_interval` updates
    /// the particle set is resampled.
    pub fn observe_laser(&mut self, scan: &LaserScan) {
        if !self.odom_initialized || self.particles.is_empty() {
            log::debug!("laser before odometry/init, ignored");
            return;
        }
        let map = match &self.map {
            Some(map) => Arc::clone(map),
            None => return,
        };

        let moved = self.prev_odom_loc.distance(&self.last_update_loc);
        if moved <= self.config.min_update_dist || moved >= self.config.max_update_dist {
            log::debug!("sensor update gated: moved {:.3} m", moved);
            return;
        }

        let mut max_log_weight = f64::NEG_INFINITY;
        for particle in &mut self.particles {
            particle.log_weight +=
                self.sensor_model
                    .log_likelihood(&map, &particle.pose, scan);
            max_log_weight = max_log_weight.max(particle.log_weight);
        }
        self.max_log_weight = max_log_weight;
        self.last_update_loc = self.prev_odom_loc;

        self.updates_since_resample += 1;
        if self.updates_since_resample >= self.config.resample_interval {
            self.resample();
            self.updates_since_resample = 0;
        }
    }

    /// Systematic low-variance resampling.
    ///
    /// Normalizes log-weights by the generation maximum, builds the
    /// cumulative weight array and steps a single uniform draw through it
    /// in increments of S/N, emitting exactly N particles with O(N) work.
    pub fn resample(&mut self) {
        if self.particles.is_empty() || !self.odom_initialized {
            return;
        }
        let n = self.particles.len();

        for particle in &mut self.particles {
            particle.log_weight -= self.max_log_weight;
        }

        let mut breakpoints = Vec::with_capacity(n);
        let mut total = 0.0f64;
        for particle in &self.particles {
            total += particle.log_weight.exp();
            breakpoints.push(total);
        }
        if total <= 0.0 {
            log::warn!("resample aborted: total particle weight is zero");
            return;
        }

        let step = total / n as f64;
        let mut sample_point = f64::from(self.sampler.uniform(0.0, step as f32));

        let mut new_particles = Vec::with_capacity(n);
        for (i, particle) in self.particles.iter().enumerate() {
            while sample_point < breakpoints[i] {
                new_particles.push(*particle);
                sample_point += step;
            }
        }
        // Repeated addition can lose the last emission to roundoff.
        while new_particles.len() < n {
            new_particles.push(self.particles[n - 1]);
        }
        new_particles.truncate(n);

        self.particles = new_particles;
        self.max_log_weight = 0.0;
    }

    /// Best pose estimate: the weighted mean of the particle set.
    ///
    /// Headings are averaged on the circle (atan2 of weighted sin/cos
    /// sums), which stays well-defined across the ±π wrap. Returns `None`
    /// before initialization or when all weights vanish.
    pub fn get_location(&self) -> Option<Pose2D> {
        if self.particles.is_empty() {
            return None;
        }

        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;
        let mut sum_sin = 0.0f64;
        let mut sum_cos = 0.0f64;
        let mut weight_sum = 0.0f64;

        for particle in &self.particles {
            let w = (particle.log_weight - self.max_log_weight).exp();
            sum_x += w * f64::from(particle.pose.x);
            sum_y += w * f64::from(particle.pose.y);
            sum_sin += w * f64::from(particle.pose.theta.sin());
            sum_cos += w * f64::from(particle.pose.theta.cos());
            weight_sum += w;
        }

        if weight_sum <= 0.0 {
            return None;
        }
        Some(Pose2D::new(
            (sum_x / weight_sum) as f32,
            (sum_y / weight_sum) as f32,
            sum_sin.atan2(sum_cos) as f32,
        ))
    }

    fn reset_odom(&mut self, loc: Point2D, angle: f32) {
        self.prev_odom_loc = loc;
        self.prev_odom_angle = angle;
        self.last_update_loc = loc;
        self.updates_since_resample = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rekha_map::LineSegment2D;

    fn unit_square() -> Arc<VectorMap> {
        Arc::new(VectorMap::from_lines(vec![
            LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0),
            LineSegment2D::from_coords(1.0, 0.0, 1.0, 1.0),
            LineSegment2D::from_coords(1.0, 1.0, 0.0, 1.0),
            LineSegment2D::from_coords(0.0, 1.0, 0.0, 0.0),
        ]))
    }

    fn seeded_config() -> ParticleFilterConfig {
        ParticleFilterConfig {
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_initialize_spawns_particles() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);

        assert_eq!(filter.num_particles(), 50);
        assert!(filter.particles().iter().all(|p| p.log_weight == 0.0));

        let estimate = filter.get_location().unwrap();
        assert!((estimate.x - 0.5).abs() < 0.2, "x = {}", estimate.x);
        assert!((estimate.y - 0.5).abs() < 0.2, "y = {}", estimate.y);
    }

    #[test]
    fn test_get_location_before_init() {
        let filter = ParticleFilter::new(seeded_config());
        assert!(filter.get_location().is_none());
    }

    #[test]
    fn test_first_odometry_rebaselines_without_motion() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        let before: Vec<Pose2D> = filter.particles().iter().map(|p| p.pose).collect();

        // Odometry frame starts somewhere unrelated to the map frame.
        filter.observe_odometry(Point2D::new(10.0, -3.0), 1.2);

        for (particle, pose) in filter.particles().iter().zip(&before) {
            assert_eq!(particle.pose, *pose);
        }
    }

    #[test]
    fn test_odometry_teleport_gate() {
        let mut config = seeded_config();
        config.motion = MotionModelConfig::noiseless();
        let mut filter = ParticleFilter::new(config);
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);

        filter.observe_odometry(Point2D::zero(), 0.0);
        let before: Vec<Pose2D> = filter.particles().iter().map(|p| p.pose).collect();

        // A 5 m jump in one step must leave particles unchanged and only
        // reset the baseline.
        filter.observe_odometry(Point2D::new(5.0, 0.0), 0.0);
        for (particle, pose) in filter.particles().iter().zip(&before) {
            assert_eq!(particle.pose, *pose);
        }

        // The next small step is measured from the new baseline.
        filter.observe_odometry(Point2D::new(5.1, 0.0), 0.0);
        for (particle, pose) in filter.particles().iter().zip(&before) {
            assert_relative_eq!(
                particle.pose.position().distance(&pose.position()),
                0.1,
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn test_noiseless_propagation_in_particle_frame() {
        let mut config = seeded_config();
        config.motion = MotionModelConfig::noiseless();
        config.num_particles = 20;
        let mut filter = ParticleFilter::new(config);
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);

        filter.observe_odometry(Point2D::zero(), 0.0);
        let before: Vec<Pose2D> = filter.particles().iter().map(|p| p.pose).collect();

        let delta = Point2D::new(0.2, 0.1);
        filter.observe_odometry(delta, 0.0);

        // Each particle moves by the odometry delta rotated into its own
        // heading basis (previous odometry heading was 0).
        for (particle, pose) in filter.particles().iter().zip(&before) {
            let expected = pose.position() + delta.rotated(pose.theta);
            assert_relative_eq!(particle.pose.x, expected.x, epsilon = 1e-5);
            assert_relative_eq!(particle.pose.y, expected.y, epsilon = 1e-5);
            assert_relative_eq!(particle.pose.theta, pose.theta, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_particles_stay_finite_under_odometry() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);

        let mut odom = Point2D::zero();
        let mut angle = 0.0f32;
        for i in 0..200 {
            odom = odom + Point2D::new(0.05, if i % 2 == 0 { 0.02 } else { -0.02 });
            angle += 0.1;
            filter.observe_odometry(odom, angle);
        }

        for particle in filter.particles() {
            assert!(particle.pose.x.is_finite());
            assert!(particle.pose.y.is_finite());
            assert!(particle.pose.theta.is_finite());
        }
    }

    #[test]
    fn test_laser_before_odometry_ignored() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);

        let scan = LaserScan::new(vec![0.3; 10], 0.02, 10.0, 0.0, 0.1);
        filter.observe_laser(&scan);

        assert!(filter.particles().iter().all(|p| p.log_weight == 0.0));
    }

    #[test]
    fn test_laser_update_gated_by_motion() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);

        // Barely moved: the update must be suppressed.
        filter.observe_odometry(Point2D::new(0.05, 0.0), 0.0);
        let scan = LaserScan::new(vec![0.3; 10], 0.02, 10.0, 0.0, 0.1);
        filter.observe_laser(&scan);

        assert!(filter.particles().iter().all(|p| p.log_weight == 0.0));
    }

    #[test]
    fn test_laser_update_reweights_after_motion() {
        let mut config = seeded_config();
        config.motion = MotionModelConfig::noiseless();
        let mut filter = ParticleFilter::new(config);
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);
        filter.observe_odometry(Point2D::new(0.2, 0.0), 0.0);

        let scan = LaserScan::new(vec![0.3; 10], 0.02, 10.0, 0.0, 0.1);
        filter.observe_laser(&scan);

        assert!(filter.particles().iter().any(|p| p.log_weight != 0.0));
    }

    #[test]
    fn test_resample_preserves_count_and_collapses() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);

        // One dominant particle, the rest negligible.
        let heavy_pose = filter.particles[7].pose;
        for (i, particle) in filter.particles.iter_mut().enumerate() {
            particle.log_weight = if i == 7 { 0.0 } else { -1000.0 };
        }
        filter.max_log_weight = 0.0;

        filter.resample();

        assert_eq!(filter.num_particles(), 50);
        for particle in filter.particles() {
            assert_eq!(particle.pose, heavy_pose);
        }
    }

    #[test]
    fn test_resample_zero_weight_aborts() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);

        for particle in filter.particles.iter_mut() {
            particle.log_weight = f64::NEG_INFINITY;
        }
        filter.max_log_weight = 0.0;

        let before: Vec<Pose2D> = filter.particles().iter().map(|p| p.pose).collect();
        filter.resample();

        assert_eq!(filter.num_particles(), 50);
        for (particle, pose) in filter.particles().iter().zip(&before) {
            assert_eq!(particle.pose, *pose);
        }
    }

    #[test]
    fn test_resample_uniform_weights_keeps_spread() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);

        let estimate_before = filter.get_location().unwrap();
        filter.resample();
        let estimate_after = filter.get_location().unwrap();

        assert_eq!(filter.num_particles(), 50);
        assert_relative_eq!(estimate_before.x, estimate_after.x, epsilon = 1e-3);
        assert_relative_eq!(estimate_before.y, estimate_after.y, epsilon = 1e-3);
    }

    #[test]
    fn test_reinitialize_replaces_particles() {
        let mut filter = ParticleFilter::new(seeded_config());
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), 0.0);
        filter.observe_odometry(Point2D::zero(), 0.0);
        filter.observe_odometry(Point2D::new(0.3, 0.0), 0.0);

        filter.initialize(unit_square(), Point2D::new(0.2, 0.8), 1.0);

        assert_eq!(filter.num_particles(), 50);
        assert!(filter.particles().iter().all(|p| p.log_weight == 0.0));
        let estimate = filter.get_location().unwrap();
        assert!((estimate.x - 0.2).abs() < 0.2);
        assert!((estimate.y - 0.8).abs() < 0.2);
    }

    #[test]
    fn test_estimate_across_heading_wrap() {
        let mut config = seeded_config();
        config.init_spread_theta = 0.05;
        let mut filter = ParticleFilter::new(config);
        filter.initialize(unit_square(), Point2D::new(0.5, 0.5), std::f32::consts::PI);

        // Particles straddle ±π; the circular mean must stay near π
        // instead of collapsing toward zero.
        let estimate = filter.get_location().unwrap();
        assert!(
            estimate.theta.abs() > 3.0,
            "heading near wrap, got {}",
            estimate.theta
        );
    }
}
