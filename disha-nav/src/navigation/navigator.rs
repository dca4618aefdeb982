//! Navigation coordinator.
//!
//! Binds the localizer's pose, the global planner's waypoints and the
//! latency compensator's predictions into one control tick: pick the
//! carrot waypoint on the active path, hand it to the local planner
//! together with the predicted pose and the live scan, and feed the
//! returned command back into the compensator.

use std::sync::Arc;

use rekha_map::{LineSegment2D, Point2D, VectorMap};

use crate::control::{LatencyCompensator, LatencyCompensatorConfig};
use crate::core::types::{LaserScan, Pose2D, VelocityCommand};
use crate::localization::SensorModelConfig;
use crate::planning::{GlobalPlanner, GlobalPlannerConfig};

/// The local planner seam.
///
/// The trajectory sampler that turns (predicted pose, carrot, scan) into a
/// drivable command lives outside the core; the coordinator only depends on
/// this trait.
pub trait LocalPlanner {
    /// Produce a command toward `target` from `pose`, avoiding obstacles
    /// in `scan`.
    fn plan(&mut self, pose: &Pose2D, target: Point2D, scan: &LaserScan) -> VelocityCommand;
}

/// Configuration for the navigation coordinator.
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Carrot radius: furthest lookahead along the path (meters).
    pub carrot_radius: f32,

    /// Replan when the predicted pose is further than this from the
    /// nearest path waypoint (meters).
    pub replan_deviation: f32,

    /// Goal tolerance (meters).
    pub goal_tolerance: f32,

    /// Live obstacle points closer than this to a path segment block it
    /// (meters).
    pub obstacle_clearance: f32,

    /// Forward offset of the laser from the base link (meters); used to
    /// place live scan points in the map frame.
    pub laser_offset: f32,

    /// Global planner configuration.
    pub planner: GlobalPlannerConfig,

    /// Latency compensator configuration.
    pub latency: LatencyCompensatorConfig,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            carrot_radius: 1.5,
            replan_deviation: 0.5,
            goal_tolerance: 0.25,
            obstacle_clearance: 0.25,
            laser_offset: SensorModelConfig::default().laser_offset,
            planner: GlobalPlannerConfig::default(),
            latency: LatencyCompensatorConfig::default(),
        }
    }
}

/// Navigation coordinator: owns the goal, the active path and the
/// compensator, and drives one control tick at a time.
pub struct Navigator {
    config: NavigatorConfig,
    planner: GlobalPlanner,
    compensator: LatencyCompensator,
    goal: Option<Point2D>,
    path: Vec<String>,
}

impl Navigator {
    /// Create a navigator over a shared map.
    pub fn new(config: NavigatorConfig, map: Arc<VectorMap>) -> Self {
        let planner = GlobalPlanner::new(config.planner, map);
        let compensator = LatencyCompensator::new(config.latency);
        Self {
            config,
            planner,
            compensator,
            goal: None,
            path: Vec::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Current goal, if any.
    pub fn goal(&self) -> Option<Point2D> {
        self.goal
    }

    /// Active path as node keys (for visualization).
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Active path as map-frame waypoints.
    pub fn path_locations(&self) -> Vec<Point2D> {
        self.planner.path_locations(&self.path)
    }

    /// Set a new navigation goal and plan from the current estimate.
    ///
    /// A new goal invalidates the previous path but not the filter.
    pub fn set_goal(&mut self, goal: Point2D, current: Point2D) {
        self.goal = Some(goal);
        self.replan(current);
    }

    /// Drop the goal and path; the next ticks hold position.
    pub fn cancel(&mut self) {
        self.goal = None;
        self.path.clear();
    }

    /// Run one control tick.
    ///
    /// `pose` is the filter estimate for the state observed at `now`
    /// (seconds). Returns the command to emit; with no goal, no path, or
    /// the goal reached, that is the zero command.
    pub fn update(
        &mut self,
        pose: &Pose2D,
        scan: &LaserScan,
        now: f64,
        local_planner: &mut dyn LocalPlanner,
    ) -> VelocityCommand {
        let goal = match self.goal {
            Some(goal) => goal,
            None => return VelocityCommand::stop(),
        };

        self.compensator.record_observation(now);
        let predicted = self.compensator.predicted_state(pose);

        if predicted.position().distance(&goal) <= self.config.goal_tolerance {
            log::info!("goal reached at ({:.2}, {:.2})", goal.x, goal.y);
            self.cancel();
            return VelocityCommand::stop();
        }

        let obstacles = self.scan_points(&predicted, scan);
        if self.needs_replan(&predicted, &obstacles) {
            self.replan(pose.position());
        }

        let waypoints = self.planner.path_locations(&self.path);
        if waypoints.is_empty() {
            log::debug!("no path to goal, holding position");
            return VelocityCommand::stop();
        }

        let carrot = self.select_carrot(&predicted, &waypoints, &obstacles);
        let command = local_planner.plan(&predicted, carrot, scan);
        self.compensator
            .record_input(command.linear, 0.0, command.angular, now);
        command
    }

    /// Replan from `start`; an empty result clears the path.
    fn replan(&mut self, start: Point2D) {
        let goal = match self.goal {
            Some(goal) => goal,
            None => return,
        };
        self.planner.initialize(start);
        self.path = self.planner.plan(goal);
        if self.path.is_empty() {
            log::warn!(
                "no path from ({:.2}, {:.2}) to ({:.2}, {:.2})",
                start.x,
                start.y,
                goal.x,
                goal.y
            );
        } else {
            log::info!("planned path with {} waypoints", self.path.len());
        }
    }

    /// Replan triggers: no path, divergence from the path, or the first
    /// remaining segment blocked by a live obstacle.
    fn needs_replan(&self, predicted: &Pose2D, obstacles: &[Point2D]) -> bool {
        let waypoints = self.planner.path_locations(&self.path);
        if waypoints.is_empty() {
            return true;
        }

        let position = predicted.position();
        let (nearest_idx, nearest_dist) = Self::nearest_waypoint(&waypoints, position);
        if nearest_dist > self.config.replan_deviation {
            log::debug!("replanning: {:.2} m off the path", nearest_dist);
            return true;
        }

        if nearest_idx + 1 < waypoints.len() {
            let first_segment =
                LineSegment2D::new(waypoints[nearest_idx], waypoints[nearest_idx + 1]);
            let blocked = obstacles.iter().any(|point| {
                first_segment.distance_to_point(*point) < self.config.obstacle_clearance
            });
            if blocked {
                log::debug!("replanning: path segment blocked by live obstacle");
                return true;
            }
        }

        false
    }

    /// Furthest waypoint within the carrot radius whose connecting segment
    /// is clear of walls and live obstacles. Falls back to the nearest
    /// waypoint when none qualifies.
    fn select_carrot(
        &self,
        predicted: &Pose2D,
        waypoints: &[Point2D],
        obstacles: &[Point2D],
    ) -> Point2D {
        let position = predicted.position();

        for waypoint in waypoints.iter().rev() {
            if position.distance(waypoint) > self.config.carrot_radius {
                continue;
            }
            if self.segment_is_clear(position, *waypoint, obstacles) {
                return *waypoint;
            }
        }

        let (nearest_idx, _) = Self::nearest_waypoint(waypoints, position);
        waypoints[nearest_idx]
    }

    /// A straight segment is clear when it crosses no wall and passes no
    /// live obstacle point closer than the clearance.
    fn segment_is_clear(&self, from: Point2D, to: Point2D, obstacles: &[Point2D]) -> bool {
        let segment = LineSegment2D::new(from, to);
        if self.planner_map().intersect(&segment).is_some() {
            return false;
        }
        obstacles
            .iter()
            .all(|point| segment.distance_to_point(*point) >= self.config.obstacle_clearance)
    }

    /// Live scan points in the map frame, seen from the predicted pose.
    /// Readings at the sensor limits are dropped.
    fn scan_points(&self, predicted: &Pose2D, scan: &LaserScan) -> Vec<Point2D> {
        let laser = predicted.position()
            + Point2D::new(predicted.theta.cos(), predicted.theta.sin()) * self.config.laser_offset;

        scan.ranges
            .iter()
            .enumerate()
            .filter(|(_, range)| scan.is_range_usable(**range))
            .map(|(i, range)| {
                let angle = predicted.theta + scan.angle_of(i);
                laser + Point2D::new(angle.cos(), angle.sin()) * *range
            })
            .collect()
    }

    fn nearest_waypoint(waypoints: &[Point2D], position: Point2D) -> (usize, f32) {
        let mut best = (0, f32::INFINITY);
        for (i, waypoint) in waypoints.iter().enumerate() {
            let dist = waypoint.distance(&position);
            if dist < best.1 {
                best = (i, dist);
            }
        }
        best
    }

    fn planner_map(&self) -> &VectorMap {
        self.planner.map()
    }
}
