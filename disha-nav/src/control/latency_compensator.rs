//! Latency compensation by forward-simulating issued commands.
//!
//! Sensor pipelines and actuators both lag: the pose the filter reports
//! describes the robot some time in the past, and a command issued now only
//! takes effect some time in the future. The compensator keeps the recent
//! commands that are not yet reflected in the observed state and integrates
//! them forward, so the controller plans from the pose the robot will
//! actually have when its command lands.

use std::collections::VecDeque;

use crate::core::types::Pose2D;

/// Delay parameters of the platform.
#[derive(Debug, Clone, Copy)]
pub struct LatencyCompensatorConfig {
    /// Actuation delay Δa: command issue to wheels moving (seconds).
    pub actuation_delay: f32,

    /// Observation delay Δo: world state to sensor message arrival
    /// (seconds).
    pub observation_delay: f32,

    /// Control period δt: each buffered command is assumed active for one
    /// period (seconds).
    pub delta_t: f32,
}

impl Default for LatencyCompensatorConfig {
    fn default() -> Self {
        Self {
            actuation_delay: 0.1,
            observation_delay: 0.1,
            delta_t: 0.05,
        }
    }
}

/// One issued command with its body-frame velocities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandRecord {
    /// Forward velocity (m/s).
    pub vx: f32,
    /// Lateral velocity (m/s); zero for non-holonomic platforms.
    pub vy: f32,
    /// Angular velocity (rad/s).
    pub omega: f32,
    /// Issue time (seconds).
    pub timestamp: f64,
}

/// Forward-simulates buffered commands over the unreported window.
#[derive(Debug, Clone)]
pub struct LatencyCompensator {
    config: LatencyCompensatorConfig,
    system_delay: f32,
    inputs: VecDeque<CommandRecord>,
    last_observation_time: Option<f64>,
}

impl LatencyCompensator {
    /// Create a compensator.
    pub fn new(config: LatencyCompensatorConfig) -> Self {
        let system_delay = config.actuation_delay + config.observation_delay;
        log::debug!(
            "latency compensator: Δa={:.3}s Δo={:.3}s Δs={:.3}s δt={:.3}s",
            config.actuation_delay,
            config.observation_delay,
            system_delay,
            config.delta_t
        );
        Self {
            config,
            system_delay,
            inputs: VecDeque::new(),
            last_observation_time: None,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LatencyCompensatorConfig {
        &self.config
    }

    /// Total system delay Δs = Δa + Δo.
    pub fn system_delay(&self) -> f32 {
        self.system_delay
    }

    /// Number of buffered commands.
    pub fn buffered_commands(&self) -> usize {
        self.inputs.len()
    }

    /// Record a newly issued command.
    ///
    /// Timestamps must be strictly monotone; an out-of-order record is
    /// rejected.
    pub fn record_input(&mut self, vx: f32, vy: f32, omega: f32, now: f64) {
        if let Some(last) = self.inputs.back() {
            if now <= last.timestamp {
                log::warn!(
                    "rejecting non-monotone command timestamp {:.3} <= {:.3}",
                    now,
                    last.timestamp
                );
                return;
            }
        }
        self.inputs.push_back(CommandRecord {
            vx,
            vy,
            omega,
            timestamp: now,
        });
    }

    /// Stamp the time the most recent sensor state corresponds to.
    pub fn record_observation(&mut self, now: f64) {
        self.last_observation_time = Some(now);
    }

    /// Pose predicted Δs into the future from the observed pose.
    ///
    /// Commands already reflected in the observed state (issued up to the
    /// observation time minus the observation delay) are pruned; the rest
    /// are integrated in order, each over one control period, using the
    /// body-frame kinematics of the record. An empty buffer returns the
    /// input pose unchanged.
    pub fn predicted_state(&mut self, pose: &Pose2D) -> Pose2D {
        if let Some(observed_at) = self.last_observation_time {
            let cutoff = observed_at - f64::from(self.config.observation_delay);
            while self
                .inputs
                .front()
                .map_or(false, |record| record.timestamp <= cutoff)
            {
                self.inputs.pop_front();
            }
        }

        if self.inputs.is_empty() {
            return *pose;
        }

        let dt = self.config.delta_t;
        let mut x = pose.x;
        let mut y = pose.y;
        let mut theta = pose.theta;
        for record in &self.inputs {
            let (sin_t, cos_t) = theta.sin_cos();
            x += (record.vx * cos_t - record.vy * sin_t) * dt;
            y += (record.vx * sin_t + record.vy * cos_t) * dt;
            theta += record.omega * dt;
        }
        Pose2D::new(x, y, theta)
    }
}
