//! Configuration for the navigation core.
//!
//! One flat TOML record covering all tunables, with per-field defaults so a
//! partial file (or none at all) still yields a runnable configuration.
//! Builders derive the per-component config structs from it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::control::LatencyCompensatorConfig;
use crate::error::{NavError, Result};
use crate::localization::{MotionModelConfig, ParticleFilterConfig, SensorModelConfig};
use crate::navigation::NavigatorConfig;
use crate::planning::GlobalPlannerConfig;

/// All recognized options of the localization and navigation core.
#[derive(Clone, Debug, Deserialize)]
pub struct NavConfig {
    /// Number of particles.
    #[serde(default = "default_num_particles")]
    pub num_particles: usize,

    /// Sensor model: clamp for short readings (meters).
    #[serde(default = "default_d_short")]
    pub d_short: f32,

    /// Sensor model: clamp for long readings (meters).
    #[serde(default = "default_d_long")]
    pub d_long: f32,

    /// Sensor model: observation variance (m²).
    #[serde(default = "default_var_obs")]
    pub var_obs: f32,

    /// Motion model: translation error per unit translation (m/m).
    #[serde(default = "default_k1")]
    pub k1: f32,

    /// Motion model: translation error per unit rotation (m/rad).
    #[serde(default = "default_k2")]
    pub k2: f32,

    /// Motion model: angular error per unit translation (rad/m).
    #[serde(default = "default_k3")]
    pub k3: f32,

    /// Motion model: angular error per unit rotation (rad/rad).
    #[serde(default = "default_k4")]
    pub k4: f32,

    /// Resample every this many sensor updates.
    #[serde(default = "default_resample_interval")]
    pub resample_interval: u32,

    /// One virtual ray per this many measured ranges.
    #[serde(default = "default_num_rays_divisor")]
    pub num_rays_divisor: usize,

    /// Forward offset of the laser from the base link (meters).
    #[serde(default = "default_laser_offset")]
    pub laser_offset: f32,

    /// Planner lattice resolution (meters).
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// Planner cushion offset (meters).
    #[serde(default = "default_clearance_offset")]
    pub clearance_offset: f32,

    /// Actuation delay Δa (seconds).
    #[serde(default = "default_actuation_delay")]
    pub actuation_delay: f32,

    /// Observation delay Δo (seconds).
    #[serde(default = "default_observation_delay")]
    pub observation_delay: f32,

    /// Control period δt (seconds).
    #[serde(default = "default_delta_t")]
    pub delta_t: f32,

    /// Carrot lookahead radius (meters).
    #[serde(default = "default_carrot_radius")]
    pub carrot_radius: f32,

    /// Replan when this far off the path (meters).
    #[serde(default = "default_replan_deviation")]
    pub replan_deviation: f32,

    /// Goal tolerance (meters).
    #[serde(default = "default_goal_tolerance")]
    pub goal_tolerance: f32,

    /// Live obstacle clearance for path checks (meters).
    #[serde(default = "default_obstacle_clearance")]
    pub obstacle_clearance: f32,

    /// Random seed for the particle filter (0 picks a time-based seed).
    #[serde(default)]
    pub seed: u64,

    /// Directory holding `<name>.txt` map files.
    #[serde(default = "default_maps_dir")]
    pub maps_dir: PathBuf,
}

// Default value functions
fn default_num_particles() -> usize {
    50
}
fn default_d_short() -> f32 {
    0.5
}
fn default_d_long() -> f32 {
    0.5
}
fn default_var_obs() -> f32 {
    1.0
}
fn default_k1() -> f32 {
    0.50
}
fn default_k2() -> f32 {
    0.25
}
fn default_k3() -> f32 {
    0.50
}
fn default_k4() -> f32 {
    0.75
}
fn default_resample_interval() -> u32 {
    5
}
fn default_num_rays_divisor() -> usize {
    10
}
fn default_laser_offset() -> f32 {
    0.2
}
fn default_resolution() -> f32 {
    0.25
}
fn default_clearance_offset() -> f32 {
    0.25
}
fn default_actuation_delay() -> f32 {
    0.1
}
fn default_observation_delay() -> f32 {
    0.1
}
fn default_delta_t() -> f32 {
    0.05
}
fn default_carrot_radius() -> f32 {
    1.5
}
fn default_replan_deviation() -> f32 {
    0.5
}
fn default_goal_tolerance() -> f32 {
    0.25
}
fn default_obstacle_clearance() -> f32 {
    0.25
}
fn default_maps_dir() -> PathBuf {
    PathBuf::from("maps")
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            num_particles: default_num_particles(),
            d_short: default_d_short(),
            d_long: default_d_long(),
            var_obs: default_var_obs(),
            k1: default_k1(),
            k2: default_k2(),
            k3: default_k3(),
            k4: default_k4(),
            resample_interval: default_resample_interval(),
            num_rays_divisor: default_num_rays_divisor(),
            laser_offset: default_laser_offset(),
            resolution: default_resolution(),
            clearance_offset: default_clearance_offset(),
            actuation_delay: default_actuation_delay(),
            observation_delay: default_observation_delay(),
            delta_t: default_delta_t(),
            carrot_radius: default_carrot_radius(),
            replan_deviation: default_replan_deviation(),
            goal_tolerance: default_goal_tolerance(),
            obstacle_clearance: default_obstacle_clearance(),
            seed: 0,
            maps_dir: default_maps_dir(),
        }
    }
}

impl NavConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("failed to read {:?}: {}", path, e)))?;
        let config: NavConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve a map name to `maps_dir/<name>.txt`.
    pub fn map_path(&self, name: &str) -> PathBuf {
        self.maps_dir.join(format!("{}.txt", name))
    }

    /// Particle filter configuration.
    pub fn particle_filter(&self) -> ParticleFilterConfig {
        ParticleFilterConfig {
            num_particles: self.num_particles,
            resample_interval: self.resample_interval,
            motion: self.motion_model(),
            sensor: self.sensor_model(),
            seed: self.seed,
            ..Default::default()
        }
    }

    /// Motion model noise constants.
    pub fn motion_model(&self) -> MotionModelConfig {
        MotionModelConfig {
            k1: self.k1,
            k2: self.k2,
            k3: self.k3,
            k4: self.k4,
        }
    }

    /// Sensor model parameters.
    pub fn sensor_model(&self) -> SensorModelConfig {
        SensorModelConfig {
            d_short: self.d_short,
            d_long: self.d_long,
            var_obs: self.var_obs,
            num_rays_divisor: self.num_rays_divisor,
            laser_offset: self.laser_offset,
        }
    }

    /// Global planner configuration.
    pub fn planner(&self) -> GlobalPlannerConfig {
        GlobalPlannerConfig {
            resolution: self.resolution,
            clearance_offset: self.clearance_offset,
        }
    }

    /// Latency compensator configuration.
    pub fn latency(&self) -> LatencyCompensatorConfig {
        LatencyCompensatorConfig {
            actuation_delay: self.actuation_delay,
            observation_delay: self.observation_delay,
            delta_t: self.delta_t,
        }
    }

    /// Navigation coordinator configuration.
    pub fn navigator(&self) -> NavigatorConfig {
        NavigatorConfig {
            carrot_radius: self.carrot_radius,
            replan_deviation: self.replan_deviation,
            goal_tolerance: self.goal_tolerance,
            obstacle_clearance: self.obstacle_clearance,
            laser_offset: self.laser_offset,
            planner: self.planner(),
            latency: self.latency(),
        }
    }
}
