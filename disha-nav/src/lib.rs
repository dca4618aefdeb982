//! # Disha-Nav: localization and navigation core for a ground vehicle
//!
//! Estimates the robot pose in a known line-segment map, plans global
//! paths through it, and compensates sensor/actuator latency so commands
//! reference the pose the robot will have when they take effect.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   navigation/                       │  ← Coordinator + local-planner seam
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────────┐ ┌──────────────────────────┐
//! │     planning/        │ │        control/          │  ← A* lattice, latency compensation
//! └──────────────────────┘ └──────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  localization/                      │  ← Particle filter (motion + sensor models)
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      core/                          │  ← Types, math, seeded sampling
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The prior map itself lives in the `rekha-map` crate and is shared
//! read-only (`Arc<VectorMap>`) between the particle filter and the
//! planner.
//!
//! # Per-tick data flow
//!
//! Odometry propagates the particles; a laser scan reweights them and the
//! filter emits a pose. The [`navigation::Navigator`] queries the
//! [`control::LatencyCompensator`] for the pose the robot will occupy when
//! the next command lands, picks the carrot waypoint on the
//! [`planning::GlobalPlanner`] path, hands both to the external local
//! planner, and records the returned command back into the compensator.

pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod localization;
pub mod navigation;
pub mod planning;

pub use config::NavConfig;
pub use control::{CommandRecord, LatencyCompensator, LatencyCompensatorConfig};
pub use error::{NavError, Result};
pub use self::core::types::{LaserScan, Pose2D, VelocityCommand};
pub use self::core::Sampler;
pub use localization::{
    MotionModel, MotionModelConfig, Particle, ParticleFilter, ParticleFilterConfig, SensorModel,
    SensorModelConfig,
};
pub use navigation::{LocalPlanner, Navigator, NavigatorConfig};
pub use planning::{Frontier, GlobalPlanner, GlobalPlannerConfig};
