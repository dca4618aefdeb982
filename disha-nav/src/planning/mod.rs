//! Global path planning on a clearance-validated lattice.

pub mod frontier;
pub mod global_planner;

pub use frontier::Frontier;
pub use global_planner::{GlobalPlanner, GlobalPlannerConfig, GridNode, Neighbor};
