//! # Rekha-Map: line-segment vector maps for 2D navigation
//!
//! A small library holding the prior map of a known indoor environment as a
//! flat list of line segments, with the geometric queries the localization
//! and planning layers need:
//!
//! - nearest ray/segment intersection ([`VectorMap::intersect`],
//!   [`VectorMap::first_hit`]) for simulating laser returns,
//! - minimum segment-to-map distance ([`VectorMap::min_distance_to_segment`])
//!   for clearance checks,
//! - plain-text map file loading (`x0 y0 x1 y1` per line, `#` comments).
//!
//! ## Coordinate frame
//!
//! All coordinates follow the ROS REP-103 convention: X forward, Y left,
//! rotation counter-clockwise positive. Units are meters.

pub mod error;
pub mod geometry;
pub mod map;

pub use error::{MapError, Result};
pub use geometry::{LineSegment2D, Point2D};
pub use map::{MapHit, VectorMap};
