//! The vector map: an immutable collection of line segments.
//!
//! The map is the prior of the environment geometry, loaded once at startup
//! and shared read-only between the localizer and the planner. Queries are
//! linear sweeps over the segment list; maps in this format are small enough
//! (hundreds of walls) that no spatial index is kept.

use std::path::Path;

use crate::error::{MapError, Result};
use crate::geometry::{LineSegment2D, Point2D};

/// Result of a nearest-hit query against the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapHit {
    /// Intersection point in map frame.
    pub point: Point2D,
    /// Distance from the query segment's start point to the hit.
    pub distance: f32,
}

/// An immutable 2D map of line segments in map frame.
#[derive(Debug, Clone, Default)]
pub struct VectorMap {
    lines: Vec<LineSegment2D>,
}

impl VectorMap {
    /// Create a map from a list of segments.
    pub fn from_lines(lines: Vec<LineSegment2D>) -> Self {
        Self { lines }
    }

    /// Load a map from a text file.
    ///
    /// Each non-empty line encodes one segment as four whitespace-separated
    /// decimals `x0 y0 x1 y1` in meters. Lines starting with `#` are comments.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let mut lines = Vec::new();
        for (line_no, raw) in contents.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(MapError::Parse {
                    line: line_no + 1,
                    reason: format!("expected 4 fields, found {}", fields.len()),
                });
            }

            let mut coords = [0.0f32; 4];
            for (i, field) in fields.iter().enumerate() {
                coords[i] = field.parse().map_err(|_| MapError::Parse {
                    line: line_no + 1,
                    reason: format!("invalid number {:?}", field),
                })?;
            }
            lines.push(LineSegment2D::from_coords(
                coords[0], coords[1], coords[2], coords[3],
            ));
        }

        log::info!("loaded vector map {:?}: {} segments", path, lines.len());
        Ok(Self { lines })
    }

    /// All map segments.
    #[inline]
    pub fn lines(&self) -> &[LineSegment2D] {
        &self.lines
    }

    /// Number of segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the map has no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Nearest intersection of a query segment with any map segment.
    ///
    /// Ties across multiple map hits are broken by the smallest Euclidean
    /// distance from the query segment's start point.
    pub fn intersect(&self, query: &LineSegment2D) -> Option<Point2D> {
        self.first_hit(query).map(|hit| hit.point)
    }

    /// Nearest intersection with hit distance, measured from `query.start`.
    pub fn first_hit(&self, query: &LineSegment2D) -> Option<MapHit> {
        let mut closest: Option<MapHit> = None;

        for line in &self.lines {
            if let Some(point) = line.intersection(query) {
                let distance = point.distance(&query.start);
                let is_closer = closest.map_or(true, |best| distance < best.distance);
                if is_closer {
                    closest = Some(MapHit { point, distance });
                }
            }
        }

        closest
    }

    /// Minimum distance from the query segment to any map segment.
    ///
    /// Returns `f32::INFINITY` for an empty map, 0 when the query crosses
    /// a wall.
    pub fn min_distance_to_segment(&self, query: &LineSegment2D) -> f32 {
        self.lines
            .iter()
            .map(|line| line.distance_to_segment(query))
            .fold(f32::INFINITY, f32::min)
    }
}
