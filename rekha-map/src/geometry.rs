//! Geometry primitives for the vector map.
//!
//! Segments are represented by their endpoints only (no parametric form),
//! which keeps transforms trivial and avoids angle wrapping at ±π.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 2D point (or vector) in meters, map frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters.
    pub x: f32,
    /// Y coordinate in meters.
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Origin.
    #[inline]
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(&self, other: Point2D) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (z component of the 3D cross product).
    #[inline]
    pub fn cross(&self, other: Point2D) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Vector length.
    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Squared length (avoids sqrt).
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction. Zero vectors are returned unchanged.
    #[inline]
    pub fn normalized(&self) -> Point2D {
        let len = self.length();
        if len > 0.0 {
            Point2D::new(self.x / len, self.y / len)
        } else {
            *self
        }
    }

    /// Perpendicular vector (90° counter-clockwise).
    #[inline]
    pub fn perpendicular(&self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }

    /// This vector rotated by `angle` radians (CCW positive).
    #[inline]
    pub fn rotated(&self, angle: f32) -> Point2D {
        let (sin_a, cos_a) = angle.sin_cos();
        Point2D::new(
            self.x * cos_a - self.y * sin_a,
            self.x * sin_a + self.y * cos_a,
        )
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        (*self - *other).length()
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        (*self - *other).length_squared()
    }
}

impl Add for Point2D {
    type Output = Point2D;

    #[inline]
    fn add(self, other: Point2D) -> Point2D {
        Point2D::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    #[inline]
    fn sub(self, other: Point2D) -> Point2D {
        Point2D::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Point2D {
    type Output = Point2D;

    #[inline]
    fn mul(self, scalar: f32) -> Point2D {
        Point2D::new(self.x * scalar, self.y * scalar)
    }
}

/// A 2D line segment defined by its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment2D {
    /// Start point of the segment.
    pub start: Point2D,
    /// End point of the segment.
    pub end: Point2D,
}

impl LineSegment2D {
    /// Create a new segment from two points.
    #[inline]
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// Create a segment from raw endpoint coordinates.
    #[inline]
    pub fn from_coords(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(Point2D::new(x0, y0), Point2D::new(x1, y1))
    }

    /// Direction vector from start to end (not normalized).
    #[inline]
    pub fn direction(&self) -> Point2D {
        self.end - self.start
    }

    /// Unit direction vector from start to end.
    #[inline]
    pub fn unit_direction(&self) -> Point2D {
        self.direction().normalized()
    }

    /// Unit normal (perpendicular to direction, pointing left).
    #[inline]
    pub fn normal(&self) -> Point2D {
        self.unit_direction().perpendicular()
    }

    /// Segment length.
    #[inline]
    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    /// Squared segment length.
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.direction().length_squared()
    }

    /// True when the endpoints (nearly) coincide.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length_squared() < f32::EPSILON
    }

    /// Point along the segment at parameter `t` (0 = start, 1 = end).
    #[inline]
    pub fn point_at(&self, t: f32) -> Point2D {
        self.start + self.direction() * t
    }

    /// Find the intersection point with another segment.
    ///
    /// Uses the parametric form with the standard determinant test.
    /// Parallel or degenerate segments yield no intersection.
    pub fn intersection(&self, other: &LineSegment2D) -> Option<Point2D> {
        let d1 = self.direction();
        let d2 = other.direction();

        let cross = d1.cross(d2);
        if cross.abs() < f32::EPSILON {
            return None;
        }

        let origin_diff = other.start - self.start;
        let t = origin_diff.cross(d2) / cross;
        let s = origin_diff.cross(d1) / cross;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s) {
            Some(self.point_at(t))
        } else {
            None
        }
    }

    /// Closest point on the segment to `point`.
    pub fn closest_point(&self, point: Point2D) -> Point2D {
        let len_sq = self.length_squared();
        if len_sq < f32::EPSILON {
            return self.start;
        }
        let t = (point - self.start).dot(self.direction()) / len_sq;
        self.point_at(t.clamp(0.0, 1.0))
    }

    /// Distance from `point` to the segment (endpoints included).
    #[inline]
    pub fn distance_to_point(&self, point: Point2D) -> f32 {
        self.closest_point(point).distance(&point)
    }

    /// Minimum distance between this segment and another.
    ///
    /// Zero when the segments intersect; otherwise the closest approach is
    /// realized at an endpoint of one of the two segments.
    pub fn distance_to_segment(&self, other: &LineSegment2D) -> f32 {
        if self.intersection(other).is_some() {
            return 0.0;
        }
        self.distance_to_point(other.start)
            .min(self.distance_to_point(other.end))
            .min(other.distance_to_point(self.start))
            .min(other.distance_to_point(self.end))
    }

    /// This segment translated sideways by `offset` meters along its unit
    /// normal (positive = left of the direction of travel).
    ///
    /// Returns `None` for degenerate segments, which have no defined normal.
    pub fn offset(&self, offset: f32) -> Option<LineSegment2D> {
        if self.is_degenerate() {
            return None;
        }
        let shift = self.normal() * offset;
        Some(LineSegment2D::new(self.start + shift, self.end + shift))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_ops() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(3.0, -1.0);

        assert_relative_eq!((a + b).x, 4.0);
        assert_relative_eq!((a - b).y, 3.0);
        assert_relative_eq!((a * 2.0).x, 2.0);
        assert_relative_eq!(a.dot(b), 1.0);
        assert_relative_eq!(a.cross(b), -7.0);
    }

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_point_rotated() {
        let p = Point2D::new(1.0, 0.0).rotated(std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalized_zero_vector() {
        let z = Point2D::zero().normalized();
        assert_eq!(z, Point2D::zero());
    }

    #[test]
    fn test_segment_intersection_crossing() {
        let a = LineSegment2D::from_coords(0.0, 0.0, 2.0, 2.0);
        let b = LineSegment2D::from_coords(0.0, 2.0, 2.0, 0.0);

        let hit = a.intersection(&b).unwrap();
        assert_relative_eq!(hit.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(hit.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_segment_intersection_parallel() {
        let a = LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0);
        let b = LineSegment2D::from_coords(0.0, 1.0, 1.0, 1.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_segment_intersection_disjoint_collinear() {
        let a = LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0);
        let b = LineSegment2D::from_coords(2.0, 0.0, 3.0, 0.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_segment_intersection_out_of_range() {
        // Lines cross but the segments do not reach the crossing.
        let a = LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0);
        let b = LineSegment2D::from_coords(2.0, -1.0, 2.0, 1.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_closest_point_interior_and_endpoint() {
        let seg = LineSegment2D::from_coords(0.0, 0.0, 10.0, 0.0);

        let interior = seg.closest_point(Point2D::new(5.0, 3.0));
        assert_relative_eq!(interior.x, 5.0);
        assert_relative_eq!(interior.y, 0.0);

        let clamped = seg.closest_point(Point2D::new(-2.0, 1.0));
        assert_relative_eq!(clamped.x, 0.0);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0);
        let b = LineSegment2D::from_coords(0.0, 2.0, 1.0, 2.0);
        assert_relative_eq!(a.distance_to_segment(&b), 2.0, epsilon = 1e-6);

        let crossing = LineSegment2D::from_coords(0.5, -1.0, 0.5, 1.0);
        assert_relative_eq!(a.distance_to_segment(&crossing), 0.0);
    }

    #[test]
    fn test_offset_segments() {
        let seg = LineSegment2D::from_coords(0.0, 0.0, 1.0, 0.0);

        let left = seg.offset(0.5).unwrap();
        assert_relative_eq!(left.start.y, 0.5, epsilon = 1e-6);
        assert_relative_eq!(left.end.y, 0.5, epsilon = 1e-6);

        let right = seg.offset(-0.5).unwrap();
        assert_relative_eq!(right.start.y, -0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_degenerate() {
        let seg = LineSegment2D::from_coords(1.0, 1.0, 1.0, 1.0);
        assert!(seg.offset(0.5).is_none());
    }
}
