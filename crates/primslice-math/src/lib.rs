#![warn(missing_docs)]

//! Math types for the primslice toolpath engine.
//!
//! Thin aliases over nalgebra for planar and spatial points, plus the
//! planar rotation used to orient primitive cross-sections about Z and
//! the tolerance constants shared across slicing code.

use nalgebra::{Matrix2, Vector2, Vector3};

/// A point in the XY plane (mm).
pub type Point2 = nalgebra::Point2<f64>;

/// A point in machine space (mm).
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in the XY plane.
pub type Vec2 = Vector2<f64>;

/// A vector in machine space.
pub type Vec3 = Vector3<f64>;

/// Rotation in the XY plane about a pivot point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation2 {
    matrix: Matrix2<f64>,
    pivot: Point2,
}

impl Rotation2 {
    /// No rotation.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix2::identity(),
            pivot: Point2::origin(),
        }
    }

    /// Counter-clockwise rotation by `degrees` about `pivot`.
    pub fn about(pivot: Point2, degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix2::new(c, -s, s, c),
            pivot,
        }
    }

    /// Counter-clockwise rotation by `radians` about the origin.
    pub fn radians(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            matrix: Matrix2::new(c, -s, s, c),
            pivot: Point2::origin(),
        }
    }

    /// The inverse rotation about the same pivot.
    pub fn inverse(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
            pivot: self.pivot,
        }
    }

    /// Rotate a point.
    pub fn apply(&self, p: &Point2) -> Point2 {
        self.pivot + self.matrix * (p - self.pivot)
    }
}

impl Default for Rotation2 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
}

impl Tolerance {
    /// Slicing tolerance (1e-6 mm).
    pub const DEFAULT: Self = Self { linear: 1e-6 };

    /// Check if two planar points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point2, b: &Point2) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-18 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_rotation() {
        let r = Rotation2::identity();
        let p = Point2::new(1.0, 2.0);
        assert!((r.apply(&p) - p).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_about_pivot() {
        let r = Rotation2::about(Point2::new(1.0, 1.0), 90.0);
        let p = r.apply(&Point2::new(2.0, 1.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_round_trip() {
        let r = Rotation2::about(Point2::new(3.0, -2.0), 37.0);
        let p = Point2::new(5.0, 7.0);
        let back = r.inverse().apply(&r.apply(&p));
        assert!((back - p).norm() < 1e-12);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(5.0, 3.0), &a, &b), 3.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(-4.0, 3.0), &a, &b), 5.0);
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point2::new(1.0, 2.0);
        assert!(tol.points_equal(&a, &Point2::new(1.0 + 1e-7, 2.0)));
        assert!(!tol.points_equal(&a, &Point2::new(1.001, 2.0)));
    }
}
