//! Polygon offsetting.
//!
//! [`PolygonOffsetter`] is the seam between perimeter/infill generation and
//! the offset algorithm. [`BisectorOffsetter`] is the built-in vertex
//! bisector method: exact for convex polygons, approximate elsewhere.

use primslice_math::{Point2, Vec2};

use crate::path::Polygon;

/// Below this, a corner is treated as a spike and dropped.
const MIN_HALF_ANGLE_SIN: f64 = 1e-3;

/// Offset results with less area than this are collapsed (mm²).
const MIN_AREA: f64 = 1e-9;

/// Moves a polygon's boundary toward (positive distance) or away from
/// (negative distance) the material it encloses.
///
/// For a counter-clockwise outer loop, positive distance shrinks it; for a
/// clockwise hole, positive distance grows the hole.
pub trait PolygonOffsetter {
    /// Offset `polygon` by `distance`, or `None` if the result collapses or
    /// inverts.
    fn offset(&self, polygon: &Polygon, distance: f64) -> Option<Polygon>;
}

/// Vertex bisector offsetter.
///
/// Each vertex moves along the bisector of its two edge normals by
/// `distance / sin(θ/2)`, where `θ` is the interior corner angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct BisectorOffsetter;

impl PolygonOffsetter for BisectorOffsetter {
    fn offset(&self, polygon: &Polygon, distance: f64) -> Option<Polygon> {
        let points = dedup_closed(&polygon.points);
        let n = points.len();
        if n < 3 {
            return None;
        }
        if distance == 0.0 {
            return Some(Polygon::new(points));
        }

        let mut moved: Vec<Point2> = Vec::with_capacity(n);
        let mut origin: Vec<usize> = Vec::with_capacity(n);

        for i in 0..n {
            let p0 = points[(i + n - 1) % n];
            let p1 = points[i];
            let p2 = points[(i + 1) % n];

            // Left normals point into the material for both windings.
            let n1 = left_normal(&(p1 - p0));
            let n2 = left_normal(&(p2 - p1));

            let sum = n1 + n2;
            let half_angle_sin = sum.norm() / 2.0;
            if half_angle_sin < MIN_HALF_ANGLE_SIN {
                continue;
            }
            let bisector = sum / sum.norm();
            moved.push(p1 + bisector * (distance / half_angle_sin));
            origin.push(i);
        }

        if moved.len() < 3 {
            return None;
        }

        // An edge pointing against its source edge means the offset has
        // passed through itself.
        let m = moved.len();
        for k in 0..m {
            let new_edge = moved[(k + 1) % m] - moved[k];
            let old_edge = points[origin[(k + 1) % m]] - points[origin[k]];
            if new_edge.dot(&old_edge) <= 0.0 {
                return None;
            }
        }

        let result = Polygon::new(moved);
        let area = result.signed_area();
        if area.abs() < MIN_AREA || area.signum() != polygon.signed_area().signum() {
            return None;
        }
        Some(result)
    }
}

fn left_normal(edge: &Vec2) -> Vec2 {
    let len = edge.norm();
    Vec2::new(-edge.y / len, edge.x / len)
}

/// Drop consecutive duplicate vertices, including a repeated closing point.
fn dedup_closed(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|q| (p - q).norm() > 1e-9) {
            out.push(*p);
        }
    }
    while out.len() > 1 && (out[0] - out[out.len() - 1]).norm() <= 1e-9 {
        out.pop();
    }
    out
}
