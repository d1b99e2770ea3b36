//! Planar path types: polygons, polylines and per-layer geometry.

use primslice_math::{Point2, Rotation2, Tolerance};
use serde::{Deserialize, Serialize};

/// A 2D polygon (closed path, first point not repeated).
///
/// Outer boundaries wind counter-clockwise, holes clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Regular polygon approximating a circle, counter-clockwise.
    pub fn circle(center: Point2, radius: f64, segments: usize) -> Self {
        Self::ellipse(center, radius, radius, segments, &Rotation2::identity())
    }

    /// Ellipse approximation with semi-axes `rx`, `ry`, counter-clockwise.
    pub fn ellipse(center: Point2, rx: f64, ry: f64, segments: usize, rotation: &Rotation2) -> Self {
        let n = segments.max(3);
        let points = (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / n as f64;
                rotation.apply(&Point2::new(center.x + rx * t.cos(), center.y + ry * t.sin()))
            })
            .collect();
        Self { points }
    }

    /// Axis-aligned rectangle centred on `center`, rotated, counter-clockwise.
    pub fn rectangle(center: Point2, width: f64, depth: f64, rotation: &Rotation2) -> Self {
        let (hw, hd) = (width / 2.0, depth / 2.0);
        let corners = [(-hw, -hd), (hw, -hd), (hw, hd), (-hw, hd)];
        Self {
            points: corners
                .iter()
                .map(|&(dx, dy)| rotation.apply(&Point2::new(center.x + dx, center.y + dy)))
                .collect(),
        }
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Signed area of the polygon.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Reverse the winding order.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Copy with reversed winding.
    pub fn reversed(&self) -> Self {
        let mut poly = self.clone();
        poly.reverse();
        poly
    }

    /// Perimeter length.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| (self.points[(i + 1) % n] - self.points[i]).norm())
            .sum()
    }

    /// Bounding box, or `None` for an empty polygon.
    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(self.points.iter())
    }

    /// Even-odd point containment test.
    pub fn contains(&self, point: &Point2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = &self.points[i];
            let pj = &self.points[j];
            if ((pi.y > point.y) != (pj.y > point.y))
                && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Signed winding number of the polygon around `point`.
    ///
    /// +1 inside a counter-clockwise loop, -1 inside a clockwise one, 0
    /// outside.
    pub fn winding_number(&self, point: &Point2) -> i32 {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        let mut winding = 0;
        for i in 0..n {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % n];
            let side = (b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y);
            if a.y <= point.y {
                if b.y > point.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= point.y && side < 0.0 {
                winding -= 1;
            }
        }
        winding
    }

    /// Radius of the circle about `center` this polygon traces, if every
    /// vertex lies at the same distance from it.
    pub fn as_circle(&self, center: &Point2) -> Option<f64> {
        if self.points.len() < 8 || !self.is_ccw() {
            return None;
        }
        let radius = (self.points[0] - center).norm();
        let tol = (radius * 1e-6).max(Tolerance::DEFAULT.linear * 10.0);
        self.points
            .iter()
            .all(|p| ((p - center).norm() - radius).abs() < tol)
            .then_some(radius)
    }
}

/// An open polyline (non-closed path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Points along the path.
    pub points: Vec<Point2>,
}

impl Polyline {
    /// Create a new polyline.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Total length of the polyline.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Starting point.
    pub fn start(&self) -> Option<&Point2> {
        self.points.first()
    }

    /// Ending point.
    pub fn end(&self) -> Option<&Point2> {
        self.points.last()
    }

    /// Reverse direction of travel.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }
}

/// Axis-aligned bounds in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Bounds2 {
    /// Bounds of a point set, `None` if empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: Point2::new(b.min.x.min(p.x), b.min.y.min(p.y)),
                max: Point2::new(b.max.x.max(p.x), b.max.y.max(p.y)),
            },
        ))
    }

    /// Grow on every side by `margin`.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Centre point.
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Width along X.
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Depth along Y.
    pub fn depth(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// All cross-section polygons of one Z layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliceGeometry {
    /// Outer boundaries (CCW) and holes (CW).
    pub polygons: Vec<Polygon>,
    /// Natural centre of a round cross-section.
    pub center: Option<Point2>,
}

impl SliceGeometry {
    /// Empty geometry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Geometry from polygons without a natural centre.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons,
            center: None,
        }
    }

    /// Geometry of a round cross-section.
    pub fn round(polygons: Vec<Polygon>, center: Point2) -> Self {
        Self {
            polygons,
            center: Some(center),
        }
    }

    /// True when the layer contributes nothing printable.
    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|p| p.len() < 3)
    }

    /// Bounding box over all polygons.
    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(self.polygons.iter().flat_map(|p| p.points.iter()))
    }

    /// Nonzero containment over all polygons: overlapping outer loops
    /// union and clockwise holes subtract.
    pub fn contains(&self, point: &Point2) -> bool {
        region_contains(&self.polygons, point)
    }

    /// Merge another layer's polygons into this one.
    ///
    /// The natural centre survives only if both sides agree on it.
    pub fn merge(&mut self, other: SliceGeometry) {
        if other.polygons.is_empty() {
            return;
        }
        if self.polygons.is_empty() {
            *self = other;
            return;
        }
        self.center = match (self.center, other.center) {
            (Some(a), Some(b)) if Tolerance::DEFAULT.points_equal(&a, &b) => Some(a),
            _ => None,
        };
        self.polygons.extend(other.polygons);
    }
}

/// Containment over a polygon set by the nonzero winding rule.
///
/// A point is inside when the summed winding of every polygon around it
/// is positive.
pub fn region_contains(polygons: &[Polygon], point: &Point2) -> bool {
    polygons.iter().map(|p| p.winding_number(point)).sum::<i32>() > 0
}

/// Optimize ordering of polylines to minimize travel moves.
/// Uses nearest-neighbor heuristic.
pub fn optimize_polyline_order(polylines: &mut Vec<Polyline>, from: Point2) {
    reorder_nearest(polylines, from, |p| p.start().copied(), |p| p.end().copied());
}

fn reorder_nearest<T>(
    items: &mut Vec<T>,
    from: Point2,
    start: impl Fn(&T) -> Option<Point2>,
    end: impl Fn(&T) -> Option<Point2>,
) {
    if items.len() < 2 {
        return;
    }

    let mut current_pos = from;
    let mut remaining: Vec<T> = std::mem::take(items);
    while !remaining.is_empty() {
        let best_idx = remaining
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let dist = start(item).map_or(f64::MAX, |p| (current_pos - p).norm());
                (i, dist)
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map_or(0, |(i, _)| i);

        let item = remaining.swap_remove(best_idx);
        if let Some(p) = end(&item) {
            current_pos = p;
        }
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
    }

    #[test]
    fn test_polygon_area() {
        let sq = square(1.0);
        assert!((sq.signed_area() - 1.0).abs() < 1e-10);
        assert!(sq.is_ccw());
        assert!(!sq.reversed().is_ccw());
    }

    #[test]
    fn test_point_in_polygon() {
        let sq = square(10.0);
        assert!(sq.contains(&Point2::new(5.0, 5.0)));
        assert!(!sq.contains(&Point2::new(15.0, 5.0)));
        assert!(!sq.contains(&Point2::new(-1.0, 5.0)));
    }

    #[test]
    fn test_region_with_hole() {
        let outer = Polygon::circle(Point2::origin(), 10.0, 64);
        let hole = Polygon::circle(Point2::origin(), 5.0, 64).reversed();
        let geometry = SliceGeometry::round(vec![outer, hole], Point2::origin());
        assert!(geometry.contains(&Point2::new(7.5, 0.0)));
        assert!(!geometry.contains(&Point2::new(0.0, 0.0)));
        assert!(!geometry.contains(&Point2::new(12.0, 0.0)));
    }

    #[test]
    fn test_overlapping_outers_union() {
        let a = square(10.0);
        let b = Polygon::new(a.points.iter().map(|p| Point2::new(p.x + 5.0, p.y)).collect());
        let geometry = SliceGeometry::from_polygons(vec![a, b]);
        assert!(geometry.contains(&Point2::new(7.5, 5.0)));
        assert!(geometry.contains(&Point2::new(2.5, 5.0)));
        assert!(geometry.contains(&Point2::new(12.5, 5.0)));
        assert!(!geometry.contains(&Point2::new(16.0, 5.0)));
    }

    #[test]
    fn test_winding_number_sign() {
        let sq = square(10.0);
        let p = Point2::new(5.0, 5.0);
        assert_eq!(sq.winding_number(&p), 1);
        assert_eq!(sq.reversed().winding_number(&p), -1);
        assert_eq!(sq.winding_number(&Point2::new(-5.0, 5.0)), 0);
    }

    #[test]
    fn test_as_circle() {
        let c = Point2::new(3.0, 4.0);
        let circle = Polygon::circle(c, 2.5, 48);
        assert!((circle.as_circle(&c).unwrap() - 2.5).abs() < 1e-9);
        assert!(square(4.0).as_circle(&Point2::new(2.0, 2.0)).is_none());
    }

    #[test]
    fn test_merge_drops_disagreeing_centers() {
        let mut a = SliceGeometry::round(vec![Polygon::circle(Point2::origin(), 1.0, 24)], Point2::origin());
        let b = SliceGeometry::round(
            vec![Polygon::circle(Point2::new(5.0, 0.0), 1.0, 24)],
            Point2::new(5.0, 0.0),
        );
        a.merge(b);
        assert_eq!(a.polygons.len(), 2);
        assert!(a.center.is_none());
    }

    #[test]
    fn test_polyline_order() {
        let mut lines = vec![
            Polyline::new(vec![Point2::new(10.0, 0.0), Point2::new(11.0, 0.0)]),
            Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]),
        ];
        optimize_polyline_order(&mut lines, Point2::origin());
        assert_eq!(lines[0].start(), Some(&Point2::new(0.0, 0.0)));
    }
}
