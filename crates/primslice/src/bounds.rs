//! Element bounds resolver.
//!
//! Closed-form extents for every primitive and unions over composite
//! subtrees. Used to size the layer loop, prune subtrees per layer and
//! lay out the support grid.

use primslice_math::{Point2, Point3, Rotation2};
use tracing::warn;

use crate::element::Element;
use crate::path::Bounds2;

/// Axis-aligned 3D bounds (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bounds3 {
    /// Bounds centred on `center` with the given half extents.
    pub fn centered(center: &Point3, hx: f64, hy: f64, hz: f64) -> Self {
        Self {
            min: Point3::new(center.x - hx, center.y - hy, center.z - hz),
            max: Point3::new(center.x + hx, center.y + hy, center.z + hz),
        }
    }

    /// Smallest bounds containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.max.z - self.min.z
    }

    /// Is `z` within the vertical range, widened by `tolerance` each side?
    pub fn contains_z(&self, z: f64, tolerance: f64) -> bool {
        z >= self.min.z - tolerance && z <= self.max.z + tolerance
    }

    /// Footprint in the XY plane.
    pub fn footprint(&self) -> Bounds2 {
        Bounds2 {
            min: Point2::new(self.min.x, self.min.y),
            max: Point2::new(self.max.x, self.max.y),
        }
    }
}

/// Half extents along X and Y of a `width` × `depth` rectangle rotated by
/// `degrees` about its centre.
fn rotated_half_extents(width: f64, depth: f64, degrees: f64) -> (f64, f64) {
    let (s, c) = degrees.to_radians().sin_cos();
    let (hw, hd) = (width / 2.0, depth / 2.0);
    (
        hw * c.abs() + hd * s.abs(),
        hw * s.abs() + hd * c.abs(),
    )
}

/// Half extents of an ellipse with semi-axes `rx`, `ry` rotated by `degrees`.
fn rotated_ellipse_half_extents(rx: f64, ry: f64, degrees: f64) -> (f64, f64) {
    let (s, c) = degrees.to_radians().sin_cos();
    (
        ((rx * c).powi(2) + (ry * s).powi(2)).sqrt(),
        ((rx * s).powi(2) + (ry * c).powi(2)).sqrt(),
    )
}

/// Compute the bounds of an element or of a whole subtree.
///
/// Returns `None` for an empty composite and for unsupported elements;
/// callers must not guess a box in their place.
pub fn element_bounds(element: &Element) -> Option<Bounds3> {
    match element {
        Element::Cube(c) => {
            let (hx, hy) = rotated_half_extents(c.width, c.depth, c.rotation);
            Some(Bounds3::centered(&c.position, hx, hy, c.height / 2.0))
        }
        Element::Cylinder(c) => Some(Bounds3::centered(
            &c.position,
            c.radius,
            c.radius,
            c.height / 2.0,
        )),
        Element::Sphere(s) => Some(Bounds3::centered(&s.position, s.radius, s.radius, s.radius)),
        Element::Cone(c) => {
            let r = c.radius.max(c.top_radius);
            Some(Bounds3::centered(&c.position, r, r, c.height / 2.0))
        }
        Element::Torus(t) => {
            let r = t.major_radius + t.tube_radius;
            Some(Bounds3::centered(&t.position, r, r, t.tube_radius))
        }
        Element::Ellipsoid(e) => {
            let (hx, hy) = rotated_ellipse_half_extents(e.radius_x, e.radius_y, e.rotation);
            Some(Bounds3::centered(&e.position, hx, hy, e.radius_z))
        }
        Element::Line(l) => {
            let half = l.width / 2.0;
            Some(Bounds3 {
                min: Point3::new(
                    l.start.x.min(l.end.x) - half,
                    l.start.y.min(l.end.y) - half,
                    l.start.z.min(l.end.z),
                ),
                max: Point3::new(
                    l.start.x.max(l.end.x) + half,
                    l.start.y.max(l.end.y) + half,
                    l.start.z.max(l.end.z).max(l.start.z.min(l.end.z) + half),
                ),
            })
        }
        Element::Text(t) => {
            let (hx, hy) = rotated_half_extents(t.approximate_width(), t.font_size, t.rotation);
            Some(Bounds3::centered(&t.position, hx, hy, t.height / 2.0))
        }
        Element::Composite(g) | Element::Component(g) | Element::Group(g) => g
            .children
            .iter()
            .filter_map(element_bounds)
            .reduce(|a, b| a.union(&b)),
        Element::Unsupported(u) => {
            warn!(kind = %u.kind, "cannot bound unsupported element");
            None
        }
    }
}

/// Rotation of a primitive's cross-section about its own centre.
pub(crate) fn z_rotation(center: &Point3, degrees: f64) -> Rotation2 {
    if degrees == 0.0 {
        Rotation2::identity()
    } else {
        Rotation2::about(Point2::new(center.x, center.y), degrees)
    }
}
