//! Torus cross-sections: a ring with a hole.

use primslice_math::Point2;

use crate::element::Torus;
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

use super::circle_segments;

/// Outer and inner radii of the ring at height `z`.
///
/// The inner radius is zero when the tube closes over the centre.
pub fn ring_radii(torus: &Torus, z: f64) -> Option<(f64, f64)> {
    let d = (z - torus.position.z).abs();
    if d > torus.tube_radius {
        return None;
    }
    let m = (torus.tube_radius * torus.tube_radius - d * d).max(0.0).sqrt();
    Some((torus.major_radius + m, (torus.major_radius - m).max(0.0)))
}

/// Outer circle plus, when the ring has one, a clockwise hole.
pub fn cross_section(torus: &Torus, z: f64, settings: &PrinterSettings) -> SliceGeometry {
    let Some((outer, inner)) = ring_radii(torus, z) else {
        return SliceGeometry::empty();
    };
    if (outer - inner) / 2.0 <= settings.extrusion_width / 2.0 {
        return SliceGeometry::empty();
    }

    let center = Point2::new(torus.position.x, torus.position.y);
    let mut polygons = vec![Polygon::circle(center, outer, circle_segments(outer))];
    if inner > 0.0 {
        polygons.push(Polygon::circle(center, inner, circle_segments(inner)).reversed());
    }
    SliceGeometry::round(polygons, center)
}
