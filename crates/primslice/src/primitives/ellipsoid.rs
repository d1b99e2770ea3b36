//! Ellipsoid cross-sections.

use primslice_math::Point2;

use crate::bounds::z_rotation;
use crate::element::Ellipsoid;
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

use super::circle_segments;

/// Semi-axes of the slice at height `z`.
pub fn slice_axes(ellipsoid: &Ellipsoid, z: f64) -> Option<(f64, f64)> {
    if ellipsoid.radius_z <= 0.0 {
        return None;
    }
    let dz = z - ellipsoid.position.z;
    if dz.abs() > ellipsoid.radius_z {
        return None;
    }
    let s = (1.0 - (dz / ellipsoid.radius_z).powi(2)).max(0.0).sqrt();
    Some((ellipsoid.radius_x.abs() * s, ellipsoid.radius_y.abs() * s))
}

/// Scaled, rotated ellipse.
pub fn cross_section(ellipsoid: &Ellipsoid, z: f64, settings: &PrinterSettings) -> SliceGeometry {
    let Some((rx, ry)) = slice_axes(ellipsoid, z) else {
        return SliceGeometry::empty();
    };
    if rx.min(ry) <= settings.extrusion_width / 2.0 {
        return SliceGeometry::empty();
    }

    let center = Point2::new(ellipsoid.position.x, ellipsoid.position.y);
    let rotation = z_rotation(&ellipsoid.position, ellipsoid.rotation);
    SliceGeometry::round(
        vec![Polygon::ellipse(center, rx, ry, circle_segments(rx.max(ry)), &rotation)],
        center,
    )
}
