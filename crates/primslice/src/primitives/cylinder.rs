//! Cylinder cross-sections.

use primslice_math::Point2;

use crate::element::Cylinder;
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

use super::{circle_segments, Z_EPSILON};

/// Circle of the cylinder's radius anywhere within its height.
pub fn cross_section(cylinder: &Cylinder, z: f64, settings: &PrinterSettings) -> SliceGeometry {
    let base = cylinder.position.z - cylinder.height / 2.0;
    if z < base - Z_EPSILON || z > base + cylinder.height + Z_EPSILON {
        return SliceGeometry::empty();
    }
    if cylinder.radius <= settings.extrusion_width / 2.0 {
        return SliceGeometry::empty();
    }

    let center = Point2::new(cylinder.position.x, cylinder.position.y);
    SliceGeometry::round(
        vec![Polygon::circle(
            center,
            cylinder.radius,
            circle_segments(cylinder.radius),
        )],
        center,
    )
}
