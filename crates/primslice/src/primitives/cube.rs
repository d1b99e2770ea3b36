//! Box cross-sections.

use primslice_math::Point2;

use crate::bounds::z_rotation;
use crate::element::Cube;
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

use super::Z_EPSILON;

/// Rectangle of the box at height `z`, rotated about the box centre.
pub fn cross_section(cube: &Cube, z: f64, settings: &PrinterSettings) -> SliceGeometry {
    let base = cube.position.z - cube.height / 2.0;
    if z < base - Z_EPSILON || z > base + cube.height + Z_EPSILON {
        return SliceGeometry::empty();
    }
    if cube.width.min(cube.depth) / 2.0 <= settings.extrusion_width / 2.0 {
        return SliceGeometry::empty();
    }

    let center = Point2::new(cube.position.x, cube.position.y);
    let rotation = z_rotation(&cube.position, cube.rotation);
    SliceGeometry::from_polygons(vec![Polygon::rectangle(
        center,
        cube.width,
        cube.depth,
        &rotation,
    )])
}
