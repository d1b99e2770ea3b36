//! Sphere cross-sections.

use primslice_math::Point2;

use crate::element::Sphere;
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

use super::circle_segments;

/// Radius of the sphere's slice at height `z`, if the plane cuts it.
pub fn slice_radius(sphere: &Sphere, z: f64) -> Option<f64> {
    let d = (z - sphere.position.z).abs();
    (d <= sphere.radius).then(|| (sphere.radius * sphere.radius - d * d).max(0.0).sqrt())
}

/// Circle of radius `sqrt(R² - d²)` where `d` is the distance from the
/// equator.
pub fn cross_section(sphere: &Sphere, z: f64, settings: &PrinterSettings) -> SliceGeometry {
    match slice_radius(sphere, z) {
        Some(r) if r > settings.extrusion_width / 2.0 => {
            let center = Point2::new(sphere.position.x, sphere.position.y);
            SliceGeometry::round(vec![Polygon::circle(center, r, circle_segments(r))], center)
        }
        _ => SliceGeometry::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use primslice_math::Point3;

    fn sphere() -> Sphere {
        Sphere {
            position: Point3::new(0.0, 0.0, 5.0),
            radius: 5.0,
        }
    }

    #[test]
    fn test_equator_and_poles() {
        let settings = PrinterSettings::default();
        assert_relative_eq!(slice_radius(&sphere(), 5.0).unwrap(), 5.0);
        assert!(cross_section(&sphere(), 0.0, &settings).is_empty());
        assert!(cross_section(&sphere(), 10.0, &settings).is_empty());

        let equator = cross_section(&sphere(), 5.0, &settings);
        let r = equator.polygons[0].as_circle(&Point2::origin()).unwrap();
        assert_relative_eq!(r, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slice_radius_formula() {
        // d = 3 from the equator.
        assert_relative_eq!(slice_radius(&sphere(), 8.0).unwrap(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(slice_radius(&sphere(), 2.0).unwrap(), 4.0, epsilon = 1e-12);
        assert!(slice_radius(&sphere(), 10.5).is_none());
    }

    #[test]
    fn test_near_pole_is_degenerate() {
        // r = sqrt(25 - 4.999²) ≈ 0.1, below half the bead width.
        assert!(cross_section(&sphere(), 9.999, &PrinterSettings::default()).is_empty());
        assert!(!cross_section(&sphere(), 9.99, &PrinterSettings::default()).is_empty());
    }
}
