//! Cone and frustum cross-sections.

use primslice_math::Point2;

use crate::element::Cone;
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

use super::{circle_segments, Z_EPSILON};

/// Radius at height `z`, interpolated from base to top.
pub fn slice_radius(cone: &Cone, z: f64) -> Option<f64> {
    if cone.height <= 0.0 {
        return None;
    }
    let base = cone.position.z - cone.height / 2.0;
    let progress = (z - base) / cone.height;
    if progress < -Z_EPSILON / cone.height || progress > 1.0 + Z_EPSILON / cone.height {
        return None;
    }
    let progress = progress.clamp(0.0, 1.0);
    Some(cone.radius + (cone.top_radius - cone.radius) * progress)
}

/// Circle of the interpolated radius.
pub fn cross_section(cone: &Cone, z: f64, settings: &PrinterSettings) -> SliceGeometry {
    match slice_radius(cone, z) {
        Some(r) if r > settings.extrusion_width / 2.0 => {
            let center = Point2::new(cone.position.x, cone.position.y);
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

    fn cone(top_radius: f64) -> Cone {
        Cone {
            position: Point3::new(0.0, 0.0, 5.0),
            radius: 4.0,
            top_radius,
            height: 10.0,
        }
    }

    #[test]
    fn test_pointed_cone_tapers() {
        assert_relative_eq!(slice_radius(&cone(0.0), 0.0).unwrap(), 4.0);
        assert_relative_eq!(slice_radius(&cone(0.0), 5.0).unwrap(), 2.0);
        assert_relative_eq!(slice_radius(&cone(0.0), 7.5).unwrap(), 1.0);
        assert!(slice_radius(&cone(0.0), 11.0).is_none());
    }

    #[test]
    fn test_frustum() {
        assert_relative_eq!(slice_radius(&cone(2.0), 10.0).unwrap(), 2.0);
        assert_relative_eq!(slice_radius(&cone(2.0), 5.0).unwrap(), 3.0);
    }

    #[test]
    fn test_tip_is_degenerate() {
        let settings = PrinterSettings::default();
        assert!(cross_section(&cone(0.0), 9.8, &settings).is_empty());
        assert!(!cross_section(&cone(0.0), 0.0, &settings).is_empty());
    }
}
