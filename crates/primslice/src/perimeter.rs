//! Perimeter (shell) generation from layer geometry.

use tracing::trace;

use crate::offset::{BisectorOffsetter, PolygonOffsetter};
use crate::path::{Polygon, SliceGeometry};
use crate::settings::PrinterSettings;

/// One printed shell loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    /// 0 for the outermost shell of its boundary.
    pub index: u32,
    /// Loop to extrude.
    pub polygon: Polygon,
}

/// Result of perimeter generation for a layer.
#[derive(Debug, Clone, Default)]
pub struct LayerPerimeters {
    /// Shell loops in print order, grouped per boundary, outermost first.
    pub shells: Vec<Shell>,
    /// Region left for infill, inset by `shell_count` widths.
    pub infill_boundary: Vec<Polygon>,
}

impl LayerPerimeters {
    /// Total extruded shell length.
    pub fn length(&self) -> f64 {
        self.shells.iter().map(|s| s.polygon.perimeter()).sum()
    }
}

/// Generate shells with the default bisector offsetter.
pub fn generate_perimeters(geometry: &SliceGeometry, settings: &PrinterSettings) -> LayerPerimeters {
    generate_perimeters_with(geometry, settings, &BisectorOffsetter)
}

/// Generate shells with a caller-supplied offsetter.
///
/// Shell `k` lies `k · extrusion_width` inside the boundary, so shell 0
/// traces the boundary itself. A boundary stops producing shells at its
/// first collapsed offset and then contributes no infill region.
pub fn generate_perimeters_with<O>(
    geometry: &SliceGeometry,
    settings: &PrinterSettings,
    offsetter: &O,
) -> LayerPerimeters
where
    O: PolygonOffsetter + ?Sized,
{
    let mut result = LayerPerimeters::default();
    let width = settings.extrusion_width;

    if settings.shell_count == 0 {
        result.infill_boundary = geometry
            .polygons
            .iter()
            .filter(|p| p.len() >= 3)
            .cloned()
            .collect();
        return result;
    }

    let mut collapsed_outers: Vec<&Polygon> = Vec::new();
    let mut boundaries: Vec<(Polygon, &Polygon)> = Vec::new();

    for contour in geometry.polygons.iter().filter(|p| p.len() >= 3) {
        let mut current = contour.clone();
        let mut complete = true;

        for k in 0..settings.shell_count {
            if k > 0 {
                match offsetter.offset(&current, width) {
                    Some(next) => current = next,
                    None => {
                        trace!(shell = k, "shell collapsed");
                        complete = false;
                        break;
                    }
                }
            }
            result.shells.push(Shell {
                index: k,
                polygon: current.clone(),
            });
        }

        match complete.then(|| offsetter.offset(&current, width)).flatten() {
            Some(boundary) => boundaries.push((boundary, contour)),
            None if contour.is_ccw() => collapsed_outers.push(contour),
            None => {}
        }
    }

    // Holes of a filled-in outer loop have nothing left to surround.
    result.infill_boundary = boundaries
        .into_iter()
        .filter(|(_, contour)| {
            contour.is_ccw()
                || !contour
                    .points
                    .first()
                    .is_some_and(|p| collapsed_outers.iter().any(|outer| outer.contains(p)))
        })
        .map(|(boundary, _)| boundary)
        .collect();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use primslice_math::Point2;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
    }

    fn settings(shell_count: u32, width: f64) -> PrinterSettings {
        PrinterSettings {
            shell_count,
            extrusion_width: width,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_shell_traces_boundary() {
        let geometry = SliceGeometry::from_polygons(vec![square(10.0)]);
        let perimeters = generate_perimeters(&geometry, &settings(2, 0.4));
        assert_eq!(perimeters.shells.len(), 2);
        assert_relative_eq!(perimeters.shells[0].polygon.perimeter(), 40.0, epsilon = 1e-9);
        assert_relative_eq!(perimeters.shells[1].polygon.perimeter(), 4.0 * 9.2, epsilon = 1e-9);
        assert_eq!(perimeters.infill_boundary.len(), 1);
        assert_relative_eq!(
            perimeters.infill_boundary[0].signed_area(),
            8.4 * 8.4,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_shells_stop_when_square_collapses() {
        // Side 2, width 0.4: sides 2.0, 1.2, 0.4 then 2 - 2*3*0.4 < 0.
        let geometry = SliceGeometry::from_polygons(vec![square(2.0)]);
        let perimeters = generate_perimeters(&geometry, &settings(6, 0.4));
        assert_eq!(perimeters.shells.len(), 3);
        assert!(perimeters.infill_boundary.is_empty());

        for (k, shell) in perimeters.shells.iter().enumerate() {
            let side = 2.0 - 2.0 * k as f64 * 0.4;
            assert!(side > 0.0);
            assert_relative_eq!(shell.polygon.perimeter(), 4.0 * side, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_exact_collapse_is_discarded() {
        // Side 1.6, width 0.4: shell 2 would have side 0.
        let geometry = SliceGeometry::from_polygons(vec![square(1.6)]);
        let perimeters = generate_perimeters(&geometry, &settings(4, 0.4));
        assert_eq!(perimeters.shells.len(), 2);
    }

    #[test]
    fn test_zero_shells_fill_boundary() {
        let geometry = SliceGeometry::from_polygons(vec![square(5.0)]);
        let perimeters = generate_perimeters(&geometry, &settings(0, 0.4));
        assert!(perimeters.shells.is_empty());
        assert_eq!(perimeters.infill_boundary, vec![square(5.0)]);
    }

    #[test]
    fn test_ring_keeps_hole_boundary() {
        let outer = Polygon::circle(Point2::origin(), 13.0, 128);
        let hole = Polygon::circle(Point2::origin(), 7.0, 128).reversed();
        let geometry = SliceGeometry::round(vec![outer, hole], Point2::origin());
        let perimeters = generate_perimeters(&geometry, &settings(2, 0.4));
        assert_eq!(perimeters.shells.len(), 4);
        assert_eq!(perimeters.infill_boundary.len(), 2);
        assert!(perimeters.infill_boundary.iter().any(|p| !p.is_ccw()));
    }

    #[test]
    fn test_hole_dropped_when_outer_collapses() {
        let outer = square(1.0);
        let hole = Polygon::new(vec![
            Point2::new(0.45, 0.45),
            Point2::new(0.45, 0.55),
            Point2::new(0.55, 0.55),
            Point2::new(0.55, 0.45),
        ]);
        let geometry = SliceGeometry::from_polygons(vec![outer, hole]);
        let perimeters = generate_perimeters(&geometry, &settings(2, 0.4));
        assert!(perimeters.infill_boundary.is_empty());
    }

    struct NeverOffset;
    impl PolygonOffsetter for NeverOffset {
        fn offset(&self, _polygon: &Polygon, _distance: f64) -> Option<Polygon> {
            None
        }
    }

    #[test]
    fn test_custom_offsetter() {
        let geometry = SliceGeometry::from_polygons(vec![square(10.0)]);
        let perimeters = generate_perimeters_with(&geometry, &settings(3, 0.4), &NeverOffset);
        assert_eq!(perimeters.shells.len(), 1);
        assert!(perimeters.infill_boundary.is_empty());
    }
}
