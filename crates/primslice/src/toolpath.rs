//! Region toolpaths: shells and infill for one layer's cross-section.
//!
//! Planning is pure and runs per layer in parallel; emission threads the
//! extrusion accumulator and runs in layer order.

use primslice_math::Point2;
use tracing::warn;

use crate::infill::{generate_infill, InfillSettings};
use crate::motion::{
    generate_circle_loop, generate_polygon_layer, generate_polyline_path, ExtrusionProfile,
};
use crate::path::{Polyline, SliceGeometry};
use crate::perimeter::{generate_perimeters, Shell};
use crate::primitives::{Layer, Stroke};
use crate::settings::PrinterSettings;

/// Planned paths for a region.
#[derive(Debug, Clone, Default)]
pub struct RegionToolpaths {
    /// Shell loops, outermost first per boundary.
    pub shells: Vec<Shell>,
    /// Infill paths in print order.
    pub infill: Vec<Polyline>,
    /// Natural centre of the region, for arc shells.
    pub center: Option<Point2>,
    /// Diagnostics, without the comment prefix.
    pub warnings: Vec<String>,
}

impl RegionToolpaths {
    /// True if nothing would be extruded.
    pub fn is_empty(&self) -> bool {
        self.shells.is_empty() && self.infill.is_empty()
    }

    /// Extruded path length (mm).
    pub fn length(&self) -> f64 {
        self.shells.iter().map(|s| s.polygon.perimeter()).sum::<f64>()
            + self.infill.iter().map(Polyline::length).sum::<f64>()
    }
}

/// Shells, infill boundary and infill for `geometry` on `layer`.
///
/// An infill failure is recorded as a warning and the shells are kept.
pub fn plan_region(
    geometry: &SliceGeometry,
    settings: &PrinterSettings,
    layer: &Layer,
) -> RegionToolpaths {
    let perimeters = generate_perimeters(geometry, settings);
    let infill_settings = if layer.solid {
        InfillSettings::solid(settings, layer.index)
    } else {
        InfillSettings::for_layer(settings, layer.index)
    };

    let mut warnings = Vec::new();
    let infill = match generate_infill(&perimeters.infill_boundary, geometry.center, &infill_settings) {
        Ok(result) => result.paths,
        Err(e) => {
            warn!(layer = layer.index, error = %e, "skipping infill");
            warnings.push(format!("WARNING: {e}"));
            Vec::new()
        }
    };

    RegionToolpaths {
        shells: perimeters.shells,
        infill,
        center: geometry.center,
        warnings,
    }
}

/// Emit planned shells then infill at the layer's print height.
///
/// Warnings are left to the caller so they can follow every other path on
/// the layer.
pub fn emit_toolpaths(
    toolpaths: &RegionToolpaths,
    settings: &PrinterSettings,
    layer: &Layer,
    current_e: f64,
) -> (String, f64) {
    let profile = ExtrusionProfile::model(settings, layer.index);
    let mut gcode = String::new();
    let mut e = current_e;

    for shell in &toolpaths.shells {
        let arc = settings
            .arc_perimeters
            .then_some(toolpaths.center)
            .flatten()
            .and_then(|c| shell.polygon.as_circle(&c).map(|r| (c, r)));
        let (code, next) = match arc {
            Some((center, radius)) => {
                generate_circle_loop(&center, radius, layer.print_z, &profile, e)
            }
            None => generate_polygon_layer(&shell.polygon, layer.print_z, &profile, e),
        };
        gcode.push_str(&code);
        e = next;
    }

    if !toolpaths.infill.is_empty() {
        gcode.push_str("; infill\n");
        for path in &toolpaths.infill {
            let (code, next) = generate_polyline_path(path, layer.print_z, &profile, e);
            gcode.push_str(&code);
            e = next;
        }
    }

    (gcode, e)
}

/// Emit line strokes, each with its own bead width.
pub fn emit_strokes(
    strokes: &[Stroke],
    settings: &PrinterSettings,
    layer: &Layer,
    current_e: f64,
) -> (String, f64) {
    let base = ExtrusionProfile::model(settings, layer.index);
    strokes.iter().fold((String::new(), current_e), |(mut gcode, e), stroke| {
        let profile = base.with_width(stroke.width);
        let (code, next) = generate_polyline_path(&stroke.path, layer.print_z, &profile, e);
        gcode.push_str(&code);
        (gcode, next)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Polygon;
    use crate::settings::InfillPattern;

    fn disc() -> SliceGeometry {
        SliceGeometry::round(vec![Polygon::circle(Point2::origin(), 5.0, 64)], Point2::origin())
    }

    #[test]
    fn test_arc_perimeters() {
        let settings = PrinterSettings {
            arc_perimeters: true,
            ..Default::default()
        };
        let layer = Layer::at(1, 0.0, &settings);
        let toolpaths = plan_region(&disc(), &settings, &layer);
        let (gcode, e) = emit_toolpaths(&toolpaths, &settings, &layer, 0.0);
        assert_eq!(gcode.lines().filter(|l| l.starts_with("G3")).count(), 2);
        assert!(e > 0.0);
    }

    #[test]
    fn test_solid_layer_overrides_pattern() {
        let settings = PrinterSettings {
            infill_pattern: InfillPattern::Spiral,
            ..Default::default()
        };
        let layer = Layer {
            solid: true,
            ..Layer::at(0, 0.0, &settings)
        };
        let square = SliceGeometry::from_polygons(vec![Polygon::rectangle(
            Point2::origin(),
            10.0,
            10.0,
            &primslice_math::Rotation2::identity(),
        )]);
        let toolpaths = plan_region(&square, &settings, &layer);
        assert!(toolpaths.warnings.is_empty());
        // Spacing 0.4 over an 8.4mm boundary.
        assert!(toolpaths.infill.len() > 15);
    }

    #[test]
    fn test_strokes_use_own_width() {
        let settings = PrinterSettings::default();
        let layer = Layer::at(1, 0.0, &settings);
        let path = Polyline::new(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]);
        let narrow = [Stroke {
            path: path.clone(),
            width: 0.4,
        }];
        let wide = [Stroke { path, width: 0.8 }];
        let (_, e_narrow) = emit_strokes(&narrow, &settings, &layer, 0.0);
        let (_, e_wide) = emit_strokes(&wide, &settings, &layer, 0.0);
        assert!((e_wide - 2.0 * e_narrow).abs() < 1e-12);
    }
}
