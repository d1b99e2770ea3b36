//! Line strokes.

use primslice_math::Point2;

use crate::element::Line;
use crate::path::Polyline;
use crate::settings::PrinterSettings;

use super::Z_EPSILON;

/// A two-point extrusion with its own bead width.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Path in the XY plane.
    pub path: Polyline,
    /// Bead width (mm).
    pub width: f64,
}

/// The line's XY projection as a stroke.
pub fn stroke(line: &Line) -> Stroke {
    Stroke {
        path: Polyline::new(vec![
            Point2::new(line.start.x, line.start.y),
            Point2::new(line.end.x, line.end.y),
        ]),
        width: line.width,
    }
}

/// The stroke, if layer `z` falls in the line's vertical span.
///
/// A flat line occupies one layer height above its Z.
pub fn stroke_at(line: &Line, z: f64, settings: &PrinterSettings) -> Option<Stroke> {
    let low = line.start.z.min(line.end.z);
    let high = line.start.z.max(line.end.z).max(low + settings.layer_height);
    (z >= low - Z_EPSILON && z < high - Z_EPSILON).then(|| stroke(line))
}
