//! Per-primitive slicers.
//!
//! Each family module computes the cross-section of one primitive at a
//! model height. [`slice_element`] turns that cross-section into G-code
//! for one layer through the shared region generator.

pub mod cone;
pub mod cube;
pub mod cylinder;
pub mod ellipsoid;
pub mod line;
pub mod sphere;
pub mod torus;

use std::f64::consts::TAU;

use crate::element::Element;
use crate::motion::{generate_polyline_path, ExtrusionProfile};
use crate::path::SliceGeometry;
use crate::settings::PrinterSettings;
use crate::toolpath::{emit_toolpaths, plan_region};

pub use line::Stroke;

/// Slack on Z range tests (mm).
pub(crate) const Z_EPSILON: f64 = 1e-9;

/// Chord length targeted by circle discretisation (mm).
const CIRCLE_CHORD: f64 = 0.5;

/// Number of segments for a circle of `radius`.
pub fn circle_segments(radius: f64) -> usize {
    ((TAU * radius.abs() / CIRCLE_CHORD).ceil() as usize).clamp(24, 256)
}

/// One print layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    /// 0 for the first model layer.
    pub index: usize,
    /// Model height sampled for geometry (mm).
    pub z: f64,
    /// Nozzle height above the bed (mm).
    pub print_z: f64,
    /// Print infill fully dense on this layer.
    pub solid: bool,
}

impl Layer {
    /// Layer `index` of a model whose lowest point is `min_z`.
    pub fn at(index: usize, min_z: f64, settings: &PrinterSettings) -> Self {
        let lh = settings.layer_height;
        Self {
            index,
            z: min_z + index as f64 * lh,
            print_z: (settings.raft_layers as usize + index + 1) as f64 * lh,
            solid: false,
        }
    }

    /// All layers of a model `height` tall.
    ///
    /// The bottom and top `solid_layers` layers are marked solid.
    pub fn stack(min_z: f64, height: f64, settings: &PrinterSettings) -> Vec<Layer> {
        let count = layer_count(height, settings.layer_height);
        let solid = settings.solid_layers as usize;
        (0..count)
            .map(|i| Layer {
                solid: i < solid || i + solid >= count,
                ..Self::at(i, min_z, settings)
            })
            .collect()
    }
}

/// `max(1, ceil(height / layer_height))`, ignoring float noise.
pub fn layer_count(height: f64, layer_height: f64) -> usize {
    let n = (height / layer_height - 1e-9).ceil();
    if n.is_finite() && n >= 1.0 {
        n as usize
    } else {
        1
    }
}

/// Output of slicing one element at one layer.
#[derive(Debug, Clone, Default)]
pub struct SliceResult {
    /// G-code for the layer (no layer header).
    pub gcode: String,
    /// Extrusion accumulator after this layer.
    pub next_e: f64,
    /// Cross-section that was printed.
    pub geometry: SliceGeometry,
}

/// Cross-section of a single primitive at model height `z`.
///
/// Returns `None` for structural elements, lines and elements that must be
/// normalised first.
pub fn cross_section(element: &Element, z: f64, settings: &PrinterSettings) -> Option<SliceGeometry> {
    let geometry = match element {
        Element::Cube(c) => cube::cross_section(c, z, settings),
        Element::Cylinder(c) => cylinder::cross_section(c, z, settings),
        Element::Sphere(s) => sphere::cross_section(s, z, settings),
        Element::Cone(c) => cone::cross_section(c, z, settings),
        Element::Torus(t) => torus::cross_section(t, z, settings),
        Element::Ellipsoid(e) => ellipsoid::cross_section(e, z, settings),
        _ => return None,
    };
    Some(geometry)
}

/// Slice one primitive at `layer`, threading the extrusion accumulator.
///
/// Shells come first, then infill. Infill problems become `; WARNING:`
/// comments; degenerate slices emit nothing.
pub fn slice_element(
    element: &Element,
    settings: &PrinterSettings,
    layer: &Layer,
    current_e: f64,
) -> SliceResult {
    if let Element::Line(l) = element {
        let Some(stroke) = line::stroke_at(l, layer.z, settings) else {
            return SliceResult {
                next_e: current_e,
                ..Default::default()
            };
        };
        let profile = ExtrusionProfile::model(settings, layer.index).with_width(stroke.width);
        let (gcode, next_e) = generate_polyline_path(&stroke.path, layer.print_z, &profile, current_e);
        return SliceResult {
            gcode,
            next_e,
            geometry: SliceGeometry::empty(),
        };
    }

    let geometry = cross_section(element, layer.z, settings).unwrap_or_default();
    let (gcode, next_e) = emit_region(&geometry, settings, layer, current_e);
    SliceResult {
        gcode,
        next_e,
        geometry,
    }
}

/// Shells and infill for a region, followed by any warning comments.
pub fn emit_region(
    geometry: &SliceGeometry,
    settings: &PrinterSettings,
    layer: &Layer,
    current_e: f64,
) -> (String, f64) {
    if geometry.is_empty() {
        return (String::new(), current_e);
    }
    let toolpaths = plan_region(geometry, settings, layer);
    let (mut gcode, e) = emit_toolpaths(&toolpaths, settings, layer, current_e);
    for warning in &toolpaths.warnings {
        gcode.push_str(&format!("; {warning}\n"));
    }
    (gcode, e)
}
