//! Print orchestration.
//!
//! [`generate_composite`] runs the full pipeline over an element tree:
//! normalise, bound, plan every layer in parallel, plan support, then emit
//! layers in Z order while threading the extrusion value. The start block
//! is the only place `E` is reset.

use primslice::motion::{generate_polygon_layer, generate_polyline_path, move_z, ExtrusionProfile};
use primslice::toolpath::{emit_strokes, emit_toolpaths};
use primslice::{
    collect_geometry, element_bounds, generate_infill, plan_region, plan_support, slice_element,
    BisectorOffsetter, Bounds3, Element, InfillSettings, Layer, Polygon, PolygonOffsetter,
    PrinterSettings, RegionToolpaths, SliceGeometry, SlicerError, Stroke, SupportLayer,
    SupportSettings,
};
use primslice_math::Rotation2;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::printer::PrinterProfile;
use crate::stats::PrintStats;

/// A complete print program.
#[derive(Debug, Clone)]
pub struct PrintOutput {
    /// G-code text, start to end block.
    pub gcode: String,
    /// Extrusion value after the last model move.
    pub final_e: f64,
    /// Number of model layers.
    pub layer_count: usize,
    /// Nozzle height of the last layer (mm).
    pub last_z: f64,
    /// Diagnostics that were written as comments.
    pub warnings: Vec<String>,
    /// Print statistics.
    pub stats: PrintStats,
}

/// Everything planned for one layer before emission.
#[derive(Debug, Clone)]
pub struct LayerPlan {
    /// The layer.
    pub layer: Layer,
    /// Model cross-section.
    pub geometry: SliceGeometry,
    /// Shells and infill.
    pub toolpaths: RegionToolpaths,
    /// Line strokes.
    pub strokes: Vec<Stroke>,
    /// Diagnostics for this layer.
    pub warnings: Vec<String>,
}

impl LayerPlan {
    /// Plan one layer of an element tree.
    pub fn build(tree: &Element, layer: Layer, settings: &PrinterSettings) -> Self {
        let collected = collect_geometry(tree, layer.z, settings);
        let toolpaths = if collected.geometry.is_empty() {
            RegionToolpaths::default()
        } else {
            plan_region(&collected.geometry, settings, &layer)
        };
        let mut warnings = collected.warnings;
        warnings.extend(toolpaths.warnings.iter().cloned());
        Self {
            layer,
            geometry: collected.geometry,
            toolpaths,
            strokes: collected.strokes,
            warnings,
        }
    }
}

/// Slice a single primitive.
///
/// Structural elements are handed to [`generate_composite`]. Text and
/// unknown elements are printed as bounding-box placeholders.
pub fn generate_for_element(
    element: &Element,
    settings: &PrinterSettings,
    profile: &PrinterProfile,
) -> Result<PrintOutput> {
    if element.children().is_some() {
        return generate_composite(element, settings, profile);
    }
    settings.validate()?;

    let (element, fallbacks) = element.normalized();
    let mut warnings: Vec<String> = fallbacks.iter().map(ToString::to_string).collect();
    let bounds = resolve_bounds(&element)?;
    let layers = Layer::stack(bounds.min.z, bounds.height(), settings);
    info!(kind = element.kind(), layers = layers.len(), "slicing element");

    let (mut gcode, mut e) = profile.flavor.start_gcode(settings, profile);
    push_warnings(&mut gcode, &warnings);
    if let Some(w) = bed_warning(&bounds, profile) {
        gcode.push_str(&format!("; {w}\n"));
        warnings.push(w);
    }

    let mut last_z = 0.0;
    for layer in &layers {
        gcode.push_str(&profile.flavor.layer_change_gcode(layer));
        gcode.push_str(&move_z(layer.print_z, settings.travel_speed));
        let result = slice_element(&element, settings, layer, e);
        gcode.push_str(&result.gcode);
        e = result.next_e;
        last_z = layer.print_z;
    }

    Ok(finish(gcode, e, layers.len(), last_z, warnings, settings, profile))
}

/// Slice an element tree.
///
/// Fails only when the tree has no extent; every per-layer problem is
/// reported as a comment and the layer continues.
pub fn generate_composite(
    element: &Element,
    settings: &PrinterSettings,
    profile: &PrinterProfile,
) -> Result<PrintOutput> {
    settings.validate()?;

    let (tree, fallbacks) = element.normalized();
    let mut warnings: Vec<String> = Vec::new();
    for fallback in &fallbacks {
        warn!(%fallback, "placeholder substituted");
        warnings.push(fallback.to_string());
    }

    let bounds = resolve_bounds(&tree)?;
    let layers = Layer::stack(bounds.min.z, bounds.height(), settings);
    info!(
        leaves = tree.leaf_count(),
        layers = layers.len(),
        height = bounds.height(),
        "slicing element tree"
    );

    let plans: Vec<LayerPlan> = layers
        .par_iter()
        .map(|layer| LayerPlan::build(&tree, *layer, settings))
        .collect();

    let geometries: Vec<SliceGeometry> = plans.iter().map(|p| p.geometry.clone()).collect();
    let support = plan_support(
        &geometries,
        &bounds.footprint(),
        &SupportSettings::from_printer(settings),
    );

    let (mut gcode, mut e) = profile.flavor.start_gcode(settings, profile);
    push_warnings(&mut gcode, &warnings);
    if let Some(w) = bed_warning(&bounds, profile) {
        gcode.push_str(&format!("; {w}\n"));
        warnings.push(w);
    }

    e = emit_raft(&mut gcode, &bounds, settings, e);

    let mut last_z = 0.0;
    for (plan, support) in plans.iter().zip(&support) {
        if plan.layer.index == 0 {
            e = emit_brim(&mut gcode, &plan.geometry, settings, &plan.layer, e);
        }
        e = emit_layer(&mut gcode, plan, support, settings, profile, e);
        warnings.extend(plan.warnings.iter().cloned());
        last_z = plan.layer.print_z;
    }

    Ok(finish(gcode, e, plans.len(), last_z, warnings, settings, profile))
}

fn resolve_bounds(tree: &Element) -> Result<Bounds3> {
    element_bounds(tree).ok_or_else(|| {
        SlicerError::Unbounded(format!("{} element has no determinable extent", tree.kind())).into()
    })
}

fn bed_warning(bounds: &Bounds3, profile: &PrinterProfile) -> Option<String> {
    if profile.fits(bounds) {
        return None;
    }
    let size = bounds.max - bounds.min;
    warn!(printer = %profile.name, "model exceeds build volume");
    Some(format!(
        "WARNING: model {:.1} x {:.1} x {:.1} mm exceeds {} build volume {:.0} x {:.0} x {:.0} mm",
        size.x, size.y, size.z, profile.name, profile.bed_x, profile.bed_y, profile.bed_z
    ))
}

fn push_warnings(gcode: &mut String, warnings: &[String]) {
    for w in warnings {
        gcode.push_str(&format!("; {w}\n"));
    }
}

/// Emit one planned layer in print order.
fn emit_layer(
    gcode: &mut String,
    plan: &LayerPlan,
    support: &SupportLayer,
    settings: &PrinterSettings,
    profile: &PrinterProfile,
    current_e: f64,
) -> f64 {
    let layer = &plan.layer;
    gcode.push_str(&profile.flavor.layer_change_gcode(layer));
    gcode.push_str(&move_z(layer.print_z, settings.travel_speed));

    let (code, mut e) = emit_toolpaths(&plan.toolpaths, settings, layer, current_e);
    gcode.push_str(&code);

    let (code, next) = emit_strokes(&plan.strokes, settings, layer, e);
    gcode.push_str(&code);
    e = next;

    if !support.is_empty() {
        gcode.push_str("; support\n");
        let support_profile = ExtrusionProfile::support(settings);
        for path in &support.paths {
            let (code, next) = generate_polyline_path(path, layer.print_z, &support_profile, e);
            gcode.push_str(&code);
            e = next;
        }
    }

    push_warnings(gcode, &plan.warnings);
    debug!(
        layer = layer.index,
        z = layer.z,
        shells = plan.toolpaths.shells.len(),
        infill = plan.toolpaths.infill.len(),
        support = support.paths.len(),
        "layer emitted"
    );
    e
}

/// Raft layers under the whole footprint, solid infill alternating
/// direction.
fn emit_raft(gcode: &mut String, bounds: &Bounds3, settings: &PrinterSettings, current_e: f64) -> f64 {
    let mut e = current_e;
    if settings.raft_layers == 0 {
        return e;
    }
    let area = bounds.footprint().expanded(settings.raft_margin);
    let outline = Polygon::rectangle(area.center(), area.width(), area.depth(), &Rotation2::identity());
    let lh = settings.layer_height;

    for k in 0..settings.raft_layers as usize {
        let print_z = (k + 1) as f64 * lh;
        gcode.push_str(&format!("; raft layer {k}\n"));
        gcode.push_str(&move_z(print_z, settings.travel_speed));

        let profile = ExtrusionProfile::model(settings, k);
        let (code, next) = generate_polygon_layer(&outline, print_z, &profile, e);
        gcode.push_str(&code);
        e = next;

        match generate_infill(
            std::slice::from_ref(&outline),
            None,
            &InfillSettings::solid(settings, k),
        ) {
            Ok(infill) => {
                for path in &infill.paths {
                    let (code, next) = generate_polyline_path(path, print_z, &profile, e);
                    gcode.push_str(&code);
                    e = next;
                }
            }
            Err(err) => {
                warn!(error = %err, "raft infill skipped");
                gcode.push_str(&format!("; WARNING: {err}\n"));
            }
        }
    }
    e
}

/// Brim loops around the outer boundaries of the first layer.
fn emit_brim(
    gcode: &mut String,
    geometry: &SliceGeometry,
    settings: &PrinterSettings,
    layer: &Layer,
    current_e: f64,
) -> f64 {
    let mut e = current_e;
    if settings.brim_width <= 0.0 || geometry.is_empty() || settings.raft_layers > 0 {
        return e;
    }
    let loops = (settings.brim_width / settings.extrusion_width).ceil() as usize;
    let profile = ExtrusionProfile::model(settings, layer.index);

    gcode.push_str("; brim\n");
    for outer in geometry.polygons.iter().filter(|p| p.is_ccw()) {
        // Outermost loop first so the nozzle works inward.
        for i in (1..=loops).rev() {
            let distance = -(i as f64) * settings.extrusion_width;
            if let Some(ring) = BisectorOffsetter.offset(outer, distance) {
                let (code, next) = generate_polygon_layer(&ring, layer.print_z, &profile, e);
                gcode.push_str(&code);
                e = next;
            }
        }
    }
    e
}

fn finish(
    mut gcode: String,
    final_e: f64,
    layer_count: usize,
    last_z: f64,
    warnings: Vec<String>,
    settings: &PrinterSettings,
    profile: &PrinterProfile,
) -> PrintOutput {
    gcode.push_str(&profile.flavor.end_gcode(settings, profile, last_z));
    let stats = PrintStats::measure(&gcode, layer_count, settings.filament_diameter);
    info!(
        layers = layer_count,
        filament_mm = stats.filament_mm,
        time_s = stats.print_time_seconds,
        warnings = warnings.len(),
        "print generated"
    );
    PrintOutput {
        gcode,
        final_e,
        layer_count,
        last_z,
        warnings,
        stats,
    }
}
