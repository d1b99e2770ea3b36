//! Infill pattern generation.
//!
//! Every pattern is built as unclipped lines or curves over the region's
//! bounding box and then clipped against the region polygons with the
//! nonzero winding rule. Overlapping outer loops union and clockwise holes
//! split paths into disjoint pieces.

use std::f64::consts::{PI, TAU};

use primslice_math::{Point2, Rotation2};

use crate::error::InfillError;
use crate::path::{optimize_polyline_order, region_contains, Bounds2, Polygon, Polyline};
use crate::settings::{InfillPattern, PrinterSettings};

/// Spacing floor between adjacent infill lines (mm).
pub const MIN_INFILL_SPACING: f64 = 0.05;

/// Maximum scanlines per line family.
pub const MAX_SCANLINES: usize = 20_000;

/// Angular resolution target for rings and spirals (mm of arc).
const CURVE_STEP: f64 = 0.5;

/// Settings for infill generation.
#[derive(Debug, Clone, Copy)]
pub struct InfillSettings {
    /// Infill pattern.
    pub pattern: InfillPattern,
    /// Infill density (0 to 100).
    pub density: f64,
    /// Line width (mm).
    pub line_width: f64,
    /// Layer index (for alternating patterns).
    pub layer_index: usize,
}

impl InfillSettings {
    /// Model infill for a layer, as configured.
    pub fn for_layer(settings: &PrinterSettings, layer_index: usize) -> Self {
        Self {
            pattern: settings.infill_pattern,
            density: settings.infill_density,
            line_width: settings.extrusion_width,
            layer_index,
        }
    }

    /// Fully dense infill for a layer, alternating direction.
    pub fn solid(settings: &PrinterSettings, layer_index: usize) -> Self {
        Self {
            pattern: InfillPattern::Solid,
            density: 100.0,
            ..Self::for_layer(settings, layer_index)
        }
    }

    /// Distance between adjacent lines (mm).
    ///
    /// Solid infill ignores density.
    pub fn spacing(&self) -> f64 {
        let spacing = match self.pattern {
            InfillPattern::Solid => self.line_width,
            _ if self.density <= 0.0 => f64::INFINITY,
            _ => self.line_width / (self.density.min(100.0) / 100.0),
        };
        spacing.max(MIN_INFILL_SPACING)
    }

    fn is_odd_layer(&self) -> bool {
        self.layer_index % 2 == 1
    }
}

impl Default for InfillSettings {
    fn default() -> Self {
        Self {
            pattern: InfillPattern::Lines,
            density: 20.0,
            line_width: 0.4,
            layer_index: 0,
        }
    }
}

/// Result of infill generation.
#[derive(Debug, Clone, Default)]
pub struct InfillResult {
    /// Infill paths (open polylines) in print order.
    pub paths: Vec<Polyline>,
}

impl InfillResult {
    /// Total path length.
    pub fn length(&self) -> f64 {
        self.paths.iter().map(Polyline::length).sum()
    }
}

/// Generate infill for a region bounded by polygons.
///
/// `center` is the natural centre of a round region; circular and spiral
/// patterns fail without it.
pub fn generate_infill(
    boundaries: &[Polygon],
    center: Option<Point2>,
    settings: &InfillSettings,
) -> Result<InfillResult, InfillError> {
    let boundaries: Vec<Polygon> = boundaries.iter().filter(|p| p.len() >= 3).cloned().collect();
    if boundaries.is_empty() || (settings.density <= 0.0 && settings.pattern != InfillPattern::Solid)
    {
        return Ok(InfillResult::default());
    }

    let spacing = settings.spacing();
    let paths = match settings.pattern {
        InfillPattern::Lines | InfillPattern::Solid => {
            let angle = if settings.is_odd_layer() { 90.0 } else { 0.0 };
            clip_scanlines(&boundaries, angle, spacing, 0.0)?
        }
        InfillPattern::Grid => {
            let mut paths = clip_scanlines(&boundaries, 0.0, spacing, 0.0)?;
            paths.extend(clip_scanlines(&boundaries, 90.0, spacing, 0.0)?);
            paths
        }
        InfillPattern::Triangular => {
            let phase = if settings.is_odd_layer() { spacing / 2.0 } else { 0.0 };
            let mut paths = clip_scanlines(&boundaries, 45.0, spacing, phase)?;
            paths.extend(clip_scanlines(&boundaries, -45.0, spacing, phase)?);
            paths
        }
        InfillPattern::Honeycomb => honeycomb(&boundaries, spacing, settings.is_odd_layer())?,
        InfillPattern::Circular => {
            let c = require_center(center, settings.pattern)?;
            concentric(&boundaries, c, spacing)?
        }
        InfillPattern::Spiral => {
            let c = require_center(center, settings.pattern)?;
            spiral(&boundaries, c, spacing)?
        }
    };

    Ok(InfillResult { paths })
}

fn require_center(center: Option<Point2>, pattern: InfillPattern) -> Result<Point2, InfillError> {
    center.ok_or_else(|| InfillError::UnsupportedPattern {
        pattern: pattern.name(),
        reason: "region has no natural centre".into(),
    })
}

fn check_line_budget(extent: f64, spacing: f64) -> Result<(), InfillError> {
    let lines = (extent / spacing).ceil().max(0.0) as usize;
    if lines > MAX_SCANLINES {
        return Err(InfillError::TooDense {
            spacing,
            lines,
            limit: MAX_SCANLINES,
        });
    }
    Ok(())
}

/// Parallel scanlines at `angle_deg`, clipped to the region.
///
/// Lines are `spacing` apart, offset by `phase`, and traversed back and
/// forth so consecutive lines start near the previous end.
pub fn clip_scanlines(
    boundaries: &[Polygon],
    angle_deg: f64,
    spacing: f64,
    phase: f64,
) -> Result<Vec<Polyline>, InfillError> {
    // Work in a frame where scanlines are horizontal.
    let to_frame = Rotation2::radians(-angle_deg.to_radians());
    let from_frame = to_frame.inverse();
    let rotated: Vec<Vec<Point2>> = boundaries
        .iter()
        .map(|p| p.points.iter().map(|q| to_frame.apply(q)).collect())
        .collect();

    let Some(bounds) = Bounds2::from_points(rotated.iter().flatten()) else {
        return Ok(Vec::new());
    };
    check_line_budget(bounds.depth(), spacing)?;

    let mut paths = Vec::new();
    let mut row = 0usize;
    let start = (bounds.min.y / spacing).floor() * spacing + phase.rem_euclid(spacing);
    let mut y = start;
    while y <= bounds.max.y {
        if y > bounds.min.y {
            let mut segments: Vec<Polyline> = inside_spans(&rotated, y)
                .into_iter()
                .map(|(x0, x1)| {
                    Polyline::new(vec![
                        from_frame.apply(&Point2::new(x0, y)),
                        from_frame.apply(&Point2::new(x1, y)),
                    ])
                })
                .collect();

            if !segments.is_empty() {
                if row % 2 == 1 {
                    segments.reverse();
                    segments.iter_mut().for_each(Polyline::reverse);
                }
                paths.extend(segments);
                row += 1;
            }
        }
        y += spacing;
    }

    Ok(paths)
}

/// Crossings of the horizontal line at `y` with polygon edges, as X
/// positions with the winding change seen when passing left to right.
///
/// Half-open edge rule: a vertex exactly on the line is counted once.
fn scanline_crossings(polygons: &[Vec<Point2>], y: f64) -> Vec<(f64, i32)> {
    let mut xs = Vec::new();
    for poly in polygons {
        let n = poly.len();
        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            if (a.y > y) != (b.y > y) {
                let t = (y - a.y) / (b.y - a.y);
                // Downward edges open a counter-clockwise loop.
                let delta = if b.y < a.y { 1 } else { -1 };
                xs.push((a.x + t * (b.x - a.x), delta));
            }
        }
    }
    xs
}

/// Spans of the line at `y` where the nonzero winding is positive.
fn inside_spans(polygons: &[Vec<Point2>], y: f64) -> Vec<(f64, f64)> {
    let mut crossings = scanline_crossings(polygons, y);
    crossings.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut spans = Vec::new();
    let mut winding = 0;
    let mut start = 0.0;
    for (x, delta) in crossings {
        let before = winding;
        winding += delta;
        if before <= 0 && winding > 0 {
            start = x;
        } else if before > 0 && winding <= 0 && x - start > 1e-9 {
            spans.push((start, x));
        }
    }
    spans
}

/// Clip an arbitrary path to the region, returning the inside pieces.
pub fn clip_polyline(points: &[Point2], boundaries: &[Polygon]) -> Vec<Polyline> {
    let mut pieces: Vec<Polyline> = Vec::new();
    let mut current: Vec<Point2> = Vec::new();

    for w in points.windows(2) {
        let (p, q) = (w[0], w[1]);
        let mut ts = vec![0.0, 1.0];
        ts.extend(segment_crossings(&p, &q, boundaries));
        ts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        for span in ts.windows(2) {
            let a = p + (q - p) * span[0];
            let b = p + (q - p) * span[1];
            let mid = p + (q - p) * ((span[0] + span[1]) / 2.0);
            if region_contains(boundaries, &mid) {
                if current.last().is_none_or(|last| (last - a).norm() > 1e-9) {
                    flush(&mut current, &mut pieces);
                    current.push(a);
                }
                current.push(b);
            } else {
                flush(&mut current, &mut pieces);
            }
        }
    }
    flush(&mut current, &mut pieces);
    pieces
}

fn flush(current: &mut Vec<Point2>, pieces: &mut Vec<Polyline>) {
    if current.len() >= 2 {
        pieces.push(Polyline::new(std::mem::take(current)));
    } else {
        current.clear();
    }
}

/// Parameters in (0, 1) where `p`-`q` crosses a boundary edge.
fn segment_crossings(p: &Point2, q: &Point2, boundaries: &[Polygon]) -> Vec<f64> {
    let d = q - p;
    let mut ts = Vec::new();
    for poly in boundaries {
        let n = poly.points.len();
        for i in 0..n {
            let a = poly.points[i];
            let e = poly.points[(i + 1) % n] - a;
            let cross = d.x * e.y - d.y * e.x;
            if cross.abs() < 1e-12 {
                continue;
            }
            let diff = a - p;
            let t = (diff.x * e.y - diff.y * e.x) / cross;
            let s = (diff.x * d.y - diff.y * d.x) / cross;
            if t > 0.0 && t < 1.0 && (0.0..=1.0).contains(&s) {
                ts.push(t);
            }
        }
    }
    ts
}

/// Pointy-top hexagonal tessellation.
///
/// Hex side is `spacing · 2/√3` so the line length per unit area matches
/// the parallel-line patterns. Each row boundary is a zigzag; vertical
/// edges join neighbouring zigzags. Odd layers shift by half a hex width.
fn honeycomb(
    boundaries: &[Polygon],
    spacing: f64,
    odd_layer: bool,
) -> Result<Vec<Polyline>, InfillError> {
    let Some(bounds) = Bounds2::from_points(boundaries.iter().flat_map(|p| p.points.iter())) else {
        return Ok(Vec::new());
    };

    let side = spacing * 2.0 / 3.0_f64.sqrt();
    let hex_width = 3.0_f64.sqrt() * side;
    let row_pitch = 1.5 * side;
    check_line_budget(bounds.depth(), row_pitch)?;
    check_line_budget(bounds.width(), hex_width / 2.0)?;

    let layer_shift = if odd_layer { hex_width / 2.0 } else { 0.0 };
    let x0 = (bounds.min.x / hex_width).floor() * hex_width - hex_width + layer_shift;
    let columns = ((bounds.max.x - x0) / (hex_width / 2.0)).ceil() as usize + 2;
    let first_row = (bounds.min.y / row_pitch).floor() as i64 - 1;
    let last_row = (bounds.max.y / row_pitch).ceil() as i64 + 1;

    // Row j hexes are centred at y = j·row_pitch; odd rows shift by half a hex.
    let row_offset = |j: i64| if j.rem_euclid(2) == 1 { hex_width / 2.0 } else { 0.0 };

    let mut paths = Vec::new();
    for (n, j) in (first_row..=last_row).enumerate() {
        let cy = j as f64 * row_pitch;
        let low = cy + side / 2.0;
        let high = cy + side;

        // Zigzag between row j and row j+1: peaks at row j hex tops.
        let mut zigzag: Vec<Point2> = (0..columns)
            .map(|k| {
                let x = x0 + k as f64 * hex_width / 2.0;
                let rel = (x - row_offset(j) - x0) / (hex_width / 2.0);
                let is_peak = (rel.round() as i64).rem_euclid(2) == 0;
                Point2::new(x, if is_peak { high } else { low })
            })
            .collect();
        if n % 2 == 1 {
            zigzag.reverse();
        }
        paths.extend(clip_polyline(&zigzag, boundaries));

        // Vertical edges of row j: between its hexes, below the zigzag.
        let mut x = x0 + row_offset(j) + hex_width / 2.0;
        while x <= bounds.max.x + hex_width {
            let edge = [Point2::new(x, cy - side / 2.0), Point2::new(x, cy + side / 2.0)];
            paths.extend(clip_polyline(&edge, boundaries));
            x += hex_width;
        }
    }

    let start = paths
        .first()
        .and_then(|p| p.start().copied())
        .unwrap_or(bounds.min);
    optimize_polyline_order(&mut paths, start);
    Ok(paths)
}

/// Largest distance from `center` to a region vertex.
fn max_radius(boundaries: &[Polygon], center: &Point2) -> f64 {
    boundaries
        .iter()
        .flat_map(|p| p.points.iter())
        .map(|p| (p - center).norm())
        .fold(0.0, f64::max)
}

/// Concentric rings about `center`, outermost first.
fn concentric(
    boundaries: &[Polygon],
    center: Point2,
    spacing: f64,
) -> Result<Vec<Polyline>, InfillError> {
    let r_max = max_radius(boundaries, &center);
    check_line_budget(r_max, spacing)?;

    let mut paths = Vec::new();
    let mut radius = r_max - spacing / 2.0;
    while radius > spacing / 2.0 {
        let segments = ((TAU * radius / CURVE_STEP).ceil() as usize).clamp(24, 1024);
        let mut ring: Vec<Point2> = Polygon::circle(center, radius, segments).points;
        ring.push(ring[0]);
        paths.extend(clip_polyline(&ring, boundaries));
        radius -= spacing;
    }
    Ok(paths)
}

/// A single Archimedean spiral from `center` outward with pitch `spacing`.
fn spiral(boundaries: &[Polygon], center: Point2, spacing: f64) -> Result<Vec<Polyline>, InfillError> {
    let r_max = max_radius(boundaries, &center);
    check_line_budget(r_max, spacing)?;

    let b = spacing / TAU;
    let mut points = vec![center];
    if r_max <= spacing {
        return Ok(Vec::new());
    }
    let mut theta: f64 = 0.0;
    loop {
        let r = b * theta;
        if r > r_max - spacing / 2.0 {
            break;
        }
        // Step so each chord is about CURVE_STEP long.
        theta += (CURVE_STEP / r.max(spacing / 2.0)).min(PI / 8.0);
        let r = b * theta;
        points.push(Point2::new(center.x + r * theta.cos(), center.y + r * theta.sin()));
    }
    Ok(clip_polyline(&points, boundaries))
}
