//! Motion and extrusion primitives.
//!
//! Every function that emits extrusion takes the current extrusion
//! accumulator `E` and returns the G-code text together with the new `E`.
//! Callers fold these pairs in print order; nothing here keeps state.

use std::f64::consts::PI;

use primslice_math::Point2;

use crate::path::{Polygon, Polyline};
use crate::settings::PrinterSettings;

/// Segments shorter than this are not emitted (mm).
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Filament length needed to lay a bead of `length` × `width` × `layer_height`.
///
/// Linear in `length`; zero or negative length yields zero.
pub fn calculate_extrusion(
    length: f64,
    layer_height: f64,
    width: f64,
    filament_diameter: f64,
) -> f64 {
    if length <= 0.0 || filament_diameter <= 0.0 {
        return 0.0;
    }
    let filament_area = PI * (filament_diameter / 2.0).powi(2);
    length * layer_height * width / filament_area
}

/// Format a coordinate with three decimals.
pub fn fmt_coord(value: f64) -> String {
    // Avoid "-0.000".
    let v = if value.abs() < 5e-4 { 0.0 } else { value };
    format!("{:.3}", v)
}

/// Format an extrusion value with five decimals.
pub fn fmt_e(value: f64) -> String {
    format!("{:.5}", value)
}

/// Feed rate in mm/min from mm/s.
fn feed(speed_mm_s: f64) -> String {
    format!("{:.0}", speed_mm_s * 60.0)
}

/// Travel move (`G0`), optionally including Z.
pub fn move_to(point: &Point2, z: Option<f64>, speed_mm_s: f64) -> String {
    match z {
        Some(z) => format!(
            "G0 X{} Y{} Z{} F{}\n",
            fmt_coord(point.x),
            fmt_coord(point.y),
            fmt_coord(z),
            feed(speed_mm_s)
        ),
        None => format!(
            "G0 X{} Y{} F{}\n",
            fmt_coord(point.x),
            fmt_coord(point.y),
            feed(speed_mm_s)
        ),
    }
}

/// Vertical move to `z`.
pub fn move_z(z: f64, speed_mm_s: f64) -> String {
    format!("G0 Z{} F{}\n", fmt_coord(z), feed(speed_mm_s))
}

/// Extrusion move (`G1`) to `point`, ending at accumulator value `e`.
pub fn extrude_to(point: &Point2, e: f64, speed_mm_s: f64) -> String {
    format!(
        "G1 X{} Y{} E{} F{}\n",
        fmt_coord(point.x),
        fmt_coord(point.y),
        fmt_e(e),
        feed(speed_mm_s)
    )
}

/// Arc direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    /// `G2`.
    Clockwise,
    /// `G3`.
    CounterClockwise,
}

/// Arc move (`G2`/`G3`) to `end` about `center`, ending at `e`.
pub fn arc_to(
    from: &Point2,
    end: &Point2,
    center: &Point2,
    direction: ArcDirection,
    e: f64,
    speed_mm_s: f64,
) -> String {
    let code = match direction {
        ArcDirection::Clockwise => "G2",
        ArcDirection::CounterClockwise => "G3",
    };
    format!(
        "{} X{} Y{} I{} J{} E{} F{}\n",
        code,
        fmt_coord(end.x),
        fmt_coord(end.y),
        fmt_coord(center.x - from.x),
        fmt_coord(center.y - from.y),
        fmt_e(e),
        feed(speed_mm_s)
    )
}

/// Bead geometry and speeds for one kind of extrusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrusionProfile {
    /// Bead height (mm).
    pub layer_height: f64,
    /// Bead width (mm).
    pub width: f64,
    /// Filament diameter (mm).
    pub filament_diameter: f64,
    /// Extrusion multiplier.
    pub flow: f64,
    /// Extrusion speed (mm/s).
    pub print_speed: f64,
    /// Travel speed (mm/s).
    pub travel_speed: f64,
}

impl ExtrusionProfile {
    /// Model perimeters and infill on the given layer.
    pub fn model(settings: &PrinterSettings, layer_index: usize) -> Self {
        Self {
            layer_height: settings.layer_height,
            width: settings.extrusion_width,
            filament_diameter: settings.filament_diameter,
            flow: 1.0,
            print_speed: settings.speed_for_layer(layer_index),
            travel_speed: settings.travel_speed,
        }
    }

    /// Support material.
    pub fn support(settings: &PrinterSettings) -> Self {
        Self {
            flow: settings.support_flow,
            print_speed: settings.support_speed,
            ..Self::model(settings, 1)
        }
    }

    /// Same profile with a different bead width.
    pub fn with_width(self, width: f64) -> Self {
        Self { width, ..self }
    }

    /// Filament needed for a segment of `length`.
    pub fn extrusion_for(&self, length: f64) -> f64 {
        calculate_extrusion(length, self.layer_height, self.width, self.filament_diameter)
            * self.flow
    }
}

/// Emit a closed loop: travel to the first vertex, then extrude around the
/// polygon and back to the start.
///
/// Returns `(gcode, next_e)`. Polygons with fewer than 3 vertices emit
/// nothing.
pub fn generate_polygon_layer(
    polygon: &Polygon,
    z: f64,
    profile: &ExtrusionProfile,
    current_e: f64,
) -> (String, f64) {
    if polygon.len() < 3 {
        return (String::new(), current_e);
    }
    let mut closed = polygon.points.clone();
    closed.push(polygon.points[0]);
    emit_path(&closed, z, profile, current_e)
}

/// Emit an open path.
pub fn generate_polyline_path(
    polyline: &Polyline,
    z: f64,
    profile: &ExtrusionProfile,
    current_e: f64,
) -> (String, f64) {
    if polyline.len() < 2 {
        return (String::new(), current_e);
    }
    emit_path(&polyline.points, z, profile, current_e)
}

fn emit_path(points: &[Point2], z: f64, profile: &ExtrusionProfile, current_e: f64) -> (String, f64) {
    let mut gcode = String::new();
    let mut e = current_e;
    let mut last = points[0];
    let mut started = false;

    for p in &points[1..] {
        let segment_length = (p - last).norm();
        if segment_length <= MIN_SEGMENT_LENGTH {
            continue;
        }
        if !started {
            gcode.push_str(&move_to(&points[0], Some(z), profile.travel_speed));
            started = true;
        }
        e += profile.extrusion_for(segment_length);
        gcode.push_str(&extrude_to(p, e, profile.print_speed));
        last = *p;
    }

    (gcode, e)
}

/// Emit a full circle as a single counter-clockwise arc.
pub fn generate_circle_loop(
    center: &Point2,
    radius: f64,
    z: f64,
    profile: &ExtrusionProfile,
    current_e: f64,
) -> (String, f64) {
    if radius <= MIN_SEGMENT_LENGTH {
        return (String::new(), current_e);
    }
    let start = Point2::new(center.x + radius, center.y);
    let e = current_e + profile.extrusion_for(2.0 * PI * radius);
    let mut gcode = move_to(&start, Some(z), profile.travel_speed);
    gcode.push_str(&arc_to(
        &start,
        &start,
        center,
        ArcDirection::CounterClockwise,
        e,
        profile.print_speed,
    ));
    (gcode, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn profile() -> ExtrusionProfile {
        ExtrusionProfile::model(&PrinterSettings::default(), 1)
    }

    #[test]
    fn test_extrusion_is_linear() {
        let one = calculate_extrusion(10.0, 0.2, 0.4, 1.75);
        let two = calculate_extrusion(20.0, 0.2, 0.4, 1.75);
        assert!(one > 0.0);
        assert_relative_eq!(two, 2.0 * one, epsilon = 1e-12);
        assert_eq!(calculate_extrusion(0.0, 0.2, 0.4, 1.75), 0.0);
    }

    #[test]
    fn test_extrusion_value() {
        // 0.2 * 0.4 * 100 / (pi * 0.875^2)
        let e = calculate_extrusion(100.0, 0.2, 0.4, 1.75);
        assert_relative_eq!(e, 8.0 / (PI * 0.765625), epsilon = 1e-9);
    }

    #[test]
    fn test_polygon_loop_closes() {
        let square = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]);
        let p = profile();
        let (gcode, e) = generate_polygon_layer(&square, 0.2, &p, 1.0);
        let lines: Vec<&str> = gcode.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("G0 X0.000 Y0.000 Z0.200"));
        assert!(lines[4].starts_with("G1 X0.000 Y0.000"));
        assert_relative_eq!(e - 1.0, p.extrusion_for(40.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_segments_skipped() {
        let path = Polyline::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(5.0, 0.0),
        ]);
        let (gcode, _) = generate_polyline_path(&path, 0.2, &profile(), 0.0);
        assert_eq!(gcode.lines().filter(|l| l.starts_with("G1")).count(), 1);

        let dot = Polyline::new(vec![Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)]);
        let (gcode, e) = generate_polyline_path(&dot, 0.2, &profile(), 3.0);
        assert!(gcode.is_empty());
        assert_eq!(e, 3.0);
    }

    #[test]
    fn test_circle_arc() {
        let (gcode, e) = generate_circle_loop(&Point2::new(5.0, 5.0), 2.0, 0.4, &profile(), 0.0);
        assert!(gcode.contains("G3 X7.000 Y5.000 I-2.000 J0.000"));
        assert_relative_eq!(e, profile().extrusion_for(4.0 * PI), epsilon = 1e-12);
    }

    #[test]
    fn test_support_profile_flow() {
        let settings = PrinterSettings::default();
        let support = ExtrusionProfile::support(&settings);
        let model = ExtrusionProfile::model(&settings, 1);
        assert!(support.extrusion_for(10.0) < model.extrusion_for(10.0));
    }
}
