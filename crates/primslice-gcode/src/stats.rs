//! Print statistics from emitted G-code.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// PLA density (g/cm³).
pub const PLA_DENSITY: f64 = 1.24;

/// Statistics about a generated print.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintStats {
    /// Total number of model layers.
    pub layer_count: usize,
    /// Length of extruding moves in XY (mm).
    pub extruded_path_mm: f64,
    /// Filament pushed through the nozzle (mm).
    pub filament_mm: f64,
    /// Filament volume (mm³).
    pub filament_volume_mm3: f64,
    /// Filament weight, assuming PLA (g).
    pub filament_grams: f64,
    /// Estimated print time in seconds.
    pub print_time_seconds: f64,
}

impl PrintStats {
    /// Measure a G-code program.
    ///
    /// Time is distance over commanded feed rate; acceleration and heating
    /// are ignored.
    pub fn measure(gcode: &str, layer_count: usize, filament_diameter: f64) -> Self {
        let mut tracker = MotionTracker::default();
        for line in gcode.lines() {
            tracker.step(line);
        }
        let area = PI * (filament_diameter / 2.0).powi(2);
        let volume = tracker.filament * area;
        Self {
            layer_count,
            extruded_path_mm: tracker.extruded,
            filament_mm: tracker.filament,
            filament_volume_mm3: volume,
            filament_grams: volume / 1000.0 * PLA_DENSITY,
            print_time_seconds: tracker.seconds,
        }
    }
}

#[derive(Debug, Default)]
struct MotionTracker {
    x: f64,
    y: f64,
    z: f64,
    e: f64,
    feed_mm_min: f64,
    relative: bool,
    extruded: f64,
    filament: f64,
    seconds: f64,
}

impl MotionTracker {
    fn step(&mut self, line: &str) {
        let code = line.split(';').next().unwrap_or("").trim();
        let Some(command) = code.split_whitespace().next() else {
            return;
        };
        let word = |letter: char| {
            code.split_whitespace()
                .skip(1)
                .find(|w| w.starts_with(letter))
                .and_then(|w| w[1..].parse::<f64>().ok())
        };

        match command {
            "G90" => self.relative = false,
            "G91" => self.relative = true,
            "G92" => {
                if let Some(e) = word('E') {
                    self.e = e;
                }
            }
            "G0" | "G1" | "G2" | "G3" => {
                if let Some(f) = word('F') {
                    self.feed_mm_min = f;
                }
                let target = |current: f64, value: Option<f64>, relative: bool| match value {
                    Some(v) if relative => current + v,
                    Some(v) => v,
                    None => current,
                };
                let x = target(self.x, word('X'), self.relative);
                let y = target(self.y, word('Y'), self.relative);
                let z = target(self.z, word('Z'), self.relative);
                let e = target(self.e, word('E'), self.relative);

                let planar = match command {
                    "G2" | "G3" => arc_length(
                        (self.x, self.y),
                        (x, y),
                        (word('I').unwrap_or(0.0), word('J').unwrap_or(0.0)),
                        command == "G2",
                    ),
                    _ => ((x - self.x).powi(2) + (y - self.y).powi(2)).sqrt(),
                };
                let distance = (planar * planar + (z - self.z).powi(2)).sqrt();
                if e > self.e {
                    self.extruded += planar;
                    self.filament += e - self.e;
                }
                if self.feed_mm_min > 0.0 {
                    self.seconds += distance / (self.feed_mm_min / 60.0);
                }
                self.x = x;
                self.y = y;
                self.z = z;
                self.e = e;
            }
            _ => {}
        }
    }
}

/// Length of an arc from `from` to `to` about `from + (i, j)`.
fn arc_length(from: (f64, f64), to: (f64, f64), offset: (f64, f64), clockwise: bool) -> f64 {
    let center = (from.0 + offset.0, from.1 + offset.1);
    let radius = (offset.0 * offset.0 + offset.1 * offset.1).sqrt();
    let a0 = (from.1 - center.1).atan2(from.0 - center.0);
    let a1 = (to.1 - center.1).atan2(to.0 - center.0);
    let mut sweep = if clockwise { a0 - a1 } else { a1 - a0 };
    if sweep <= 1e-9 {
        sweep += TAU;
    }
    radius * sweep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_measure_lines() {
        let gcode = "G92 E0\nG0 X0 Y0 F6000\nG1 X10 Y0 E1.0 F600\nG1 X10 Y10 E2.0\nG0 X0 Y0 F6000\n";
        let stats = PrintStats::measure(gcode, 1, 1.75);
        assert_relative_eq!(stats.extruded_path_mm, 20.0, epsilon = 1e-12);
        assert_relative_eq!(stats.filament_mm, 2.0, epsilon = 1e-12);
        // 20mm at 10mm/s plus the diagonal return at 100mm/s.
        assert_relative_eq!(
            stats.print_time_seconds,
            2.0 + 200.0_f64.sqrt() / 100.0,
            epsilon = 1e-9
        );
        assert!(stats.filament_grams > 0.0);
    }

    #[test]
    fn test_full_circle_arc() {
        let gcode = "G0 X7 Y5 F600\nG3 X7 Y5 I-2 J0 E1.0 F600\n";
        let stats = PrintStats::measure(gcode, 1, 1.75);
        assert_relative_eq!(stats.extruded_path_mm, 4.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_relative_retract_not_counted() {
        let gcode = "G1 X1 E3.0 F600\nG91\nG1 E-5 F2700\nG90\n";
        let stats = PrintStats::measure(gcode, 1, 1.75);
        assert_relative_eq!(stats.filament_mm, 3.0, epsilon = 1e-12);
    }
}
