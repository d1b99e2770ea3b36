//! G-code flavor definitions and the print lifecycle.

use std::fmt::Write as _;

use primslice::motion::{extrude_to, fmt_coord, fmt_e, move_to, move_z, ExtrusionProfile};
use primslice::{Layer, PrinterSettings};
use primslice_math::Point2;
use serde::{Deserialize, Serialize};

use crate::printer::PrinterProfile;

/// Nozzle height for the prime line (mm).
pub const PRIME_Z: f64 = 0.3;

/// Closest approach of the prime line to the bed edges (mm).
const PRIME_MARGIN: f64 = 5.0;

/// Longest prime line (mm).
const PRIME_LENGTH: f64 = 100.0;

/// Marker ending the start block.
pub const END_START_MARKER: &str = "; END START";

/// Marker opening the end block.
pub const END_PRINT_MARKER: &str = "; END PRINT";

/// G-code flavor (dialect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GcodeFlavor {
    /// Marlin firmware (Ender, Prusa).
    #[default]
    Marlin,
    /// RepRap firmware.
    RepRap,
}

impl GcodeFlavor {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            GcodeFlavor::Marlin => "Marlin",
            GcodeFlavor::RepRap => "RepRap",
        }
    }

    /// Start block: header, setup, heating, homing and a prime line.
    ///
    /// Returns the block and the extrusion value after priming.
    pub fn start_gcode(&self, settings: &PrinterSettings, profile: &PrinterProfile) -> (String, f64) {
        let mut out = String::new();
        let _ = writeln!(out, "; generated by primslice {}", env!("CARGO_PKG_VERSION"));
        let _ = writeln!(out, "; flavor: {}", self.name());
        let _ = writeln!(out, "; printer: {}", profile.name);
        let _ = writeln!(out, "; layer_height: {}", settings.layer_height);
        let _ = writeln!(out, "; extrusion_width: {}", settings.extrusion_width);
        let _ = writeln!(
            out,
            "; infill: {} {}%",
            settings.infill_pattern.name(),
            settings.infill_density
        );

        out.push_str("G21 ; millimetres\n");
        out.push_str("G90 ; absolute positioning\n");
        out.push_str("M82 ; absolute extrusion\n");
        if profile.heated_bed {
            let _ = writeln!(out, "M140 S{} ; set bed temp", settings.bed_temperature);
        }
        let _ = writeln!(out, "M104 S{} ; set nozzle temp", settings.hotend_temperature);
        out.push_str("G28 ; home all axes\n");
        if *self == GcodeFlavor::Marlin && profile.auto_bed_leveling {
            out.push_str("G29 ; auto bed leveling\n");
        }
        if profile.heated_bed {
            let _ = writeln!(out, "M190 S{} ; wait for bed temp", settings.bed_temperature);
        }
        let _ = writeln!(out, "M109 S{} ; wait for nozzle temp", settings.hotend_temperature);
        out.push_str("G92 E0 ; reset extruder\n");

        let (prime, e) = prime_line(settings, profile);
        out.push_str(&prime);
        out.push_str(END_START_MARKER);
        out.push('\n');
        (out, e)
    }

    /// End block: heaters off, retract, park, motors off.
    ///
    /// `last_z` is the nozzle height of the last printed layer.
    pub fn end_gcode(&self, settings: &PrinterSettings, profile: &PrinterProfile, last_z: f64) -> String {
        let park_z = (last_z + 10.0).min(profile.bed_z);
        let (park_x, park_y) = if profile.in_bounds(profile.park_x, profile.park_y, park_z) {
            (profile.park_x, profile.park_y)
        } else {
            (0.0, 0.0)
        };

        let mut out = String::new();
        out.push_str(END_PRINT_MARKER);
        out.push('\n');
        out.push_str("M104 S0 ; turn off nozzle\n");
        out.push_str("M140 S0 ; turn off bed\n");
        out.push_str("G91 ; relative positioning\n");
        let _ = writeln!(
            out,
            "G1 E-{} F{:.0} ; retract",
            fmt_e(settings.retraction_distance),
            settings.retraction_speed * 60.0
        );
        out.push_str("G90 ; absolute positioning\n");
        out.push_str(&move_z(park_z, settings.travel_speed));
        out.push_str(&move_to(&Point2::new(park_x, park_y), None, settings.travel_speed));
        out.push_str("M84 ; disable motors\n");
        out
    }

    /// Layer header comments.
    pub fn layer_change_gcode(&self, layer: &Layer) -> String {
        format!(";LAYER:{}\n;Z:{}\n", layer.index, fmt_coord(layer.print_z))
    }
}

/// Purge line along the front edge of the bed, starting from E0.
fn prime_line(settings: &PrinterSettings, profile: &PrinterProfile) -> (String, f64) {
    let start = Point2::new(PRIME_MARGIN, PRIME_MARGIN);
    let length = (profile.bed_x - 2.0 * PRIME_MARGIN).clamp(0.0, PRIME_LENGTH);
    let end = Point2::new(start.x + length, start.y);
    let profile = ExtrusionProfile {
        layer_height: PRIME_Z,
        ..ExtrusionProfile::model(settings, 0)
    };
    let e = profile.extrusion_for(length);

    let mut out = String::from("; prime line\n");
    out.push_str(&move_z(PRIME_Z, settings.travel_speed));
    out.push_str(&move_to(&start, None, settings.travel_speed));
    out.push_str(&extrude_to(&end, e, settings.first_layer_speed));
    (out, e)
}
