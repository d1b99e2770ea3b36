//! Printer profile definitions.

use primslice::Bounds3;
use serde::{Deserialize, Serialize};

use crate::flavor::GcodeFlavor;

/// Printer profile with machine-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterProfile {
    /// Profile name.
    pub name: String,
    /// G-code flavor.
    pub flavor: GcodeFlavor,
    /// Build volume X (mm).
    pub bed_x: f64,
    /// Build volume Y (mm).
    pub bed_y: f64,
    /// Build volume Z (mm).
    pub bed_z: f64,
    /// Is the bed heated?
    pub heated_bed: bool,
    /// Does the printer level the bed before printing (G29)?
    pub auto_bed_leveling: bool,
    /// X position to present the print at (mm).
    pub park_x: f64,
    /// Y position to present the print at (mm).
    pub park_y: f64,
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::generic()
    }
}

impl PrinterProfile {
    /// Generic printer profile.
    pub fn generic() -> Self {
        Self {
            name: "Generic".into(),
            flavor: GcodeFlavor::Marlin,
            bed_x: 220.0,
            bed_y: 220.0,
            bed_z: 250.0,
            heated_bed: true,
            auto_bed_leveling: false,
            park_x: 0.0,
            park_y: 200.0,
        }
    }

    /// Creality Ender 3 profile.
    pub fn ender3() -> Self {
        Self {
            name: "Creality Ender 3".into(),
            flavor: GcodeFlavor::Marlin,
            bed_x: 220.0,
            bed_y: 220.0,
            bed_z: 250.0,
            heated_bed: true,
            auto_bed_leveling: false,
            park_x: 0.0,
            park_y: 220.0,
        }
    }

    /// Prusa MK4 profile.
    pub fn prusa_mk4() -> Self {
        Self {
            name: "Prusa MK4".into(),
            flavor: GcodeFlavor::Marlin,
            bed_x: 250.0,
            bed_y: 210.0,
            bed_z: 220.0,
            heated_bed: true,
            auto_bed_leveling: true,
            park_x: 0.0,
            park_y: 200.0,
        }
    }

    /// Names accepted by [`PrinterProfile::by_name`].
    pub const NAMES: [&'static str; 3] = ["generic", "ender3", "prusa_mk4"];

    /// Look up a built-in profile by its short name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "generic" => Some(Self::generic()),
            "ender3" | "ender_3" => Some(Self::ender3()),
            "prusa_mk4" | "mk4" => Some(Self::prusa_mk4()),
            _ => None,
        }
    }

    /// Get all built-in profiles.
    pub fn all_profiles() -> Vec<Self> {
        vec![Self::generic(), Self::ender3(), Self::prusa_mk4()]
    }

    /// Check if a position is within build volume.
    pub fn in_bounds(&self, x: f64, y: f64, z: f64) -> bool {
        (0.0..=self.bed_x).contains(&x)
            && (0.0..=self.bed_y).contains(&y)
            && (0.0..=self.bed_z).contains(&z)
    }

    /// Does a model of this extent fit the build volume?
    pub fn fits(&self, bounds: &Bounds3) -> bool {
        let size = bounds.max - bounds.min;
        size.x <= self.bed_x && size.y <= self.bed_y && size.z <= self.bed_z
    }
}
