//! Printer configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlicerError};

/// Infill pattern types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfillPattern {
    /// Parallel raster lines, alternating 0°/90° per layer.
    #[default]
    Lines,
    /// Both 0° and 90° line families every layer.
    Grid,
    /// Hexagonal tessellation.
    Honeycomb,
    /// Two ±45° line families.
    Triangular,
    /// Full-density raster.
    Solid,
    /// Concentric rings about the cross-section centre.
    Circular,
    /// One continuous spiral about the cross-section centre.
    Spiral,
}

impl InfillPattern {
    /// Lower-case pattern name as it appears in settings files.
    pub fn name(&self) -> &'static str {
        match self {
            InfillPattern::Lines => "lines",
            InfillPattern::Grid => "grid",
            InfillPattern::Honeycomb => "honeycomb",
            InfillPattern::Triangular => "triangular",
            InfillPattern::Solid => "solid",
            InfillPattern::Circular => "circular",
            InfillPattern::Spiral => "spiral",
        }
    }
}

/// Where support structures may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportType {
    /// No support.
    #[default]
    None,
    /// Only columns that reach the build plate without hitting the model.
    TouchingBuildplate,
    /// Columns may rest on the model.
    Everywhere,
}

/// Printer and print-quality parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSettings {
    /// Layer height (mm).
    pub layer_height: f64,
    /// Extrusion move speed (mm/s).
    pub print_speed: f64,
    /// Travel move speed (mm/s).
    pub travel_speed: f64,
    /// Speed for the first model layer (mm/s).
    pub first_layer_speed: f64,
    /// Hotend temperature (°C).
    pub hotend_temperature: u32,
    /// Bed temperature (°C).
    pub bed_temperature: u32,
    /// Extrusion line width (mm).
    pub extrusion_width: f64,
    /// Filament diameter (mm).
    pub filament_diameter: f64,
    /// Retraction distance at the end of the print (mm).
    pub retraction_distance: f64,
    /// Retraction speed (mm/s).
    pub retraction_speed: f64,
    /// Infill density (0 to 100).
    pub infill_density: f64,
    /// Infill pattern.
    pub infill_pattern: InfillPattern,
    /// Number of perimeter shells.
    pub shell_count: u32,
    /// Bottom and top layers printed solid.
    pub solid_layers: u32,
    /// Support placement.
    pub support_type: SupportType,
    /// Maximum self-supporting overhang, measured from vertical (degrees).
    pub support_overhang_angle: f64,
    /// Support fill density (0 to 100).
    pub support_density: f64,
    /// Horizontal gap kept between support and model (mm).
    pub support_xy_distance: f64,
    /// Extrusion multiplier for support material.
    pub support_flow: f64,
    /// Support move speed (mm/s).
    pub support_speed: f64,
    /// Raft layers printed under the model.
    pub raft_layers: u32,
    /// Raft margin around the first layer footprint (mm).
    pub raft_margin: f64,
    /// Brim width around the first layer (mm, 0 disables).
    pub brim_width: f64,
    /// Emit circular perimeters as G2/G3 arcs.
    pub arc_perimeters: bool,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            print_speed: 50.0,
            travel_speed: 150.0,
            first_layer_speed: 20.0,
            hotend_temperature: 210,
            bed_temperature: 60,
            extrusion_width: 0.4,
            filament_diameter: 1.75,
            retraction_distance: 5.0,
            retraction_speed: 45.0,
            infill_density: 20.0,
            infill_pattern: InfillPattern::Lines,
            shell_count: 2,
            solid_layers: 0,
            support_type: SupportType::None,
            support_overhang_angle: 45.0,
            support_density: 15.0,
            support_xy_distance: 0.6,
            support_flow: 0.8,
            support_speed: 40.0,
            raft_layers: 0,
            raft_margin: 3.0,
            brim_width: 0.0,
            arc_perimeters: false,
        }
    }
}

impl PrinterSettings {
    /// Parse settings from TOML and validate them.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from JSON and validate them.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.layer_height <= 0.0 || self.layer_height > 1.0 {
            return Err(SlicerError::InvalidSettings(
                "layer_height must be between 0 and 1mm".into(),
            ));
        }
        if self.extrusion_width <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "extrusion_width must be positive".into(),
            ));
        }
        if self.filament_diameter <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "filament_diameter must be positive".into(),
            ));
        }
        if self.print_speed <= 0.0 || self.travel_speed <= 0.0 || self.first_layer_speed <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "speeds must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.infill_density) {
            return Err(SlicerError::InvalidSettings(
                "infill_density must be between 0 and 100".into(),
            ));
        }
        if self.support_type != SupportType::None
            && (self.support_density <= 0.0 || self.support_density > 100.0)
        {
            return Err(SlicerError::InvalidSettings(
                "support_density must be in (0, 100] when support is enabled".into(),
            ));
        }
        if !(0.0..90.0).contains(&self.support_overhang_angle) {
            return Err(SlicerError::InvalidSettings(
                "support_overhang_angle must be in [0, 90) degrees".into(),
            ));
        }
        if self.support_flow <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "support_flow must be positive".into(),
            ));
        }
        if self.retraction_distance < 0.0 || self.brim_width < 0.0 || self.raft_margin < 0.0 {
            return Err(SlicerError::InvalidSettings(
                "retraction, brim and raft distances must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Feed rate for extrusion on a given model layer (mm/s).
    pub fn speed_for_layer(&self, layer_index: usize) -> f64 {
        if layer_index == 0 {
            self.first_layer_speed
        } else {
            self.print_speed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        assert!(PrinterSettings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let settings = PrinterSettings {
            layer_height: -0.1,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PrinterSettings {
            infill_density: 120.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let settings = PrinterSettings::from_toml_str(
            "layer_height = 0.3\ninfill_pattern = \"honeycomb\"\nsupport_type = \"touching_buildplate\"\n",
        )
        .unwrap();
        assert!((settings.layer_height - 0.3).abs() < 1e-12);
        assert_eq!(settings.infill_pattern, InfillPattern::Honeycomb);
        assert_eq!(settings.support_type, SupportType::TouchingBuildplate);
        assert_eq!(settings.shell_count, 2);
    }

    #[test]
    fn test_json_rejects_invalid() {
        assert!(PrinterSettings::from_json_str(r#"{"extrusion_width": 0.0}"#).is_err());
    }
}
