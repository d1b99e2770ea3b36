//! Error types for the toolpath engine.

use thiserror::Error;

/// Errors that can occur while slicing an element tree.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Invalid printer settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The element tree has no determinable extent.
    #[error("cannot determine bounds: {0}")]
    Unbounded(String),

    /// Element tree or settings JSON could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings TOML could not be parsed.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised by an infill pattern for a particular region.
///
/// These never abort a layer: the caller skips the infill and annotates
/// the output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InfillError {
    /// Pattern cannot be applied to this geometry.
    #[error("{pattern} infill is not supported for this geometry: {reason}")]
    UnsupportedPattern {
        /// Pattern name.
        pattern: &'static str,
        /// Why the pattern does not apply.
        reason: String,
    },

    /// Spacing would produce more scanlines than the generator allows.
    #[error("infill spacing {spacing:.4}mm needs {lines} lines, limit is {limit}")]
    TooDense {
        /// Effective spacing (mm).
        spacing: f64,
        /// Scanlines that would be generated.
        lines: usize,
        /// Upper bound.
        limit: usize,
    },
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
