//! Error types for print generation.

use primslice::SlicerError;
use thiserror::Error;

/// Errors that abort print generation.
#[derive(Error, Debug)]
pub enum GcodeError {
    /// Slicing failed.
    #[error(transparent)]
    Slicer(#[from] SlicerError),

    /// No built-in printer profile has this name.
    #[error("unknown printer profile '{0}'")]
    UnknownProfile(String),
}

/// Result type for print generation.
pub type Result<T> = std::result::Result<T, GcodeError>;
