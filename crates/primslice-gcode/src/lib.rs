#![warn(missing_docs)]

//! G-code generation for primslice.
//!
//! This crate wraps sliced layers in a printer's start and end sequence
//! and runs the whole pipeline for an element tree.
//!
//! # Example
//!
//! ```no_run
//! use primslice::{Element, PrinterSettings};
//! use primslice_gcode::{generate_composite, PrinterProfile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = Element::from_json_str(&std::fs::read_to_string("model.json")?)?;
//! let output = generate_composite(&tree, &PrinterSettings::default(), &PrinterProfile::ender3())?;
//! std::fs::write("output.gcode", output.gcode)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod flavor;
pub mod generator;
pub mod printer;
pub mod stats;

pub use error::{GcodeError, Result};
pub use flavor::GcodeFlavor;
pub use generator::{generate_composite, generate_for_element, LayerPlan, PrintOutput};
pub use primslice::SlicerError;
pub use printer::PrinterProfile;
pub use stats::PrintStats;
