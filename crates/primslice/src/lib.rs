#![warn(missing_docs)]

//! Layer slicing and toolpath synthesis for parametric solid primitives.
//!
//! An element tree of cubes, cylinders, spheres, cones, tori, ellipsoids
//! and lines is sliced into horizontal layers analytically. Each layer's
//! cross-section is turned into shells, infill and support paths, and
//! every extruding move carries an explicit running extrusion value.
//!
//! # Example
//!
//! ```
//! use primslice::{collect_geometry, Element, Layer, PrinterSettings};
//!
//! # fn main() -> primslice::Result<()> {
//! let tree = Element::from_json_str(r#"{"type": "sphere", "position": [0, 0, 5], "radius": 5}"#)?;
//! let settings = PrinterSettings::default();
//! let layer = Layer::at(25, 0.0, &settings);
//! let collected = collect_geometry(&tree, layer.z, &settings);
//! assert_eq!(collected.geometry.polygons.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod collect;
pub mod element;
pub mod error;
pub mod infill;
pub mod motion;
pub mod offset;
pub mod path;
pub mod perimeter;
pub mod primitives;
pub mod settings;
pub mod support;
pub mod toolpath;

pub use bounds::{element_bounds, Bounds3};
pub use collect::{collect_geometry, CollectedLayer};
pub use element::{Element, Fallback, Group};
pub use error::{InfillError, Result, SlicerError};
pub use infill::{generate_infill, InfillResult, InfillSettings};
pub use motion::{calculate_extrusion, ExtrusionProfile};
pub use offset::{BisectorOffsetter, PolygonOffsetter};
pub use path::{Bounds2, Polygon, Polyline, SliceGeometry};
pub use perimeter::{generate_perimeters, generate_perimeters_with, LayerPerimeters, Shell};
pub use primitives::{layer_count, slice_element, Layer, SliceResult, Stroke};
pub use settings::{InfillPattern, PrinterSettings, SupportType};
pub use support::{detect_overhangs, plan_support, SupportLayer, SupportSettings};
pub use toolpath::{plan_region, RegionToolpaths};
