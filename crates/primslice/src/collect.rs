//! Geometry collection over an element tree.

use tracing::debug;

use crate::bounds::element_bounds;
use crate::element::Element;
use crate::path::SliceGeometry;
use crate::primitives::{cross_section, line, Stroke};
use crate::settings::PrinterSettings;

/// Everything an element tree contributes to one layer.
#[derive(Debug, Clone, Default)]
pub struct CollectedLayer {
    /// Merged cross-sections of every solid leaf.
    pub geometry: SliceGeometry,
    /// Line strokes.
    pub strokes: Vec<Stroke>,
    /// Leaves that could not be sliced.
    pub warnings: Vec<String>,
}

/// Collect the cross-section of a tree at model height `z`.
///
/// Subtrees whose bounds miss `z` by more than a layer height are pruned
/// without visiting their leaves.
pub fn collect_geometry(element: &Element, z: f64, settings: &PrinterSettings) -> CollectedLayer {
    let mut layer = CollectedLayer::default();
    collect_into(element, z, settings, &mut layer);
    layer
}

fn collect_into(element: &Element, z: f64, settings: &PrinterSettings, out: &mut CollectedLayer) {
    match element {
        Element::Composite(g) | Element::Component(g) | Element::Group(g) => {
            let in_range = element_bounds(element)
                .is_some_and(|b| b.contains_z(z, settings.layer_height));
            if !in_range {
                debug!(kind = element.kind(), name = ?g.name, z, "pruned subtree");
                return;
            }
            for child in &g.children {
                collect_into(child, z, settings, out);
            }
        }
        Element::Line(l) => {
            if let Some(stroke) = line::stroke_at(l, z, settings) {
                out.strokes.push(stroke);
            }
        }
        Element::Text(t) => {
            debug!(text = %t.text, "skipped text element");
            out.warnings
                .push(format!("WARNING: text '{}' skipped; convert text to outlines", t.text));
        }
        Element::Unsupported(u) => {
            debug!(kind = %u.kind, "skipped unsupported element");
            out.warnings
                .push(format!("WARNING: unsupported element '{}' skipped", u.kind));
        }
        leaf => {
            if let Some(geometry) = cross_section(leaf, z, settings) {
                out.geometry.merge(geometry);
            }
        }
    }
}
