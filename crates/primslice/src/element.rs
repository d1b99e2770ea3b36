//! The element tree: parametric primitives and the groups that own them.
//!
//! Positions are primitive centres in absolute machine coordinates (mm).
//! `rotation` is degrees about Z through the primitive centre. JSON uses a
//! `"type"` tag with snake_case names; points are `[x, y, z]` arrays.

use std::fmt;

use primslice_math::{Point3, Vec3};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Axis-aligned box (before rotation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    /// Centre of the box.
    pub position: Point3,
    /// Size along X.
    pub width: f64,
    /// Size along Y.
    pub depth: f64,
    /// Size along Z.
    pub height: f64,
    /// Rotation about Z (degrees).
    #[serde(default)]
    pub rotation: f64,
}

/// Cylinder along Z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    /// Centre of the cylinder.
    pub position: Point3,
    /// Radius.
    pub radius: f64,
    /// Height along Z.
    pub height: f64,
}

/// Sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Centre of the sphere.
    pub position: Point3,
    /// Radius.
    pub radius: f64,
}

/// Cone or frustum along Z, base at the bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cone {
    /// Centre of the bounding cylinder.
    pub position: Point3,
    /// Base radius.
    pub radius: f64,
    /// Top radius (0 for a pointed cone).
    #[serde(default)]
    pub top_radius: f64,
    /// Height along Z.
    pub height: f64,
}

/// Torus lying in the XY plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    /// Centre of the torus.
    pub position: Point3,
    /// Distance from the centre to the tube centre.
    pub major_radius: f64,
    /// Tube radius.
    pub tube_radius: f64,
}

/// Ellipsoid with semi-axes along X, Y, Z (before rotation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Centre of the ellipsoid.
    pub position: Point3,
    /// Semi-axis along X.
    pub radius_x: f64,
    /// Semi-axis along Y.
    pub radius_y: f64,
    /// Semi-axis along Z.
    pub radius_z: f64,
    /// Rotation about Z (degrees).
    #[serde(default)]
    pub rotation: f64,
}

/// A stroke of fixed width between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point.
    pub start: Point3,
    /// End point.
    pub end: Point3,
    /// Stroke width (mm).
    #[serde(default = "default_line_width")]
    pub width: f64,
}

fn default_line_width() -> f64 {
    0.4
}

/// Text label. Not printable directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Centre of the text block.
    pub position: Point3,
    /// Text content.
    pub text: String,
    /// Glyph height (mm).
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Extrusion height along Z (mm).
    #[serde(default = "default_text_height")]
    pub height: f64,
    /// Rotation about Z (degrees).
    #[serde(default)]
    pub rotation: f64,
}

fn default_font_size() -> f64 {
    10.0
}

fn default_text_height() -> f64 {
    2.0
}

impl Text {
    /// Width estimate of the rendered string.
    pub fn approximate_width(&self) -> f64 {
        self.text.chars().count().max(1) as f64 * self.font_size * 0.6
    }
}

/// Children of a structural element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    /// Optional label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owned children, in order.
    #[serde(default)]
    pub children: Vec<Element>,
}

/// An element of a kind this engine does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unsupported {
    /// The `"type"` value found in the input.
    pub kind: String,
    /// Reported centre, origin if absent.
    pub position: Point3,
    /// Reported size, derived from common size fields.
    pub size: Vec3,
}

/// Edge length used when an unsupported element reports no size.
pub const DEFAULT_PLACEHOLDER_SIZE: f64 = 10.0;

impl Unsupported {
    fn from_value(kind: String, value: &Value) -> Self {
        let position = value
            .get("position")
            .and_then(|v| serde_json::from_value::<Point3>(v.clone()).ok())
            .unwrap_or_else(Point3::origin);

        let size = value
            .get("size")
            .and_then(|v| serde_json::from_value::<Vec3>(v.clone()).ok())
            .unwrap_or_else(|| {
                let diameter = value
                    .get("radius")
                    .and_then(Value::as_f64)
                    .map(|r| r * 2.0);
                let field = |name: &str| {
                    value
                        .get(name)
                        .and_then(Value::as_f64)
                        .or(diameter)
                        .unwrap_or(DEFAULT_PLACEHOLDER_SIZE)
                };
                Vec3::new(field("width"), field("depth"), field("height"))
            });

        Self {
            kind,
            position,
            size,
        }
    }
}

/// A node of the element tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Box primitive.
    Cube(Cube),
    /// Cylinder primitive.
    Cylinder(Cylinder),
    /// Sphere primitive.
    Sphere(Sphere),
    /// Cone primitive.
    Cone(Cone),
    /// Torus primitive.
    Torus(Torus),
    /// Ellipsoid primitive.
    Ellipsoid(Ellipsoid),
    /// Line stroke.
    Line(Line),
    /// Text label.
    Text(Text),
    /// Composite of children.
    Composite(Group),
    /// Reusable component of children.
    Component(Group),
    /// Plain group of children.
    Group(Group),
    /// Unknown input type, kept so callers can fall back.
    Unsupported(Unsupported),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedElement {
    Cube(Cube),
    Cylinder(Cylinder),
    Sphere(Sphere),
    Cone(Cone),
    Torus(Torus),
    Ellipsoid(Ellipsoid),
    Line(Line),
    Text(Text),
    Composite(Group),
    Component(Group),
    Group(Group),
}

const KNOWN_KINDS: &[&str] = &[
    "cube",
    "cylinder",
    "sphere",
    "cone",
    "torus",
    "ellipsoid",
    "line",
    "text",
    "composite",
    "component",
    "group",
];

impl From<TaggedElement> for Element {
    fn from(tagged: TaggedElement) -> Self {
        match tagged {
            TaggedElement::Cube(c) => Element::Cube(c),
            TaggedElement::Cylinder(c) => Element::Cylinder(c),
            TaggedElement::Sphere(s) => Element::Sphere(s),
            TaggedElement::Cone(c) => Element::Cone(c),
            TaggedElement::Torus(t) => Element::Torus(t),
            TaggedElement::Ellipsoid(e) => Element::Ellipsoid(e),
            TaggedElement::Line(l) => Element::Line(l),
            TaggedElement::Text(t) => Element::Text(t),
            TaggedElement::Composite(g) => Element::Composite(g),
            TaggedElement::Component(g) => Element::Component(g),
            TaggedElement::Group(g) => Element::Group(g),
        }
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Element::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl Element {
    /// Build an element from a JSON value.
    ///
    /// Known types must be well formed; unknown types become
    /// [`Element::Unsupported`].
    pub fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_owned();

        if KNOWN_KINDS.contains(&kind.as_str()) {
            serde_json::from_value::<TaggedElement>(value).map(Element::from)
        } else {
            Ok(Element::Unsupported(Unsupported::from_value(kind, &value)))
        }
    }

    /// Parse an element tree from JSON text.
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_value(value)?)
    }

    /// Type name as used in JSON.
    pub fn kind(&self) -> &str {
        match self {
            Element::Cube(_) => "cube",
            Element::Cylinder(_) => "cylinder",
            Element::Sphere(_) => "sphere",
            Element::Cone(_) => "cone",
            Element::Torus(_) => "torus",
            Element::Ellipsoid(_) => "ellipsoid",
            Element::Line(_) => "line",
            Element::Text(_) => "text",
            Element::Composite(_) => "composite",
            Element::Component(_) => "component",
            Element::Group(_) => "group",
            Element::Unsupported(u) => &u.kind,
        }
    }

    /// Children of a structural element.
    pub fn children(&self) -> Option<&[Element]> {
        match self {
            Element::Composite(g) | Element::Component(g) | Element::Group(g) => {
                Some(&g.children)
            }
            _ => None,
        }
    }

    /// Number of leaf elements in the subtree.
    pub fn leaf_count(&self) -> usize {
        match self.children() {
            Some(children) => children.iter().map(Element::leaf_count).sum(),
            None => 1,
        }
    }

    /// Copy of the tree with every unprintable leaf replaced by a
    /// bounding-box cube, plus a record of each substitution.
    pub fn normalized(&self) -> (Element, Vec<Fallback>) {
        let mut fallbacks = Vec::new();
        let tree = self.normalize_into(&mut fallbacks);
        (tree, fallbacks)
    }

    fn normalize_into(&self, fallbacks: &mut Vec<Fallback>) -> Element {
        match self {
            Element::Composite(g) => Element::Composite(normalize_group(g, fallbacks)),
            Element::Component(g) => Element::Component(normalize_group(g, fallbacks)),
            Element::Group(g) => Element::Group(normalize_group(g, fallbacks)),
            Element::Text(t) => {
                fallbacks.push(Fallback::Text {
                    text: t.text.clone(),
                });
                Element::Cube(Cube {
                    position: t.position,
                    width: t.approximate_width(),
                    depth: t.font_size,
                    height: t.height,
                    rotation: t.rotation,
                })
            }
            Element::Unsupported(u) => {
                fallbacks.push(Fallback::Unsupported {
                    kind: u.kind.clone(),
                });
                Element::Cube(Cube {
                    position: u.position,
                    width: u.size.x,
                    depth: u.size.y,
                    height: u.size.z,
                    rotation: 0.0,
                })
            }
            leaf => leaf.clone(),
        }
    }
}

fn normalize_group(group: &Group, fallbacks: &mut Vec<Fallback>) -> Group {
    Group {
        name: group.name.clone(),
        children: group
            .children
            .iter()
            .map(|c| c.normalize_into(fallbacks))
            .collect(),
    }
}

/// A leaf that was replaced by a bounding-box placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    /// Unknown element type.
    Unsupported {
        /// Input type name.
        kind: String,
    },
    /// Text, which must be converted to outlines upstream.
    Text {
        /// Text content.
        text: String,
    },
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Unsupported { kind } => write!(
                f,
                "WARNING: unsupported element '{kind}' printed as bounding box"
            ),
            Fallback::Text { text } => write!(
                f,
                "ERROR: text '{text}' cannot be printed directly, printed as bounding box; convert text to outlines first"
            ),
        }
    }
}
