//! Scene graph
//!
//! The typed, immutable tree produced by the document parser and consumed by
//! the rasterizer. Nodes own their children; gradients live in a registry and
//! are looked up by id at render time.

use quill_core::{Affine2D, Color, Point, Rect, Size};
use rustc_hash::FxHashMap;

use crate::error::Diagnostic;
use crate::path::Segment;
use crate::style::Style;

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// A parsed SVG document
#[derive(Clone, Debug, PartialEq)]
pub struct SvgDocument {
    pub(crate) width: Option<f32>,
    pub(crate) height: Option<f32>,
    pub(crate) view_box: Option<Rect>,
    pub(crate) aspect: AspectRatio,
    pub(crate) nodes: Vec<Node>,
    pub(crate) gradients: GradientRegistry,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl SvgDocument {
    /// Root `width` in user units, if given
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// Root `height` in user units, if given
    pub fn height(&self) -> Option<f32> {
        self.height
    }

    pub fn view_box(&self) -> Option<Rect> {
        self.view_box
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    /// Intrinsic size: `width`/`height`, falling back to the viewBox size
    pub fn size(&self) -> Option<Size> {
        let vb = self.view_box.map(|r| r.size);
        match (self.width, self.height, vb) {
            (Some(w), Some(h), _) => Some(Size::new(w, h)),
            (Some(w), None, Some(vb)) if vb.width > 0.0 => {
                Some(Size::new(w, w * vb.height / vb.width))
            }
            (None, Some(h), Some(vb)) if vb.height > 0.0 => {
                Some(Size::new(h * vb.width / vb.height, h))
            }
            (None, None, vb) => vb,
            _ => None,
        }
    }

    /// Top-level nodes in paint order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn gradients(&self) -> &GradientRegistry {
        &self.gradients
    }

    /// Localized failures absorbed while parsing, in source order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Total number of nodes, groups included
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|n| match &n.kind {
                    NodeKind::Group { children } => 1 + count(children),
                    _ => 1,
                })
                .sum()
        }
        count(&self.nodes)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A drawable element with its resolved style
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: Option<String>,
    pub kind: NodeKind,
    /// Local transform, composed with ancestors during rendering
    pub transform: Affine2D,
    /// Group opacity, multiplied down the tree during rendering
    pub opacity: f32,
    pub style: Style,
}

/// Shape geometry, in the node's local user space
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        ry: f32,
    },
    Circle {
        center: Point,
        radius: f32,
    },
    Ellipse {
        center: Point,
        rx: f32,
        ry: f32,
    },
    Line {
        from: Point,
        to: Point,
    },
    Polygon {
        points: Vec<Point>,
    },
    Polyline {
        points: Vec<Point>,
    },
    Path {
        segments: Vec<Segment>,
    },
    Group {
        children: Vec<Node>,
    },
}

impl NodeKind {
    pub fn is_group(&self) -> bool {
        matches!(self, NodeKind::Group { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paint and gradients
// ─────────────────────────────────────────────────────────────────────────────

/// Source of color for a fill or stroke
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Paint {
    #[default]
    None,
    Solid(Color),
    /// Reference to a gradient by id, with an optional fallback color used
    /// when the id does not resolve
    GradientRef { id: String, fallback: Option<Color> },
}

impl Paint {
    pub fn is_none(&self) -> bool {
        matches!(self, Paint::None)
    }
}

/// Gradient geometry
///
/// Coordinates are fractions of the bounding box for
/// [`GradientUnits::ObjectBoundingBox`] and user units otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    Linear { x1: f32, y1: f32, x2: f32, y2: f32 },
    Radial { cx: f32, cy: f32, r: f32 },
}

/// Coordinate system of a gradient's geometry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientUnits {
    #[default]
    ObjectBoundingBox,
    UserSpaceOnUse,
}

/// Behavior outside the `[0, 1]` gradient range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

/// A color anchor within a gradient
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stop {
    /// Position in `[0, 1]`
    pub offset: f32,
    pub color: Color,
    /// `stop-opacity`, multiplied into the color's alpha when sampled
    pub opacity: f32,
}

impl Stop {
    /// Stop color with `stop-opacity` applied
    pub fn effective_color(&self) -> Color {
        self.color.multiply_alpha(self.opacity)
    }
}

/// A linear or radial gradient paint server
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    /// Sorted ascending by offset
    pub stops: Vec<Stop>,
    pub units: GradientUnits,
    pub spread: SpreadMethod,
    pub transform: Affine2D,
}

/// Gradients by id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GradientRegistry {
    gradients: FxHashMap<String, Gradient>,
}

impl GradientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Gradient> {
        self.gradients.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.gradients.contains_key(id)
    }

    /// Register a gradient; the first definition of an id wins
    ///
    /// Returns `false` if the id was already taken.
    pub fn insert(&mut self, id: impl Into<String>, gradient: Gradient) -> bool {
        match self.gradients.entry(id.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(gradient);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.gradients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gradients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Gradient)> {
        self.gradients.iter().map(|(id, g)| (id.as_str(), g))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// preserveAspectRatio
// ─────────────────────────────────────────────────────────────────────────────

/// Alignment along one axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Min,
    Mid,
    Max,
}

impl Align {
    fn factor(self) -> f32 {
        match self {
            Align::Min => 0.0,
            Align::Mid => 0.5,
            Align::Max => 1.0,
        }
    }
}

/// How the viewBox is fitted into the output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectRatio {
    /// Stretch non-uniformly to fill the output
    None,
    /// Uniform scale; `slice` covers the output instead of fitting inside it
    Uniform { x: Align, y: Align, slice: bool },
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Uniform {
            x: Align::Mid,
            y: Align::Mid,
            slice: false,
        }
    }
}

impl AspectRatio {
    /// Parse a `preserveAspectRatio` value
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_ascii_whitespace();
        let mut align = parts.next()?;
        if align == "defer" {
            align = parts.next()?;
        }
        let slice = match parts.next() {
            None | Some("meet") => false,
            Some("slice") => true,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        if align == "none" {
            return Some(AspectRatio::None);
        }

        let axis = |s: &str| match s {
            "Min" => Some(Align::Min),
            "Mid" => Some(Align::Mid),
            "Max" => Some(Align::Max),
            _ => None,
        };
        let rest = align.strip_prefix('x')?;
        let (x, y) = rest.split_once('Y')?;
        Some(AspectRatio::Uniform {
            x: axis(x)?,
            y: axis(y)?,
            slice,
        })
    }

    /// Transform mapping `view_box` onto a `target` area at the origin
    pub fn fit(&self, view_box: Rect, target: Size) -> Affine2D {
        let vb_w = view_box.width();
        let vb_h = view_box.height();
        if vb_w <= 0.0 || vb_h <= 0.0 {
            return Affine2D::IDENTITY;
        }
        let sx = target.width / vb_w;
        let sy = target.height / vb_h;

        match *self {
            AspectRatio::None => Affine2D::scale(sx, sy)
                .then(&Affine2D::translation(-view_box.x(), -view_box.y())),
            AspectRatio::Uniform { x, y, slice } => {
                let s = if slice { sx.max(sy) } else { sx.min(sy) };
                let dx = (target.width - vb_w * s) * x.factor();
                let dy = (target.height - vb_h * s) * y.factor();
                Affine2D::translation(dx, dy)
                    .then(&Affine2D::scale(s, s))
                    .then(&Affine2D::translation(-view_box.x(), -view_box.y()))
            }
        }
    }
}
