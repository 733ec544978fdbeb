//! SVG document loading
//!
//! Turns source text into an [`SvgDocument`]: the element tree from
//! [`crate::xml`] is walked once, each element's presentation is computed
//! against its parent's, shapes become typed [`Node`]s and gradient
//! definitions are collected into the registry.

use std::str::FromStr;

use quill_core::{parse_color, Affine2D, Color, Point, Rect, Size};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::{Diagnostic, ParseError};
use crate::path::parse_path_data;
use crate::scene::{
    AspectRatio, Gradient, GradientKind, GradientRegistry, GradientUnits, Node, NodeKind, Paint,
    SpreadMethod, Stop, SvgDocument,
};
use crate::shape::rect_radii;
use crate::style::{self, declarations, lookup, parse_opacity, Style};
use crate::transform::parse_transform;
use crate::units::{parse_number_list, Axis, Length, LengthUnit};
use crate::xml::{offset_pos, parse_tree, Element};

/// Viewport assumed for percentages when the root gives no size at all
const FALLBACK_VIEWPORT: Size = Size::new(100.0, 100.0);

/// Parse SVG source text into a document
///
/// Structural problems fail with a [`ParseError`]; everything else is
/// absorbed and recorded in [`SvgDocument::diagnostics`].
pub fn parse(source: &str) -> Result<SvgDocument, ParseError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if source.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let tree = parse_tree(source)?;
    let root = Element::root(&tree);
    if root.name() != "svg" {
        return Err(ParseError::NotAnSvgDocument);
    }

    let mut builder = Builder {
        viewport: FALLBACK_VIEWPORT,
        diagnostics: Vec::new(),
    };

    let width = builder.root_length(&root, "width");
    let height = builder.root_length(&root, "height");
    let view_box = builder.view_box(&root);
    let aspect = match root.attr("preserveAspectRatio") {
        Some(value) => AspectRatio::parse(value).unwrap_or_else(|| {
            builder.invalid(&root, "preserveAspectRatio", value);
            AspectRatio::default()
        }),
        None => AspectRatio::default(),
    };
    builder.viewport = match (view_box, width, height) {
        (Some(vb), _, _) => vb.size,
        (None, None, None) => FALLBACK_VIEWPORT,
        (None, w, h) => Size::new(
            w.unwrap_or(FALLBACK_VIEWPORT.width),
            h.unwrap_or(FALLBACK_VIEWPORT.height),
        ),
    };

    let mut definitions = Vec::new();
    builder.collect_gradients(&root, &mut definitions);

    let root_style = style::compute(
        &Style::default(),
        true,
        &root,
        builder.viewport,
        &mut builder.diagnostics,
    );
    let mut nodes = Vec::new();
    if root_style.displayed {
        builder.build_children(&root, &root_style.style, root_style.visible, &mut nodes);
    }
    if root_style.opacity < 1.0 && !nodes.is_empty() {
        nodes = vec![Node {
            id: root.attr("id").map(str::to_string),
            kind: NodeKind::Group { children: nodes },
            transform: Affine2D::IDENTITY,
            opacity: root_style.opacity,
            style: root_style.style,
        }];
    }

    let gradients = builder.resolve_gradients(&definitions);
    builder.check_references(&nodes, &gradients);

    let document = SvgDocument {
        width,
        height,
        view_box,
        aspect,
        nodes,
        gradients,
        diagnostics: builder.diagnostics,
    };
    debug!(
        "Parsed SVG document: {} nodes, {} gradients, {} diagnostics",
        document.node_count(),
        document.gradients.len(),
        document.diagnostics.len()
    );
    Ok(document)
}

impl SvgDocument {
    /// Load an SVG document from a string
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parse(source)
    }

    /// Load an SVG document from raw bytes, which must be UTF-8
    pub fn from_data(data: &[u8]) -> Result<Self, ParseError> {
        match std::str::from_utf8(data) {
            Ok(source) => parse(source),
            Err(e) => {
                let valid = &data[..e.valid_up_to()];
                // The prefix is valid by construction
                let prefix = std::str::from_utf8(valid).unwrap_or_default();
                Err(ParseError::MalformedMarkup {
                    position: offset_pos(prefix, prefix.len()),
                    message: "input is not valid UTF-8".to_string(),
                })
            }
        }
    }
}

impl FromStr for SvgDocument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

struct Builder {
    /// Reference size for percentage lengths
    viewport: Size,
    diagnostics: Vec<Diagnostic>,
}

/// A gradient element as written, before `href` inheritance
#[derive(Clone, Debug, Default)]
struct GradientDef {
    id: String,
    linear: bool,
    x1: Option<Length>,
    y1: Option<Length>,
    x2: Option<Length>,
    y2: Option<Length>,
    cx: Option<Length>,
    cy: Option<Length>,
    r: Option<Length>,
    units: Option<GradientUnits>,
    spread: Option<SpreadMethod>,
    transform: Option<Affine2D>,
    href: Option<String>,
    stops: Vec<Stop>,
}

impl Builder {
    fn build_children(
        &mut self,
        parent: &Element<'_, '_>,
        style: &Style,
        visible: bool,
        out: &mut Vec<Node>,
    ) {
        for child in parent.children() {
            self.build_element(&child, style, visible, out);
        }
    }

    fn build_element(&mut self, el: &Element<'_, '_>, inherited: &Style, visible: bool, out: &mut Vec<Node>) {
        match el.name() {
            // Never rendered; gradients were collected up front
            "defs" | "linearGradient" | "radialGradient" | "stop" => return,
            "title" | "desc" | "metadata" | "style" | "script" => return,
            "clipPath" | "mask" | "symbol" | "pattern" | "marker" | "filter" => {
                self.unsupported(el);
                return;
            }
            "g" | "svg" | "a" | "switch" | "rect" | "circle" | "ellipse" | "line" | "polygon"
            | "polyline" | "path" => {}
            _ => {
                // Lenient skip: recognized descendants still render
                self.unsupported(el);
                self.build_children(el, inherited, visible, out);
                return;
            }
        }

        let presentation = style::compute(inherited, visible, el, self.viewport, &mut self.diagnostics);
        if !presentation.displayed {
            return;
        }

        let mut transform = match el.attr("transform") {
            Some(value) => parse_transform(value).unwrap_or_else(|| {
                self.invalid(el, "transform", value);
                Affine2D::IDENTITY
            }),
            None => Affine2D::IDENTITY,
        };

        let kind = match el.name() {
            "g" | "svg" | "a" | "switch" => {
                if el.name() == "svg" {
                    let x = self.length(el, "x", Axis::Horizontal, 0.0);
                    let y = self.length(el, "y", Axis::Vertical, 0.0);
                    transform = transform.then(&Affine2D::translation(x, y));
                }
                let mut children = Vec::new();
                self.build_children(el, &presentation.style, presentation.visible, &mut children);
                if children.is_empty() {
                    return;
                }
                NodeKind::Group { children }
            }
            _ if !presentation.visible => return,
            _ => match self.shape(el) {
                Some(kind) => kind,
                None => return,
            },
        };

        out.push(Node {
            id: el.attr("id").map(str::to_string),
            kind,
            transform,
            opacity: presentation.opacity,
            style: presentation.style,
        });
    }

    /// Geometry of a basic shape; `None` when the shape renders nothing
    fn shape(&mut self, el: &Element<'_, '_>) -> Option<NodeKind> {
        let kind = match el.name() {
            "rect" => {
                let x = self.length(el, "x", Axis::Horizontal, 0.0);
                let y = self.length(el, "y", Axis::Vertical, 0.0);
                let width = self.length(el, "width", Axis::Horizontal, 0.0);
                let height = self.length(el, "height", Axis::Vertical, 0.0);
                if width <= 0.0 || height <= 0.0 {
                    return None;
                }
                let rx = self.optional_length(el, "rx", Axis::Horizontal);
                let ry = self.optional_length(el, "ry", Axis::Vertical);
                let (rx, ry) = rect_radii(rx, ry, width, height);
                NodeKind::Rect {
                    x,
                    y,
                    width,
                    height,
                    rx,
                    ry,
                }
            }
            "circle" => {
                let center = self.point(el, "cx", "cy");
                let radius = self.length(el, "r", Axis::Diagonal, 0.0);
                if radius <= 0.0 {
                    return None;
                }
                NodeKind::Circle { center, radius }
            }
            "ellipse" => {
                let center = self.point(el, "cx", "cy");
                let rx = self.optional_length(el, "rx", Axis::Horizontal);
                let ry = self.optional_length(el, "ry", Axis::Vertical);
                let (rx, ry) = match (rx, ry) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (None, None) => return None,
                };
                if rx <= 0.0 || ry <= 0.0 {
                    return None;
                }
                NodeKind::Ellipse { center, rx, ry }
            }
            "line" => NodeKind::Line {
                from: self.point(el, "x1", "y1"),
                to: self.point(el, "x2", "y2"),
            },
            "polygon" | "polyline" => {
                let points = self.points(el)?;
                if el.name() == "polygon" {
                    NodeKind::Polygon { points }
                } else {
                    NodeKind::Polyline { points }
                }
            }
            "path" => {
                let d = el.attr("d")?;
                match parse_path_data(d) {
                    Ok(segments) if segments.is_empty() => return None,
                    Ok(segments) => NodeKind::Path { segments },
                    Err(error) => {
                        warn!(
                            "Dropping <{}> at {}: invalid path data: {}",
                            el.name(), el.pos(), error
                        );
                        self.diagnostics.push(Diagnostic::InvalidPathData {
                            element: el.name().to_string(),
                            position: el.pos(),
                            error,
                        });
                        return None;
                    }
                }
            }
            _ => return None,
        };
        Some(kind)
    }

    fn points(&mut self, el: &Element<'_, '_>) -> Option<Vec<Point>> {
        let value = el.attr("points")?;
        let Some(mut numbers) = parse_number_list(value) else {
            self.invalid(el, "points", value);
            return None;
        };
        if numbers.len() % 2 == 1 {
            self.invalid(el, "points", value);
            numbers.pop();
        }
        let points: Vec<Point> = numbers
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect();
        (points.len() >= 2).then_some(points)
    }

    fn point(&mut self, el: &Element<'_, '_>, x: &str, y: &str) -> Point {
        Point::new(
            self.length(el, x, Axis::Horizontal, 0.0),
            self.length(el, y, Axis::Vertical, 0.0),
        )
    }

    fn length(&mut self, el: &Element<'_, '_>, name: &str, axis: Axis, default: f32) -> f32 {
        self.optional_length(el, name, axis).unwrap_or(default)
    }

    fn optional_length(&mut self, el: &Element<'_, '_>, name: &str, axis: Axis) -> Option<f32> {
        let value = el.attr(name)?;
        match Length::parse(value) {
            Some(len) => Some(len.resolve(axis, self.viewport)),
            None => {
                self.invalid(el, name, value);
                None
            }
        }
    }

    fn root_length(&mut self, root: &Element<'_, '_>, name: &str) -> Option<f32> {
        let value = root.attr(name)?;
        match Length::parse(value) {
            Some(len) if len.unit == LengthUnit::Percent => None,
            Some(len) if len.value > 0.0 => Some(len.to_user_units(0.0)),
            _ => {
                self.invalid(root, name, value);
                None
            }
        }
    }

    fn view_box(&mut self, root: &Element<'_, '_>) -> Option<Rect> {
        let value = root.attr("viewBox")?;
        match parse_number_list(value).as_deref() {
            Some(&[x, y, w, h]) if w > 0.0 && h > 0.0 => Some(Rect::new(x, y, w, h)),
            _ => {
                self.invalid(root, "viewBox", value);
                None
            }
        }
    }

    fn unsupported(&mut self, el: &Element<'_, '_>) {
        warn!("Skipping unsupported element <{}> at {}", el.name(), el.pos());
        self.diagnostics.push(Diagnostic::UnsupportedElement {
            name: el.name().to_string(),
            position: el.pos(),
        });
    }

    fn invalid(&mut self, el: &Element<'_, '_>, attribute: &str, value: &str) {
        warn!(
            "<{}> at {}: invalid value '{}' for {}",
            el.name(), el.pos(), value, attribute
        );
        self.diagnostics.push(Diagnostic::InvalidAttribute {
            element: el.name().to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            position: el.pos(),
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gradients
    // ─────────────────────────────────────────────────────────────────────────

    /// Collect every gradient element in document order, wherever it appears
    fn collect_gradients(&mut self, el: &Element<'_, '_>, out: &mut Vec<GradientDef>) {
        for child in el.children() {
            match child.name() {
                "linearGradient" | "radialGradient" => {
                    if let Some(def) = self.gradient_def(&child) {
                        out.push(def);
                    }
                }
                _ => self.collect_gradients(&child, out),
            }
        }
    }

    fn gradient_def(&mut self, el: &Element<'_, '_>) -> Option<GradientDef> {
        let id = el.attr("id")?.trim();
        if id.is_empty() {
            return None;
        }

        let mut def = GradientDef {
            id: id.to_string(),
            linear: el.name() == "linearGradient",
            ..GradientDef::default()
        };

        let names: &[&str] = if def.linear {
            &["x1", "y1", "x2", "y2"]
        } else {
            &["cx", "cy", "r"]
        };
        for &name in names {
            let Some(value) = el.attr(name) else {
                continue;
            };
            let Some(len) = Length::parse(value) else {
                self.invalid(el, name, value);
                continue;
            };
            let slot = match name {
                "x1" => &mut def.x1,
                "y1" => &mut def.y1,
                "x2" => &mut def.x2,
                "y2" => &mut def.y2,
                "cx" => &mut def.cx,
                "cy" => &mut def.cy,
                _ => &mut def.r,
            };
            *slot = Some(len);
        }

        if let Some(value) = el.attr("gradientUnits") {
            def.units = match value.trim() {
                "objectBoundingBox" => Some(GradientUnits::ObjectBoundingBox),
                "userSpaceOnUse" => Some(GradientUnits::UserSpaceOnUse),
                _ => {
                    self.invalid(el, "gradientUnits", value);
                    None
                }
            };
        }
        if let Some(value) = el.attr("spreadMethod") {
            def.spread = match value.trim() {
                "pad" => Some(SpreadMethod::Pad),
                "reflect" => Some(SpreadMethod::Reflect),
                "repeat" => Some(SpreadMethod::Repeat),
                _ => {
                    self.invalid(el, "spreadMethod", value);
                    None
                }
            };
        }
        if let Some(value) = el.attr("gradientTransform") {
            def.transform = parse_transform(value);
            if def.transform.is_none() {
                self.invalid(el, "gradientTransform", value);
            }
        }
        def.href = el
            .attr("href")
            .and_then(|h| h.trim().strip_prefix('#'))
            .map(str::to_string);

        let mut previous = 0.0f32;
        for child in el.children().filter(|c| c.name() == "stop") {
            let stop = self.stop(&child, previous);
            previous = stop.offset;
            def.stops.push(stop);
        }

        Some(def)
    }

    fn stop(&mut self, el: &Element<'_, '_>, previous: f32) -> Stop {
        let offset = match el.attr("offset") {
            Some(value) => parse_opacity(value).unwrap_or_else(|| {
                self.invalid(el, "offset", value);
                0.0
            }),
            None => 0.0,
        };

        let decls = declarations(el);
        let color = match lookup(&decls, "stop-color") {
            None | Some("inherit") => Color::BLACK,
            Some("currentColor") => lookup(&decls, "color")
                .and_then(|c| parse_color(c).ok())
                .unwrap_or(Color::BLACK),
            Some(value) => parse_color(value).unwrap_or_else(|error| {
                warn!(
                    "<stop> at {}: invalid stop-color '{}': {}",
                    el.pos(), value, error
                );
                self.diagnostics.push(Diagnostic::ColorParseFailure {
                    attribute: "stop-color".to_string(),
                    value: value.to_string(),
                    position: el.pos(),
                    error,
                });
                Color::BLACK
            }),
        };
        let opacity = match lookup(&decls, "stop-opacity") {
            None | Some("inherit") => 1.0,
            Some(value) => parse_opacity(value).unwrap_or_else(|| {
                self.invalid(el, "stop-opacity", value);
                1.0
            }),
        };

        Stop {
            offset: offset.max(previous),
            color,
            opacity,
        }
    }

    /// Apply `href` inheritance and register gradients; the first id wins
    fn resolve_gradients(&mut self, definitions: &[GradientDef]) -> GradientRegistry {
        let mut by_id: FxHashMap<&str, &GradientDef> = FxHashMap::default();
        for def in definitions {
            by_id.entry(def.id.as_str()).or_insert(def);
        }

        let mut registry = GradientRegistry::new();
        for def in definitions {
            let gradient = self.resolve_gradient(def, &by_id);
            if !registry.insert(def.id.clone(), gradient) {
                debug!("Ignoring duplicate gradient id '{}'", def.id);
            }
        }
        registry
    }

    fn resolve_gradient(&self, def: &GradientDef, by_id: &FxHashMap<&str, &GradientDef>) -> Gradient {
        let mut merged = def.clone();
        let mut visited: SmallVec<[&str; 4]> = SmallVec::new();
        visited.push(def.id.as_str());

        let mut next = def.href.as_deref();
        while let Some(id) = next {
            if visited.contains(&id) {
                warn!("Gradient '{}' has a circular href chain", def.id);
                break;
            }
            visited.push(id);
            let Some(template) = by_id.get(id) else {
                break;
            };

            if merged.stops.is_empty() {
                merged.stops = template.stops.clone();
            }
            merged.units = merged.units.or(template.units);
            merged.spread = merged.spread.or(template.spread);
            merged.transform = merged.transform.or(template.transform);
            if template.linear == merged.linear {
                merged.x1 = merged.x1.or(template.x1);
                merged.y1 = merged.y1.or(template.y1);
                merged.x2 = merged.x2.or(template.x2);
                merged.y2 = merged.y2.or(template.y2);
                merged.cx = merged.cx.or(template.cx);
                merged.cy = merged.cy.or(template.cy);
                merged.r = merged.r.or(template.r);
            }
            next = template.href.as_deref();
        }

        let units = merged.units.unwrap_or_default();
        let resolve = |len: Option<Length>, default: Length, axis: Axis| {
            let len = len.unwrap_or(default);
            match units {
                GradientUnits::ObjectBoundingBox => len.to_fraction(),
                GradientUnits::UserSpaceOnUse => len.resolve(axis, self.viewport),
            }
        };

        let kind = if merged.linear {
            GradientKind::Linear {
                x1: resolve(merged.x1, Length::percent(0.0), Axis::Horizontal),
                y1: resolve(merged.y1, Length::percent(0.0), Axis::Vertical),
                x2: resolve(merged.x2, Length::percent(100.0), Axis::Horizontal),
                y2: resolve(merged.y2, Length::percent(0.0), Axis::Vertical),
            }
        } else {
            GradientKind::Radial {
                cx: resolve(merged.cx, Length::percent(50.0), Axis::Horizontal),
                cy: resolve(merged.cy, Length::percent(50.0), Axis::Vertical),
                r: resolve(merged.r, Length::percent(50.0), Axis::Diagonal),
            }
        };

        Gradient {
            kind,
            stops: merged.stops,
            units,
            spread: merged.spread.unwrap_or_default(),
            transform: merged.transform.unwrap_or(Affine2D::IDENTITY),
        }
    }

    /// Record each gradient reference that names no gradient, once per id
    fn check_references(&mut self, nodes: &[Node], registry: &GradientRegistry) {
        fn walk<'n>(nodes: &'n [Node], out: &mut Vec<&'n str>) {
            for node in nodes {
                if let NodeKind::Group { children } = &node.kind {
                    walk(children, out);
                    continue;
                }
                for paint in [&node.style.fill, &node.style.stroke] {
                    if let Paint::GradientRef { id, .. } = paint {
                        out.push(id.as_str());
                    }
                }
            }
        }

        let mut ids = Vec::new();
        walk(nodes, &mut ids);
        let mut seen = FxHashSet::default();
        for id in ids {
            if !registry.contains(id) && seen.insert(id) {
                warn!("Unresolved gradient reference '#{}'", id);
                self.diagnostics.push(Diagnostic::GradientRefUnresolved { id: id.to_string() });
            }
        }
    }
}
