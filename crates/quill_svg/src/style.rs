//! Presentation attributes and inheritance
//!
//! Each element's style is computed from its parent's [`Style`], its
//! presentation attributes and its inline `style="..."` declarations (which
//! take precedence). Bad values are recorded as diagnostics and leave the
//! inherited value in place.

use quill_core::{parse_color, Color, ColorError, FillRule, LineCap, LineJoin, Size, StrokeStyle};
use smallvec::SmallVec;

use crate::error::Diagnostic;
use crate::scene::Paint;
use crate::units::{parse_number, scan_number, Axis, Length};
use crate::xml::Element;

/// Inherited fill and stroke properties of a node
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub fill: Paint,
    pub fill_opacity: f32,
    pub fill_rule: FillRule,
    pub stroke: Paint,
    pub stroke_opacity: f32,
    pub stroke_style: StrokeStyle,
    /// The `color` property, the value of `currentColor`
    pub color: Color,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Paint::Solid(Color::BLACK),
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: Paint::None,
            stroke_opacity: 1.0,
            stroke_style: StrokeStyle::default(),
            color: Color::BLACK,
        }
    }
}

/// Computed presentation of one element
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Presentation {
    pub style: Style,
    /// Not inherited
    pub opacity: f32,
    /// `display="none"` removes the element and its subtree
    pub displayed: bool,
    /// Inherited; hidden shapes are skipped but their children may override
    pub visible: bool,
}

/// Names of the properties read from attributes and `style` declarations
const PROPERTIES: &[&str] = &[
    "color",
    "display",
    "fill",
    "fill-opacity",
    "fill-rule",
    "opacity",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "visibility",
];

/// Presentation declarations of an element in precedence order
///
/// Attributes come first, then inline `style` declarations, so a lookup that
/// keeps the last match honors the override order.
pub(crate) fn declarations<'a>(el: &Element<'a, '_>) -> SmallVec<[(&'a str, &'a str); 8]> {
    let mut decls: SmallVec<[(&'a str, &'a str); 8]> = SmallVec::new();
    el.for_each_attr(|name, value| {
        if PROPERTIES.contains(&name) {
            decls.push((name, value.trim()));
        }
    });

    if let Some(inline) = el.attr("style") {
        for decl in inline.split(';') {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if let Some(known) = PROPERTIES.iter().find(|p| **p == name) {
                let value = value.trim();
                let value = value
                    .strip_suffix("!important")
                    .map_or(value, str::trim_end);
                decls.push((*known, value));
            }
        }
    }

    decls
}

/// Last declared value of `name`
pub(crate) fn lookup<'a>(decls: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    decls.iter().rev().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

/// Compute an element's presentation from its parent's
pub(crate) fn compute(
    parent: &Style,
    parent_visible: bool,
    el: &Element<'_, '_>,
    viewport: Size,
    diagnostics: &mut Vec<Diagnostic>,
) -> Presentation {
    let decls = declarations(el);
    let mut p = Presentation {
        style: parent.clone(),
        opacity: 1.0,
        displayed: true,
        visible: parent_visible,
    };
    let mut report = Reporter { el, diagnostics };

    // `color` first so `currentColor` in this element sees the new value
    if let Some(value) = lookup(&decls, "color") {
        if value != "inherit" && value != "currentColor" {
            match parse_color(value) {
                Ok(c) => p.style.color = c,
                Err(e) => report.color("color", value, e),
            }
        }
    }

    for &(name, value) in decls.iter() {
        if value == "inherit" {
            // Already holds the parent's value; `opacity` falls back to its default
            continue;
        }
        let style = &mut p.style;
        match name {
            "fill" => match parse_paint(value, style.color) {
                Ok(paint) => style.fill = paint,
                Err(e) => report.color(name, value, e),
            },
            "stroke" => match parse_paint(value, style.color) {
                Ok(paint) => style.stroke = paint,
                Err(e) => report.color(name, value, e),
            },
            "fill-opacity" => match parse_opacity(value) {
                Some(v) => style.fill_opacity = v,
                None => report.invalid(name, value),
            },
            "stroke-opacity" => match parse_opacity(value) {
                Some(v) => style.stroke_opacity = v,
                None => report.invalid(name, value),
            },
            "opacity" => match parse_opacity(value) {
                Some(v) => p.opacity = v,
                None => report.invalid(name, value),
            },
            "fill-rule" => match value {
                "nonzero" => style.fill_rule = FillRule::NonZero,
                "evenodd" => style.fill_rule = FillRule::EvenOdd,
                _ => report.invalid(name, value),
            },
            "stroke-width" => match Length::parse(value) {
                Some(len) if len.value >= 0.0 => {
                    style.stroke_style.width = len.resolve(Axis::Diagonal, viewport)
                }
                _ => report.invalid(name, value),
            },
            "stroke-linecap" => match value {
                "butt" => style.stroke_style.cap = LineCap::Butt,
                "round" => style.stroke_style.cap = LineCap::Round,
                "square" => style.stroke_style.cap = LineCap::Square,
                _ => report.invalid(name, value),
            },
            "stroke-linejoin" => match value {
                "miter" | "miter-clip" => style.stroke_style.join = LineJoin::Miter,
                "round" => style.stroke_style.join = LineJoin::Round,
                "bevel" => style.stroke_style.join = LineJoin::Bevel,
                _ => report.invalid(name, value),
            },
            "stroke-miterlimit" => match parse_number(value) {
                Some(v) if v >= 1.0 => style.stroke_style.miter_limit = v,
                _ => report.invalid(name, value),
            },
            "display" => p.displayed = value != "none",
            "visibility" => match value {
                "visible" => p.visible = true,
                "hidden" | "collapse" => p.visible = false,
                _ => report.invalid(name, value),
            },
            _ => {}
        }
    }

    p
}

/// Parse a `fill`/`stroke` value
///
/// `none`, `currentColor`, a color literal, or `url(#id)` with an optional
/// fallback color.
pub fn parse_paint(value: &str, current_color: Color) -> Result<Paint, ColorError> {
    let value = value.trim();
    match value {
        "none" => return Ok(Paint::None),
        "currentColor" => return Ok(Paint::Solid(current_color)),
        _ => {}
    }

    let Some(rest) = value.strip_prefix("url(") else {
        return parse_color(value).map(Paint::Solid);
    };
    let malformed = || ColorError::Malformed(value.to_string());
    let (target, fallback) = rest.split_once(')').ok_or_else(malformed)?;
    let target = target.trim().trim_matches(|c| c == '"' || c == '\'');
    let id = target.strip_prefix('#').ok_or_else(malformed)?;
    if id.is_empty() {
        return Err(malformed());
    }

    let fallback = match fallback.trim() {
        "" | "none" => None,
        "currentColor" => Some(current_color),
        other => Some(parse_color(other)?),
    };
    Ok(Paint::GradientRef {
        id: id.to_string(),
        fallback,
    })
}

/// Parse an opacity: a number or percentage, clamped into `[0, 1]`
pub fn parse_opacity(value: &str) -> Option<f32> {
    let value = value.trim();
    let (v, end) = scan_number(value.as_bytes(), 0)?;
    let v = match &value[end..] {
        "" => v,
        "%" => v / 100.0,
        _ => return None,
    };
    Some(v.clamp(0.0, 1.0))
}

struct Reporter<'a, 'e> {
    el: &'e Element<'e, 'e>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Reporter<'_, '_> {
    fn color(&mut self, attribute: &str, value: &str, error: ColorError) {
        tracing::warn!(
            "<{}> at {}: invalid color '{}' for {}: {}",
            self.el.name(),
            self.el.pos(),
            value,
            attribute,
            error
        );
        self.diagnostics.push(Diagnostic::ColorParseFailure {
            attribute: attribute.to_string(),
            value: value.to_string(),
            position: self.el.pos(),
            error,
        });
    }

    fn invalid(&mut self, attribute: &str, value: &str) {
        tracing::warn!(
            "<{}> at {}: invalid value '{}' for {}",
            self.el.name(),
            self.el.pos(),
            value,
            attribute
        );
        self.diagnostics.push(Diagnostic::InvalidAttribute {
            element: self.el.name().to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            position: self.el.pos(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_tree;

    const VIEWPORT: Size = Size::new(100.0, 100.0);

    fn compute_root(src: &str) -> (Presentation, Vec<Diagnostic>) {
        let doc = parse_tree(src).unwrap();
        let el = Element::root(&doc);
        let mut diagnostics = Vec::new();
        let p = compute(&Style::default(), true, &el, VIEWPORT, &mut diagnostics);
        (p, diagnostics)
    }

    #[test]
    fn test_defaults() {
        let (p, diags) = compute_root("<g/>");
        assert_eq!(p.style, Style::default());
        assert_eq!(p.opacity, 1.0);
        assert!(p.displayed && p.visible);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_attributes_and_inline_style() {
        let (p, diags) = compute_root(
            r#"<g fill="red" stroke="blue" stroke-width="3" style="fill: #00ff00; stroke-linecap: round"/>"#,
        );
        assert!(diags.is_empty());
        assert_eq!(p.style.fill, Paint::Solid(Color::rgb(0.0, 1.0, 0.0)));
        assert_eq!(p.style.stroke, Paint::Solid(Color::BLUE));
        assert_eq!(p.style.stroke_style.width, 3.0);
        assert_eq!(p.style.stroke_style.cap, LineCap::Round);
    }

    #[test]
    fn test_current_color_uses_own_color_property() {
        let (p, _) = compute_root(r#"<g fill="currentColor" color="red"/>"#);
        assert_eq!(p.style.fill, Paint::Solid(Color::RED));
    }

    #[test]
    fn test_bad_color_keeps_inherited_value() {
        let (p, diags) = compute_root(r#"<g fill="notacolor"/>"#);
        assert_eq!(p.style.fill, Paint::Solid(Color::BLACK));
        assert!(matches!(
            &diags[..],
            [Diagnostic::ColorParseFailure { attribute, .. }] if attribute == "fill"
        ));
    }

    #[test]
    fn test_invalid_attribute_values() {
        let (p, diags) = compute_root(r#"<g stroke-width="2em" fill-rule="odd" stroke-miterlimit="0.5"/>"#);
        assert_eq!(p.style.stroke_style.width, 1.0);
        assert_eq!(p.style.fill_rule, FillRule::NonZero);
        assert_eq!(p.style.stroke_style.miter_limit, 4.0);
        assert_eq!(diags.len(), 3);
        assert!(diags
            .iter()
            .all(|d| matches!(d, Diagnostic::InvalidAttribute { .. })));
    }

    #[test]
    fn test_opacity_is_clamped() {
        let (p, _) = compute_root(r#"<g opacity="1.5" fill-opacity="50%" stroke-opacity="-1"/>"#);
        assert_eq!(p.opacity, 1.0);
        assert_eq!(p.style.fill_opacity, 0.5);
        assert_eq!(p.style.stroke_opacity, 0.0);
    }

    #[test]
    fn test_display_and_visibility() {
        let (p, _) = compute_root(r#"<g display="none" visibility="hidden"/>"#);
        assert!(!p.displayed);
        assert!(!p.visible);
    }

    #[test]
    fn test_percent_stroke_width_uses_diagonal() {
        let (p, _) = compute_root(r#"<g stroke-width="10%"/>"#);
        assert!((p.style.stroke_style.width - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_paint_values() {
        assert_eq!(parse_paint("none", Color::BLACK), Ok(Paint::None));
        assert_eq!(
            parse_paint("currentColor", Color::BLUE),
            Ok(Paint::Solid(Color::BLUE))
        );
        assert_eq!(
            parse_paint("url(#g1)", Color::BLACK),
            Ok(Paint::GradientRef {
                id: "g1".into(),
                fallback: None
            })
        );
        assert_eq!(
            parse_paint("url('#g2') red", Color::BLACK),
            Ok(Paint::GradientRef {
                id: "g2".into(),
                fallback: Some(Color::RED)
            })
        );
        assert!(parse_paint("url(g1)", Color::BLACK).is_err());
        assert!(parse_paint("url(#g1", Color::BLACK).is_err());
        assert!(parse_paint("url(#g1) bogus", Color::BLACK).is_err());
    }

    #[test]
    fn test_parse_opacity() {
        assert_eq!(parse_opacity("0.25"), Some(0.25));
        assert_eq!(parse_opacity("75%"), Some(0.75));
        assert_eq!(parse_opacity("2"), Some(1.0));
        assert_eq!(parse_opacity("half"), None);
        assert_eq!(parse_opacity("0.5px"), None);
    }
}
