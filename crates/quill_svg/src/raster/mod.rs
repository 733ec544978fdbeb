//! CPU rasterization of a parsed document
//!
//! The scene graph is walked depth-first in document order. Each shape is
//! built as a `tiny-skia` path, covered into a mask and composited "over"
//! the pixmap one pixel at a time, so gradients are sampled by
//! [`PaintSource`]. Strokes are expanded to outlines and filled the same way.
//! The result is converted to straight RGBA8.

mod outline;
mod pixmap;

use quill_core::{Affine2D, Color, Rect, Size, StrokeStyle};
use tiny_skia::Path;
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::paint::PaintSource;
use crate::scene::{GradientRegistry, Node, NodeKind, Paint, SvgDocument};
use crate::shape;

pub use pixmap::{PixelBuffer, MAX_PIXELS};

use self::outline::{build_path, to_fill_rule, to_stroke, to_transform};
use self::pixmap::{check_size, Canvas};

/// Rasterization settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Composited beneath the scene
    pub background: Color,
    /// Anti-aliased edges; off samples each pixel once at its center
    pub antialias: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: Color::TRANSPARENT,
            antialias: true,
        }
    }
}

impl RenderOptions {
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }
}

/// Render `document` into a `width` x `height` buffer with default options
pub fn render(document: &SvgDocument, width: u32, height: u32) -> PixelBuffer {
    render_with_options(document, width, height, &RenderOptions::default())
}

/// Render `document` into a `width` x `height` buffer
///
/// Never fails: a document with nothing to draw yields the background, and a
/// zero dimension yields an empty buffer of that size. A size over
/// [`MAX_PIXELS`] is logged and yields the 0x0 buffer; use
/// [`try_render_with_options`] to see that case as an error.
pub fn render_with_options(
    document: &SvgDocument,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> PixelBuffer {
    try_render_with_options(document, width, height, options).unwrap_or_else(|e| {
        warn!("Skipping render: {}", e);
        PixelBuffer::empty()
    })
}

/// Render `document`, failing when the output would exceed [`MAX_PIXELS`]
pub fn try_render_with_options(
    document: &SvgDocument,
    width: u32,
    height: u32,
    options: &RenderOptions,
) -> Result<PixelBuffer, RenderError> {
    check_size(width, height)?;
    if width == 0 || height == 0 {
        return Ok(PixelBuffer::transparent(width, height));
    }

    let canvas = Canvas::new(width, height, options.background, options.antialias).ok_or(
        RenderError::SizeTooLarge {
            width,
            height,
            max: MAX_PIXELS,
        },
    )?;
    let mut painter = Painter {
        canvas,
        registry: document.gradients(),
    };

    let root = root_transform(document, Size::new(width as f32, height as f32));
    for node in document.nodes() {
        painter.draw(node, &root, 1.0);
    }

    debug!(
        "Rendered {} nodes at {}x{}",
        document.node_count(),
        width,
        height
    );
    Ok(painter.canvas.into_pixel_buffer())
}

/// Map the document's viewBox (or its width/height) onto the output
///
/// A document without any size information is drawn in output pixels.
pub fn root_transform(document: &SvgDocument, target: Size) -> Affine2D {
    let view_box = document
        .view_box()
        .or_else(|| match (document.width(), document.height()) {
            (None, None) => None,
            (w, h) => Some(Rect::new(
                0.0,
                0.0,
                w.unwrap_or(target.width),
                h.unwrap_or(target.height),
            )),
        });
    match view_box {
        Some(vb) => document.aspect_ratio().fit(vb, target),
        None => Affine2D::IDENTITY,
    }
}

struct Painter<'a> {
    canvas: Canvas,
    registry: &'a GradientRegistry,
}

impl Painter<'_> {
    fn draw(&mut self, node: &Node, parent: &Affine2D, parent_opacity: f32) {
        let ctm = parent.then(&node.transform);
        let opacity = parent_opacity * node.opacity;
        if opacity <= 0.0 {
            return;
        }

        if let NodeKind::Group { children } = &node.kind {
            for child in children {
                self.draw(child, &ctm, opacity);
            }
            return;
        }

        let segments = shape::to_segments(&node.kind);
        let bbox = shape::bounds(&segments);
        let Some(path) = build_path(&segments) else {
            return;
        };
        let style = &node.style;

        if !style.fill.is_none() {
            if let Some(device) = path.clone().transform(to_transform(&ctm)) {
                self.fill(
                    &device,
                    to_fill_rule(style.fill_rule),
                    &style.fill,
                    bbox,
                    &ctm,
                    opacity * style.fill_opacity,
                );
            }
        }

        if !style.stroke.is_none() {
            self.stroke(
                &path,
                &style.stroke_style,
                &style.stroke,
                bbox,
                &ctm,
                opacity * style.stroke_opacity,
            );
        }
    }

    /// Stroke in user space, then fill the outline in device space
    fn stroke(
        &mut self,
        path: &Path,
        style: &StrokeStyle,
        paint: &Paint,
        bbox: Option<Rect>,
        ctm: &Affine2D,
        opacity: f32,
    ) {
        if style.width <= 0.0 {
            return;
        }
        let resolution = ctm.mean_scale().max(f32::EPSILON);
        let Some(outline) = path
            .stroke(&to_stroke(style), resolution)
            .and_then(|outline| outline.transform(to_transform(ctm)))
        else {
            return;
        };
        self.fill(
            &outline,
            tiny_skia::FillRule::Winding,
            paint,
            bbox,
            ctm,
            opacity,
        );
    }

    fn fill(
        &mut self,
        device: &Path,
        rule: tiny_skia::FillRule,
        paint: &Paint,
        bbox: Option<Rect>,
        ctm: &Affine2D,
        opacity: f32,
    ) {
        let source = PaintSource::prepare(paint, self.registry, bbox, ctm, opacity);
        if source.is_invisible() {
            return;
        }
        self.canvas.fill(device, rule, &source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;
    use quill_core::Point;

    fn alpha_at(buffer: &PixelBuffer, x: u32, y: u32) -> u8 {
        buffer.pixel(x, y).map_or(0, |p| p[3])
    }

    fn render_src(src: &str, w: u32, h: u32) -> PixelBuffer {
        render(&parse(src).unwrap(), w, h)
    }

    #[test]
    fn test_buffer_matches_requested_size() {
        let doc = parse(r#"<svg viewBox="0 0 7 3"><rect width="7" height="3"/></svg>"#).unwrap();
        for (w, h) in [(1, 1), (10, 4), (3, 30)] {
            let buffer = render(&doc, w, h);
            assert_eq!(buffer.dimensions(), (w, h));
            assert_eq!(buffer.data().len(), (w * h * 4) as usize);
        }
    }

    #[test]
    fn test_zero_dimension_yields_empty_buffer() {
        let doc = parse("<svg/>").unwrap();
        let buffer = render(&doc, 0, 10);
        assert_eq!(buffer.dimensions(), (0, 10));
        assert!(buffer.data().is_empty());
    }

    #[test]
    fn test_root_transform_letterboxes() {
        let doc = parse(r#"<svg viewBox="0 0 10 5"/>"#).unwrap();
        let m = root_transform(&doc, Size::new(20.0, 20.0));
        assert_eq!(m.transform_point(Point::new(0.0, 0.0)), Point::new(0.0, 5.0));
        assert_eq!(m.transform_point(Point::new(10.0, 5.0)), Point::new(20.0, 15.0));
    }

    #[test]
    fn test_root_transform_uses_output_for_missing_dimension() {
        let doc = parse(r#"<svg width="10"/>"#).unwrap();
        let m = root_transform(&doc, Size::new(20.0, 40.0));
        // 10 x 40 fitted into 20 x 40
        assert_eq!(m.transform_point(Point::new(10.0, 40.0)), Point::new(15.0, 40.0));
        assert!(root_transform(&parse("<svg/>").unwrap(), Size::new(5.0, 5.0)).is_identity());
    }

    #[test]
    fn test_background_and_antialias_options() {
        let doc = parse(r#"<svg width="4" height="4"><rect x="0.5" width="2" height="4" fill="black"/></svg>"#).unwrap();
        let options = RenderOptions::default().with_background(Color::WHITE);
        let aa = render_with_options(&doc, 4, 4, &options);
        assert_eq!(aa.pixel(3, 0), Some([255, 255, 255, 255]));
        let [r, _, _, a] = aa.pixel(0, 0).unwrap();
        assert!(r.abs_diff(128) <= 2 && a == 255, "{r} {a}");

        let aliased = render_with_options(&doc, 4, 4, &options.with_antialias(false));
        let edge = aliased.pixel(0, 0).unwrap();
        assert!(edge == [0, 0, 0, 255] || edge == [255, 255, 255, 255]);
    }

    #[test]
    fn test_later_siblings_paint_over_earlier() {
        let buffer = render_src(
            r#"<svg width="2" height="2"><rect width="2" height="2" fill="red"/><rect width="1" height="2" fill="blue"/></svg>"#,
            2,
            2,
        );
        assert_eq!(buffer.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(buffer.pixel(1, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_group_transform_and_opacity_compose() {
        let buffer = render_src(
            r#"<svg width="4" height="4"><g transform="translate(2,0)" opacity="0.5"><rect width="2" height="4" fill="lime" opacity="0.5"/></g></svg>"#,
            4,
            4,
        );
        assert_eq!(buffer.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(buffer.pixel(3, 1), Some([0, 255, 0, 64]));
    }

    #[test]
    fn test_stroke_only_shape() {
        let buffer = render_src(
            r#"<svg width="10" height="10"><rect x="2" y="2" width="6" height="6" fill="none" stroke="black" stroke-width="2"/></svg>"#,
            10,
            10,
        );
        assert_eq!(buffer.pixel(5, 5), Some([0, 0, 0, 0]), "interior unfilled");
        assert_eq!(buffer.pixel(2, 5), Some([0, 0, 0, 255]), "left side stroked");
        assert_eq!(buffer.pixel(1, 1), Some([0, 0, 0, 255]), "miter corner");
    }

    #[test]
    fn test_stroke_width_scales_with_transform() {
        let buffer = render_src(
            r#"<svg width="20" height="20"><line x1="0" y1="10" x2="20" y2="10" stroke="black" transform="scale(1)"/><g transform="scale(4)"><line x1="0" y1="1" x2="5" y2="1" stroke="black"/></g></svg>"#,
            20,
            20,
        );
        // 1px line at y=10 straddles rows 9 and 10
        let alpha = buffer.pixel(5, 9).unwrap()[3];
        assert!(alpha.abs_diff(128) <= 2, "{alpha}");
        // Scaled line is 4px wide around y=4
        assert_eq!(buffer.pixel(5, 2), Some([0, 0, 0, 255]));
        assert_eq!(buffer.pixel(5, 5), Some([0, 0, 0, 255]));
        assert_eq!(buffer.pixel(5, 6), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_evenodd_fill_rule() {
        let buffer = render_src(
            r#"<svg width="6" height="6"><path fill-rule="evenodd" d="M0 0H6V6H0Z M2 2H4V4H2Z"/></svg>"#,
            6,
            6,
        );
        assert_eq!(buffer.pixel(3, 3), Some([0, 0, 0, 0]));
        assert_eq!(buffer.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_oversized_output_is_rejected() {
        let doc = parse(r#"<svg><rect width="10" height="10"/></svg>"#).unwrap();
        let options = RenderOptions::default();
        assert_eq!(
            try_render_with_options(&doc, 100_000, 100_000, &options),
            Err(RenderError::SizeTooLarge {
                width: 100_000,
                height: 100_000,
                max: MAX_PIXELS
            })
        );
        let buffer = render(&doc, u32::MAX, u32::MAX);
        assert_eq!(buffer.dimensions(), (0, 0));
        assert!(try_render_with_options(&doc, 16, 16, &options).is_ok());
    }

    #[test]
    fn test_line_caps() {
        let line = |cap: &str| {
            render_src(
                &format!(
                    r#"<svg width="30" height="20"><line x1="10" y1="10" x2="20" y2="10" stroke="black" stroke-width="10" stroke-linecap="{cap}"/></svg>"#
                ),
                30,
                20,
            )
        };
        let butt = line("butt");
        assert_eq!(alpha_at(&butt, 15, 10), 255);
        assert_eq!(alpha_at(&butt, 6, 10), 0);

        let square = line("square");
        assert_eq!(alpha_at(&square, 6, 10), 255);
        assert_eq!(alpha_at(&square, 5, 5), 255);

        let round = line("round");
        assert_eq!(alpha_at(&round, 6, 10), 255);
        // Outside the cap's circle
        assert_eq!(alpha_at(&round, 5, 5), 0);
    }

    #[test]
    fn test_line_joins() {
        let corner = |join: &str| {
            render_src(
                &format!(
                    r#"<svg width="20" height="20"><polyline points="4 16 10 10 16 16" fill="none" stroke="black" stroke-width="4" stroke-linejoin="{join}"/></svg>"#
                ),
                20,
                20,
            )
        };
        // The miter tip reaches about 2.8 units above the vertex
        let miter = corner("miter");
        assert!(alpha_at(&miter, 10, 7) > 0);
        let bevel = corner("bevel");
        assert_eq!(alpha_at(&bevel, 10, 7), 0);
        let round = corner("round");
        assert_eq!(alpha_at(&round, 10, 7), 0);
        assert!(alpha_at(&round, 10, 8) > 0);
    }

    #[test]
    fn test_miter_limit_falls_back_to_bevel() {
        let buffer = render_src(
            r#"<svg width="20" height="20"><polyline points="4 16 10 10 16 16" fill="none" stroke="black" stroke-width="4" stroke-miterlimit="1"/></svg>"#,
            20,
            20,
        );
        assert_eq!(alpha_at(&buffer, 10, 7), 0);
    }

    #[test]
    fn test_without_antialias_coverage_is_binary() {
        let doc = parse(r#"<svg width="10" height="10"><circle cx="5" cy="5" r="3.7"/></svg>"#).unwrap();
        let buffer = render_with_options(&doc, 10, 10, &RenderOptions::default().with_antialias(false));
        assert!(buffer.data().chunks_exact(4).all(|p| p[3] == 0 || p[3] == 255));
        assert_eq!(alpha_at(&buffer, 5, 5), 255);
    }
}
