//! SVG parsing and rasterization for Quill
//!
//! This crate turns SVG source text into an RGBA pixel buffer. Parsing
//! builds an immutable scene graph ([`SvgDocument`]); rendering is a pure
//! function of a document and an output size, so one document can be
//! rendered from several threads at once.
//!
//! # Example
//!
//! ```
//! use quill_svg::{render, SvgDocument};
//!
//! let svg = r#"<svg width="100" height="100"><circle cx="50" cy="50" r="40" fill="blue"/></svg>"#;
//! let document: SvgDocument = svg.parse()?;
//! let image = render(&document, 100, 100);
//! assert_eq!(image.pixel(50, 50), Some([0, 0, 255, 255]));
//! # Ok::<(), quill_svg::ParseError>(())
//! ```

mod document;
mod error;
mod paint;
mod path;
mod raster;
mod scene;
mod shape;
mod style;
mod transform;
mod units;
mod xml;

#[cfg(test)]
mod tests;

pub use document::parse;
pub use error::{Diagnostic, ParseError, PathError, PathErrorKind, RenderError, TextPos};
pub use paint::{resolve_paint, sample_stops, PaintSource};
pub use path::{arc_to_cubics, parse_path_data, Segment};
pub use raster::{
    render, render_with_options, root_transform, try_render_with_options, PixelBuffer,
    RenderOptions, MAX_PIXELS,
};
pub use scene::{
    Align, AspectRatio, Gradient, GradientKind, GradientRegistry, GradientUnits, Node, NodeKind,
    Paint, SpreadMethod, Stop, SvgDocument,
};
pub use shape::{bounds, to_segments};
pub use style::{parse_paint, Style};
pub use transform::parse_transform;

use tracing::warn;

/// Output size used when the caller has no preference
pub const DEFAULT_RENDER_SIZE: (u32, u32) = (200, 200);

/// Edge length of square thumbnails
pub const THUMBNAIL_SIZE: u32 = 64;

/// Parse and render in one step
pub fn render_str(source: &str, width: u32, height: u32) -> Result<PixelBuffer, ParseError> {
    let document = parse(source)?;
    Ok(render(&document, width, height))
}

/// Parse and render, substituting a transparent buffer for unparseable input
pub fn render_or_blank(source: &str, width: u32, height: u32) -> PixelBuffer {
    render_str(source, width, height).unwrap_or_else(|e| {
        warn!("Rendering blank {}x{} image: {}", width, height, e);
        PixelBuffer::transparent(width, height)
    })
}

/// Render a square thumbnail of [`THUMBNAIL_SIZE`] pixels
pub fn render_thumbnail(source: &str) -> PixelBuffer {
    render_or_blank(source, THUMBNAIL_SIZE, THUMBNAIL_SIZE)
}
