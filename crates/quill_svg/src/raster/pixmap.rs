//! Pixel storage

use quill_core::{Color, Point};
use tiny_skia::{Mask, Path, Pixmap, PremultipliedColorU8, Transform};
use tracing::warn;

use crate::error::RenderError;
use crate::paint::PaintSource;

/// Largest output accepted, in pixels (8192 x 8192)
pub const MAX_PIXELS: u64 = 1 << 26;

/// Reject sizes whose buffer would exceed [`MAX_PIXELS`]
pub(crate) fn check_size(width: u32, height: u32) -> Result<(), RenderError> {
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(RenderError::SizeTooLarge {
            width,
            height,
            max: MAX_PIXELS,
        });
    }
    Ok(())
}

/// Rasterized image data
///
/// Straight-alpha RGBA8, row-major, top-left origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer of the given size
    ///
    /// A size over [`MAX_PIXELS`] yields an empty 0x0 buffer instead.
    pub fn transparent(width: u32, height: u32) -> Self {
        if let Err(e) = check_size(width, height) {
            warn!("Substituting an empty buffer: {}", e);
            return Self::empty();
        }
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// The 0x0 buffer
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the pixel data as a slice
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA of one pixel, `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.pixels.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True when every pixel has zero alpha
    pub fn is_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.pixels
    }
}

/// Premultiplied render target backed by a `tiny-skia` pixmap
pub(crate) struct Canvas {
    pixmap: Pixmap,
    antialias: bool,
}

impl Canvas {
    /// `None` when `tiny-skia` cannot allocate the size
    pub fn new(width: u32, height: u32, background: Color, antialias: bool) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        let [r, g, b, a] = background.to_rgba8();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        Some(Self { pixmap, antialias })
    }

    /// Cover `path` (in device space) and composite `source` over the
    /// covered pixels
    pub fn fill(&mut self, path: &Path, rule: tiny_skia::FillRule, source: &PaintSource<'_>) {
        let width = self.pixmap.width();
        let height = self.pixmap.height();

        // Coverage is computed only over the path's bounds, clipped to the canvas
        let bounds = path.bounds();
        let x0 = bounds.left().floor().max(0.0) as u32;
        let y0 = bounds.top().floor().max(0.0) as u32;
        let x1 = (bounds.right().ceil().max(0.0) as u32).min(width);
        let y1 = (bounds.bottom().ceil().max(0.0) as u32).min(height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let Some(mut mask) = Mask::new(x1 - x0, y1 - y0) else {
            return;
        };
        let shift = Transform::from_translate(-(x0 as f32), -(y0 as f32));
        mask.fill_path(path, rule, self.antialias, shift);

        let mask_width = (x1 - x0) as usize;
        let pixels = self.pixmap.pixels_mut();
        for (i, &coverage) in mask.data().iter().enumerate() {
            if coverage == 0 {
                continue;
            }
            let x = x0 as usize + i % mask_width;
            let y = y0 as usize + i / mask_width;
            let color = source.sample(Point::new(x as f32 + 0.5, y as f32 + 0.5));
            if let Some(dst) = pixels.get_mut(y * width as usize + x) {
                blend(dst, color, coverage as f32 / 255.0);
            }
        }
    }

    /// Convert to straight-alpha RGBA8
    pub fn into_pixel_buffer(self) -> PixelBuffer {
        let mut pixels = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        PixelBuffer {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            pixels,
        }
    }
}

/// Composite a straight-alpha color over `dst`, scaled by `coverage`
fn blend(dst: &mut PremultipliedColorU8, color: Color, coverage: f32) {
    let [r, g, b, a] = color.premultiplied();
    let k = coverage.clamp(0.0, 1.0);
    let src = [r * k, g * k, b * k, a * k];
    if src[3] <= 0.0 {
        return;
    }

    let inv = 1.0 - src[3];
    let d = [dst.red(), dst.green(), dst.blue(), dst.alpha()];
    let mix = |s: f32, d: u8| ((s + d as f32 / 255.0 * inv) * 255.0).round().clamp(0.0, 255.0) as u8;
    let alpha = mix(src[3], d[3]);
    let out = PremultipliedColorU8::from_rgba(
        mix(src[0], d[0]).min(alpha),
        mix(src[1], d[1]).min(alpha),
        mix(src[2], d[2]).min(alpha),
        alpha,
    );
    if let Some(out) = out {
        *dst = out;
    }
}
