//! Paint resolution
//!
//! A node's [`Paint`] is prepared once per fill or stroke into a
//! [`PaintSource`] (registry lookup, bounding-box mapping, inverse gradient
//! transform) and then sampled per pixel.

use quill_core::{Affine2D, Color, Point, Rect, Vec2};

use crate::scene::{Gradient, GradientKind, GradientRegistry, GradientUnits, Paint, SpreadMethod, Stop};

/// A paint ready to be sampled
#[derive(Clone, Debug, PartialEq)]
pub enum PaintSource<'a> {
    Solid(Color),
    Linear {
        stops: &'a [Stop],
        spread: SpreadMethod,
        /// Sample space to gradient space
        inverse: Affine2D,
        start: Point,
        axis: Vec2,
        opacity: f32,
    },
    Radial {
        stops: &'a [Stop],
        spread: SpreadMethod,
        inverse: Affine2D,
        center: Point,
        radius: f32,
        opacity: f32,
    },
}

impl<'a> PaintSource<'a> {
    /// Prepare `paint` for sampling
    ///
    /// `bbox` is the shape's bounding box in user space, `ctm` maps user
    /// space to the space `sample` is called in, and `opacity` is multiplied
    /// into every sampled color.
    pub fn prepare(
        paint: &Paint,
        registry: &'a GradientRegistry,
        bbox: Option<Rect>,
        ctm: &Affine2D,
        opacity: f32,
    ) -> PaintSource<'a> {
        match paint {
            Paint::None => PaintSource::Solid(Color::TRANSPARENT),
            Paint::Solid(color) => PaintSource::Solid(color.multiply_alpha(opacity)),
            Paint::GradientRef { id, fallback } => match registry.get(id) {
                Some(gradient) => Self::gradient(gradient, bbox, ctm, opacity),
                None => PaintSource::Solid(
                    fallback.map_or(Color::TRANSPARENT, |c| c.multiply_alpha(opacity)),
                ),
            },
        }
    }

    fn gradient(gradient: &'a Gradient, bbox: Option<Rect>, ctm: &Affine2D, opacity: f32) -> Self {
        let stops = gradient.stops.as_slice();
        match stops {
            [] => return PaintSource::Solid(Color::TRANSPARENT),
            [only] => return PaintSource::Solid(only.effective_color().multiply_alpha(opacity)),
            _ => {}
        }
        let last = || PaintSource::Solid(stops[stops.len() - 1].effective_color().multiply_alpha(opacity));

        // Gradient space to user space
        let units = match gradient.units {
            GradientUnits::UserSpaceOnUse => Affine2D::IDENTITY,
            GradientUnits::ObjectBoundingBox => match bbox {
                Some(b) if b.width() > 0.0 && b.height() > 0.0 => {
                    Affine2D::new(b.width(), 0.0, 0.0, b.height(), b.x(), b.y())
                }
                _ => return PaintSource::Solid(Color::TRANSPARENT),
            },
        };
        let to_sample = ctm.then(&units).then(&gradient.transform);
        let Some(inverse) = to_sample.invert() else {
            return PaintSource::Solid(Color::TRANSPARENT);
        };

        match gradient.kind {
            GradientKind::Linear { x1, y1, x2, y2 } => {
                let axis = Vec2::new(x2 - x1, y2 - y1);
                if axis.dot(axis) <= f32::EPSILON {
                    return last();
                }
                PaintSource::Linear {
                    stops,
                    spread: gradient.spread,
                    inverse,
                    start: Point::new(x1, y1),
                    axis,
                    opacity,
                }
            }
            GradientKind::Radial { cx, cy, r } => {
                if r <= 0.0 {
                    return last();
                }
                PaintSource::Radial {
                    stops,
                    spread: gradient.spread,
                    inverse,
                    center: Point::new(cx, cy),
                    radius: r,
                    opacity,
                }
            }
        }
    }

    /// Straight-alpha color at `point`
    pub fn sample(&self, point: Point) -> Color {
        match self {
            PaintSource::Solid(color) => *color,
            PaintSource::Linear {
                stops,
                spread,
                inverse,
                start,
                axis,
                opacity,
            } => {
                let p = inverse.transform_point(point);
                let t = (p - *start).dot(*axis) / axis.dot(*axis);
                sample_stops(stops, apply_spread(*spread, t)).multiply_alpha(*opacity)
            }
            PaintSource::Radial {
                stops,
                spread,
                inverse,
                center,
                radius,
                opacity,
            } => {
                let p = inverse.transform_point(point);
                let t = p.distance(*center) / radius;
                sample_stops(stops, apply_spread(*spread, t)).multiply_alpha(*opacity)
            }
        }
    }

    /// True when every sample is fully transparent
    pub fn is_invisible(&self) -> bool {
        match self {
            PaintSource::Solid(color) => color.is_transparent(),
            PaintSource::Linear { opacity, .. } | PaintSource::Radial { opacity, .. } => {
                *opacity <= 0.0
            }
        }
    }
}

/// Color of `paint` at `point`, both in the same user space as `bbox`
pub fn resolve_paint(
    paint: &Paint,
    registry: &GradientRegistry,
    point: Point,
    bbox: Option<Rect>,
) -> Color {
    PaintSource::prepare(paint, registry, bbox, &Affine2D::IDENTITY, 1.0).sample(point)
}

fn apply_spread(spread: SpreadMethod, t: f32) -> f32 {
    if !t.is_finite() {
        return 0.0;
    }
    match spread {
        SpreadMethod::Pad => t.clamp(0.0, 1.0),
        SpreadMethod::Repeat => t - t.floor(),
        SpreadMethod::Reflect => {
            let m = t.rem_euclid(2.0);
            if m > 1.0 {
                2.0 - m
            } else {
                m
            }
        }
    }
}

/// Interpolate a sorted stop list at `t`
///
/// Colors are flat before the first and after the last stop. Between two
/// stops each channel moves linearly, so samples never leave the range of
/// the bracketing pair.
pub fn sample_stops(stops: &[Stop], t: f32) -> Color {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Color::TRANSPARENT;
    };
    if t <= first.offset {
        return first.effective_color();
    }
    if t >= last.offset {
        return last.effective_color();
    }

    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            if span <= f32::EPSILON {
                return b.effective_color();
            }
            let local = ((t - a.offset) / span).clamp(0.0, 1.0);
            return Color::lerp(&a.effective_color(), &b.effective_color(), local);
        }
    }
    last.effective_color()
}
