//! Shape decomposition into path segments

use quill_core::{Point, Rect};

use crate::path::{arc_to_cubics, Segment};
use crate::scene::NodeKind;

/// Magic number for cubic Bézier circle approximation
const KAPPA: f32 = 0.552_284_75;

/// Outline of a shape node as absolute segments in its local user space
///
/// Groups have no outline of their own and yield an empty list.
pub fn to_segments(kind: &NodeKind) -> Vec<Segment> {
    match kind {
        NodeKind::Rect {
            x,
            y,
            width,
            height,
            rx,
            ry,
        } => rect(*x, *y, *width, *height, *rx, *ry),
        NodeKind::Circle { center, radius } => ellipse(*center, *radius, *radius),
        NodeKind::Ellipse { center, rx, ry } => ellipse(*center, *rx, *ry),
        NodeKind::Line { from, to } => vec![Segment::MoveTo(*from), Segment::LineTo(*to)],
        NodeKind::Polygon { points } => poly(points, true),
        NodeKind::Polyline { points } => poly(points, false),
        NodeKind::Path { segments } => segments.clone(),
        NodeKind::Group { .. } => Vec::new(),
    }
}

/// Resolve `rx`/`ry` for a rect: a missing radius mirrors the other, and
/// both are clamped to half the corresponding side
pub(crate) fn rect_radii(rx: Option<f32>, ry: Option<f32>, width: f32, height: f32) -> (f32, f32) {
    let (rx, ry) = match (rx, ry) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    (rx.min(width / 2.0).max(0.0), ry.min(height / 2.0).max(0.0))
}

fn rect(x: f32, y: f32, w: f32, h: f32, rx: f32, ry: f32) -> Vec<Segment> {
    let p = Point::new;
    if rx <= 0.0 || ry <= 0.0 {
        return vec![
            Segment::MoveTo(p(x, y)),
            Segment::LineTo(p(x + w, y)),
            Segment::LineTo(p(x + w, y + h)),
            Segment::LineTo(p(x, y + h)),
            Segment::Close,
        ];
    }

    let kx = rx * (1.0 - KAPPA);
    let ky = ry * (1.0 - KAPPA);
    let corner = |c1: Point, c2: Point, end: Point| Segment::CubicTo {
        control1: c1,
        control2: c2,
        end,
    };

    vec![
        Segment::MoveTo(p(x + rx, y)),
        Segment::LineTo(p(x + w - rx, y)),
        corner(p(x + w - kx, y), p(x + w, y + ky), p(x + w, y + ry)),
        Segment::LineTo(p(x + w, y + h - ry)),
        corner(p(x + w, y + h - ky), p(x + w - kx, y + h), p(x + w - rx, y + h)),
        Segment::LineTo(p(x + rx, y + h)),
        corner(p(x + kx, y + h), p(x, y + h - ky), p(x, y + h - ry)),
        Segment::LineTo(p(x, y + ry)),
        corner(p(x, y + ky), p(x + kx, y), p(x + rx, y)),
        Segment::Close,
    ]
}

fn ellipse(center: Point, rx: f32, ry: f32) -> Vec<Segment> {
    let (cx, cy) = (center.x, center.y);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let cubic = |x1, y1, x2, y2, x, y| Segment::CubicTo {
        control1: Point::new(x1, y1),
        control2: Point::new(x2, y2),
        end: Point::new(x, y),
    };

    vec![
        Segment::MoveTo(Point::new(cx + rx, cy)),
        cubic(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry),
        cubic(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy),
        cubic(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry),
        cubic(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy),
        Segment::Close,
    ]
}

fn poly(points: &[Point], close: bool) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(points.len() + 1);
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        segments.push(Segment::MoveTo(*first));
        segments.extend(iter.map(|p| Segment::LineTo(*p)));
        if close {
            segments.push(Segment::Close);
        }
    }
    segments
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounds
// ─────────────────────────────────────────────────────────────────────────────

/// Exact bounding box of a segment list, curve extrema included
pub fn bounds(segments: &[Segment]) -> Option<Rect> {
    let mut points: Vec<Point> = Vec::with_capacity(segments.len() * 2);
    let mut current = Point::ZERO;
    let mut start = Point::ZERO;

    for segment in segments {
        match *segment {
            Segment::MoveTo(p) => {
                points.push(p);
                current = p;
                start = p;
            }
            Segment::LineTo(p) => {
                points.push(p);
                current = p;
            }
            Segment::QuadTo { control, end } => {
                points.push(end);
                quad_extrema(current, control, end, &mut points);
                current = end;
            }
            Segment::CubicTo {
                control1,
                control2,
                end,
            } => {
                points.push(end);
                cubic_extrema(current, control1, control2, end, &mut points);
                current = end;
            }
            Segment::ArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => {
                let mut from = current;
                for cubic in arc_to_cubics(current, radii, rotation, large_arc, sweep, end) {
                    if let Segment::CubicTo {
                        control1,
                        control2,
                        end,
                    } = cubic
                    {
                        cubic_extrema(from, control1, control2, end, &mut points);
                        from = end;
                    }
                }
                points.push(end);
                current = end;
            }
            Segment::Close => current = start,
        }
    }

    Rect::bounding(points)
}

fn quad_extrema(p0: Point, p1: Point, p2: Point, out: &mut Vec<Point>) {
    let eval = |t: f32| {
        let mt = 1.0 - t;
        Point::new(
            mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
            mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
        )
    };
    for (a, b, c) in [(p0.x, p1.x, p2.x), (p0.y, p1.y, p2.y)] {
        let denom = a - 2.0 * b + c;
        if denom != 0.0 {
            let t = (a - b) / denom;
            if t > 0.0 && t < 1.0 {
                out.push(eval(t));
            }
        }
    }
}

fn cubic_extrema(p0: Point, p1: Point, p2: Point, p3: Point, out: &mut Vec<Point>) {
    let eval = |t: f32| {
        let mt = 1.0 - t;
        let (w0, w1, w2, w3) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
        Point::new(
            w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
            w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
        )
    };

    for (v0, v1, v2, v3) in [(p0.x, p1.x, p2.x, p3.x), (p0.y, p1.y, p2.y, p3.y)] {
        // Derivative is proportional to a*t^2 + b*t + c
        let (c0, c1, c2) = (v1 - v0, v2 - v1, v3 - v2);
        let a = c0 - 2.0 * c1 + c2;
        let b = 2.0 * (c1 - c0);
        let c = c0;

        let mut roots = [f32::NAN; 2];
        if a.abs() < 1e-12 {
            if b != 0.0 {
                roots[0] = -c / b;
            }
        } else {
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                let sq = disc.sqrt();
                roots = [(-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a)];
            }
        }

        for t in roots {
            if t > 0.0 && t < 1.0 {
                out.push(eval(t));
            }
        }
    }
}
