//! Segment lists as `tiny-skia` paths

use quill_core::{Affine2D, FillRule, LineCap, LineJoin, Point, StrokeStyle};
use tiny_skia::{Path, PathBuilder, Stroke, Transform};

use crate::path::{arc_to_cubics, Segment};

/// Build a user-space path; `None` when nothing drawable remains
pub(crate) fn build_path(segments: &[Segment]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    // Arcs are expanded from the pen position
    let mut pen = Point::ZERO;
    let mut start = Point::ZERO;

    for segment in segments {
        match *segment {
            Segment::MoveTo(p) => {
                pb.move_to(p.x, p.y);
                pen = p;
                start = p;
            }
            Segment::LineTo(p) => {
                pb.line_to(p.x, p.y);
                pen = p;
            }
            Segment::QuadTo { control, end } => {
                pb.quad_to(control.x, control.y, end.x, end.y);
                pen = end;
            }
            Segment::CubicTo {
                control1,
                control2,
                end,
            } => {
                pb.cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y);
                pen = end;
            }
            Segment::ArcTo {
                radii,
                rotation,
                large_arc,
                sweep,
                end,
            } => {
                for piece in arc_to_cubics(pen, radii, rotation, large_arc, sweep, end) {
                    match piece {
                        Segment::CubicTo {
                            control1,
                            control2,
                            end,
                        } => pb.cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y),
                        other => {
                            if let Some(p) = other.end_point() {
                                pb.line_to(p.x, p.y);
                            }
                        }
                    }
                }
                pen = end;
            }
            Segment::Close => {
                pb.close();
                pen = start;
            }
        }
    }

    pb.finish()
}

pub(crate) fn to_transform(m: &Affine2D) -> Transform {
    let [a, b, c, d, tx, ty] = m.elements;
    Transform::from_row(a, b, c, d, tx, ty)
}

pub(crate) fn to_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

pub(crate) fn to_stroke(style: &StrokeStyle) -> Stroke {
    Stroke {
        width: style.width,
        miter_limit: style.miter_limit,
        line_cap: match style.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match style.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        ..Stroke::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::Vec2;

    #[test]
    fn test_builds_lines_and_curves() {
        let path = build_path(&[
            Segment::MoveTo(Point::new(0.0, 0.0)),
            Segment::LineTo(Point::new(10.0, 0.0)),
            Segment::QuadTo {
                control: Point::new(10.0, 10.0),
                end: Point::new(0.0, 10.0),
            },
            Segment::Close,
        ])
        .unwrap();
        let b = path.bounds();
        assert_eq!((b.left(), b.top(), b.right(), b.bottom()), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_arcs_start_from_pen() {
        let path = build_path(&[
            Segment::MoveTo(Point::new(0.0, 5.0)),
            Segment::ArcTo {
                radii: Vec2::new(5.0, 5.0),
                rotation: 0.0,
                large_arc: false,
                sweep: true,
                end: Point::new(10.0, 5.0),
            },
        ])
        .unwrap();
        let b = path.bounds();
        assert!((b.top() - 0.0).abs() < 0.01, "{b:?}");
        assert!((b.bottom() - 5.0).abs() < 0.01, "{b:?}");
        assert!((b.right() - 10.0).abs() < 0.01, "{b:?}");
    }

    #[test]
    fn test_nothing_drawable() {
        assert!(build_path(&[]).is_none());
        assert!(build_path(&[Segment::MoveTo(Point::new(1.0, 1.0))]).is_none());
    }

    #[test]
    fn test_transform_rows() {
        let m = Affine2D::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let t = to_transform(&m);
        assert_eq!((t.sx, t.ky, t.kx, t.sy, t.tx, t.ty), (1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
    }

    #[test]
    fn test_stroke_and_fill_rule_mapping() {
        let style = StrokeStyle::new(3.0)
            .with_cap(LineCap::Round)
            .with_join(LineJoin::Bevel)
            .with_miter_limit(2.0);
        let stroke = to_stroke(&style);
        assert_eq!(stroke.width, 3.0);
        assert_eq!(stroke.miter_limit, 2.0);
        assert_eq!(stroke.line_cap, tiny_skia::LineCap::Round);
        assert_eq!(stroke.line_join, tiny_skia::LineJoin::Bevel);
        assert!(stroke.dash.is_none());

        assert_eq!(to_fill_rule(FillRule::EvenOdd), tiny_skia::FillRule::EvenOdd);
        assert_eq!(to_fill_rule(FillRule::NonZero), tiny_skia::FillRule::Winding);
    }
}
