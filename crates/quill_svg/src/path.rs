//! Path data interpreter
//!
//! Decodes the `d` attribute minilanguage (`M L H V C S Q T A Z`, absolute
//! and relative) into absolute [`Segment`]s. Elliptical arcs are converted
//! to cubic Béziers while parsing, so the output only ever contains
//! `MoveTo`, `LineTo`, `QuadTo`, `CubicTo` and `Close`.

use quill_core::{Point, Vec2};
use smallvec::SmallVec;

use crate::error::{PathError, PathErrorKind};
use crate::units::{scan_number, skip_separators};

/// A single absolute path segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Elliptical arc; `rotation` is the x-axis rotation in radians
    ArcTo {
        radii: Vec2,
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    Close,
}

impl Segment {
    /// End point of the segment, `None` for `Close`
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            Segment::MoveTo(p) | Segment::LineTo(p) => Some(p),
            Segment::QuadTo { end, .. }
            | Segment::CubicTo { end, .. }
            | Segment::ArcTo { end, .. } => Some(end),
            Segment::Close => None,
        }
    }
}

/// Parse path data into absolute segments
///
/// On failure the returned [`PathError`] carries every segment completed
/// before the offending command.
pub fn parse_path_data(d: &str) -> Result<Vec<Segment>, PathError> {
    PathParser::new(d).run()
}

struct PathParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    segments: Vec<Segment>,
    current: Point,
    subpath_start: Point,
    last_cubic_control: Option<Point>,
    last_quad_control: Option<Point>,
}

impl<'a> PathParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            segments: Vec::new(),
            current: Point::ZERO,
            subpath_start: Point::ZERO,
            last_cubic_control: None,
            last_quad_control: None,
        }
    }

    fn run(mut self) -> Result<Vec<Segment>, PathError> {
        let mut previous: Option<u8> = None;

        loop {
            self.pos = skip_separators(self.bytes, self.pos);
            let Some(&b) = self.bytes.get(self.pos) else {
                break;
            };

            let command = if b.is_ascii_alphabetic() {
                self.pos += 1;
                b
            } else {
                // Implicit repetition of the previous command's coordinate group
                match previous {
                    Some(b'M') if starts_number(b) => b'L',
                    Some(b'm') if starts_number(b) => b'l',
                    Some(prev) if starts_number(b) && !matches!(prev, b'Z' | b'z') => prev,
                    _ => return Err(self.invalid_command_at(self.pos)),
                }
            };

            if !is_command(command) {
                return Err(self.invalid_command_at(self.pos - 1));
            }
            if previous.is_none() && !matches!(command, b'M' | b'm') {
                return Err(self.fail(PathErrorKind::MissingMoveTo(command as char)));
            }

            self.execute(command)?;
            previous = Some(command);
        }

        Ok(self.segments)
    }

    fn execute(&mut self, command: u8) -> Result<(), PathError> {
        let relative = command.is_ascii_lowercase();
        let base = if relative { self.current } else { Point::ZERO };
        let mut cubic_control = None;
        let mut quad_control = None;

        match command.to_ascii_uppercase() {
            b'M' => {
                let p = self.point(command, base)?;
                self.segments.push(Segment::MoveTo(p));
                self.current = p;
                self.subpath_start = p;
            }
            b'L' => {
                let p = self.point(command, base)?;
                self.line_to(p);
            }
            b'H' => {
                let x = self.number(command)? + base.x;
                self.line_to(Point::new(x, self.current.y));
            }
            b'V' => {
                let y = self.number(command)? + base.y;
                self.line_to(Point::new(self.current.x, y));
            }
            b'C' => {
                let control1 = self.point(command, base)?;
                let control2 = self.point(command, base)?;
                let end = self.point(command, base)?;
                self.cubic_to(control1, control2, end);
                cubic_control = Some(control2);
            }
            b'S' => {
                let control2 = self.point(command, base)?;
                let end = self.point(command, base)?;
                let control1 = self
                    .last_cubic_control
                    .map_or(self.current, |c| c.reflect_about(self.current));
                self.cubic_to(control1, control2, end);
                cubic_control = Some(control2);
            }
            b'Q' => {
                let control = self.point(command, base)?;
                let end = self.point(command, base)?;
                self.quad_to(control, end);
                quad_control = Some(control);
            }
            b'T' => {
                let end = self.point(command, base)?;
                let control = self
                    .last_quad_control
                    .map_or(self.current, |c| c.reflect_about(self.current));
                self.quad_to(control, end);
                quad_control = Some(control);
            }
            b'A' => {
                let rx = self.number(command)?;
                let ry = self.number(command)?;
                let rotation = self.number(command)?.to_radians();
                let large_arc = self.flag(command)?;
                let sweep = self.flag(command)?;
                let end = self.point(command, base)?;
                let from = self.current;
                self.segments.extend(arc_to_cubics(
                    from,
                    Vec2::new(rx, ry),
                    rotation,
                    large_arc,
                    sweep,
                    end,
                ));
                self.current = end;
            }
            b'Z' => {
                self.segments.push(Segment::Close);
                self.current = self.subpath_start;
            }
            _ => return Err(self.invalid_command_at(self.pos - 1)),
        }

        self.last_cubic_control = cubic_control;
        self.last_quad_control = quad_control;
        Ok(())
    }

    fn line_to(&mut self, p: Point) {
        self.segments.push(Segment::LineTo(p));
        self.current = p;
    }

    fn quad_to(&mut self, control: Point, end: Point) {
        self.segments.push(Segment::QuadTo { control, end });
        self.current = end;
    }

    fn cubic_to(&mut self, control1: Point, control2: Point, end: Point) {
        self.segments.push(Segment::CubicTo {
            control1,
            control2,
            end,
        });
        self.current = end;
    }

    fn number(&mut self, command: u8) -> Result<f32, PathError> {
        self.pos = skip_separators(self.bytes, self.pos);
        match scan_number(self.bytes, self.pos) {
            Some((value, end)) => {
                self.pos = end;
                Ok(value)
            }
            None => Err(self.fail(PathErrorKind::InsufficientOperands(command as char))),
        }
    }

    fn point(&mut self, command: u8, base: Point) -> Result<Point, PathError> {
        let x = self.number(command)?;
        let y = self.number(command)?;
        Ok(Point::new(base.x + x, base.y + y))
    }

    /// Arc flags are single `0`/`1` characters and may be written without separators
    fn flag(&mut self, command: u8) -> Result<bool, PathError> {
        self.pos = skip_separators(self.bytes, self.pos);
        match self.bytes.get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(self.fail(PathErrorKind::InsufficientOperands(command as char))),
        }
    }

    fn invalid_command_at(&mut self, offset: usize) -> PathError {
        let c = self.src[offset..].chars().next().unwrap_or('\0');
        self.pos = offset;
        self.fail(PathErrorKind::InvalidCommand(c))
    }

    fn fail(&mut self, kind: PathErrorKind) -> PathError {
        PathError {
            kind,
            offset: self.pos,
            partial: std::mem::take(&mut self.segments),
        }
    }
}

fn is_command(b: u8) -> bool {
    matches!(
        b.to_ascii_uppercase(),
        b'M' | b'L' | b'H' | b'V' | b'C' | b'S' | b'Q' | b'T' | b'A' | b'Z'
    )
}

fn starts_number(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.')
}

/// Convert an SVG elliptical arc to cubic Bézier segments
///
/// Uses the endpoint-to-center conversion from the SVG implementation notes
/// and emits one cubic per quarter turn or less. A zero radius or identical
/// endpoints degrade to a straight line.
pub fn arc_to_cubics(
    from: Point,
    radii: Vec2,
    rotation: f32,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> SmallVec<[Segment; 4]> {
    let mut out = SmallVec::new();

    let mut rx = radii.x.abs();
    let mut ry = radii.y.abs();
    if from == to || rx == 0.0 || ry == 0.0 || !rx.is_finite() || !ry.is_finite() {
        out.push(Segment::LineTo(to));
        return out;
    }

    let (sin_phi, cos_phi) = rotation.sin_cos();

    // Start point in the ellipse's rotated frame
    let dx = (from.x - to.x) / 2.0;
    let dy = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    // Scale up radii that cannot span the endpoints
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let rx_sq = rx * rx;
    let ry_sq = ry * ry;
    let numer = (rx_sq * ry_sq - rx_sq * y1p * y1p - ry_sq * x1p * x1p).max(0.0);
    let denom = rx_sq * y1p * y1p + ry_sq * x1p * x1p;
    let mut coef = if denom > 0.0 { (numer / denom).sqrt() } else { 0.0 };
    if large_arc == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;

    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;

    let theta1 = uy.atan2(ux);
    let mut delta = (ux * vy - uy * vx).atan2(ux * vx + uy * vy);
    if !sweep && delta > 0.0 {
        delta -= std::f32::consts::TAU;
    } else if sweep && delta < 0.0 {
        delta += std::f32::consts::TAU;
    }

    let count = (delta.abs() / std::f32::consts::FRAC_PI_2).ceil().max(1.0) as usize;
    let step = delta / count as f32;
    let alpha = 4.0 / 3.0 * (step / 4.0).tan();

    let point_at = |t: f32| {
        let (sin_t, cos_t) = t.sin_cos();
        Point::new(
            cx + rx * cos_t * cos_phi - ry * sin_t * sin_phi,
            cy + rx * cos_t * sin_phi + ry * sin_t * cos_phi,
        )
    };
    let tangent_at = |t: f32| {
        let (sin_t, cos_t) = t.sin_cos();
        Vec2::new(
            -rx * sin_t * cos_phi - ry * cos_t * sin_phi,
            -rx * sin_t * sin_phi + ry * cos_t * cos_phi,
        )
    };

    let mut start = from;
    for i in 0..count {
        let t1 = theta1 + step * i as f32;
        let t2 = t1 + step;
        let end = if i + 1 == count { to } else { point_at(t2) };
        let control1 = start.offset(tangent_at(t1).scale(alpha));
        let control2 = point_at(t2).offset(tangent_at(t2).scale(-alpha));
        out.push(Segment::CubicTo {
            control1,
            control2,
            end,
        });
        start = end;
    }

    out
}
