//! `transform` attribute parsing

use quill_core::Affine2D;
use smallvec::SmallVec;

use crate::units::{scan_number, skip_separators};

/// Parse a transform list into a single matrix
///
/// Functions compose left to right: `translate(10) scale(2)` scales first,
/// then translates. Returns `None` on any syntax error or wrong argument
/// count; the caller treats the whole attribute as invalid.
pub fn parse_transform(s: &str) -> Option<Affine2D> {
    let bytes = s.as_bytes();
    let mut pos = skip_separators(bytes, 0);
    let mut result = Affine2D::IDENTITY;

    while pos < bytes.len() {
        let name_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_alphabetic) {
            pos += 1;
        }
        let name = &s[name_start..pos];
        if name.is_empty() {
            return None;
        }

        pos = skip_whitespace(bytes, pos);
        if bytes.get(pos) != Some(&b'(') {
            return None;
        }
        pos += 1;

        let mut args: SmallVec<[f32; 6]> = SmallVec::new();
        loop {
            pos = skip_separators(bytes, pos);
            match bytes.get(pos) {
                Some(b')') => {
                    pos += 1;
                    break;
                }
                Some(_) => {
                    let (value, end) = scan_number(bytes, pos)?;
                    args.push(value);
                    pos = end;
                }
                None => return None,
            }
        }

        result = result.then(&function(name, &args)?);
        pos = skip_separators(bytes, pos);
    }

    Some(result)
}

fn function(name: &str, args: &[f32]) -> Option<Affine2D> {
    let m = match (name, args) {
        ("matrix", &[a, b, c, d, e, f]) => Affine2D::new(a, b, c, d, e, f),
        ("translate", &[tx]) => Affine2D::translation(tx, 0.0),
        ("translate", &[tx, ty]) => Affine2D::translation(tx, ty),
        ("scale", &[s]) => Affine2D::scale(s, s),
        ("scale", &[sx, sy]) => Affine2D::scale(sx, sy),
        ("rotate", &[deg]) => Affine2D::rotation(deg.to_radians()),
        ("rotate", &[deg, cx, cy]) => Affine2D::rotation_about(deg.to_radians(), cx, cy),
        ("skewX", &[deg]) => Affine2D::skew_x(deg.to_radians()),
        ("skewY", &[deg]) => Affine2D::skew_y(deg.to_radians()),
        _ => return None,
    };
    Some(m)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}
