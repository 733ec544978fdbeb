//! Numeric and length attribute grammar

use quill_core::Size;

/// Scan an SVG number (optional sign, digits, fraction, exponent) at `start`
///
/// Returns the value and the index just past it.
pub fn scan_number(bytes: &[u8], start: usize) -> Option<(f32, usize)> {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;

    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if digits > 0 || j > frac_start {
            digits += j - frac_start;
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    let text = std::str::from_utf8(&bytes[start..i]).ok()?;
    text.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| (v, i))
}

/// Skip whitespace and commas
pub fn skip_separators(bytes: &[u8], mut i: usize) -> usize {
    while bytes
        .get(i)
        .is_some_and(|b| b.is_ascii_whitespace() || *b == b',')
    {
        i += 1;
    }
    i
}

/// Parse a string that consists of exactly one number
pub fn parse_number(s: &str) -> Option<f32> {
    let s = s.trim();
    match scan_number(s.as_bytes(), 0) {
        Some((v, end)) if end == s.len() => Some(v),
        _ => None,
    }
}

/// Parse a whitespace/comma separated list of numbers
pub fn parse_number_list(s: &str) -> Option<Vec<f32>> {
    let bytes = s.as_bytes();
    let mut values = Vec::new();
    let mut i = skip_separators(bytes, 0);
    while i < bytes.len() {
        let (v, end) = scan_number(bytes, i)?;
        values.push(v);
        i = skip_separators(bytes, end);
    }
    Some(values)
}

// ─────────────────────────────────────────────────────────────────────────────
// Lengths
// ─────────────────────────────────────────────────────────────────────────────

/// Length unit suffix
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthUnit {
    #[default]
    None,
    Px,
    Percent,
    Pt,
    Pc,
    Mm,
    Cm,
    In,
}

/// A number with an optional unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

/// Which viewport dimension a percentage refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// Normalized diagonal, `sqrt((w² + h²) / 2)`
    Diagonal,
}

impl Axis {
    pub fn reference(self, viewport: Size) -> f32 {
        match self {
            Axis::Horizontal => viewport.width,
            Axis::Vertical => viewport.height,
            Axis::Diagonal => {
                ((viewport.width * viewport.width + viewport.height * viewport.height) / 2.0)
                    .sqrt()
            }
        }
    }
}

impl Length {
    pub const fn new(value: f32, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub const fn percent(value: f32) -> Self {
        Self::new(value, LengthUnit::Percent)
    }

    /// Parse `<number><unit>?`; unknown unit suffixes are rejected
    pub fn parse(s: &str) -> Option<Length> {
        let s = s.trim();
        let (value, end) = scan_number(s.as_bytes(), 0)?;
        let unit = match s[end..].to_ascii_lowercase().as_str() {
            "" => LengthUnit::None,
            "px" => LengthUnit::Px,
            "%" => LengthUnit::Percent,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            "mm" => LengthUnit::Mm,
            "cm" => LengthUnit::Cm,
            "in" => LengthUnit::In,
            _ => return None,
        };
        Some(Length { value, unit })
    }

    /// Convert to user units (96 per inch); percentages scale `reference`
    pub fn to_user_units(&self, reference: f32) -> f32 {
        match self.unit {
            LengthUnit::None | LengthUnit::Px => self.value,
            LengthUnit::Percent => self.value / 100.0 * reference,
            LengthUnit::Pt => self.value * 96.0 / 72.0,
            LengthUnit::Pc => self.value * 16.0,
            LengthUnit::Mm => self.value * 96.0 / 25.4,
            LengthUnit::Cm => self.value * 96.0 / 2.54,
            LengthUnit::In => self.value * 96.0,
        }
    }

    /// Resolve against a viewport along `axis`
    pub fn resolve(&self, axis: Axis, viewport: Size) -> f32 {
        self.to_user_units(axis.reference(viewport))
    }

    /// Value as a fraction, for `objectBoundingBox` coordinates (`50%` is `0.5`)
    pub fn to_fraction(&self) -> f32 {
        match self.unit {
            LengthUnit::Percent => self.value / 100.0,
            _ => self.to_user_units(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_number_grammar() {
        let cases: &[(&str, f32, usize)] = &[
            ("10", 10.0, 2),
            ("-3.5", -3.5, 4),
            ("+.5", 0.5, 3),
            ("1e3", 1000.0, 3),
            ("2.5E-1", 0.25, 6),
            ("1.5.5", 1.5, 3),
            ("4-2", 4.0, 1),
            ("7e", 7.0, 1),
            ("3.", 3.0, 2),
        ];
        for &(src, value, end) in cases {
            let (v, e) = scan_number(src.as_bytes(), 0).unwrap();
            assert!((v - value).abs() < 1e-6, "{src}: {v}");
            assert_eq!(e, end, "{src}");
        }
        assert!(scan_number(b"-", 0).is_none());
        assert!(scan_number(b".", 0).is_none());
        assert!(scan_number(b"abc", 0).is_none());
    }

    #[test]
    fn test_number_list() {
        assert_eq!(
            parse_number_list(" 1,2 3 , -4.5e1").unwrap(),
            vec![1.0, 2.0, 3.0, -45.0]
        );
        assert_eq!(parse_number_list("").unwrap(), Vec::<f32>::new());
        assert!(parse_number_list("1 two 3").is_none());
    }

    #[test]
    fn test_length_units() {
        assert_eq!(Length::parse("12").unwrap(), Length::number(12.0));
        assert_eq!(Length::parse("12px").unwrap().to_user_units(0.0), 12.0);
        assert_eq!(Length::parse("1in").unwrap().to_user_units(0.0), 96.0);
        assert_eq!(Length::parse("72pt").unwrap().to_user_units(0.0), 96.0);
        assert!((Length::parse("25.4mm").unwrap().to_user_units(0.0) - 96.0).abs() < 1e-3);
        assert_eq!(Length::parse("50%").unwrap().to_user_units(300.0), 150.0);
    }

    #[test]
    fn test_unknown_units_are_rejected() {
        assert!(Length::parse("2em").is_none());
        assert!(Length::parse("3 px").is_none());
        assert!(Length::parse("px").is_none());
    }

    #[test]
    fn test_percent_axes() {
        let viewport = Size::new(300.0, 400.0);
        let half = Length::percent(50.0);
        assert_eq!(half.resolve(Axis::Horizontal, viewport), 150.0);
        assert_eq!(half.resolve(Axis::Vertical, viewport), 200.0);
        let diag = Length::percent(100.0).resolve(Axis::Diagonal, viewport);
        assert!((diag - (125_000.0f32).sqrt()).abs() < 1e-2);
    }

    #[test]
    fn test_fraction() {
        assert_eq!(Length::percent(25.0).to_fraction(), 0.25);
        assert_eq!(Length::number(0.75).to_fraction(), 0.75);
    }
}
