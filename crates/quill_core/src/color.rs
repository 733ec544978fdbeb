//! Color model
//!
//! [`Color`] holds four straight-alpha channels in `[0, 1]`. [`parse_color`]
//! understands the SVG color literals:
//!
//! - hex: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`
//! - functional: `rgb(r, g, b)` / `rgba(r, g, b, a)` with integer or
//!   percentage channels
//! - a closed set of CSS named colors, plus `transparent`
//!
//! `none` and `currentColor` are paint keywords and are rejected here; the
//! document parser handles them before calling into this module.

use crate::error::ColorError;

/// RGBA color with straight (non-premultiplied) alpha
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 128.0 / 255.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Unchecked constructor for trusted literals
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Unchecked constructor for trusted literals
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Validating constructor: every channel must be finite and in `[0, 1]`
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Result<Self, ColorError> {
        for (channel, value) in [("r", r), ("g", g), ("b", b), ("a", a)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ColorError::ChannelOutOfRange { channel, value });
            }
        }
        Ok(Self { r, g, b, a })
    }

    /// Color from a `0xRRGGBB` literal
    pub const fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Scale the alpha channel by `factor` (clamped to `[0, 1]`)
    pub fn multiply_alpha(mut self, factor: f32) -> Self {
        self.a = (self.a * factor).clamp(0.0, 1.0);
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Premultiplied channels `[r*a, g*a, b*a, a]`
    pub fn premultiplied(&self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }

    /// Quantize to 8-bit straight RGBA
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Linear interpolation between two colors
    pub fn lerp(a: &Color, b: &Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
            a: a.a + (b.a - a.a) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl std::str::FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse an SVG color literal
pub fn parse_color(token: &str) -> Result<Color, ColorError> {
    let trimmed = token.trim();
    let malformed = || ColorError::Malformed(trimmed.to_string());

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(malformed);
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(args) = functional_args(&lower, "rgba").or_else(|| functional_args(&lower, "rgb")) {
        return parse_rgb_function(args).map_err(|e| match e {
            FunctionalError::Malformed => malformed(),
            FunctionalError::Range(e) => e,
        });
    }

    named_color(&lower).ok_or_else(malformed)
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let [r, g, b, a] = match hex.len() {
        3 => [digit(0)?, digit(1)?, digit(2)?, 255],
        4 => [digit(0)?, digit(1)?, digit(2)?, digit(3)?],
        6 => [pair(0)?, pair(2)?, pair(4)?, 255],
        8 => [pair(0)?, pair(2)?, pair(4)?, pair(6)?],
        _ => return None,
    };
    Some(Color::rgba(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ))
}

/// Return the argument list of `name(...)`, if `s` has that shape
fn functional_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(name)?.trim_start();
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}

enum FunctionalError {
    Malformed,
    Range(ColorError),
}

enum Channel {
    Number(f32),
    Percent(f32),
}

fn parse_channel(arg: &str) -> Option<Channel> {
    let arg = arg.trim();
    if let Some(pct) = arg.strip_suffix('%') {
        pct.trim().parse::<f32>().ok().filter(|v| v.is_finite()).map(Channel::Percent)
    } else {
        arg.parse::<f32>().ok().filter(|v| v.is_finite()).map(Channel::Number)
    }
}

fn parse_rgb_function(args: &str) -> Result<Color, FunctionalError> {
    let parts: Vec<&str> = if args.contains(',') {
        args.split(',').collect()
    } else {
        // CSS Color 4 space-separated form: `rgb(255 0 0 / 50%)`
        args.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|s| !s.is_empty())
            .collect()
    };
    if parts.len() != 3 && parts.len() != 4 {
        return Err(FunctionalError::Malformed);
    }

    let channels: Vec<Channel> = parts[..3]
        .iter()
        .map(|p| parse_channel(p))
        .collect::<Option<_>>()
        .ok_or(FunctionalError::Malformed)?;

    let all_numbers = channels.iter().all(|c| matches!(c, Channel::Number(_)));
    let all_percent = channels.iter().all(|c| matches!(c, Channel::Percent(_)));
    if !all_numbers && !all_percent {
        return Err(FunctionalError::Malformed);
    }

    let normalized: Vec<f32> = channels
        .iter()
        .map(|c| match c {
            Channel::Number(v) => v / 255.0,
            Channel::Percent(v) => v / 100.0,
        })
        .collect();

    let alpha = match parts.get(3) {
        Some(arg) => match parse_channel(arg).ok_or(FunctionalError::Malformed)? {
            Channel::Number(v) => v,
            Channel::Percent(v) => v / 100.0,
        },
        None => 1.0,
    };

    Color::new(normalized[0], normalized[1], normalized[2], alpha).map_err(FunctionalError::Range)
}

/// Look up a lowercase CSS color keyword
pub fn named_color(name: &str) -> Option<Color> {
    if name == "transparent" {
        return Some(Color::TRANSPARENT);
    }
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, hex)| Color::from_hex(*hex))
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("black", 0x000000),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkcyan", 0x008B8B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xA9A9A9),
    ("darkorange", 0xFF8C00),
    ("darkred", 0x8B0000),
    ("darkviolet", 0x9400D3),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("firebrick", 0xB22222),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gainsboro", 0xDCDCDC),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("hotpink", 0xFF69B4),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lightblue", 0xADD8E6),
    ("lightcoral", 0xF08080),
    ("lightcyan", 0xE0FFFF),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("navy", 0x000080),
    ("olive", 0x808000),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("royalblue", 0x4169E1),
    ("salmon", 0xFA8072),
    ("seagreen", 0x2E8B57),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("tomato", 0xFF6347),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];
