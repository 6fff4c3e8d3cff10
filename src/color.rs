//! Color values and lenient color parsing for `<c>`, `<bg>` and mark attributes.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use rand::Rng;

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Opaque color from channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from channels including alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Whether alpha is fully opaque.
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Random opaque color.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::rgb(rng.gen(), rng.gen(), rng.gen())
    }

    /// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise.
    pub fn to_hex(self) -> String {
        if self.is_opaque() {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse a color literal.
    ///
    /// Accepts CSS named colors, `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
    /// `0xrrggbb[aa]`, bare `rrggbb`, `rgb()`/`rgba()` and `hsl()`/`hsla()`.
    /// Returns `None` for anything else; callers keep their previous color.
    pub fn try_parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        let lower = value.to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(hex) = lower.strip_prefix("0x") {
            return parse_hex(hex);
        }
        if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
            return parse_rgb_function(args);
        }
        if let Some(args) = function_args(&lower, "hsla").or_else(|| function_args(&lower, "hsl")) {
            return parse_hsl_function(args);
        }
        if let Some(color) = named_color(&lower) {
            return Some(color);
        }
        if matches!(lower.len(), 6 | 8) && lower.bytes().all(|b| b.is_ascii_hexdigit()) {
            return parse_hex(&lower);
        }
        None
    }
}

/// A color argument as written in markup: either a literal or `random`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpec {
    /// Fixed color.
    Literal(Color),
    /// Fresh random opaque color per occurrence.
    Random,
}

impl ColorSpec {
    /// Parse a tag argument, recognizing the `random` keyword.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("random") {
            return Some(Self::Random);
        }
        Color::try_parse(raw).map(Self::Literal)
    }

    /// Resolve to a concrete color.
    pub fn resolve<R: Rng>(self, rng: &mut R) -> Color {
        match self {
            Self::Literal(color) => color,
            Self::Random => Color::random(rng),
        }
    }
}

fn function_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let rest = value.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner)
}

fn split_args(args: &str) -> impl Iterator<Item = &str> {
    args.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |idx: usize| u8::from_str_radix(&hex[idx..idx + 1], 16).ok().map(|v| v * 17);
    let byte = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::rgba(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_channel(raw: &str) -> Option<u8> {
    if let Some(pct) = raw.strip_suffix('%') {
        let v: f32 = pct.trim().parse().ok()?;
        return Some(unit_to_byte(v / 100.0));
    }
    let v: f32 = raw.parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(v.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(raw: &str) -> Option<u8> {
    if let Some(pct) = raw.strip_suffix('%') {
        let v: f32 = pct.trim().parse().ok()?;
        return Some(unit_to_byte(v / 100.0));
    }
    let v: f32 = raw.parse().ok()?;
    Some(unit_to_byte(v))
}

fn unit_to_byte(v: f32) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_rgb_function(args: &str) -> Option<Color> {
    let parts: smallvec::SmallVec<[&str; 4]> = split_args(args).collect();
    match parts.as_slice() {
        [r, g, b] => Some(Color::rgb(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
        )),
        [r, g, b, a] => Some(Color::rgba(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
            parse_alpha(a)?,
        )),
        _ => None,
    }
}

fn parse_hsl_function(args: &str) -> Option<Color> {
    let parts: smallvec::SmallVec<[&str; 4]> = split_args(args).collect();
    let (h, s, l, a) = match parts.as_slice() {
        [h, s, l] => (*h, *s, *l, None),
        [h, s, l, a] => (*h, *s, *l, Some(*a)),
        _ => return None,
    };
    let hue: f32 = h.trim_end_matches("deg").parse().ok()?;
    let sat: f32 = s.strip_suffix('%')?.parse().ok()?;
    let light: f32 = l.strip_suffix('%')?.parse().ok()?;
    if !(hue.is_finite() && sat.is_finite() && light.is_finite()) {
        return None;
    }
    let (r, g, b) = hsl_to_rgb(
        hue.rem_euclid(360.0),
        (sat / 100.0).clamp(0.0, 1.0),
        (light / 100.0).clamp(0.0, 1.0),
    );
    let alpha = match a {
        Some(raw) => parse_alpha(raw)?,
        None => 255,
    };
    Some(Color::rgba(r, g, b, alpha))
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (
        unit_to_byte(r1 + m),
        unit_to_byte(g1 + m),
        unit_to_byte(b1 + m),
    )
}

fn named_color(name: &str) -> Option<Color> {
    let idx = NAMED_COLORS
        .binary_search_by(|(candidate, _)| candidate.cmp(&name))
        .ok()?;
    let rgb = NAMED_COLORS[idx].1;
    if name == "transparent" {
        return Some(Color::TRANSPARENT);
    }
    Some(Color::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

// Sorted for binary search.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF),
    ("antiquewhite", 0xFAEBD7),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("bisque", 0xFFE4C4),
    ("black", 0x000000),
    ("blanchedalmond", 0xFFEBCD),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("burlywood", 0xDEB887),
    ("cadetblue", 0x5F9EA0),
    ("chartreuse", 0x7FFF00),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("cornsilk", 0xFFF8DC),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkcyan", 0x008B8B),
    ("darkgoldenrod", 0xB8860B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xA9A9A9),
    ("darkkhaki", 0xBDB76B),
    ("darkmagenta", 0x8B008B),
    ("darkolivegreen", 0x556B2F),
    ("darkorange", 0xFF8C00),
    ("darkorchid", 0x9932CC),
    ("darkred", 0x8B0000),
    ("darksalmon", 0xE9967A),
    ("darkseagreen", 0x8FBC8F),
    ("darkslateblue", 0x483D8B),
    ("darkslategray", 0x2F4F4F),
    ("darkslategrey", 0x2F4F4F),
    ("darkturquoise", 0x00CED1),
    ("darkviolet", 0x9400D3),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1E90FF),
    ("firebrick", 0xB22222),
    ("floralwhite", 0xFFFAF0),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gainsboro", 0xDCDCDC),
    ("ghostwhite", 0xF8F8FF),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("honeydew", 0xF0FFF0),
    ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lavenderblush", 0xFFF0F5),
    ("lawngreen", 0x7CFC00),
    ("lemonchiffon", 0xFFFACD),
    ("lightblue", 0xADD8E6),
    ("lightcoral", 0xF08080),
    ("lightcyan", 0xE0FFFF),
    ("lightgoldenrodyellow", 0xFAFAD2),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightsalmon", 0xFFA07A),
    ("lightseagreen", 0x20B2AA),
    ("lightskyblue", 0x87CEFA),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xB0C4DE),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("linen", 0xFAF0E6),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66CDAA),
    ("mediumblue", 0x0000CD),
    ("mediumorchid", 0xBA55D3),
    ("mediumpurple", 0x9370DB),
    ("mediumseagreen", 0x3CB371),
    ("mediumslateblue", 0x7B68EE),
    ("mediumspringgreen", 0x00FA9A),
    ("mediumturquoise", 0x48D1CC),
    ("mediumvioletred", 0xC71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xF5FFFA),
    ("mistyrose", 0xFFE4E1),
    ("moccasin", 0xFFE4B5),
    ("navajowhite", 0xFFDEAD),
    ("navy", 0x000080),
    ("oldlace", 0xFDF5E6),
    ("olive", 0x808000),
    ("olivedrab", 0x6B8E23),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("palegoldenrod", 0xEEE8AA),
    ("palegreen", 0x98FB98),
    ("paleturquoise", 0xAFEEEE),
    ("palevioletred", 0xDB7093),
    ("papayawhip", 0xFFEFD5),
    ("peachpuff", 0xFFDAB9),
    ("peru", 0xCD853F),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("powderblue", 0xB0E0E6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("rosybrown", 0xBC8F8F),
    ("royalblue", 0x4169E1),
    ("saddlebrown", 0x8B4513),
    ("salmon", 0xFA8072),
    ("sandybrown", 0xF4A460),
    ("seagreen", 0x2E8B57),
    ("seashell", 0xFFF5EE),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xFFFAFA),
    ("springgreen", 0x00FF7F),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("thistle", 0xD8BFD8),
    ("tomato", 0xFF6347),
    ("transparent", 0x000000),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn named_colors_are_sorted_for_binary_search() {
        for pair in NAMED_COLORS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Color::try_parse("Red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::try_parse("  steelblue "), Some(Color::rgb(0x46, 0x82, 0xB4)));
        assert_eq!(Color::try_parse("transparent"), Some(Color::TRANSPARENT));
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::try_parse("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::try_parse("#f008"), Some(Color::rgba(255, 0, 0, 0x88)));
        assert_eq!(Color::try_parse("#1E90FF"), Some(Color::rgb(0x1E, 0x90, 0xFF)));
        assert_eq!(
            Color::try_parse("0x1e90ff80"),
            Some(Color::rgba(0x1E, 0x90, 0xFF, 0x80))
        );
        assert_eq!(Color::try_parse("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::try_parse("#12345"), None);
    }

    #[test]
    fn parses_functional_forms() {
        assert_eq!(Color::try_parse("rgb(10, 20, 30)"), Some(Color::rgb(10, 20, 30)));
        assert_eq!(
            Color::try_parse("rgba(255,0,0,0.5)"),
            Some(Color::rgba(255, 0, 0, 128))
        );
        assert_eq!(
            Color::try_parse("rgb(100%, 0%, 50%)"),
            Some(Color::rgb(255, 0, 128))
        );
        assert_eq!(Color::try_parse("hsl(120, 100%, 50%)"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::try_parse("hsl(0, 0%, 100%)"), Some(Color::WHITE));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Color::try_parse(""), None);
        assert_eq!(Color::try_parse("notacolor"), None);
        assert_eq!(Color::try_parse("rgb(1,2)"), None);
        assert_eq!(Color::try_parse("#xyz"), None);
    }

    #[test]
    fn random_keyword_resolves_to_opaque_color() {
        let spec = ColorSpec::parse(" RANDOM ").expect("random keyword");
        assert_eq!(spec, ColorSpec::Random);
        let mut rng = SmallRng::seed_from_u64(7);
        let first = spec.resolve(&mut rng);
        assert!(first.is_opaque());
        let mut replay = SmallRng::seed_from_u64(7);
        assert_eq!(spec.resolve(&mut replay), first);
    }

    #[test]
    fn hex_output_round_trips_alpha() {
        assert_eq!(Color::rgb(255, 0, 16).to_hex(), "#ff0010");
        assert_eq!(Color::rgba(255, 0, 16, 0).to_hex(), "#ff001000");
    }
}
