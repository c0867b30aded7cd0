use compact_str::{format_compact, CompactString};
use ratatui::style::Color;

/// Builds a [`Color::Rgb`] from a `0xRRGGBB` literal.
pub const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Converts a [`Color`] to its RGB components.
///
/// Named colors use the xterm palette. Colors without an RGB meaning
/// (e.g. [`Color::Reset`]) resolve to `fallback`.
pub fn to_rgb(color: Color, fallback: (u8, u8, u8)) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::Red => (128, 0, 0),
        Color::Green => (0, 128, 0),
        Color::Yellow => (128, 128, 0),
        Color::Blue => (0, 0, 128),
        Color::Magenta => (128, 0, 128),
        Color::Cyan => (0, 128, 128),
        Color::Gray => (192, 192, 192),
        Color::DarkGray => (128, 128, 128),
        Color::LightRed => (255, 0, 0),
        Color::LightGreen => (0, 255, 0),
        Color::LightYellow => (255, 255, 0),
        Color::LightBlue => (0, 0, 255),
        Color::LightMagenta => (255, 0, 255),
        Color::LightCyan => (0, 255, 255),
        Color::White => (255, 255, 255),
        Color::Indexed(_) | Color::Reset => fallback,
    }
}

/// Converts a [`Color`] to an opaque CSS color string (`#rrggbb`).
///
/// The result always fits inline in a [`CompactString`], so this does not
/// allocate in the render loop.
pub fn to_css(color: Color) -> CompactString {
    let (r, g, b) = to_rgb(color, (255, 255, 255));
    format_compact!("#{r:02x}{g:02x}{b:02x}")
}

/// Converts a [`Color`] to a CSS `rgba()` string with the given alpha.
pub fn to_css_rgba(color: Color, alpha: f64) -> CompactString {
    let (r, g, b) = to_rgb(color, (255, 255, 255));
    let alpha = alpha.clamp(0.0, 1.0);
    format_compact!("rgba({r},{g},{b},{alpha:.3})")
}

/// Parses a computed CSS color of the form `rgb(r, g, b)` or `rgba(r, g, b, a)`.
///
/// Returns the components and the alpha channel.
pub fn parse_css_rgb(value: &str) -> Option<((u8, u8, u8), f64)> {
    let value = value.trim();
    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut parts = inner
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|part| !part.is_empty());
    let mut channel = || -> Option<u8> {
        let v: f64 = parts.next()?.parse().ok()?;
        Some(v.clamp(0.0, 255.0).round() as u8)
    };
    let rgb = (channel()?, channel()?, channel()?);
    let alpha = match parts.next() {
        Some(alpha) => alpha.parse().ok()?,
        None => 1.0,
    };
    Some((rgb, alpha))
}

/// Relative luminance in `[0, 1]` (sRGB, ITU-R BT.709 weights).
pub fn relative_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb() {
        assert_eq!(rgb(0xFF8C00), Color::Rgb(255, 140, 0));
    }

    #[test]
    fn test_to_css() {
        assert_eq!(to_css(Color::Rgb(0xFF, 0xD7, 0x00)), "#ffd700");
        assert_eq!(to_css(Color::Black), "#000000");
        assert_eq!(to_css(Color::Reset), "#ffffff");
    }

    #[test]
    fn test_to_css_rgba() {
        assert_eq!(
            to_css_rgba(Color::Rgb(255, 69, 0), 0.0),
            "rgba(255,69,0,0.000)"
        );
        assert_eq!(to_css_rgba(Color::White, 1.7), "rgba(255,255,255,1.000)");
        assert!(!to_css_rgba(Color::White, 0.5).is_heap_allocated());
    }

    #[test]
    fn test_parse_css_rgb() {
        assert_eq!(parse_css_rgb("rgb(255, 255, 255)"), Some(((255, 255, 255), 1.0)));
        assert_eq!(parse_css_rgb("rgba(0, 0, 0, 0)"), Some(((0, 0, 0), 0.0)));
        assert_eq!(parse_css_rgb("rgb(18 18 18 / 0.5)"), Some(((18, 18, 18), 0.5)));
        assert_eq!(parse_css_rgb("transparent"), None);
        assert_eq!(parse_css_rgb("rgb(1, 2)"), None);
    }

    #[test]
    fn test_relative_luminance() {
        assert_eq!(relative_luminance((0, 0, 0)), 0.0);
        assert!((relative_luminance((255, 255, 255)) - 1.0).abs() < 1e-9);
        assert!(relative_luminance((30, 30, 30)) < 0.5);
    }
}
