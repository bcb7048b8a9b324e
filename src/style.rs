use crate::error::{IllustrationError, Result};
use crate::theme::Theme;
use crate::types::Color;

/// Stroke width used when artwork sets a stroke color without a usable width.
pub const DEFAULT_STROKE_WIDTH: f32 = 1.5;

const DARK_LUMINANCE: f32 = 80.0;
const LIGHT_LUMINANCE: f32 = 235.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaintRole {
    Fill,
    Stroke,
}

/// Resolves paint for one element: direct attributes first, then the inline `style`
/// declarations, with theme harmonization applied before opacity.
pub fn resolve_style(node: roxmltree::Node<'_, '_>, theme: &Theme) -> Result<ResolvedStyle> {
    let raw_fill = parse_color(attribute_or_style(node, "fill"), theme)?;
    let raw_stroke = parse_color(attribute_or_style(node, "stroke"), theme)?;
    let mut stroke_width = parse_length(attribute_or_style(node, "stroke-width"));

    let opacity = attribute_or_style(node, "opacity");
    let fill = raw_fill
        .map(|c| harmonize(c, PaintRole::Fill, theme))
        .map(|c| apply_opacity(c, attribute_or_style(node, "fill-opacity")))
        .map(|c| apply_opacity(c, opacity));
    let stroke = raw_stroke
        .map(|c| harmonize(c, PaintRole::Stroke, theme))
        .map(|c| apply_opacity(c, attribute_or_style(node, "stroke-opacity")))
        .map(|c| apply_opacity(c, opacity));

    if stroke.is_some() && stroke_width <= 0.0 {
        stroke_width = DEFAULT_STROKE_WIDTH;
    }

    Ok(ResolvedStyle {
        fill,
        stroke,
        stroke_width: stroke_width.max(0.0),
    })
}

pub(crate) fn attribute_or_style<'a>(node: roxmltree::Node<'a, '_>, key: &str) -> Option<&'a str> {
    if let Some(value) = node.attribute(key).filter(|v| !v.trim().is_empty()) {
        return Some(value);
    }
    let style = node.attribute("style")?;
    style_declaration(style, key)
}

fn style_declaration<'a>(style: &'a str, key: &str) -> Option<&'a str> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(key))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Parses a length in user units. Unit suffixes are ignored; anything unparseable is 0.
pub(crate) fn parse_length(input: Option<&str>) -> f32 {
    let Some(raw) = input else {
        return 0.0;
    };
    let s = raw
        .trim()
        .trim_end_matches("px")
        .trim_end_matches("pt")
        .trim();
    s.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn parse_color(input: Option<&str>, theme: &Theme) -> Result<Option<Color>> {
    let Some(raw) = input else {
        return Ok(None);
    };
    let v = raw.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if let Some(hex) = v.strip_prefix('#') {
        return decode_hex_color(hex).map(Some);
    }
    let lower = v.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return Ok(Some(parse_rgb_function(args, theme)));
    }
    // Only the two extremes are named; everything else takes the theme accent.
    Ok(Some(match lower.as_str() {
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        _ => theme.default_paint(),
    }))
}

/// Decodes `rgb`, `rrggbb`, or `aarrggbb` (alpha first).
pub fn decode_hex_color(hex: &str) -> Result<Color> {
    let bad = || IllustrationError::MalformedMarkup(format!("unsupported hex color: #{hex}"));
    if !hex.is_ascii() {
        return Err(bad());
    }
    let expanded;
    let hex = if hex.len() == 3 {
        expanded = hex.chars().flat_map(|c| [c, c]).collect::<String>();
        expanded.as_str()
    } else {
        hex
    };
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
    match hex.len() {
        6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(Color::rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => Err(bad()),
    }
}

fn parse_rgb_function(args: &str, theme: &Theme) -> Color {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c.is_whitespace() || c == '/')
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() < 3 {
        return theme.default_paint();
    }
    let channel = |s: &str| -> Option<u8> {
        let v = match s.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? * 2.55,
            None => s.parse::<f32>().ok()?,
        };
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let (Some(r), Some(g), Some(b)) = (channel(parts[0]), channel(parts[1]), channel(parts[2]))
    else {
        return theme.default_paint();
    };
    let color = Color::rgb(r, g, b);
    match parts.get(3).and_then(|a| parse_opacity(a)) {
        Some(alpha) => color.scale_alpha(alpha),
        None => color,
    }
}

fn harmonize(color: Color, role: PaintRole, theme: &Theme) -> Color {
    let luminance = color.luminance();
    if luminance < DARK_LUMINANCE {
        return match role {
            PaintRole::Fill => theme.primary_dark,
            PaintRole::Stroke => theme.primary_light,
        };
    }
    if luminance > LIGHT_LUMINANCE {
        let accent = match role {
            PaintRole::Fill => theme.fill_highlight,
            PaintRole::Stroke => theme.stroke_highlight,
        };
        return accent.with_alpha(color.a);
    }
    color
}

pub fn harmonize_fill(color: Color, theme: &Theme) -> Color {
    harmonize(color, PaintRole::Fill, theme)
}

pub fn harmonize_stroke(color: Color, theme: &Theme) -> Color {
    harmonize(color, PaintRole::Stroke, theme)
}

fn parse_opacity(raw: &str) -> Option<f32> {
    let raw = raw.trim();
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
        None => raw.parse::<f32>().ok()?,
    };
    if value.is_nan() {
        return None;
    }
    Some(value.clamp(0.0, 1.0))
}

fn apply_opacity(color: Color, value: Option<&str>) -> Color {
    match value.and_then(parse_opacity) {
        Some(opacity) => color.scale_alpha(opacity),
        None => color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element<'a>(doc: &'a roxmltree::Document<'a>) -> roxmltree::Node<'a, 'a> {
        doc.root_element()
            .children()
            .find(|n| n.is_element())
            .expect("test markup has a child element")
    }

    fn resolve(markup: &str) -> ResolvedStyle {
        let doc = roxmltree::Document::parse(markup).unwrap();
        resolve_style(first_element(&doc), &Theme::default()).unwrap()
    }

    #[test]
    fn hex_forms_decode_to_white() {
        let theme = Theme::default();
        for hex in ["#fff", "#ffffff", "#ffffffff"] {
            assert_eq!(parse_color(Some(hex), &theme).unwrap(), Some(Color::WHITE));
        }
        // Eight digits carry alpha first.
        assert_eq!(
            parse_color(Some("#ffffff00"), &theme).unwrap(),
            Some(Color::rgba(255, 255, 0, 255))
        );
        assert_eq!(
            parse_color(Some("#00ffffff"), &theme).unwrap(),
            Some(Color::rgba(255, 255, 255, 0))
        );
    }

    #[test]
    fn eight_digit_hex_reads_alpha_first() {
        assert_eq!(
            decode_hex_color("80102030").unwrap(),
            Color::rgba(0x10, 0x20, 0x30, 0x80)
        );
        assert_eq!(decode_hex_color("abc").unwrap(), Color::rgb(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn malformed_hex_is_an_error() {
        assert!(matches!(
            decode_hex_color("12345"),
            Err(IllustrationError::MalformedMarkup(_))
        ));
        assert!(decode_hex_color("zzzzzz").is_err());
    }

    #[test]
    fn none_and_blank_mean_no_paint() {
        let theme = Theme::default();
        assert_eq!(parse_color(Some("none"), &theme).unwrap(), None);
        assert_eq!(parse_color(Some("  "), &theme).unwrap(), None);
        assert_eq!(parse_color(None, &theme).unwrap(), None);
    }

    #[test]
    fn unknown_keywords_use_theme_accent() {
        let theme = Theme::default();
        assert_eq!(
            parse_color(Some("rebeccapurple"), &theme).unwrap(),
            Some(theme.primary_light)
        );
    }

    #[test]
    fn luminance_extremes_are_harmonized() {
        let theme = Theme::default();
        assert_eq!(
            harmonize_fill(Color::rgb(10, 10, 10), &theme),
            theme.primary_dark
        );
        assert_eq!(
            harmonize_stroke(Color::rgb(10, 10, 10), &theme),
            theme.primary_light
        );
        assert_eq!(
            harmonize_fill(Color::rgba(250, 250, 250, 77), &theme),
            Color::rgba(255, 255, 255, 77)
        );
        assert_eq!(
            harmonize_stroke(Color::rgb(250, 250, 250), &theme),
            Color::rgb(220, 220, 220)
        );
        let mid = Color::rgb(46, 160, 135);
        assert_eq!(harmonize_fill(mid, &theme), mid);
    }

    #[test]
    fn rgb_function_feeds_harmonization() {
        let style = resolve(r##"<svg><rect fill="rgb(10,10,10)" stroke="rgb(250, 250, 250)"/></svg>"##);
        let theme = Theme::default();
        assert_eq!(style.fill, Some(theme.primary_dark));
        assert_eq!(style.stroke, Some(theme.stroke_highlight));
    }

    #[test]
    fn inline_style_fills_in_blank_attributes() {
        let style = resolve(
            r##"<svg><path fill="" style="fill: #2ea087; Stroke:#2ea087 ;stroke-width:3px"/></svg>"##,
        );
        assert_eq!(style.fill, Some(Color::rgb(0x2e, 0xa0, 0x87)));
        assert_eq!(style.stroke, Some(Color::rgb(0x2e, 0xa0, 0x87)));
        assert_eq!(style.stroke_width, 3.0);
    }

    #[test]
    fn attribute_wins_over_inline_style() {
        let style = resolve(r##"<svg><path fill="#2ea087" style="fill:#22668d"/></svg>"##);
        assert_eq!(style.fill, Some(Color::rgb(0x2e, 0xa0, 0x87)));
    }

    #[test]
    fn stroke_without_width_defaults() {
        let style = resolve(r##"<svg><path stroke="#2ea087"/></svg>"##);
        assert_eq!(style.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(style.fill, None);

        let zero = resolve(r##"<svg><path stroke="#2ea087" stroke-width="0"/></svg>"##);
        assert_eq!(zero.stroke_width, DEFAULT_STROKE_WIDTH);
    }

    #[test]
    fn opacities_compose_multiplicatively() {
        let style = resolve(
            r##"<svg><path fill="#2ea087" fill-opacity="0.5" opacity="0.5" stroke="#2ea087" stroke-opacity="2"/></svg>"##,
        );
        assert_eq!(style.fill.map(|c| c.a), Some(64));
        // stroke-opacity clamps to 1, then the shared opacity applies.
        assert_eq!(style.stroke.map(|c| c.a), Some(128));
    }

    #[test]
    fn unparseable_opacity_is_ignored() {
        let style = resolve(r##"<svg><path fill="#2ea087" opacity="half"/></svg>"##);
        assert_eq!(style.fill.map(|c| c.a), Some(255));
    }
}
