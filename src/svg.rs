use crate::assets::{Asset, Shape};
use crate::error::{IllustrationError, Result};
use crate::path::{
    PathData, ellipse_path, interpret_path_data, polyline_path, rect_path, round_rect_path,
};
use crate::style::{DEFAULT_STROKE_WIDTH, ResolvedStyle, attribute_or_style, parse_length, resolve_style};
use crate::theme::Theme;

// Illustration subset of SVG.
//
// Supported:
// - root viewBox / width / height for the intrinsic size
// - <g> grouping (flattened, no transform)
// - <path>, <circle>, <ellipse>, <rect rx ry>, <line>, <polyline>, <polygon>
// - fill / stroke / stroke-width / *-opacity via attributes or style=""
//
// Unknown elements are skipped. DTDs are stripped and never processed.

/// Intrinsic size used when the document declares no usable dimensions.
pub const FALLBACK_SIZE: f32 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Group,
    Path,
    Circle,
    Ellipse,
    Rect,
    Line,
    Polyline,
    Polygon,
}

impl ElementKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "g" => Some(ElementKind::Group),
            "path" => Some(ElementKind::Path),
            "circle" => Some(ElementKind::Circle),
            "ellipse" => Some(ElementKind::Ellipse),
            "rect" => Some(ElementKind::Rect),
            "line" => Some(ElementKind::Line),
            "polyline" => Some(ElementKind::Polyline),
            "polygon" => Some(ElementKind::Polygon),
            _ => None,
        }
    }

    /// Closed outlines default to a filled look, open ones to a stroked look.
    fn is_closed(self) -> bool {
        !matches!(self, ElementKind::Line | ElementKind::Polyline)
    }
}

pub fn parse_document(bytes: &[u8], theme: &Theme) -> Result<Asset> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| IllustrationError::MalformedMarkup(format!("document is not UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let sanitized = strip_doctype(text);

    let opt = roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(&sanitized, opt)
        .map_err(|e| IllustrationError::MalformedMarkup(e.to_string()))?;
    let root = doc.root_element();

    let (width, height) = intrinsic_size(root);
    let mut shapes = Vec::new();
    compile_children(&mut shapes, root, theme)?;
    Asset::vector(width, height, shapes)
}

fn intrinsic_size(root: roxmltree::Node<'_, '_>) -> (f32, f32) {
    if let Some((_, _, w, h)) = parse_viewbox(root.attribute("viewBox")) {
        return (w, h);
    }
    let w = parse_length(root.attribute("width"));
    let h = parse_length(root.attribute("height"));
    if w > 0.0 && h > 0.0 {
        return (w, h);
    }
    (FALLBACK_SIZE, FALLBACK_SIZE)
}

fn parse_viewbox(view_box: Option<&str>) -> Option<(f32, f32, f32, f32)> {
    let vb = view_box?;
    let mut it = vb
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty());
    let min_x = it.next()?.parse::<f32>().ok()?;
    let min_y = it.next()?.parse::<f32>().ok()?;
    let w = it.next()?.parse::<f32>().ok()?;
    let h = it.next()?.parse::<f32>().ok()?;
    if it.next().is_some() || !(w > 0.0 && h > 0.0) || !w.is_finite() || !h.is_finite() {
        return None;
    }
    Some((min_x, min_y, w, h))
}

/// Removes `<!DOCTYPE ...>` declarations, internal subsets included.
fn strip_doctype(xml: &str) -> String {
    const MARKER: &str = "<!doctype";
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    loop {
        let lower = rest.to_ascii_lowercase();
        let Some(start) = lower.find(MARKER) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        let tail = &rest[start + MARKER.len()..];
        let mut depth = 0usize;
        let mut end = tail.len();
        for (i, ch) in tail.char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => {
                    end = i + 1;
                    break;
                }
                _ => {}
            }
        }
        rest = &tail[end..];
    }
}

fn compile_children(
    out: &mut Vec<Shape>,
    parent: roxmltree::Node<'_, '_>,
    theme: &Theme,
) -> Result<()> {
    for child in parent.children().filter(|n| n.is_element()) {
        compile_element(out, child, theme)?;
    }
    Ok(())
}

fn compile_element(out: &mut Vec<Shape>, node: roxmltree::Node<'_, '_>, theme: &Theme) -> Result<()> {
    let Some(kind) = ElementKind::from_tag(node.tag_name().name()) else {
        // Ignore unknown tags in our subset.
        return Ok(());
    };
    let path = match kind {
        ElementKind::Group => return compile_children(out, node, theme),
        ElementKind::Path => path_element(node)?,
        ElementKind::Circle => circle_to_path(node)?,
        ElementKind::Ellipse => ellipse_to_path(node)?,
        ElementKind::Rect => rect_to_path(node)?,
        ElementKind::Line => line_to_path(node),
        ElementKind::Polyline => poly_points_to_path(node, false)?,
        ElementKind::Polygon => poly_points_to_path(node, true)?,
    };
    let mut style = resolve_style(node, theme)?;
    if kind == ElementKind::Line {
        style.fill = None;
    }
    out.push(finish_shape(path, style, kind.is_closed(), theme));
    Ok(())
}

fn finish_shape(path: PathData, style: ResolvedStyle, closed: bool, theme: &Theme) -> Shape {
    let ResolvedStyle {
        mut fill,
        mut stroke,
        mut stroke_width,
    } = style;
    if fill.is_none() && stroke.is_none() {
        if closed {
            fill = Some(theme.default_paint());
        } else {
            stroke = Some(theme.default_paint());
            if stroke_width <= 0.0 {
                stroke_width = DEFAULT_STROKE_WIDTH;
            }
        }
    }
    Shape {
        path,
        fill,
        stroke,
        stroke_width,
    }
}

fn number_attr(node: roxmltree::Node<'_, '_>, name: &str) -> f32 {
    parse_length(node.attribute(name))
}

fn malformed(node: roxmltree::Node<'_, '_>, message: &str) -> IllustrationError {
    let pos = node.document().text_pos_at(node.range().start);
    IllustrationError::MalformedMarkup(format!(
        "<{}> at {}:{}: {}",
        node.tag_name().name(),
        pos.row,
        pos.col,
        message
    ))
}

fn path_element(node: roxmltree::Node<'_, '_>) -> Result<PathData> {
    let d = node
        .attribute("d")
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| malformed(node, "missing 'd' attribute"))?;
    Ok(interpret_path_data(d)?)
}

fn circle_to_path(node: roxmltree::Node<'_, '_>) -> Result<PathData> {
    let cx = number_attr(node, "cx");
    let cy = number_attr(node, "cy");
    let r = number_attr(node, "r");
    if r <= 0.0 {
        return Err(malformed(node, "missing or invalid radius"));
    }
    Ok(ellipse_path(cx, cy, r, r))
}

fn ellipse_to_path(node: roxmltree::Node<'_, '_>) -> Result<PathData> {
    let cx = number_attr(node, "cx");
    let cy = number_attr(node, "cy");
    let rx = number_attr(node, "rx");
    let ry = number_attr(node, "ry");
    if rx <= 0.0 || ry <= 0.0 {
        return Err(malformed(node, "missing or invalid radii"));
    }
    Ok(ellipse_path(cx, cy, rx, ry))
}

fn rect_to_path(node: roxmltree::Node<'_, '_>) -> Result<PathData> {
    let x = number_attr(node, "x");
    let y = number_attr(node, "y");
    let w = number_attr(node, "width");
    let h = number_attr(node, "height");
    if w <= 0.0 || h <= 0.0 {
        return Err(malformed(node, "missing or invalid dimensions"));
    }
    let mut rx = parse_length(attribute_or_style(node, "rx"));
    let mut ry = parse_length(attribute_or_style(node, "ry"));
    if rx <= 0.0 && ry <= 0.0 {
        return Ok(rect_path(x, y, w, h));
    }
    if rx <= 0.0 {
        rx = ry;
    }
    if ry <= 0.0 {
        ry = rx;
    }
    Ok(round_rect_path(x, y, w, h, rx, ry))
}

fn line_to_path(node: roxmltree::Node<'_, '_>) -> PathData {
    let points = [
        (number_attr(node, "x1"), number_attr(node, "y1")),
        (number_attr(node, "x2"), number_attr(node, "y2")),
    ];
    polyline_path(&points, false)
}

fn poly_points_to_path(node: roxmltree::Node<'_, '_>, close: bool) -> Result<PathData> {
    let points = parse_points(node.attribute("points").unwrap_or(""));
    let (min, what) = if close {
        (3, "polygon requires at least three points")
    } else {
        (2, "polyline requires at least two points")
    };
    if points.len() < min {
        return Err(malformed(node, what));
    }
    Ok(polyline_path(&points, close))
}

/// Splits on whitespace/commas; bad tokens read as 0 and an unpaired trailing value is
/// dropped.
fn parse_points(input: &str) -> Vec<(f32, f32)> {
    let nums: Vec<f32> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f32>().unwrap_or(0.0))
        .collect();
    nums.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSeg;
    use crate::types::Color;

    fn parse(svg: &str) -> Result<Asset> {
        parse_document(svg.as_bytes(), &Theme::default())
    }

    #[test]
    fn viewbox_wins_over_width_and_height() {
        let asset = parse(r#"<svg width="10" height="10" viewBox="5 5 100 200"/>"#).unwrap();
        assert_eq!((asset.width(), asset.height()), (100.0, 200.0));
    }

    #[test]
    fn width_and_height_used_without_viewbox() {
        let asset = parse(r#"<svg width="48px" height="24"/>"#).unwrap();
        assert_eq!((asset.width(), asset.height()), (48.0, 24.0));
    }

    #[test]
    fn missing_size_falls_back_to_square() {
        let asset = parse(r#"<svg viewBox="0 0 0 10"/>"#).unwrap();
        assert_eq!((asset.width(), asset.height()), (FALLBACK_SIZE, FALLBACK_SIZE));
    }

    #[test]
    fn doctype_is_stripped_before_parsing() {
        let svg = r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg viewBox="0 0 10 10"><rect width="4" height="4"/></svg>"#;
        assert_eq!(parse(svg).unwrap().shapes().len(), 1);
    }

    #[test]
    fn doctype_with_internal_entities_is_never_expanded() {
        let svg = r#"<!doctype svg [ <!ENTITY ext SYSTEM "file:///etc/passwd"> ]>
<svg viewBox="0 0 10 10"><rect width="4" height="4"/></svg>"#;
        let stripped = strip_doctype(svg);
        assert!(!stripped.contains("ENTITY"));
        assert_eq!(parse(svg).unwrap().shapes().len(), 1);

        let with_ref = r#"<!DOCTYPE svg [ <!ENTITY ext SYSTEM "file:///etc/passwd"> ]>
<svg viewBox="0 0 10 10"><rect width="4" height="4" fill="&ext;"/></svg>"#;
        assert!(matches!(
            parse(with_ref),
            Err(IllustrationError::MalformedMarkup(_))
        ));
    }

    #[test]
    fn groups_flatten_in_document_order_and_unknown_tags_skip() {
        let svg = r##"<svg viewBox="0 0 10 10">
            <rect width="1" height="1" fill="#2ea087"/>
            <g><circle r="1"/><g><line x2="5" y2="5"/></g></g>
            <text>ignored</text>
            <polygon points="0,0 5,0 5,5"/>
        </svg>"##;
        let asset = parse(svg).unwrap();
        assert_eq!(asset.shapes().len(), 4);
        assert_eq!(asset.shapes()[0].fill, Some(Color::rgb(0x2e, 0xa0, 0x87)));
        assert_eq!(asset.shapes()[3].path.segments().last(), Some(&PathSeg::Close));
    }

    #[test]
    fn default_paint_depends_on_closedness() {
        let theme = Theme::default();
        let asset = parse(r#"<svg><rect width="2" height="2"/><polyline points="0 0 1 1"/></svg>"#)
            .unwrap();
        let rect = &asset.shapes()[0];
        assert_eq!(rect.fill, Some(theme.primary_light));
        assert_eq!(rect.stroke, None);
        let poly = &asset.shapes()[1];
        assert_eq!(poly.fill, None);
        assert_eq!(poly.stroke, Some(theme.primary_light));
        assert_eq!(poly.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(poly.path.segments().len(), 2);
    }

    #[test]
    fn line_is_never_filled() {
        let asset = parse(r##"<svg><line x1="0" y1="0" x2="4" y2="4" fill="#2ea087"/></svg>"##).unwrap();
        let line = &asset.shapes()[0];
        assert_eq!(line.fill, None);
        assert!(line.stroke.is_some());
        assert!(line.stroke_width > 0.0);
    }

    #[test]
    fn circle_and_ellipse_need_positive_radii() {
        assert!(matches!(
            parse(r#"<svg><circle cx="1" cy="1" r="0"/></svg>"#),
            Err(IllustrationError::MalformedMarkup(_))
        ));
        assert!(parse(r#"<svg><ellipse rx="2" ry="-1"/></svg>"#).is_err());
        assert!(parse(r#"<svg><ellipse rx="2" ry="1"/></svg>"#).is_ok());
    }

    #[test]
    fn rect_copies_single_corner_radius() {
        let asset = parse(r#"<svg><rect width="10" height="10" ry="2"/></svg>"#).unwrap();
        assert_eq!(
            asset.shapes()[0].path,
            round_rect_path(0.0, 0.0, 10.0, 10.0, 2.0, 2.0)
        );
        let plain = parse(r#"<svg><rect width="10" height="10"/></svg>"#).unwrap();
        assert_eq!(plain.shapes()[0].path.segments().len(), 5);
        assert!(parse(r#"<svg><rect width="10"/></svg>"#).is_err());
    }

    #[test]
    fn polygon_drops_odd_trailing_coordinate() {
        let asset = parse(r#"<svg><polygon points="0,0 10,0 10,10 7"/></svg>"#).unwrap();
        let segs = asset.shapes()[0].path.segments();
        assert_eq!(
            segs,
            &[
                PathSeg::MoveTo(0.0, 0.0),
                PathSeg::LineTo(10.0, 0.0),
                PathSeg::LineTo(10.0, 10.0),
                PathSeg::Close,
            ]
        );
    }

    #[test]
    fn too_few_points_are_rejected() {
        assert!(parse(r#"<svg><polygon points="0,0 10,0 10"/></svg>"#).is_err());
        assert!(parse(r#"<svg><polyline points="0,0 1"/></svg>"#).is_err());
    }

    #[test]
    fn bad_path_data_fails_the_document() {
        assert!(matches!(
            parse(r#"<svg><path d="M0 0 A 1 1 0 0 1 2 2"/></svg>"#),
            Err(IllustrationError::UnsupportedPathCommand(_))
        ));
        assert!(matches!(
            parse(r#"<svg><path d=" "/></svg>"#),
            Err(IllustrationError::MalformedMarkup(_))
        ));
    }

    #[test]
    fn path_with_several_subpaths_is_one_shape() {
        let asset = parse(r#"<svg><path d="M0 0 L1 0 L1 1 Z M3 3 L4 3 L4 4 Z"/></svg>"#).unwrap();
        assert_eq!(asset.shapes().len(), 1);
        assert_eq!(asset.shapes()[0].path.subpath_count(), 2);
    }

    #[test]
    fn rejects_non_utf8_and_broken_xml() {
        assert!(parse_document(&[0xff, 0xfe, 0x00], &Theme::default()).is_err());
        assert!(parse("<svg><rect></svg>").is_err());
    }
}
