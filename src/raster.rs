use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LineCap, LineJoin, LinearGradient, Paint as SkPaint,
    Path, PathBuilder, Pixmap, PixmapPaint, Point, SpreadMode, Stroke, Transform,
};

use crate::canvas::{Canvas, Command, Paint};
use crate::error::{IllustrationError, Result};
use crate::path::{Matrix, PathData, PathSeg};
use crate::types::Color;

/// Plays the canvas onto a transparent pixmap of the canvas size (rounded to whole pixels).
pub fn canvas_to_pixmap(canvas: &Canvas) -> Result<Pixmap> {
    let size = canvas.size();
    if !size.is_positive() {
        return Err(IllustrationError::RasterTarget(format!(
            "invalid raster size {}x{}",
            size.width, size.height
        )));
    }
    let width_px = size.width.round().max(1.0) as u32;
    let height_px = size.height.round().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        IllustrationError::RasterTarget(format!("unable to allocate {width_px}x{height_px} pixmap"))
    })?;
    render_commands(&mut pixmap, canvas.commands());
    Ok(pixmap)
}

pub fn canvas_to_png(canvas: &Canvas) -> Result<Vec<u8>> {
    let pixmap = canvas_to_pixmap(canvas)?;
    pixmap
        .encode_png()
        .map_err(|e| IllustrationError::RasterTarget(format!("png encode failed: {e}")))
}

fn render_commands(pixmap: &mut Pixmap, commands: &[Command]) {
    for cmd in commands {
        match cmd {
            Command::FillPath { path, paint } => {
                let Some(path) = build_path(path) else {
                    continue;
                };
                let Some(paint) = fill_paint(paint) else {
                    continue;
                };
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            Command::StrokePath { path, color, width } => {
                let Some(path) = build_path(path) else {
                    continue;
                };
                let paint = solid_paint(*color);
                let stroke = build_stroke(*width);
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
            Command::DrawImage { image, transform } => {
                let paint = PixmapPaint {
                    quality: FilterQuality::Bicubic,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(
                    0,
                    0,
                    Pixmap::as_ref(image),
                    &paint,
                    to_transform(*transform),
                    None,
                );
            }
        }
    }
}

fn build_path(path: &PathData) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for seg in path.segments() {
        match *seg {
            PathSeg::MoveTo(x, y) => pb.move_to(x, y),
            PathSeg::LineTo(x, y) => pb.line_to(x, y),
            PathSeg::CubicTo(x1, y1, x2, y2, x, y) => pb.cubic_to(x1, y1, x2, y2, x, y),
            PathSeg::QuadTo(x1, y1, x, y) => pb.quad_to(x1, y1, x, y),
            PathSeg::Close => pb.close(),
        }
    }
    pb.finish()
}

fn build_stroke(width: f32) -> Stroke {
    Stroke {
        width: width.max(0.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn fill_paint(paint: &Paint) -> Option<SkPaint<'static>> {
    match paint {
        Paint::Solid(color) => Some(solid_paint(*color)),
        Paint::LinearGradient {
            start,
            end,
            from,
            to,
        } => {
            let stops = vec![
                GradientStop::new(0.0, to_sk_color(*from)),
                GradientStop::new(1.0, to_sk_color(*to)),
            ];
            let shader = LinearGradient::new(
                Point::from_xy(start.0, start.1),
                Point::from_xy(end.0, end.1),
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            )?;
            let mut sk = SkPaint::default();
            sk.shader = shader;
            sk.anti_alias = true;
            Some(sk)
        }
    }
}

fn solid_paint(color: Color) -> SkPaint<'static> {
    let mut paint = SkPaint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn to_sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_transform(m: Matrix) -> Transform {
    Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
}

/// Decodes PNG or JPEG bytes into premultiplied pixels.
pub fn decode_image(data: &[u8]) -> Option<Pixmap> {
    let decoded = match image::guess_format(data) {
        Ok(fmt) => image::load_from_memory_with_format(data, fmt).ok()?,
        Err(_) => image::load_from_memory(data).ok()?,
    };
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in rgba
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let a = src[3];
        dst[0] = premul_u8(src[0], a);
        dst[1] = premul_u8(src[1], a);
        dst[2] = premul_u8(src[2], a);
        dst[3] = a;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::rect_path;
    use crate::types::Size;
    use std::sync::Arc;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let px = pixmap.pixel(x, y).unwrap().demultiply();
        (px.red(), px.green(), px.blue(), px.alpha())
    }

    #[test]
    fn fills_and_strokes_land_where_recorded() {
        let mut canvas = Canvas::new(Size::new(20.0, 10.0));
        canvas.fill_path(&rect_path(0.0, 0.0, 10.0, 10.0), Paint::Solid(Color::rgb(200, 0, 0)));
        canvas.stroke_path(&rect_path(12.0, 2.0, 6.0, 6.0), Color::rgb(0, 0, 200), 2.0);
        let pixmap = canvas_to_pixmap(&canvas).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (20, 10));
        assert_eq!(pixel(&pixmap, 5, 5), (200, 0, 0, 255));
        assert_eq!(pixel(&pixmap, 15, 5).3, 0);
        assert_eq!(pixel(&pixmap, 12, 5), (0, 0, 200, 255));
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let mut canvas = Canvas::new(Size::new(100.0, 4.0));
        canvas.fill_path(
            &rect_path(0.0, 0.0, 100.0, 4.0),
            Paint::LinearGradient {
                start: (0.0, 0.0),
                end: (100.0, 0.0),
                from: Color::rgb(0, 0, 0),
                to: Color::rgb(255, 255, 255),
            },
        );
        let pixmap = canvas_to_pixmap(&canvas).unwrap();
        let left = pixel(&pixmap, 2, 2).0;
        let right = pixel(&pixmap, 97, 2).0;
        assert!(left < 20, "left={left}");
        assert!(right > 235, "right={right}");
    }

    #[test]
    fn png_output_decodes_back() {
        let mut canvas = Canvas::new(Size::new(8.0, 6.0));
        canvas.fill_path(&rect_path(0.0, 0.0, 8.0, 6.0), Paint::Solid(Color::rgb(1, 2, 3)));
        let png = canvas_to_png(&canvas).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(decoded.get_pixel(4, 3).0, [1, 2, 3, 255]);
    }

    #[test]
    fn decoded_images_are_premultiplied_and_drawable() {
        let mut img = image::RgbaImage::new(2, 2);
        for px in img.pixels_mut() {
            *px = image::Rgba([200, 100, 0, 128]);
        }
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let pixmap = decode_image(&png).unwrap();
        assert_eq!(pixmap.data()[3], 128);
        assert_eq!(pixmap.data()[0], premul_u8(200, 128));

        let mut canvas = Canvas::new(Size::square(4.0));
        canvas.scale(2.0, 2.0);
        canvas.draw_image(Arc::new(pixmap));
        let out = canvas_to_pixmap(&canvas).unwrap();
        assert!(pixel(&out, 1, 1).3 > 100);
        assert!(decode_image(b"not an image").is_none());
    }

    #[test]
    fn rejects_empty_targets() {
        let canvas = Canvas::new(Size::new(0.0, 10.0));
        assert!(matches!(
            canvas_to_pixmap(&canvas),
            Err(IllustrationError::RasterTarget(_))
        ));
    }
}
