use crate::assets::Asset;
use crate::canvas::{Canvas, Paint};
use crate::path::{Matrix, round_rect_path};
use crate::theme::Theme;
use crate::types::{Color, Size};

/// Default inset between the canvas edge and the artwork, per side.
pub const DEFAULT_MARGIN: f32 = 16.0;

const BACKGROUND_RADIUS: f32 = 24.0;
const SHADOW_RADIUS: f32 = 20.0;
const SHADOW_ALPHA: f32 = 0.14;
const HIGHLIGHT_RADIUS: f32 = 22.0;
const BORDER_RADIUS: f32 = 23.0;
const BORDER_WIDTH: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub margin: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
        }
    }
}

/// Uniform scale and centering offset that fit `art` inside `target` minus margins.
///
/// Returns `None` when no positive finite scale exists.
pub fn fit_transform(art: Size, target: Size, margin: f32) -> Option<Matrix> {
    let scale = ((target.width - 2.0 * margin) / art.width)
        .min((target.height - 2.0 * margin) / art.height);
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let tx = (target.width - art.width * scale) / 2.0;
    let ty = (target.height - art.height * scale) / 2.0;
    Some(Matrix::translate(tx, ty).mul(Matrix::scale(scale, scale)))
}

/// Draws the themed backdrop and then `asset` fitted into the canvas.
pub fn render_asset(asset: &Asset, canvas: &mut Canvas, theme: &Theme, options: &RenderOptions) {
    let size = canvas.size();
    draw_background(canvas, size, theme);

    let art = Size::new(asset.width(), asset.height());
    let Some(fit) = fit_transform(art, size, options.margin) else {
        log::trace!(
            "canvas {}x{} too small for artwork {}x{}",
            size.width,
            size.height,
            art.width,
            art.height
        );
        return;
    };
    let scale = fit.a;

    canvas.save_state();
    canvas.concat_matrix(fit);
    if let Some(image) = asset.raster_image() {
        canvas.draw_image(image.clone());
    } else {
        for shape in asset.shapes() {
            if let Some(fill) = shape.fill {
                canvas.fill_path(&shape.path, Paint::Solid(fill));
            }
            if let Some(stroke) = shape.stroke {
                if shape.stroke_width > 0.0 {
                    canvas.stroke_path(&shape.path, stroke, shape.stroke_width * scale);
                }
            }
        }
    }
    canvas.restore_state();
}

fn draw_background(canvas: &mut Canvas, size: Size, theme: &Theme) {
    let (w, h) = (size.width, size.height);
    if w > 0.0 && h > 0.0 {
        canvas.fill_path(
            &round_rect_path(0.0, 0.0, w, h, BACKGROUND_RADIUS, BACKGROUND_RADIUS),
            Paint::LinearGradient {
                start: (0.0, 0.0),
                end: (w, h),
                from: theme.primary_light,
                to: theme.primary,
            },
        );
    }

    // Depth cue.
    if w - 12.0 > 0.0 && h - 16.0 > 0.0 {
        canvas.fill_path(
            &round_rect_path(6.0, 10.0, w - 12.0, h - 16.0, SHADOW_RADIUS, SHADOW_RADIUS),
            Paint::Solid(theme.primary_dark.scale_alpha(SHADOW_ALPHA)),
        );
    }

    if w - 4.0 > 0.0 && h - 4.0 > 0.0 {
        canvas.fill_path(
            &round_rect_path(2.0, 2.0, w - 4.0, h - 4.0, HIGHLIGHT_RADIUS, HIGHLIGHT_RADIUS),
            Paint::LinearGradient {
                start: (0.0, 0.0),
                end: (0.0, h),
                from: Color::WHITE.with_alpha(120),
                to: Color::WHITE.with_alpha(10),
            },
        );
    }

    if w - 2.0 > 0.0 && h - 2.0 > 0.0 {
        canvas.stroke_path(
            &round_rect_path(1.0, 1.0, w - 2.0, h - 2.0, BORDER_RADIUS, BORDER_RADIUS),
            Color::WHITE.with_alpha(90),
            BORDER_WIDTH,
        );
    }
}
