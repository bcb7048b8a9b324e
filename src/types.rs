#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Perceptual luminance on the 0..=255 scale (Rec. 709 weights).
    pub fn luminance(self) -> f32 {
        0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32
    }

    /// Multiplies the alpha channel by `opacity`, clamped to 0..=1.
    pub fn scale_alpha(self, opacity: f32) -> Self {
        let opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        let a = (self.a as f32 * opacity).round() as u8;
        self.with_alpha(a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn square(side: f32) -> Self {
        Self::new(side, side)
    }

    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_alpha_clamps_and_rounds() {
        let c = Color::rgba(10, 20, 30, 200);
        assert_eq!(c.scale_alpha(0.5).a, 100);
        assert_eq!(c.scale_alpha(2.0).a, 200);
        assert_eq!(c.scale_alpha(-1.0).a, 0);
        assert_eq!(c.scale_alpha(0.5).r, 10);
    }

    #[test]
    fn luminance_matches_rec709_weights() {
        assert!((Color::WHITE.luminance() - 255.0).abs() < 0.01);
        assert!((Color::rgb(10, 10, 10).luminance() - 10.0).abs() < 0.01);
        assert_eq!(Color::BLACK.luminance(), 0.0);
    }

    #[test]
    fn size_positivity() {
        assert!(Size::new(1.0, 2.0).is_positive());
        assert!(!Size::new(0.0, 2.0).is_positive());
        assert!(!Size::new(f32::NAN, 2.0).is_positive());
    }
}
