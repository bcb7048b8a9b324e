use crate::types::Color;

/// Application palette that authored artwork is harmonized into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub primary: Color,
    pub primary_dark: Color,
    pub primary_light: Color,
    pub fill_highlight: Color,
    pub stroke_highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::rgb(34, 102, 141),
            primary_dark: Color::rgb(23, 71, 104),
            primary_light: Color::rgb(211, 229, 241),
            fill_highlight: Color::WHITE,
            stroke_highlight: Color::rgb(220, 220, 220),
        }
    }
}

impl Theme {
    /// Accent used when artwork leaves both fill and stroke unset, and for unknown
    /// color keywords.
    pub fn default_paint(&self) -> Color {
        self.primary_light
    }
}
