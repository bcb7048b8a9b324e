use std::sync::Arc;

use tiny_skia::Pixmap;

use crate::path::{Matrix, PathData};
use crate::types::{Color, Size};

/// Fill paint recorded on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    // Two-stop axial gradient, padded beyond its end points.
    LinearGradient {
        start: (f32, f32),
        end: (f32, f32),
        from: Color,
        to: Color,
    },
}

#[derive(Clone)]
pub enum Command {
    FillPath {
        path: PathData,
        paint: Paint,
    },
    // Round caps and joins; width is already in device units.
    StrokePath {
        path: PathData,
        color: Color,
        width: f32,
    },
    // Bitmap drawn at the origin through `transform` with bicubic filtering.
    DrawImage {
        image: Arc<Pixmap>,
        transform: Matrix,
    },
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::FillPath { path, paint } => f
                .debug_struct("FillPath")
                .field("path", path)
                .field("paint", paint)
                .finish(),
            Command::StrokePath { path, color, width } => f
                .debug_struct("StrokePath")
                .field("path", path)
                .field("color", color)
                .field("width", width)
                .finish(),
            Command::DrawImage { image, transform } => f
                .debug_struct("DrawImage")
                .field("width", &image.width())
                .field("height", &image.height())
                .field("transform", transform)
                .finish(),
        }
    }
}

/// Records drawing commands in device space.
///
/// Geometry passed in is mapped through the current transform at record time, so playback
/// never needs to track graphics state.
#[derive(Debug, Clone)]
pub struct Canvas {
    size: Size,
    transform: Matrix,
    stack: Vec<Matrix>,
    commands: Vec<Command>,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            transform: Matrix::identity(),
            stack: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn transform(&self) -> Matrix {
        self.transform
    }

    pub fn save_state(&mut self) {
        self.stack.push(self.transform);
    }

    pub fn restore_state(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.transform = prev;
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.concat_matrix(Matrix::translate(tx, ty));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.concat_matrix(Matrix::scale(sx, sy));
    }

    /// Pre-multiplies `m` into the current transform (applied before what is already set).
    pub fn concat_matrix(&mut self, m: Matrix) {
        self.transform = self.transform.mul(m);
    }

    pub fn fill_path(&mut self, path: &PathData, paint: Paint) {
        if path.is_empty() {
            return;
        }
        let m = self.transform;
        let paint = match paint {
            Paint::LinearGradient {
                start,
                end,
                from,
                to,
            } => Paint::LinearGradient {
                start: m.apply(start.0, start.1),
                end: m.apply(end.0, end.1),
                from,
                to,
            },
            solid => solid,
        };
        self.commands.push(Command::FillPath {
            path: path.transform(m),
            paint,
        });
    }

    pub fn stroke_path(&mut self, path: &PathData, color: Color, width: f32) {
        if path.is_empty() || !(width > 0.0) {
            return;
        }
        self.commands.push(Command::StrokePath {
            path: path.transform(self.transform),
            color,
            width,
        });
    }

    pub fn draw_image(&mut self, image: Arc<Pixmap>) {
        self.commands.push(Command::DrawImage {
            image,
            transform: self.transform,
        });
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
