use crate::path::PathError;

pub type Result<T> = std::result::Result<T, IllustrationError>;

#[derive(Debug, thiserror::Error)]
pub enum IllustrationError {
    #[error("resource not found: {name}")]
    ResourceNotFound { name: String },

    #[error("malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("unsupported path data: {0}")]
    UnsupportedPathCommand(#[from] PathError),

    #[error("unable to decode raster image {name}: {message}")]
    RasterDecodeFailure { name: String, message: String },

    #[error("invalid asset size {width}x{height}")]
    InvalidAsset { width: f32, height: f32 },

    #[error("no illustration assets could be loaded: {}", failures.join("; "))]
    EmptyCatalog { failures: Vec<String> },

    #[error("raster target error: {0}")]
    RasterTarget(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
