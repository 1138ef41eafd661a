use std::path::PathBuf;

use thiserror::Error;

use crate::annotation::Tool;
use crate::color::Color;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("captured image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid data URL: {0}")]
    DataUrl(String),

    #[error("tool '{0}' is not available in this editor")]
    ToolUnavailable(Tool),

    #[error("color {0} is not one of the palette swatches")]
    UnsupportedColor(Color),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    #[error("invalid font descriptor: {0}")]
    InvalidFont(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("hand-off store has no captured image")]
    MissingCapture,
}

impl EditorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::Io {
            path: path.into(),
            source,
        }
    }
}
