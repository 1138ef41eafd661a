//! Export sinks for the native-resolution composite.

use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Serialize;

use crate::annotation::Annotation;
use crate::capture::PageInfo;
use crate::error::{EditorError, Result};

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image.clone()).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// `screenshot-<YYYY-MM-DDTHH-MM-SS>.png` in UTC.
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("screenshot-{}.png", at.format("%Y-%m-%dT%H-%M-%S"))
}

/// Local file save.
pub trait FileSink {
    /// Writes `png` under `filename`, returning where it landed.
    fn save(&mut self, filename: &str, png: &[u8]) -> Result<PathBuf>;
}

/// System clipboard accepting an image payload.
pub trait ClipboardSink {
    fn write_image(&mut self, image: &RgbaImage, png: &[u8]) -> Result<()>;
}

/// Saves exports into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectorySink {
    fn save(&mut self, filename: &str, png: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|err| EditorError::io(&self.dir, err))?;
        let path = self.dir.join(filename);
        fs::write(&path, png).map_err(|err| EditorError::io(&path, err))?;
        Ok(path)
    }
}

/// OS clipboard through `arboard`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_image(&mut self, image: &RgbaImage, _png: &[u8]) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| EditorError::Clipboard(err.to_string()))?;
        let data = arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        };
        clipboard
            .set_image(data)
            .map_err(|err| EditorError::Clipboard(err.to_string()))
    }
}

/// Sidecar describing an exported PNG.
#[derive(Debug, Clone, Serialize)]
pub struct ExportMeta {
    pub export_meta_version: u32,
    pub image_path: String,
    pub generated_at: String,
    pub size: ExportSize,
    pub page: Option<PageInfo>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExportSize {
    pub width: u32,
    pub height: u32,
    pub units: &'static str,
}

impl ExportMeta {
    pub fn new(
        image_path: &Path,
        width: u32,
        height: u32,
        page: Option<PageInfo>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            export_meta_version: 1,
            image_path: image_path.display().to_string(),
            generated_at: Utc::now().to_rfc3339(),
            size: ExportSize {
                width,
                height,
                units: "px",
            },
            page,
            annotations,
        }
    }

    /// Writes `<stem>.json` next to the exported image.
    pub fn write_beside(&self, image_path: &Path) -> Result<PathBuf> {
        let stem = image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("export");
        let path = image_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(format!("{stem}.json"));
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&path, raw).map_err(|err| EditorError::io(&path, err))?;
        Ok(path)
    }
}
