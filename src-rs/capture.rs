//! Capture providers: where the screenshot comes from.
//!
//! The editor only needs PNG bytes and their dimensions; how a provider
//! obtains them (an existing file, an external screenshot tool) stays here.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use chrono::Utc;
use image::GenericImageView;
use log::{debug, error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

use crate::error::{EditorError, Result};

const RESTRICTED_SCHEMES: [&str; 4] = [
    "chrome://",
    "chrome-extension://",
    "moz-extension://",
    "edge://",
];

/// Placeholder in [`CommandCapture`] arguments replaced by the output path.
pub const OUT_PLACEHOLDER: &str = "{out}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Visible,
}

impl CaptureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
        }
    }

    /// Capture modes this build can perform, by their request name.
    pub fn from_request(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Self::Visible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub url: String,
    pub title: String,
    pub capture_mode: CaptureMode,
}

/// Pages the capture step cannot script into; only a visible-area capture
/// is possible there.
pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_SCHEMES
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Capture mode actually used for a page, given the requested mode name.
/// Restricted pages always fall back to a visible-area capture; `None` means
/// the request names a mode that cannot be captured.
pub fn resolve_mode(url: &str, requested: &str) -> Option<CaptureMode> {
    if is_restricted_url(url) {
        if CaptureMode::from_request(requested) != Some(CaptureMode::Visible) {
            warn!("restricted page {url}; falling back to visible area capture");
        }
        return Some(CaptureMode::Visible);
    }
    CaptureMode::from_request(requested)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub page: PageInfo,
}

impl CapturedImage {
    /// Validates encoded image bytes and records their dimensions. Non-PNG
    /// input is re-encoded so the hand-off always carries PNG.
    pub fn from_encoded(bytes: Vec<u8>, page: PageInfo) -> Result<Self> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(EditorError::EmptyImage { width, height });
        }
        let png = if format == image::ImageFormat::Png {
            bytes
        } else {
            crate::export::encode_png(&decoded.to_rgba8())?
        };
        Ok(Self {
            png,
            width,
            height,
            page,
        })
    }
}

pub trait CaptureProvider {
    /// Page the capture is taken from.
    fn page(&self) -> &PageInfo;
    fn capture_visible(&self) -> Result<CapturedImage>;
}

/// Uses an image already on disk as the capture.
#[derive(Debug, Clone)]
pub struct FileCapture {
    pub path: PathBuf,
    pub page: PageInfo,
}

impl CaptureProvider for FileCapture {
    fn page(&self) -> &PageInfo {
        &self.page
    }

    fn capture_visible(&self) -> Result<CapturedImage> {
        let bytes = fs::read(&self.path).map_err(|err| EditorError::io(&self.path, err))?;
        CapturedImage::from_encoded(bytes, self.page.clone())
    }
}

/// Runs an external screenshot tool that writes a PNG to `{out}`.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub page: PageInfo,
    pub scratch_dir: PathBuf,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, args: Vec<String>, page: PageInfo) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(15),
            page,
            scratch_dir: env::temp_dir(),
        }
    }

    fn scratch_path(&self) -> PathBuf {
        let ts = Utc::now().format("%Y%m%d-%H%M%S");
        let rand = rand::thread_rng().gen_range(1000..9999);
        self.scratch_dir
            .join(format!("quickshot-capture-{ts}-{}-{rand}.png", std::process::id()))
    }

    fn run(&self, out_path: &Path) -> Result<()> {
        let out = out_path.display().to_string();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(OUT_PLACEHOLDER, &out))
            .collect();
        debug!("capture command: {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| EditorError::Capture(format!("failed to spawn {}: {err}", self.program)))?;

        let status = child
            .wait_timeout(self.timeout)
            .map_err(|err| EditorError::Capture(err.to_string()))?;
        let Some(status) = status else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EditorError::Capture(format!(
                "{} timed out after {}s",
                self.program,
                self.timeout.as_secs()
            )));
        };
        if !status.success() {
            let output = child.wait_with_output().ok();
            let stderr = output
                .map(|o| String::from_utf8_lossy(&o.stderr).trim().to_string())
                .unwrap_or_default();
            return Err(EditorError::Capture(format!(
                "{} exited with {}: {stderr}",
                self.program,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

impl CaptureProvider for CommandCapture {
    fn page(&self) -> &PageInfo {
        &self.page
    }

    fn capture_visible(&self) -> Result<CapturedImage> {
        let out_path = self.scratch_path();
        let result = self.run(&out_path).and_then(|()| {
            let bytes = fs::read(&out_path).map_err(|err| EditorError::io(&out_path, err))?;
            CapturedImage::from_encoded(bytes, self.page.clone())
        });
        let _ = fs::remove_file(&out_path);
        result
    }
}

/// Captures through `provider`, logging failures instead of panicking. No
/// editor session should start when this returns an error.
pub fn capture_page(provider: &dyn CaptureProvider, requested: &str) -> Result<CapturedImage> {
    let Some(mode) = resolve_mode(&provider.page().url, requested) else {
        error!("unsupported capture mode {requested:?}");
        return Err(EditorError::Capture(format!(
            "unsupported capture mode: {requested}"
        )));
    };
    match provider.capture_visible() {
        Ok(mut captured) => {
            captured.page.capture_mode = mode;
            Ok(captured)
        }
        Err(err) => {
            error!("failed to capture visible area: {err}");
            Err(err)
        }
    }
}
