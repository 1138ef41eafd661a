use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotation::{FontDescriptor, Tool};
use crate::color::Color;
use crate::error::{EditorError, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;

pub const OUT_DIR_ENV: &str = "QUICKSHOT_OUT_DIR";

/// Editor tuning. Every field has a default, so a config file only needs the
/// keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_limit: usize,
    /// Image-space extent a drag must exceed (in width or height) to commit.
    pub min_annotation_size: f64,
    /// Stroke width in surface pixels, the same at every scale.
    pub stroke_width: f64,
    pub arrow_head_length: f64,
    pub arrow_head_angle_deg: f64,
    pub preview_opacity: f32,
    pub text_font: FontDescriptor,
    /// Delay between a text field losing focus and its commit.
    pub text_commit_grace_ms: u64,
    pub default_tool: Tool,
    pub default_color: Color,
    pub palette: Vec<Color>,
    /// `false` builds the highlight/arrow-only editor.
    pub text_tool: bool,
    pub output_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            min_annotation_size: 5.0,
            stroke_width: 5.0,
            arrow_head_length: 15.0,
            arrow_head_angle_deg: 30.0,
            preview_opacity: 0.7,
            text_font: FontDescriptor::default(),
            text_commit_grace_ms: 150,
            default_tool: Tool::Arrow,
            default_color: Color::RED,
            palette: Color::default_palette(),
            text_tool: true,
            output_dir: default_output_dir(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| EditorError::io(path, err))?;
        let mut config: EditorConfig = serde_json::from_str(&raw)?;
        config.normalize();
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        let mut tools = vec![Tool::Highlight, Tool::Arrow];
        if self.text_tool {
            tools.push(Tool::Text);
        }
        tools
    }

    fn normalize(&mut self) {
        self.history_limit = self.history_limit.max(1);
        self.preview_opacity = self.preview_opacity.clamp(0.0, 1.0);
        if !self.palette.contains(&self.default_color) {
            self.palette.insert(0, self.default_color);
        }
        if !self.text_tool && self.default_tool == Tool::Text {
            self.default_tool = Tool::Arrow;
        }
    }
}

/// Output directory: `QUICKSHOT_OUT_DIR` when set, `.quickshot` otherwise.
pub fn default_output_dir() -> PathBuf {
    env::var(OUT_DIR_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".quickshot"))
}
