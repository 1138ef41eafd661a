//! Annotation model.
//!
//! All coordinates are stored in image space so the same annotation renders
//! correctly at display scale and at native export resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::EditorError;
use crate::geometry::{Bounds, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Highlight,
    Arrow,
    Text,
}

impl Tool {
    /// Tools that create annotations by dragging.
    pub fn is_shape(self) -> bool {
        matches!(self, Tool::Highlight | Tool::Arrow)
    }

    pub fn cursor(self) -> Cursor {
        match self {
            Tool::Highlight => Cursor::Highlight,
            Tool::Arrow => Cursor::Arrow,
            Tool::Text => Cursor::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Highlight => "highlight",
            Tool::Arrow => "arrow",
            Tool::Text => "text",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer affordance shown over the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Highlight,
    Arrow,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorStyle {
    pub cursor: Cursor,
    /// Set while a drag is in progress.
    pub drawing: bool,
}

/// CSS-like `"<size>px <family>"` font descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FontDescriptor {
    pub size_px: f64,
    pub family: String,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            size_px: 16.0,
            family: "Arial".to_string(),
        }
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

impl FromStr for FontDescriptor {
    type Err = EditorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::InvalidFont(raw.to_string());
        let trimmed = raw.trim();
        let (size, family) = trimmed.split_once(char::is_whitespace).ok_or_else(invalid)?;
        let size_px = size
            .strip_suffix("px")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(invalid)?;
        let family = family.trim();
        if family.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            size_px,
            family: family.to_string(),
        })
    }
}

impl TryFrom<String> for FontDescriptor {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FontDescriptor> for String {
    fn from(font: FontDescriptor) -> Self {
        font.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Annotation {
    /// Rectangle outline between two corners.
    Highlight {
        start: Point,
        end: Point,
        color: Color,
    },
    /// Line with an arrowhead at `end`.
    Arrow {
        start: Point,
        end: Point,
        color: Color,
    },
    /// Filled text whose baseline starts at `anchor`.
    Text {
        anchor: Point,
        color: Color,
        text: String,
        font: FontDescriptor,
    },
}

impl Annotation {
    /// Zero-length provisional shape for `tool`, or `None` for the text tool.
    pub fn provisional(tool: Tool, origin: Point, color: Color) -> Option<Self> {
        match tool {
            Tool::Highlight => Some(Annotation::Highlight {
                start: origin,
                end: origin,
                color,
            }),
            Tool::Arrow => Some(Annotation::Arrow {
                start: origin,
                end: origin,
                color,
            }),
            Tool::Text => None,
        }
    }

    pub fn tool(&self) -> Tool {
        match self {
            Annotation::Highlight { .. } => Tool::Highlight,
            Annotation::Arrow { .. } => Tool::Arrow,
            Annotation::Text { .. } => Tool::Text,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Annotation::Highlight { color, .. }
            | Annotation::Arrow { color, .. }
            | Annotation::Text { color, .. } => *color,
        }
    }

    /// Moves the drag end of a shape; text is left untouched.
    pub fn set_end(&mut self, point: Point) {
        match self {
            Annotation::Highlight { end, .. } | Annotation::Arrow { end, .. } => *end = point,
            Annotation::Text { .. } => {}
        }
    }

    /// Box spanned by a shape's drag corners. Text has no drag extent.
    pub fn drag_bounds(&self) -> Option<Bounds> {
        match self {
            Annotation::Highlight { start, end, .. } | Annotation::Arrow { start, end, .. } => {
                Some(Bounds::from_corners(*start, *end))
            }
            Annotation::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_descriptor_parses_css_shorthand() {
        let font: FontDescriptor = "16px Arial".parse().unwrap();
        assert_eq!(font, FontDescriptor::default());
        let wide: FontDescriptor = "24.5px Helvetica Neue".parse().unwrap();
        assert_eq!(wide.size_px, 24.5);
        assert_eq!(wide.family, "Helvetica Neue");
        assert!("Arial".parse::<FontDescriptor>().is_err());
        assert!("0px Arial".parse::<FontDescriptor>().is_err());
    }

    #[test]
    fn provisional_shape_starts_collapsed() {
        let origin = Point::new(10.0, 20.0);
        let mut ann = Annotation::provisional(Tool::Arrow, origin, Color::RED).unwrap();
        assert!(!ann.drag_bounds().unwrap().exceeds(0.0));
        ann.set_end(Point::new(30.0, 20.0));
        assert_eq!(ann.drag_bounds().unwrap().width(), 20.0);
        assert!(Annotation::provisional(Tool::Text, origin, Color::RED).is_none());
    }

    #[test]
    fn serializes_with_type_tag() {
        let ann = Annotation::Text {
            anchor: Point::new(1.0, 2.0),
            color: Color::RED,
            text: "Hi".to_string(),
            font: FontDescriptor::default(),
        };
        let value = serde_json::to_value(&ann).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["font"], "16px Arial");
        let back: Annotation = serde_json::from_value(value).unwrap();
        assert_eq!(back, ann);
    }
}
