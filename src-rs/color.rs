use std::fmt;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::EditorError;

/// Straight (non-premultiplied) RGBA color.
///
/// Serialized as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(0xFF, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// Swatches offered by the toolbar.
    pub fn default_palette() -> Vec<Color> {
        vec![
            Color::RED,
            Color::rgb(0xFF, 0x98, 0x00),
            Color::rgb(0xFF, 0xEB, 0x3B),
            Color::rgb(0x4C, 0xAF, 0x50),
            Color::rgb(0x21, 0x96, 0xF3),
            Color::rgb(0x00, 0x00, 0x00),
            Color::rgb(0xFF, 0xFF, 0xFF),
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::RED
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = EditorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_color(raw).ok_or_else(|| EditorError::InvalidColor(raw.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

fn parse_color(raw: &str) -> Option<Color> {
    let s = raw.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return match hex.len() {
            6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        };
    }

    let lower = s.to_ascii_lowercase();
    if lower.starts_with("rgba(") && lower.ends_with(')') {
        let body = &lower[5..lower.len() - 1];
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return None;
        }
        let byte = |p: &str| -> Option<u8> {
            Some(p.parse::<f64>().ok()?.round().clamp(0.0, 255.0) as u8)
        };
        let alpha_value = parts[3].parse::<f64>().ok()?;
        let a = if alpha_value <= 1.0 {
            (alpha_value * 255.0).round().clamp(0.0, 255.0) as u8
        } else {
            alpha_value.round().clamp(0.0, 255.0) as u8
        };
        return Some(Color {
            r: byte(parts[0])?,
            g: byte(parts[1])?,
            b: byte(parts[2])?,
            a,
        });
    }

    None
}
