//! Image-space / display-space conversions.
//!
//! Annotations live in image space (native pixels of the capture). The
//! editing surface shows the image at `scale`, so display = image * scale.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Display-space point to image space.
    pub fn to_image(self, scale: f64) -> Self {
        Self::new(self.x / scale, self.y / scale)
    }

    /// Image-space point to display space.
    pub fn to_display(self, scale: f64) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Area available to the editing surface, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scale that fits an image into the viewport, never upscaling past 1.0.
pub fn fit_scale(image_w: u32, image_h: u32, viewport: Viewport) -> f64 {
    if image_w == 0 || image_h == 0 {
        return 1.0;
    }
    let scale_x = f64::from(viewport.width) / f64::from(image_w);
    let scale_y = f64::from(viewport.height) / f64::from(image_h);
    let scale = scale_x.min(scale_y).min(1.0);
    if scale > 0.0 {
        scale
    } else {
        // A zero-sized viewport still needs a usable surface.
        1.0 / f64::from(image_w.max(image_h))
    }
}

/// Surface dimensions for an image shown at `scale` (truncated, at least 1px).
pub fn canvas_size(image_w: u32, image_h: u32, scale: f64) -> (u32, u32) {
    let w = (f64::from(image_w) * scale).floor().max(1.0) as u32;
    let h = (f64::from(image_h) * scale).floor().max(1.0) as u32;
    (w, h)
}

/// Axis-aligned box spanned by two corners, in whatever space they share.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// True when either side is strictly longer than `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.width() > threshold || self.height() > threshold
    }
}
