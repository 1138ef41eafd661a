//! Pixel-level drawing primitives on `RgbaImage`.

use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};

/// Glyph cell size of the bitmap font, in font units.
pub const GLYPH_SIZE: i32 = 8;
/// Row of the glyph cell that sits on the baseline.
const GLYPH_BASELINE_ROW: i32 = 7;

fn clamp_i32(value: i32, min_value: i32, max_value: i32) -> i32 {
    value.max(min_value).min(max_value)
}

/// Source-over compositing of `src` onto `dst`.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let dst_a = f64::from(dst[3]) / 255.0;
    let out_a = a + dst_a * inv;
    let channel = |i: usize| -> u8 {
        let value = (f64::from(src[i]) * a + f64::from(dst[i]) * dst_a * inv) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

fn blend_at(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = *img.get_pixel(x as u32, y as u32);
    img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
}

pub fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    if radius <= 0.1 {
        blend_at(img, cx.round() as i32, cy.round() as i32, color);
        return;
    }
    let min_x = clamp_i32((cx - radius).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32((cx + radius).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32((cy - radius).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32((cy + radius).ceil() as i32, 0, img.height() as i32 - 1);
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx + dy * dy <= r2 {
                blend_at(img, x, y, color);
            }
        }
    }
}

/// Liang-Barsky clip of a segment to an axis-aligned box.
fn clip_segment(
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    (min_x, min_y): (f64, f64),
    (max_x, max_y): (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-dx, x1 - min_x),
        (dx, max_x - x1),
        (-dy, y1 - min_y),
        (dy, max_y - y1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some(((x1 + dx * t0, y1 + dy * t0), (x1 + dx * t1, y1 + dy * t1)))
}

/// Round-capped line of the given width.
///
/// Blends a disc per step, so overlapping coverage is only idempotent for
/// opaque colors; translucent strokes go through a [`Layer`]. Only the part
/// of the segment within a stroke radius of the image is stepped.
pub fn draw_thick_line(
    img: &mut RgbaImage,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    color: Rgba<u8>,
    width: f64,
) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return;
    }
    let radius = (width.max(1.0) / 2.0).max(0.6);
    let margin = radius + 1.0;
    let Some(((x1, y1), (x2, y2))) = clip_segment(
        (x1, y1),
        (x2, y2),
        (-margin, -margin),
        (
            f64::from(img.width()) - 1.0 + margin,
            f64::from(img.height()) - 1.0 + margin,
        ),
    ) else {
        return;
    };
    let dx = x2 - x1;
    let dy = y2 - y1;
    let distance = (dx * dx + dy * dy).sqrt();
    let steps = distance.max(1.0).ceil() as i32;
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps.max(1));
        draw_disc(img, x1 + dx * t, y1 + dy * t, radius, color);
    }
}

/// Rectangle outline centred on the edges between two corners, round joins.
pub fn stroke_rect(
    img: &mut RgbaImage,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: Rgba<u8>,
    width: f64,
) {
    draw_thick_line(img, x0, y0, x1, y0, color, width);
    draw_thick_line(img, x1, y0, x1, y1, color, width);
    draw_thick_line(img, x1, y1, x0, y1, color, width);
    draw_thick_line(img, x0, y1, x0, y0, color, width);
}

/// Integer magnification for a font of `size_px` on the 8px glyph grid.
pub fn glyph_scale(size_px: f64) -> i32 {
    (size_px / f64::from(GLYPH_SIZE)).round().max(1.0) as i32
}

/// Draws `text` with its baseline at `y`. Glyph cells outside the image are
/// skipped, so the cost is bounded by the visible part.
pub fn draw_bitmap_text(
    img: &mut RgbaImage,
    x: i32,
    baseline_y: i32,
    text: &str,
    color: Rgba<u8>,
    scale: i32,
) {
    let (width, height) = (i64::from(img.width()), i64::from(img.height()));
    let scale = i64::from(scale.max(1));
    let cell = i64::from(GLYPH_SIZE) * scale;
    let top = i64::from(baseline_y) - i64::from(GLYPH_BASELINE_ROW) * scale;
    if top >= height || top + cell <= 0 {
        return;
    }
    let mut cursor_x = i64::from(x);
    for ch in text.chars() {
        if cursor_x >= width {
            break;
        }
        if cursor_x + cell <= 0 {
            cursor_x += cell;
            continue;
        }
        let Some(glyph) = glyph_for(ch) else {
            cursor_x += cell;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            let row_bits = *row;
            let py = top + row_idx as i64 * scale;
            for col_idx in 0..GLYPH_SIZE {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + i64::from(col_idx) * scale;
                for y in py.max(0)..(py + scale).min(height) {
                    for x in px.max(0)..(px + scale).min(width) {
                        let dst = *img.get_pixel(x as u32, y as u32);
                        img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
                    }
                }
            }
        }
        cursor_x += cell;
    }
}

/// Bitmap for `ch`, falling back to `?` outside the bundled ranges.
fn glyph_for(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
}

/// Transparent scratch surface composited onto a target with one opacity,
/// so overlapping strokes inside it do not darken each other.
pub struct Layer {
    pixels: RgbaImage,
}

impl Layer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn composite_onto(&self, target: &mut RgbaImage, opacity: f32) {
        let opacity = f64::from(opacity.clamp(0.0, 1.0));
        for (x, y, src) in self.pixels.enumerate_pixels() {
            if src[3] == 0 || x >= target.width() || y >= target.height() {
                continue;
            }
            let alpha = (f64::from(src[3]) * opacity).round().clamp(0.0, 255.0) as u8;
            let dst = *target.get_pixel(x, y);
            target.put_pixel(x, y, blend_pixel(dst, Rgba([src[0], src[1], src[2], alpha])));
        }
    }
}
