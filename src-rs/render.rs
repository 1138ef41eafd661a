//! Composite pipeline shared by the display surface and export.
//!
//! A render always starts from a fresh copy of the base image and redraws
//! every committed annotation, never patching a previous frame.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::annotation::Annotation;
use crate::config::EditorConfig;
use crate::geometry::Point;
use crate::raster::{self, Layer};

/// Stroke parameters in surface pixels, identical at every scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub stroke_width: f64,
    pub arrow_head_length: f64,
    /// Angle between the shaft and each head segment, in radians.
    pub arrow_head_angle: f64,
    pub preview_opacity: f32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::from(&EditorConfig::default())
    }
}

impl From<&EditorConfig> for RenderStyle {
    fn from(config: &EditorConfig) -> Self {
        Self {
            stroke_width: config.stroke_width,
            arrow_head_length: config.arrow_head_length,
            arrow_head_angle: config.arrow_head_angle_deg.to_radians(),
            preview_opacity: config.preview_opacity,
        }
    }
}

/// Image resampled to the display surface size.
pub fn scaled_base(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Draws one annotation at full opacity onto a surface showing image space
/// at `scale`.
pub fn draw_annotation(target: &mut RgbaImage, scale: f64, ann: &Annotation, style: &RenderStyle) {
    match ann {
        Annotation::Highlight { start, end, color } => {
            let a = start.to_display(scale);
            let b = end.to_display(scale);
            raster::stroke_rect(
                target,
                a.x.min(b.x),
                a.y.min(b.y),
                a.x.max(b.x),
                a.y.max(b.y),
                color.to_rgba(),
                style.stroke_width,
            );
        }
        Annotation::Arrow { start, end, color } => {
            draw_arrow(
                target,
                start.to_display(scale),
                end.to_display(scale),
                color.to_rgba(),
                style,
            );
        }
        Annotation::Text {
            anchor,
            color,
            text,
            font,
        } => {
            let at = anchor.to_display(scale);
            raster::draw_bitmap_text(
                target,
                at.x.round() as i32,
                at.y.round() as i32,
                text,
                color.to_rgba(),
                raster::glyph_scale(font.size_px * scale),
            );
        }
    }
}

fn draw_arrow(
    target: &mut RgbaImage,
    start: Point,
    end: Point,
    color: image::Rgba<u8>,
    style: &RenderStyle,
) {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let width = style.stroke_width;
    raster::draw_thick_line(target, start.x, start.y, end.x, end.y, color, width);
    for side in [-1.0, 1.0] {
        let head = angle + side * style.arrow_head_angle;
        raster::draw_thick_line(
            target,
            end.x,
            end.y,
            end.x - style.arrow_head_length * head.cos(),
            end.y - style.arrow_head_length * head.sin(),
            color,
            width,
        );
    }
}

/// Draws an in-progress annotation at the preview opacity.
pub fn draw_preview(target: &mut RgbaImage, scale: f64, ann: &Annotation, style: &RenderStyle) {
    let mut layer = Layer::new(target.width(), target.height());
    draw_annotation(layer.pixels_mut(), scale, ann, style);
    layer.composite_onto(target, style.preview_opacity);
}

/// Base image plus annotations (and optional preview) on a fresh surface.
pub fn compose<'a>(
    base: &RgbaImage,
    scale: f64,
    annotations: impl IntoIterator<Item = &'a Annotation>,
    preview: Option<&Annotation>,
    style: &RenderStyle,
) -> RgbaImage {
    let mut surface = base.clone();
    for ann in annotations {
        draw_annotation(&mut surface, scale, ann, style);
    }
    if let Some(ann) = preview {
        draw_preview(&mut surface, scale, ann, style);
    }
    surface
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::FontDescriptor;
    use crate::color::Color;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn highlight() -> Annotation {
        Annotation::Highlight {
            start: Point::new(100.0, 100.0),
            end: Point::new(200.0, 150.0),
            color: Color::RED,
        }
    }

    #[test]
    fn annotation_lands_at_p_times_scale() {
        let style = RenderStyle::default();
        let native = RgbaImage::from_pixel(400, 300, WHITE);
        let export = compose(&native, 1.0, [&highlight()], None, &style);
        assert_eq!(*export.get_pixel(100, 100), Color::RED.to_rgba());
        assert_eq!(*export.get_pixel(200, 150), Color::RED.to_rgba());
        assert_eq!(*export.get_pixel(150, 125), WHITE);

        let display = RgbaImage::from_pixel(200, 150, WHITE);
        let frame = compose(&display, 0.5, [&highlight()], None, &style);
        assert_eq!(*frame.get_pixel(50, 50), Color::RED.to_rgba());
        assert_eq!(*frame.get_pixel(100, 75), Color::RED.to_rgba());
        assert_eq!(*frame.get_pixel(75, 62), WHITE);
    }

    #[test]
    fn arrowhead_points_back_along_shaft() {
        let style = RenderStyle::default();
        let base = RgbaImage::from_pixel(200, 100, WHITE);
        let arrow = Annotation::Arrow {
            start: Point::new(20.0, 50.0),
            end: Point::new(150.0, 50.0),
            color: Color::RED,
        };
        let out = compose(&base, 1.0, [&arrow], None, &style);
        // Head segments end 15px back at +-30 degrees: (137, 42.5) and (137, 57.5).
        assert_eq!(*out.get_pixel(137, 43), Color::RED.to_rgba());
        assert_eq!(*out.get_pixel(137, 57), Color::RED.to_rgba());
        assert_eq!(*out.get_pixel(170, 50), WHITE);
    }

    #[test]
    fn preview_is_translucent() {
        let style = RenderStyle::default();
        let base = RgbaImage::from_pixel(400, 300, WHITE);
        let out = compose(&base, 1.0, std::iter::empty(), Some(&highlight()), &style);
        let px = *out.get_pixel(100, 100);
        assert_eq!(px[0], 255);
        assert!(px[1] > 60 && px[1] < 90, "expected 70% red over white, got {px:?}");
    }

    #[test]
    fn later_annotations_draw_on_top() {
        let style = RenderStyle::default();
        let base = RgbaImage::from_pixel(400, 300, WHITE);
        let blue = Color::rgb(0, 0, 255);
        let over = Annotation::Arrow {
            start: Point::new(100.0, 50.0),
            end: Point::new(100.0, 200.0),
            color: blue,
        };
        let out = compose(&base, 1.0, [&highlight(), &over], None, &style);
        assert_eq!(*out.get_pixel(100, 100), blue.to_rgba());
    }

    #[test]
    fn text_scales_with_surface() {
        let style = RenderStyle::default();
        let text = Annotation::Text {
            anchor: Point::new(40.0, 60.0),
            color: Color::RED,
            text: "Hi".to_string(),
            font: FontDescriptor::default(),
        };
        let native = compose(&RgbaImage::from_pixel(200, 100, WHITE), 1.0, [&text], None, &style);
        let half = compose(&RgbaImage::from_pixel(100, 50, WHITE), 0.5, [&text], None, &style);
        let inked = |img: &RgbaImage| img.pixels().filter(|p| **p == Color::RED.to_rgba()).count();
        assert!(inked(&native) > 0);
        assert_eq!(inked(&native), inked(&half) * 4);
    }
}
