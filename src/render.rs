//! # Overlay Renderer
//!
//! Headless stand-in for the on-screen overlay view. The image is contain-fit
//! into a container-sized canvas, then mapped overlays are drawn on top:
//! stroked boxes, filled point markers and translucent segmentation paths.
//!
//! Overlays must be mapped with the layout from [`OverlayRenderer::layout_for`]
//! so they line up with the drawn image.

use std::path::Path;

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeOptions, Resizer};
use image::{ImageFormat, RgbaImage};
use overlay_geom::layout::{aspect_ratio, compute_render_layout, RenderLayout};
use overlay_geom::overlay::{BoxOverlay, PathOverlay, PointOverlay};
use overlay_geom::palette::Color as OverlayColor;
use serde::Serialize;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};
use tracing::debug;

use crate::error::{VisionError, VisionResult};
use crate::raster;

/// Everything drawn on top of the image, already in container pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayScene {
    pub boxes: Vec<BoxOverlay>,
    pub points: Vec<PointOverlay>,
    pub paths: Vec<PathOverlay>,
    /// Diameter of point markers.
    pub marker_size: f64,
}

impl OverlayScene {
    pub fn new(marker_size: f64) -> Self {
        Self {
            marker_size,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.points.is_empty() && self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    /// Canvas colour behind the bars, RGBA.
    pub background: [u8; 4],
    pub stroke_width: f32,
    /// Alpha of segmentation fills.
    pub fill_alpha: u8,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: [0, 0, 0, 255],
            stroke_width: 3.0,
            fill_alpha: 96,
        }
    }
}

pub struct OverlayRenderer {
    width: u32,
    height: u32,
    style: RenderStyle,
}

impl OverlayRenderer {
    pub fn new(width: u32, height: u32) -> VisionResult<Self> {
        if width == 0 || height == 0 {
            return Err(VisionError::surface_allocation(
                f64::from(width),
                f64::from(height),
                "container must have a positive size",
            ));
        }
        Ok(Self {
            width,
            height,
            style: RenderStyle::default(),
        })
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Where `image` lands inside the container.
    pub fn layout_for(&self, image: &RgbaImage) -> RenderLayout {
        compute_render_layout(
            f64::from(self.width),
            f64::from(self.height),
            aspect_ratio(image.width(), image.height()),
        )
    }

    pub fn render(&self, image: &RgbaImage, scene: &OverlayScene) -> VisionResult<RgbaImage> {
        let mut canvas = Pixmap::new(self.width, self.height).ok_or_else(|| {
            VisionError::surface_allocation(
                f64::from(self.width),
                f64::from(self.height),
                "cannot allocate canvas",
            )
        })?;
        let [r, g, b, a] = self.style.background;
        canvas.fill(Color::from_rgba8(r, g, b, a));

        let layout = self.layout_for(image);
        if !layout.is_empty() {
            let w = (layout.width.round() as u32).max(1);
            let h = (layout.height.round() as u32).max(1);
            let resized = resize_rgba(image, w, h)?;
            let src = raster::pixmap_from_rgba(&resized)?;
            canvas.draw_pixmap(
                layout.offset_x.round() as i32,
                layout.offset_y.round() as i32,
                src.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        let stroke = Stroke {
            width: self.style.stroke_width,
            ..Stroke::default()
        };

        for overlay in &scene.paths {
            let Some(path) = raster::to_skia_path(&raster::to_bez_path(&overlay.path)) else {
                continue;
            };
            let fill = paint(overlay.color, self.style.fill_alpha);
            canvas.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
            canvas.stroke_path(&path, &paint(overlay.color, 255), &stroke, Transform::identity(), None);
        }

        for overlay in &scene.boxes {
            let rect = overlay.rect;
            // Inverted regions map to negative extents; draw the covered area.
            let (l, r) = min_max(rect.left, rect.right());
            let (t, b) = min_max(rect.top, rect.bottom());
            if let Some(bounds) = Rect::from_ltrb(l as f32, t as f32, r as f32, b as f32) {
                let path = PathBuilder::from_rect(bounds);
                canvas.stroke_path(&path, &paint(overlay.color, 255), &stroke, Transform::identity(), None);
            }
        }

        let radius = (scene.marker_size / 2.0) as f32;
        for overlay in &scene.points {
            if let Some(circle) =
                PathBuilder::from_circle(overlay.center.x as f32, overlay.center.y as f32, radius)
            {
                canvas.fill_path(
                    &circle,
                    &paint(overlay.color, 255),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }

        debug!(
            boxes = scene.boxes.len(),
            points = scene.points.len(),
            paths = scene.paths.len(),
            "overlay scene rendered"
        );
        raster::rgba_from_pixmap(&canvas)
    }

    /// Render and write a PNG.
    pub fn render_to_file(&self, image: &RgbaImage, scene: &OverlayScene, output: &Path) -> VisionResult<()> {
        self.render(image, scene)?
            .save_with_format(output, ImageFormat::Png)
            .map_err(|e| VisionError::image_encode(output, e.to_string()))
    }
}

fn paint(color: OverlayColor, alpha: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, alpha);
    paint.anti_alias = true;
    paint
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Resample an RGBA image to exactly `width x height`.
fn resize_rgba(image: &RgbaImage, width: u32, height: u32) -> VisionResult<RgbaImage> {
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    let resize_error = |reason: String| {
        VisionError::surface_allocation(f64::from(width), f64::from(height), reason)
    };

    let src = TypedImageRef::<U8x4>::from_buffer(image.width(), image.height(), image.as_raw())
        .map_err(|e| resize_error(e.to_string()))?;
    let mut buffer = vec![0u8; (width as usize) * (height as usize) * 4];
    let mut dst = TypedImage::<U8x4>::from_buffer(width, height, &mut buffer)
        .map_err(|e| resize_error(e.to_string()))?;

    let opts = ResizeOptions::new().use_alpha(true);
    Resizer::new()
        .resize_typed::<U8x4>(&src, &mut dst, &opts)
        .map_err(|e| resize_error(e.to_string()))?;

    RgbaImage::from_raw(width, height, buffer)
        .ok_or_else(|| resize_error("pixel buffer size mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use overlay_geom::overlay::{map_points, map_regions};
    use overlay_geom::palette::Palette;
    use overlay_geom::{Point, Region};

    fn red_square(side: u32) -> RgbaImage {
        RgbaImage::from_pixel(side, side, Rgba([255, 0, 0, 255]))
    }

    fn near(actual: &Rgba<u8>, expected: [u8; 4]) -> bool {
        actual.0.iter().zip(expected).all(|(a, e)| a.abs_diff(e) <= 1)
    }

    #[test]
    fn test_image_is_contain_fit_with_bars() {
        let renderer = OverlayRenderer::new(200, 100).unwrap();
        let image = red_square(50);
        let out = renderer.render(&image, &OverlayScene::new(8.0)).unwrap();
        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(*out.get_pixel(10, 50), Rgba([0, 0, 0, 255]));
        assert!(near(out.get_pixel(100, 50), [255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(190, 50), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_boxes_and_points_are_drawn_in_palette_colours() {
        let renderer = OverlayRenderer::new(100, 100).unwrap();
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let layout = renderer.layout_for(&image);
        let palette = Palette::default();

        let mut scene = OverlayScene::new(10.0);
        scene.boxes = map_regions(&layout, &[Region::new(0.2, 0.2, 0.8, 0.8)], &palette);
        scene.points = map_points(&layout, &[Point::new(0.5, 0.5)], 10.0, &palette);
        let out = renderer.render(&image, &scene).unwrap();

        let c = palette.color(0);
        assert_eq!(*out.get_pixel(20, 50), Rgba([c.r, c.g, c.b, 255]));
        assert_eq!(*out.get_pixel(50, 50), Rgba([c.r, c.g, c.b, 255]));
        assert!(near(out.get_pixel(35, 35), [255, 255, 255, 255]));
    }

    #[test]
    fn test_resize_keeps_solid_colour() {
        let out = resize_rgba(&red_square(64), 16, 16).unwrap();
        assert_eq!(out.dimensions(), (16, 16));
        assert!(out.pixels().all(|p| near(p, [255, 0, 0, 255])));
    }

    #[test]
    fn test_zero_container_rejected() {
        assert!(OverlayRenderer::new(0, 10).is_err());
    }
}
