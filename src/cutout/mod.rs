//! # Raster Cutout Engine
//!
//! Produces a transparent PNG containing only the source pixels inside a
//! segmentation path.
//!
//! ## Pipeline
//!
//! 1. Decode the source image to get `(W, H)`.
//! 2. Pick a transform for the normalized path from the [`CutoutMode`]:
//!
//! | Mode | Path transform | Surface | Source drawn at |
//! |------|----------------|---------|-----------------|
//! | `Whole` | scale `(W, H)` | `W x H` | `(0, 0)` |
//! | `BoundingBoxFullSize` | scale `(boxW, boxH)`, offset `(boxX, boxY)` | `W x H` | `(0, 0)` |
//! | `BoundingBoxCropped` | scale `(boxW, boxH)` | `ceil(boxW) x ceil(boxH)` | `(-boxX, -boxY)` |
//!
//! 3. Scale the path, allocate a transparent surface and a clip mask filled
//!    from the path (non-zero rule unless [`CutoutOptions`] says otherwise).
//! 4. Draw the source through the mask, encode as PNG and write it to the
//!    [`CutoutCache`].
//!
//! Each call is independent. The async and batch helpers run calls on the
//! blocking thread pool; nothing is retried.

pub mod cache;

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use futures_util::future::join_all;
use image::{ImageReader, RgbaImage};
use overlay_geom::layout::RenderLayout;
use overlay_geom::overlay::{map_region, PixelRect};
use overlay_geom::{PathTransform, Region, VectorPath};
use serde::Serialize;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};
use tracing::{debug, info, warn};

pub use cache::{CacheSlot, CutoutCache};

use crate::error::{VisionError, VisionResult};
use crate::raster::{self, MaskFillRule};

/// How the normalized path relates to the source image, and what is output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoutMode {
    /// Path normalized to the whole image; output is full size.
    Whole,
    /// Path normalized to the box; output is full size.
    BoundingBoxFullSize(Region),
    /// Path normalized to the box; output is cropped to the box.
    BoundingBoxCropped(Region),
}

impl CutoutMode {
    pub fn label(&self) -> &'static str {
        match self {
            CutoutMode::Whole => "whole",
            CutoutMode::BoundingBoxFullSize(_) => "bbox-full",
            CutoutMode::BoundingBoxCropped(_) => "bbox-cropped",
        }
    }
}

/// Mode selector without a region, for the command line and sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CutoutModeKind {
    #[value(name = "whole")]
    Whole,
    #[value(name = "bbox-full")]
    BboxFull,
    #[default]
    #[value(name = "bbox-cropped")]
    BboxCropped,
}

impl CutoutModeKind {
    pub fn with_region(self, region: Region) -> CutoutMode {
        match self {
            CutoutModeKind::Whole => CutoutMode::Whole,
            CutoutModeKind::BboxFull => CutoutMode::BoundingBoxFullSize(region),
            CutoutModeKind::BboxCropped => CutoutMode::BoundingBoxCropped(region),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoutOptions {
    pub fill_rule: MaskFillRule,
    pub anti_alias: bool,
}

impl Default for CutoutOptions {
    fn default() -> Self {
        Self {
            fill_rule: MaskFillRule::NonZero,
            anti_alias: true,
        }
    }
}

/// A written cutout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoutArtifact {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub mode: &'static str,
    pub created_at_ms: i64,
}

/// One entry of a batch.
#[derive(Debug, Clone)]
pub struct CutoutRequest {
    pub source: PathBuf,
    pub path: String,
    pub mode: CutoutMode,
}

struct CutoutPlan {
    transform: PathTransform,
    width: u32,
    height: u32,
    /// Where the source's origin lands on the surface.
    source_x: f64,
    source_y: f64,
}

fn plan_cutout(width: u32, height: u32, mode: &CutoutMode) -> VisionResult<CutoutPlan> {
    let (w, h) = (f64::from(width), f64::from(height));
    let plan = match mode {
        CutoutMode::Whole => CutoutPlan {
            transform: PathTransform::scale(w, h),
            width,
            height,
            source_x: 0.0,
            source_y: 0.0,
        },
        CutoutMode::BoundingBoxFullSize(region) => {
            let rect = pixel_box(w, h, region)?;
            CutoutPlan {
                transform: PathTransform::new(rect.width, rect.height, rect.left, rect.top),
                width,
                height,
                source_x: 0.0,
                source_y: 0.0,
            }
        }
        CutoutMode::BoundingBoxCropped(region) => {
            let rect = pixel_box(w, h, region)?;
            CutoutPlan {
                transform: PathTransform::scale(rect.width, rect.height),
                width: surface_extent(rect.width, rect.height, rect.width)?,
                height: surface_extent(rect.width, rect.height, rect.height)?,
                source_x: -rect.left,
                source_y: -rect.top,
            }
        }
    };
    Ok(plan)
}

/// Pixel rect of a normalized box on a `w x h` image.
fn pixel_box(w: f64, h: f64, region: &Region) -> VisionResult<PixelRect> {
    let rect = map_region(&RenderLayout::identity(w, h), region);
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !(usable(rect.width) && usable(rect.height) && rect.left.is_finite() && rect.top.is_finite())
    {
        return Err(VisionError::surface_allocation(
            rect.width,
            rect.height,
            "bounding box must have a positive width and height",
        ));
    }
    Ok(rect)
}

fn surface_extent(width: f64, height: f64, extent: f64) -> VisionResult<u32> {
    let pixels = extent.ceil();
    if pixels > f64::from(u32::MAX) {
        return Err(VisionError::surface_allocation(width, height, "surface is too large"));
    }
    Ok(pixels as u32)
}

/// Cut `path` out of `source` in memory.
///
/// The output is `W x H` for the full-size modes and `ceil(boxW) x ceil(boxH)`
/// for [`CutoutMode::BoundingBoxCropped`]. Pixels outside the path are fully
/// transparent.
pub fn render_cutout(
    source: &RgbaImage,
    path: &VectorPath,
    mode: &CutoutMode,
    options: &CutoutOptions,
) -> VisionResult<RgbaImage> {
    let plan = plan_cutout(source.width(), source.height(), mode)?;
    let scaled = path.transformed(&plan.transform);

    let mut surface = Pixmap::new(plan.width, plan.height).ok_or_else(|| {
        VisionError::surface_allocation(
            f64::from(plan.width),
            f64::from(plan.height),
            "cannot allocate output surface",
        )
    })?;
    surface.fill(Color::TRANSPARENT);

    let mask = raster::build_mask(plan.width, plan.height, &scaled, options.fill_rule, options.anti_alias)?;
    let src = raster::pixmap_from_rgba(source)?;
    surface.draw_pixmap(
        0,
        0,
        src.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate(plan.source_x as f32, plan.source_y as f32),
        Some(&mask),
    );

    raster::rgba_from_pixmap(&surface)
}

/// Decode an image file to RGBA.
pub fn load_rgba(path: &Path) -> VisionResult<RgbaImage> {
    let reader = ImageReader::open(path)
        .map_err(|e| VisionError::image_load(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| VisionError::image_load(path, e.to_string()))?;
    let image = reader
        .decode()
        .map_err(|e| VisionError::image_load(path, e.to_string()))?;
    Ok(image.into_rgba8())
}

/// File-based cutout producer writing into a [`CutoutCache`].
#[derive(Debug, Clone)]
pub struct CutoutEngine {
    cache: CutoutCache,
    options: CutoutOptions,
}

impl CutoutEngine {
    pub fn new(cache: CutoutCache) -> Self {
        Self {
            cache,
            options: CutoutOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CutoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &CutoutCache {
        &self.cache
    }

    pub fn options(&self) -> &CutoutOptions {
        &self.options
    }

    /// Decode `source`, cut out the normalized `path` and persist the result.
    ///
    /// # Errors
    ///
    /// - `ImageLoad` when the source cannot be read or decoded
    /// - `PathParse` when `path` is empty or malformed
    /// - `SurfaceAllocation` for a box without area
    /// - `Io` when no cache file can be created
    /// - `ImageEncode` when the PNG cannot be written (no file is left behind)
    pub fn create_cutout(
        &self,
        source: &Path,
        path: &str,
        mode: &CutoutMode,
    ) -> VisionResult<CutoutArtifact> {
        let started = Instant::now();
        let image = load_rgba(source)?;
        let parsed = VectorPath::parse(path)?;
        let output = render_cutout(&image, &parsed, mode, &self.options)?;

        let slot = self.cache.store_png(&output)?;

        info!(
            source = %source.display(),
            output = %slot.path.display(),
            mode = mode.label(),
            width = output.width(),
            height = output.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "cutout created"
        );

        Ok(CutoutArtifact {
            path: slot.path,
            width: output.width(),
            height: output.height(),
            mode: mode.label(),
            created_at_ms: slot.created_at_ms,
        })
    }

    /// [`create_cutout`](Self::create_cutout) on the blocking thread pool.
    pub async fn create_cutout_async(
        &self,
        source: PathBuf,
        path: String,
        mode: CutoutMode,
    ) -> VisionResult<CutoutArtifact> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.create_cutout(&source, &path, &mode))
            .await
            .map_err(|e| VisionError::io("cutout worker", std::io::Error::other(e)))?
    }

    /// Run independent cutouts concurrently. Results keep request order.
    pub async fn create_cutouts(
        &self,
        requests: Vec<CutoutRequest>,
    ) -> Vec<VisionResult<CutoutArtifact>> {
        debug!(count = requests.len(), "starting cutout batch");
        let results = join_all(
            requests
                .into_iter()
                .map(|r| self.create_cutout_async(r.source, r.path, r.mode)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "some cutouts failed");
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn full_box() -> VectorPath {
        VectorPath::parse("M0 0 L1 0 L1 1 L0 1 Z").unwrap()
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 128, 255]))
    }

    #[test]
    fn test_whole_mode_keeps_source_size() {
        let src = gradient(40, 30);
        let out = render_cutout(&src, &full_box(), &CutoutMode::Whole, &CutoutOptions::default())
            .unwrap();
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(out.get_pixel(20, 15), src.get_pixel(20, 15));
    }

    #[test]
    fn test_full_size_bbox_masks_outside() {
        let src = gradient(100, 100);
        let mode = CutoutMode::BoundingBoxFullSize(Region::new(0.25, 0.25, 0.75, 0.75));
        let out = render_cutout(&src, &full_box(), &mode, &CutoutOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(5, 5)[3], 0);
        assert_eq!(out.get_pixel(50, 50), src.get_pixel(50, 50));
        assert_eq!(out.get_pixel(95, 50)[3], 0);
    }

    #[test]
    fn test_cropped_mode_aligns_box_with_origin() {
        let src = gradient(100, 80);
        let mode = CutoutMode::BoundingBoxCropped(Region::new(0.5, 0.25, 1.0, 0.75));
        let out = render_cutout(&src, &full_box(), &mode, &CutoutOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (50, 40));
        assert_eq!(out.get_pixel(10, 10), src.get_pixel(60, 30));
    }

    #[test]
    fn test_cropped_dimensions_round_up() {
        let src = gradient(10, 10);
        let mode = CutoutMode::BoundingBoxCropped(Region::new(0.0, 0.0, 0.33, 0.51));
        let out = render_cutout(&src, &full_box(), &mode, &CutoutOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (4, 6));
    }

    #[test]
    fn test_empty_box_is_surface_allocation_error() {
        let src = gradient(10, 10);
        for region in [
            Region::new(0.5, 0.5, 0.5, 0.9),
            Region::new(0.8, 0.1, 0.2, 0.9),
            Region::new(0.1, f64::NAN, 0.2, 0.9),
        ] {
            let err = render_cutout(
                &src,
                &full_box(),
                &CutoutMode::BoundingBoxCropped(region),
                &CutoutOptions::default(),
            )
            .unwrap_err();
            assert_eq!(err.category(), "surface_allocation");
        }
    }

    #[test]
    fn test_mode_kind_pairs_with_region() {
        let r = Region::new(0.1, 0.1, 0.2, 0.2);
        assert_eq!(CutoutModeKind::Whole.with_region(r), CutoutMode::Whole);
        assert_eq!(CutoutModeKind::BboxFull.with_region(r), CutoutMode::BoundingBoxFullSize(r));
        assert_eq!(CutoutModeKind::BboxCropped.with_region(r).label(), "bbox-cropped");
    }
}
