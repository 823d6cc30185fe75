// SPDX-License-Identifier: MIT
//! # Normalized-Coordinate Overlay Mapping
//!
//! Maps API results from normalized space into the pixel space of a
//! [`RenderLayout`]. Results keep their response order, and that order decides
//! each overlay's index and palette colour.
//!
//! Inverted regions (`x_min > x_max`) are mapped as-is and produce a negative
//! width or height; clamping is left to the caller.

use serde::Serialize;

use crate::layout::RenderLayout;
use crate::palette::{Color, Palette};
use crate::path::VectorPath;
use crate::region::{Point, Region};
use crate::scale::PathTransform;

/// Axis-aligned rectangle in container pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Point in container pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Reference frame of a normalized path.
///
/// The segmentation response does not say which frame its path uses, so every
/// consumer states it explicitly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathFrame {
    /// Coordinates are fractions of the whole image.
    WholeImage,
    /// Coordinates are fractions of this bounding box.
    BoundingBoxRelative(Region),
}

/// CLI-facing frame selector; pair with a region via [`FrameKind::with_region`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FrameKind {
    /// Path normalized against the whole image
    #[value(name = "whole")]
    Whole,
    /// Path normalized against the returned bounding box
    #[value(name = "bbox")]
    Bbox,
}

impl FrameKind {
    pub fn with_region(self, region: Region) -> PathFrame {
        match self {
            FrameKind::Whole => PathFrame::WholeImage,
            FrameKind::Bbox => PathFrame::BoundingBoxRelative(region),
        }
    }
}

/// Map a normalized region onto the layout.
pub fn map_region(layout: &RenderLayout, region: &Region) -> PixelRect {
    PixelRect {
        left: layout.offset_x + region.x_min * layout.width,
        top: layout.offset_y + region.y_min * layout.height,
        width: (region.x_max - region.x_min) * layout.width,
        height: (region.y_max - region.y_min) * layout.height,
    }
}

/// Map a normalized point onto the layout.
pub fn map_point(layout: &RenderLayout, point: &Point) -> PixelPoint {
    PixelPoint {
        x: layout.offset_x + point.x * layout.width,
        y: layout.offset_y + point.y * layout.height,
    }
}

/// Top-left corner for a square marker of `marker_size` centred on `center`.
pub fn marker_origin(center: PixelPoint, marker_size: f64) -> PixelPoint {
    PixelPoint {
        x: center.x - marker_size / 2.0,
        y: center.y - marker_size / 2.0,
    }
}

/// Transform taking a path in `frame` into layout pixels.
///
/// For a box-relative path the box is first mapped through the layout, then
/// the path is scaled by the box's pixel size and offset by its pixel origin.
pub fn path_transform(layout: &RenderLayout, frame: &PathFrame) -> PathTransform {
    match frame {
        PathFrame::WholeImage => {
            PathTransform::new(layout.width, layout.height, layout.offset_x, layout.offset_y)
        }
        PathFrame::BoundingBoxRelative(region) => {
            let rect = map_region(layout, region);
            PathTransform::new(rect.width, rect.height, rect.left, rect.top)
        }
    }
}

/// Map a normalized path into layout pixels.
pub fn map_path(layout: &RenderLayout, path: &VectorPath, frame: &PathFrame) -> VectorPath {
    path.transformed(&path_transform(layout, frame))
}

/// A detection box ready to draw.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxOverlay {
    pub index: usize,
    pub color: Color,
    pub rect: PixelRect,
}

/// A point marker ready to draw.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointOverlay {
    pub index: usize,
    pub color: Color,
    pub center: PixelPoint,
    /// Top-left corner of the marker.
    pub origin: PixelPoint,
}

/// A segmentation outline ready to draw.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathOverlay {
    pub color: Color,
    pub path: VectorPath,
    /// Pixel box of the segmentation bbox, when one came with the path.
    pub bounds: Option<PixelRect>,
}

/// Map detection regions in response order. An empty slice yields no overlays.
pub fn map_regions(layout: &RenderLayout, regions: &[Region], palette: &Palette) -> Vec<BoxOverlay> {
    regions
        .iter()
        .enumerate()
        .map(|(index, region)| BoxOverlay {
            index,
            color: palette.color(index),
            rect: map_region(layout, region),
        })
        .collect()
}

/// Map points in response order, with markers of `marker_size` pixels.
pub fn map_points(
    layout: &RenderLayout,
    points: &[Point],
    marker_size: f64,
    palette: &Palette,
) -> Vec<PointOverlay> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let center = map_point(layout, point);
            PointOverlay {
                index,
                color: palette.color(index),
                center,
                origin: marker_origin(center, marker_size),
            }
        })
        .collect()
}

/// Map a segmentation result (path plus its bbox) using an explicit frame.
pub fn map_segmentation(
    layout: &RenderLayout,
    path: &VectorPath,
    bbox: Option<&Region>,
    frame: &PathFrame,
    palette: &Palette,
) -> PathOverlay {
    PathOverlay {
        color: palette.color(0),
        path: map_path(layout, path, frame),
        bounds: bbox.map(|region| map_region(layout, region)),
    }
}
