// SPDX-License-Identifier: MIT
//! # Contain-Fit Layout
//!
//! Computes where an image is actually drawn when it is scaled uniformly to fit
//! entirely inside a container. The unused space becomes bars on one axis:
//! left/right (pillarbox) when the container is relatively wider than the
//! image, top/bottom (letterbox) otherwise.
//!
//! All values are in container pixel space. A layout is computed fresh for
//! every (aspect ratio, container size) pair and is never persisted.

use serde::Serialize;

/// Rectangle inside the container where a contain-fitted image is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RenderLayout {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderLayout {
    /// Layout that maps normalized coordinates straight onto a `width x height`
    /// pixel grid, with no bars.
    pub fn identity(width: f64, height: f64) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            width,
            height,
        }
    }

    /// True when the layout has no drawable area.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Whether bars were added above/below the image.
    pub fn is_letterboxed(&self) -> bool {
        self.offset_y > 0.0
    }

    /// Whether bars were added left/right of the image.
    pub fn is_pillarboxed(&self) -> bool {
        self.offset_x > 0.0
    }
}

/// Aspect ratio (`width / height`) of an image with the given pixel size.
///
/// Returns `0.0` for a zero height so the result feeds straight into
/// [`compute_render_layout`], which treats it as degenerate.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height == 0 {
        return 0.0;
    }
    f64::from(width) / f64::from(height)
}

/// Compute the contain-fit render rectangle for an image inside a container.
///
/// If the container is relatively wider than the image, the image is
/// height-constrained and centred horizontally. Otherwise it is
/// width-constrained and centred vertically.
///
/// Degenerate input (a non-positive or non-finite container dimension or
/// aspect ratio) yields an empty layout at the origin instead of dividing by
/// zero.
///
/// # Example
/// ```rust
/// use overlay_geom::layout::compute_render_layout;
///
/// // 300x400 portrait container, landscape 3:2 image
/// let layout = compute_render_layout(300.0, 400.0, 1.5);
/// assert_eq!((layout.width, layout.height), (300.0, 200.0));
/// assert_eq!((layout.offset_x, layout.offset_y), (0.0, 100.0));
/// ```
pub fn compute_render_layout(
    container_width: f64,
    container_height: f64,
    image_aspect_ratio: f64,
) -> RenderLayout {
    if !is_positive(container_width) || !is_positive(container_height) || !is_positive(image_aspect_ratio) {
        return RenderLayout::default();
    }

    let container_aspect = container_width / container_height;
    if container_aspect > image_aspect_ratio {
        let height = container_height;
        let width = container_height * image_aspect_ratio;
        RenderLayout {
            offset_x: (container_width - width) / 2.0,
            offset_y: 0.0,
            width,
            height,
        }
    } else {
        let width = container_width;
        let height = container_width / image_aspect_ratio;
        RenderLayout {
            offset_x: 0.0,
            offset_y: (container_height - height) / 2.0,
            width,
            height,
        }
    }
}

#[inline]
fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
