// SPDX-License-Identifier: MIT
//! Normalized detection values as returned by the vision API.

use serde::{Deserialize, Serialize};

/// A normalized bounding box (0.0 to 1.0) relative to the full image.
///
/// Expected to satisfy `x_min <= x_max` and `y_min <= y_max`. Inverted bounds
/// are not rejected; they propagate as negative pixel extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Region {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// The region covering the whole image.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Check that bounds are ordered and inside `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.x_min)
            && in_unit(self.y_min)
            && in_unit(self.x_max)
            && in_unit(self.y_max)
            && self.x_min <= self.x_max
            && self.y_min <= self.y_max
    }
}

/// A normalized point relative to the full image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
