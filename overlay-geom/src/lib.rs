// SPDX-License-Identifier: MIT
//! # overlay-geom: Geometry for Vision API Overlays and Cutouts
//!
//! This crate turns the normalized output of a vision-understanding API
//! (bounding boxes, points and segmentation paths, all in `[0, 1]`) into
//! pixel-accurate geometry, either for drawing on top of a "contain"-fitted
//! image or for rasterizing a cutout mask against the source image.
//!
//! ## Key Components
//!
//! - [`layout`]: Contain-fit placement of an image inside a container
//!   (letterboxing / pillarboxing)
//! - [`region`]: Normalized `Region` and `Point` values as returned by the API
//! - [`path`]: Lexer, parser and serializer for the compact path mini-language
//! - [`scale`]: Scale-then-translate transform applied to parsed paths
//! - [`overlay`]: Mapping of normalized results into render-layout pixel space
//! - [`palette`]: Deterministic index-based colour cycle for overlays
//!
//! ## Reference Frames
//!
//! Every normalized value is relative to a known frame: either the whole
//! image or a bounding box. Paths carry no frame information of their own, so
//! every consumer takes an explicit [`overlay::PathFrame`] tag.
//!
//! ## Usage Example
//!
//! ```rust
//! use overlay_geom::layout::compute_render_layout;
//! use overlay_geom::overlay::map_region;
//! use overlay_geom::region::Region;
//!
//! let layout = compute_render_layout(300.0, 400.0, 1.5);
//! assert_eq!(layout.offset_y, 100.0);
//!
//! let rect = map_region(&layout, &Region::new(0.1, 0.2, 0.5, 0.6));
//! assert!((rect.left - 30.0).abs() < 1e-9);
//! assert!((rect.top - 140.0).abs() < 1e-9);
//! ```

pub mod layout;
pub mod overlay;
pub mod palette;
pub mod path;
pub mod region;
pub mod scale;

pub use layout::{compute_render_layout, RenderLayout};
pub use overlay::{PathFrame, PixelPoint, PixelRect};
pub use path::{PathParseError, VectorPath};
pub use region::{Point, Region};
pub use scale::{scale_path, PathTransform};
