//! # Vision Overlay Library
//!
//! Turns the normalized answers of a vision-understanding API into pixels:
//! boxes, points and outlines drawn over a contain-fitted image, and
//! transparent cutouts of segmented objects.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `client`: Async client for the `/caption`, `/query`, `/detect`, `/point`
//!   and `/segment` endpoints
//! - `cutout`: Raster cutout engine and its on-disk cache
//! - `raster`: Path to `tiny-skia` conversion shared by cutouts and rendering
//! - `render`: Headless overlay renderer
//! - `session`: End-to-end orchestration over an explicit context
//! - `config`: Configuration loading and validation
//! - `error`: Error taxonomy and classification
//! - `i18n`: User-facing message catalogue
//!
//! Pure geometry (layout, regions, the path language and its scaler, overlay
//! mapping) lives in the `overlay-geom` crate and is re-exported as [`geom`].
//!
//! ## Example
//!
//! ```rust
//! use vision_overlay::cutout::{render_cutout, CutoutMode, CutoutOptions};
//! use vision_overlay::geom::{Region, VectorPath};
//!
//! let source = image::RgbaImage::from_pixel(400, 400, image::Rgba([9, 9, 9, 255]));
//! let path = VectorPath::parse("M0 0 L1 0 L1 1 L0 1 Z").unwrap();
//! let mode = CutoutMode::BoundingBoxCropped(Region::new(0.0, 0.0, 0.5, 0.5));
//!
//! let cutout = render_cutout(&source, &path, &mode, &CutoutOptions::default()).unwrap();
//! assert_eq!(cutout.dimensions(), (200, 200));
//! ```

pub mod client;
pub mod config;
pub mod cutout;
pub mod error;
pub mod i18n;
pub mod raster;
pub mod render;
pub mod session;

pub use overlay_geom as geom;

pub use client::{ImagePayload, VisionApi, VisionClient};
pub use config::{AppConfig, AppContext};
pub use cutout::{CutoutArtifact, CutoutCache, CutoutEngine, CutoutMode, CutoutOptions};
pub use error::{
    ApiErrorKind, ErrorContext, ErrorSeverity, HasRecoverySuggestion, HasSeverity, Retryable,
    VisionError, VisionResult,
};
pub use i18n::{Language, MessageKey};
pub use render::{OverlayRenderer, OverlayScene};
pub use session::{VisionSession, VisionSessionBuilder};
