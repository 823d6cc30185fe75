//! # Vision API Client
//!
//! Async client for the five POST endpoints of the vision service
//! (`/caption`, `/query`, `/detect`, `/point`, `/segment`). Each request
//! carries the source image as a base64 data URI.
//!
//! Status codes are mapped to typed errors: 401 becomes
//! [`ApiErrorKind::Unauthorized`](crate::error::ApiErrorKind::Unauthorized),
//! 429 becomes `RateLimited` and any other non-2xx becomes `Generic`. The
//! client never retries.

pub mod client;
pub mod payload;
pub mod types;

pub use client::{ClientConfig, VisionApi, VisionClient};
pub use payload::ImagePayload;
pub use types::{
    CaptionLength, CaptionResponse, DetectResponse, PointResponse, QueryResponse, SegmentResponse,
};
