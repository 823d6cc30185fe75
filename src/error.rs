//! # Error Handling
//!
//! A single [`VisionError`] enum covers every failure the library can surface:
//! image loading, path parsing, raster surface allocation, image encoding,
//! upstream API status codes, transport failures, malformed responses, file
//! system errors and configuration problems.
//!
//! Every variant carries an [`ErrorContext`] with a timestamp, the operation
//! in progress, free-form context, a recovery suggestion and a severity.
//!
//! ## Classification
//!
//! - [`Retryable`]: whether re-issuing the same request later could succeed.
//!   Nothing in this crate retries on its own; the caller decides.
//! - [`HasSeverity`] and [`HasRecoverySuggestion`] expose the context.
//! - [`classify`] groups errors into transient, fatal and user-facing.
//!
//! ## Usage
//!
//! ```rust
//! use vision_overlay::error::{ApiErrorKind, Retryable, VisionError};
//!
//! let error = VisionError::upstream("detect", 429, "slow down")
//!     .with_context("detecting 'cat' in photo.png");
//!
//! assert_eq!(error.api_kind(), Some(ApiErrorKind::RateLimited));
//! assert!(error.is_retryable());
//! ```

use std::{fmt, path::Path, time::SystemTime};

use overlay_geom::PathParseError;
use thiserror::Error;

use crate::i18n::MessageKey;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that fail the current request only
    Error,
    /// Errors that will keep failing until the user changes something
    Critical,
    /// Errors that cannot be recovered from
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Sub-kind of a non-2xx answer from the vision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// HTTP 401, the API key was rejected
    Unauthorized,
    /// HTTP 429
    RateLimited,
    /// Any other non-success status
    Generic,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::Generic => "request failed",
        })
    }
}

/// Base error type for the vision overlay library
#[derive(Debug, Error)]
pub enum VisionError {
    /// Source image unreadable or undecodable
    #[error("Failed to load image '{path}': {reason}")]
    ImageLoad {
        path: String,
        reason: String,
        context: ErrorContext,
    },
    /// Malformed normalized path string
    #[error("Invalid vector path: {source}")]
    PathParse {
        #[source]
        source: PathParseError,
        context: ErrorContext,
    },
    /// Target raster dimensions are unusable
    #[error("Cannot allocate a {width}x{height} surface: {reason}")]
    SurfaceAllocation {
        width: f64,
        height: f64,
        reason: String,
        context: ErrorContext,
    },
    /// Writing the output raster failed
    #[error("Failed to encode image '{path}': {reason}")]
    ImageEncode {
        path: String,
        reason: String,
        context: ErrorContext,
    },
    /// Non-2xx status from the vision service
    #[error("Vision API /{endpoint} {kind} (HTTP {status}): {body}")]
    UpstreamApi {
        endpoint: String,
        kind: ApiErrorKind,
        status: u16,
        body: String,
        context: ErrorContext,
    },
    /// Transport failure reaching the vision service
    #[error("Network error during {operation}: {source}")]
    Network {
        operation: String,
        #[source]
        source: reqwest::Error,
        context: ErrorContext,
    },
    /// 2xx response whose body does not match the endpoint's shape
    #[error("Invalid response from /{endpoint}: {reason}")]
    InvalidResponse {
        endpoint: String,
        reason: String,
        context: ErrorContext,
    },
    /// File system errors
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        path: Option<String>,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },
    /// Configuration validation errors
    #[error("Configuration error in '{field}': {reason} (value: {value})")]
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
}

impl VisionError {
    pub fn image_load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::ImageLoad {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
            context: ErrorContext::new()
                .with_recovery_suggestion("Check that the file exists and is a PNG, JPEG, GIF, WebP or BMP image"),
        }
    }

    pub fn path_parse(source: PathParseError) -> Self {
        Self::PathParse {
            source,
            context: ErrorContext::new(),
        }
    }

    pub fn surface_allocation(width: f64, height: f64, reason: impl Into<String>) -> Self {
        Self::SurfaceAllocation {
            width,
            height,
            reason: reason.into(),
            context: ErrorContext::new()
                .with_recovery_suggestion("Use a bounding box with positive width and height"),
        }
    }

    pub fn image_encode(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::ImageEncode {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Build an upstream error, deriving the sub-kind from the status code.
    pub fn upstream(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let kind = ApiErrorKind::from_status(status);
        let context = match kind {
            ApiErrorKind::Unauthorized => ErrorContext::new()
                .with_severity(ErrorSeverity::Critical)
                .with_recovery_suggestion("Check the configured API key"),
            ApiErrorKind::RateLimited => ErrorContext::new()
                .with_severity(ErrorSeverity::Warning)
                .with_recovery_suggestion("Wait a moment before sending another request"),
            ApiErrorKind::Generic => ErrorContext::new(),
        };
        Self::UpstreamApi {
            endpoint: endpoint.into(),
            kind,
            status,
            body: body.into(),
            context,
        }
    }

    pub fn network(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            source,
            context: ErrorContext::new()
                .with_recovery_suggestion("Check the API URL and your network connection"),
        }
    }

    pub fn invalid_response(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Attach the file an I/O error refers to. No effect on other variants.
    pub fn with_path(mut self, target: impl AsRef<Path>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(target.as_ref().display().to_string());
        }
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ImageLoad { context, .. } => context,
            Self::PathParse { context, .. } => context,
            Self::SurfaceAllocation { context, .. } => context,
            Self::ImageEncode { context, .. } => context,
            Self::UpstreamApi { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::InvalidResponse { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Config { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ImageLoad { context, .. } => context,
            Self::PathParse { context, .. } => context,
            Self::SurfaceAllocation { context, .. } => context,
            Self::ImageEncode { context, .. } => context,
            Self::UpstreamApi { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::InvalidResponse { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Config { context, .. } => context,
        }
    }

    /// Stable category name, used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ImageLoad { .. } => "image_load",
            Self::PathParse { .. } => "path_parse",
            Self::SurfaceAllocation { .. } => "surface_allocation",
            Self::ImageEncode { .. } => "image_encode",
            Self::UpstreamApi { .. } => "upstream_api",
            Self::Network { .. } => "network",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
        }
    }

    /// Upstream sub-kind, when this is an API status error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::UpstreamApi { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// User-facing message for this error.
    pub fn message_key(&self) -> MessageKey {
        match self {
            Self::ImageLoad { .. } => MessageKey::ImageLoadFailed,
            Self::PathParse { .. } => MessageKey::InvalidPath,
            Self::SurfaceAllocation { .. } => MessageKey::InvalidBoundingBox,
            Self::ImageEncode { .. } => MessageKey::ImageSaveFailed,
            Self::UpstreamApi { kind, .. } => match kind {
                ApiErrorKind::Unauthorized => MessageKey::InvalidApiKey,
                ApiErrorKind::RateLimited => MessageKey::RateLimited,
                ApiErrorKind::Generic => MessageKey::RequestFailed,
            },
            Self::Network { .. } => MessageKey::NetworkUnavailable,
            Self::InvalidResponse { .. } => MessageKey::UnexpectedResponse,
            Self::Io { .. } => MessageKey::FileSystemError,
            Self::Config { .. } => MessageKey::InvalidConfiguration,
        }
    }
}

pub type VisionResult<T> = Result<T, VisionError>;

/// Whether the same request, sent again later, may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Suggested wait before the caller tries again.
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for VisionError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Io { .. } => true,
            Self::UpstreamApi { kind, status, .. } => {
                *kind == ApiErrorKind::RateLimited || *status >= 500
            }
            _ => false,
        }
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::UpstreamApi {
                kind: ApiErrorKind::RateLimited,
                ..
            } => Some(5000),
            Self::UpstreamApi { status, .. } if *status >= 500 => Some(2000),
            Self::Network { .. } => Some(2000),
            Self::Io { .. } => Some(100),
            _ => None,
        }
    }
}

pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for VisionError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

pub trait HasRecoverySuggestion {
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for VisionError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification helpers
pub mod classify {
    use super::*;

    /// Failures that may clear up without any change of input.
    pub fn is_transient(error: &VisionError) -> bool {
        matches!(
            error,
            VisionError::Network { .. }
                | VisionError::UpstreamApi {
                    kind: ApiErrorKind::RateLimited,
                    ..
                }
        )
    }

    pub fn is_fatal(error: &VisionError) -> bool {
        matches!(error, VisionError::Config { .. }) || error.severity() == ErrorSeverity::Fatal
    }

    pub fn requires_user_intervention(error: &VisionError) -> bool {
        error.severity() >= ErrorSeverity::Critical
    }
}

impl From<PathParseError> for VisionError {
    fn from(error: PathParseError) -> Self {
        Self::path_parse(error)
    }
}

impl From<std::io::Error> for VisionError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}
