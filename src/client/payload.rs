//! Image payloads for the vision API.
//!
//! Every endpoint receives the image inline as a `data:<mime>;base64,<...>`
//! URI in its `image_url` field.

use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

use crate::error::{VisionError, VisionResult};

/// A source image encoded as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data_uri: String,
    mime: &'static str,
    byte_len: usize,
}

impl ImagePayload {
    /// Encode raw file bytes. The MIME type is sniffed from the content.
    pub fn from_bytes(bytes: &[u8]) -> VisionResult<Self> {
        Self::encode(bytes, "<memory>")
    }

    pub fn from_path(path: impl AsRef<Path>) -> VisionResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| VisionError::image_load(path, e.to_string()))?;
        Self::encode(&bytes, path)
    }

    fn encode(bytes: &[u8], origin: impl AsRef<Path>) -> VisionResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| VisionError::image_load(origin.as_ref(), e.to_string()))?;
        let mime = mime_type(format).ok_or_else(|| {
            VisionError::image_load(origin.as_ref(), format!("unsupported image format {format:?}"))
        })?;
        let encoded = general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            data_uri: format!("data:{mime};base64,{encoded}"),
            mime,
            byte_len: bytes.len(),
        })
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Size of the original image in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

fn mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_data_uri() {
        let bytes = png_bytes();
        let payload = ImagePayload::from_bytes(&bytes).unwrap();
        assert_eq!(payload.mime(), "image/png");
        assert_eq!(payload.byte_len(), bytes.len());
        let encoded = payload.data_uri().strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(general_purpose::STANDARD.decode(encoded).unwrap(), bytes);
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        let err = ImagePayload::from_bytes(b"definitely not an image").unwrap_err();
        assert_eq!(err.category(), "image_load");
    }

    #[test]
    fn test_missing_file_is_image_load_error() {
        let err = ImagePayload::from_path("/nonexistent/photo.png").unwrap_err();
        assert!(matches!(err, VisionError::ImageLoad { .. }));
    }
}
