//! Common test utilities shared by the integration tests
//!
//! Fixture images written to temporary directories, and a scripted
//! [`VisionApi`] for exercising sessions without a server.

#![allow(dead_code)]

pub mod fixtures {
    use std::path::{Path, PathBuf};

    use image::{ImageFormat, Rgba, RgbaImage};

    /// Write a solid-colour PNG and return its path.
    pub fn solid_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, Rgba(color))
            .save_with_format(&path, ImageFormat::Png)
            .expect("write fixture png");
        path
    }

    /// Encoded bytes of a tiny opaque PNG.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode fixture png");
        out.into_inner()
    }
}

pub mod fake_api {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vision_overlay::client::{
        CaptionLength, CaptionResponse, DetectResponse, ImagePayload, PointResponse,
        QueryResponse, SegmentResponse, VisionApi,
    };
    use vision_overlay::error::{VisionError, VisionResult};
    use vision_overlay::geom::{Point, Region};

    /// Scripted answers for each endpoint. Endpoints left unset answer 500.
    #[derive(Default)]
    pub struct FakeVisionApi {
        pub objects: Option<Vec<Region>>,
        pub points: Option<Vec<Point>>,
        pub segment: Option<(String, Region)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeVisionApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_objects(mut self, objects: Vec<Region>) -> Self {
            self.objects = Some(objects);
            self
        }

        pub fn with_points(mut self, points: Vec<Point>) -> Self {
            self.points = Some(points);
            self
        }

        pub fn with_segment(mut self, path: &str, bbox: Region) -> Self {
            self.segment = Some((path.to_string(), bbox));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn unscripted(endpoint: &str) -> VisionError {
            VisionError::upstream(endpoint, 500, "not scripted")
        }
    }

    #[async_trait]
    impl VisionApi for FakeVisionApi {
        async fn caption(&self, image: &ImagePayload, length: CaptionLength) -> VisionResult<CaptionResponse> {
            self.record(format!("caption {length:?} {}", image.mime()));
            Ok(CaptionResponse {
                caption: "a test image".to_string(),
            })
        }

        async fn query(&self, _image: &ImagePayload, question: &str) -> VisionResult<QueryResponse> {
            self.record(format!("query {question}"));
            Ok(QueryResponse {
                answer: "yes".to_string(),
            })
        }

        async fn detect(&self, _image: &ImagePayload, object: &str) -> VisionResult<DetectResponse> {
            self.record(format!("detect {object}"));
            let objects = self.objects.clone().ok_or_else(|| Self::unscripted("detect"))?;
            Ok(DetectResponse { objects })
        }

        async fn point(&self, _image: &ImagePayload, object: &str) -> VisionResult<PointResponse> {
            self.record(format!("point {object}"));
            let points = self.points.clone().ok_or_else(|| Self::unscripted("point"))?;
            Ok(PointResponse { points })
        }

        async fn segment(&self, _image: &ImagePayload, object: &str) -> VisionResult<SegmentResponse> {
            self.record(format!("segment {object}"));
            let (path, bbox) = self.segment.clone().ok_or_else(|| Self::unscripted("segment"))?;
            Ok(SegmentResponse { path, bbox })
        }
    }
}
