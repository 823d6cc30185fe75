//! Vision API HTTP client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::client::payload::ImagePayload;
use crate::client::types::{
    CaptionLength, CaptionRequest, CaptionResponse, DetectResponse, ObjectRequest, PointResponse,
    QueryRequest, QueryResponse, SegmentResponse,
};
use crate::config::config::{DEFAULT_API_KEY_HEADER, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::{VisionError, VisionResult};

/// Configuration for the vision client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL; endpoint names are appended after a `/`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_header: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// The five vision endpoints.
///
/// Implementations surface every non-2xx status and transport failure as a
/// [`VisionError`] and never retry.
#[async_trait]
pub trait VisionApi: Send + Sync {
    async fn caption(&self, image: &ImagePayload, length: CaptionLength) -> VisionResult<CaptionResponse>;

    async fn query(&self, image: &ImagePayload, question: &str) -> VisionResult<QueryResponse>;

    async fn detect(&self, image: &ImagePayload, object: &str) -> VisionResult<DetectResponse>;

    async fn point(&self, image: &ImagePayload, object: &str) -> VisionResult<PointResponse>;

    async fn segment(&self, image: &ImagePayload, object: &str) -> VisionResult<SegmentResponse>;
}

/// Client for the vision service.
pub struct VisionClient {
    http: Client,
    config: ClientConfig,
}

impl VisionClient {
    pub fn new(config: ClientConfig) -> VisionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisionError::network("building HTTP client", e))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    async fn post<B, R>(&self, endpoint: &'static str, body: &B) -> VisionResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Send,
    {
        let url = self.endpoint_url(endpoint);
        debug!(endpoint, %url, "sending vision request");

        let mut request = self.http.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.header(self.config.api_key_header.as_str(), key.as_str());
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| VisionError::network(format!("POST /{endpoint}"), e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "vision request rejected");
            return Err(VisionError::upstream(endpoint, status.as_u16(), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VisionError::network(format!("reading /{endpoint} response"), e))?;
        debug!(
            endpoint,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "vision request completed"
        );

        serde_json::from_slice(&bytes)
            .map_err(|e| VisionError::invalid_response(endpoint, e.to_string()))
    }
}

#[async_trait]
impl VisionApi for VisionClient {
    async fn caption(&self, image: &ImagePayload, length: CaptionLength) -> VisionResult<CaptionResponse> {
        let body = CaptionRequest {
            image_url: image.data_uri(),
            length,
        };
        self.post("caption", &body).await
    }

    async fn query(&self, image: &ImagePayload, question: &str) -> VisionResult<QueryResponse> {
        let body = QueryRequest {
            image_url: image.data_uri(),
            question,
        };
        self.post("query", &body).await
    }

    async fn detect(&self, image: &ImagePayload, object: &str) -> VisionResult<DetectResponse> {
        let body = ObjectRequest {
            image_url: image.data_uri(),
            object,
        };
        self.post("detect", &body).await
    }

    async fn point(&self, image: &ImagePayload, object: &str) -> VisionResult<PointResponse> {
        let body = ObjectRequest {
            image_url: image.data_uri(),
            object,
        };
        self.post("point", &body).await
    }

    async fn segment(&self, image: &ImagePayload, object: &str) -> VisionResult<SegmentResponse> {
        let body = ObjectRequest {
            image_url: image.data_uri(),
            object,
        };
        self.post("segment", &body).await
    }
}
