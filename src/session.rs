//! # Vision Session
//!
//! Couples a [`VisionApi`], the [`AppContext`] and a [`CutoutEngine`] into
//! the end-to-end operations of the application: ask the service about an
//! image, then map the answer onto the configured container or cut it out
//! of the source.
//!
//! Segmentation paths carry no frame of their own, so every operation that
//! consumes one takes it explicitly: a [`FrameKind`] for overlays, and a
//! [`CutoutModeKind`] for cutouts (`whole` treats the path as image-relative,
//! the bbox modes as box-relative).
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vision_overlay::session::VisionSession;
//!
//! # async fn run() -> vision_overlay::error::VisionResult<()> {
//! let session = VisionSession::builder().build()?;
//! let mapped = session.detect_overlays(Path::new("photo.jpg"), "cat").await?;
//! println!("{} boxes", mapped.overlays.len());
//! # Ok(())
//! # }
//! ```

use std::{path::Path, sync::Arc};

use overlay_geom::layout::{aspect_ratio, compute_render_layout, RenderLayout};
use overlay_geom::overlay::{map_points, map_regions, map_segmentation, BoxOverlay, FrameKind, PathOverlay, PointOverlay};
use overlay_geom::palette::Palette;
use overlay_geom::VectorPath;
use serde::Serialize;
use tracing::{debug, info};

use crate::client::{
    CaptionLength, CaptionResponse, ImagePayload, QueryResponse, VisionApi, VisionClient,
};
use crate::config::{AppConfig, AppContext};
use crate::cutout::{CutoutArtifact, CutoutCache, CutoutEngine, CutoutModeKind};
use crate::error::{VisionError, VisionResult};

/// Overlays together with the layout they were mapped through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedOverlays<T> {
    pub layout: RenderLayout,
    pub overlays: T,
}

pub struct VisionSession {
    api: Arc<dyn VisionApi>,
    context: AppContext,
    engine: CutoutEngine,
    palette: Palette,
}

impl VisionSession {
    pub fn builder() -> VisionSessionBuilder {
        VisionSessionBuilder::new()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn engine(&self) -> &CutoutEngine {
        &self.engine
    }

    /// Encode the image and compute its layout inside the configured container.
    fn prepare(&self, image: &Path) -> VisionResult<(ImagePayload, RenderLayout)> {
        let payload = ImagePayload::from_path(image)?;
        let (width, height) = image::image_dimensions(image)
            .map_err(|e| VisionError::image_load(image, e.to_string()))?;
        let config = self.context.config();
        let layout = compute_render_layout(
            f64::from(config.container_width),
            f64::from(config.container_height),
            aspect_ratio(width, height),
        );
        Ok((payload, layout))
    }

    pub async fn caption(&self, image: &Path, length: CaptionLength) -> VisionResult<CaptionResponse> {
        let payload = ImagePayload::from_path(image)?;
        self.api.caption(&payload, length).await
    }

    pub async fn query(&self, image: &Path, question: &str) -> VisionResult<QueryResponse> {
        let payload = ImagePayload::from_path(image)?;
        self.api.query(&payload, question).await
    }

    /// Detection boxes for `object`, in response order.
    pub async fn detect_overlays(
        &self,
        image: &Path,
        object: &str,
    ) -> VisionResult<MappedOverlays<Vec<BoxOverlay>>> {
        let (payload, layout) = self.prepare(image)?;
        let response = self.api.detect(&payload, object).await?;
        info!(object, found = response.objects.len(), "detection finished");
        Ok(MappedOverlays {
            layout,
            overlays: map_regions(&layout, &response.objects, &self.palette),
        })
    }

    /// Point markers for `object`, in response order.
    pub async fn point_overlays(
        &self,
        image: &Path,
        object: &str,
    ) -> VisionResult<MappedOverlays<Vec<PointOverlay>>> {
        let (payload, layout) = self.prepare(image)?;
        let response = self.api.point(&payload, object).await?;
        info!(object, found = response.points.len(), "pointing finished");
        Ok(MappedOverlays {
            layout,
            overlays: map_points(
                &layout,
                &response.points,
                self.context.config().marker_size,
                &self.palette,
            ),
        })
    }

    /// Segmentation outline for `object`, read in the given frame.
    pub async fn segment_overlay(
        &self,
        image: &Path,
        object: &str,
        frame: FrameKind,
    ) -> VisionResult<MappedOverlays<PathOverlay>> {
        let (payload, layout) = self.prepare(image)?;
        let response = self.api.segment(&payload, object).await?;
        let path = VectorPath::parse(&response.path)?;
        debug!(object, commands = path.len(), ?frame, "segmentation received");
        Ok(MappedOverlays {
            layout,
            overlays: map_segmentation(
                &layout,
                &path,
                Some(&response.bbox),
                &frame.with_region(response.bbox),
                &self.palette,
            ),
        })
    }

    /// Segment `object` and cut it out of the source image.
    pub async fn segment_cutout(
        &self,
        image: &Path,
        object: &str,
        mode: CutoutModeKind,
    ) -> VisionResult<CutoutArtifact> {
        let payload = ImagePayload::from_path(image)?;
        let response = self.api.segment(&payload, object).await?;
        self.engine
            .create_cutout_async(image.to_path_buf(), response.path, mode.with_region(response.bbox))
            .await
    }
}

/// Builder for [`VisionSession`].
///
/// Anything not supplied is derived from the context: the HTTP client from
/// its API settings and the cutout engine from its cache directory.
#[derive(Default)]
pub struct VisionSessionBuilder {
    api: Option<Arc<dyn VisionApi>>,
    context: Option<AppContext>,
    engine: Option<CutoutEngine>,
    palette: Option<Palette>,
}

impl VisionSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api<A: VisionApi + 'static>(mut self, api: A) -> Self {
        self.api = Some(Arc::new(api));
        self
    }

    pub fn with_shared_api(mut self, api: Arc<dyn VisionApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_context(mut self, context: AppContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_engine(mut self, engine: CutoutEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    pub fn build(self) -> VisionResult<VisionSession> {
        let context = match self.context {
            Some(context) => context,
            None => AppContext::new(AppConfig::default())?,
        };
        let api = match self.api {
            Some(api) => api,
            None => Arc::new(VisionClient::new(context.config().client_config())?),
        };
        let engine = match self.engine {
            Some(engine) => engine,
            None => CutoutEngine::new(CutoutCache::open(&context.config().cache_dir)?),
        };
        Ok(VisionSession {
            api,
            context,
            engine,
            palette: self.palette.unwrap_or_default(),
        })
    }
}
