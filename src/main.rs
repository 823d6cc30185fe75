use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vision_overlay::client::CaptionLength;
use vision_overlay::config::{AppConfig, AppContext};
use vision_overlay::cutout::{load_rgba, CutoutCache, CutoutEngine, CutoutModeKind, CutoutOptions};
use vision_overlay::error::{HasRecoverySuggestion, VisionError};
use vision_overlay::geom::layout::{aspect_ratio, compute_render_layout};
use vision_overlay::geom::overlay::{map_points, map_regions, map_segmentation, FrameKind};
use vision_overlay::geom::palette::Palette;
use vision_overlay::geom::path::DEFAULT_PRECISION;
use vision_overlay::geom::{PathTransform, Point, Region, VectorPath};
use vision_overlay::i18n::{Language, MessageKey};
use vision_overlay::raster::MaskFillRule;
use vision_overlay::render::{OverlayRenderer, OverlayScene};
use vision_overlay::session::VisionSession;

/// Ask a vision API about an image and turn the answers into overlays and cutouts.
#[derive(Parser, Debug)]
#[command(name = "vov", version)]
#[command(about = "Vision API overlays: detect, point, segment and cut out objects")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Vision API base URL (overrides VISION_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// API key (overrides VISION_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Header the API key is sent in (overrides VISION_API_KEY_HEADER)
    #[arg(long, global = true)]
    api_key_header: Option<String>,

    /// Request timeout in seconds (overrides VISION_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Cutout cache directory (overrides VISION_CACHE_DIR)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Message language (overrides VISION_LANG)
    #[arg(long, global = true, value_enum)]
    lang: Option<Language>,

    /// Container size overlays are laid out in, e.g. 1280x720
    #[arg(long, global = true, value_parser = parse_size)]
    container: Option<(u32, u32)>,

    /// Point marker size in container pixels
    #[arg(long, global = true)]
    marker_size: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe an image
    Caption {
        image: PathBuf,
        #[arg(long, value_enum, default_value_t = CaptionLength::Normal)]
        length: CaptionLength,
    },
    /// Ask a question about an image
    Query { image: PathBuf, question: String },
    /// Detect bounding boxes of an object
    Detect { image: PathBuf, object: String },
    /// Locate centre points of an object
    Point { image: PathBuf, object: String },
    /// Segment an object, optionally cutting it out
    Segment {
        image: PathBuf,
        object: String,
        /// Frame the returned path is normalized to
        #[arg(long, value_enum, default_value_t = FrameKind::Whole)]
        frame: FrameKind,
        /// Write a cutout in this mode instead of printing the outline
        #[arg(long, value_enum)]
        cutout: Option<CutoutModeKind>,
    },
    /// Compute the contain-fit layout of an image in the container
    Layout {
        /// Image aspect ratio (width / height)
        #[arg(long, conflicts_with = "image", required_unless_present = "image")]
        aspect: Option<f64>,
        /// Read the aspect ratio from this image
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Scale and offset a normalized path
    ScalePath {
        path: String,
        #[arg(long, allow_negative_numbers = true)]
        scale_x: f64,
        #[arg(long, allow_negative_numbers = true)]
        scale_y: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_y: f64,
        #[arg(long, default_value_t = DEFAULT_PRECISION)]
        precision: usize,
    },
    /// Cut a normalized path out of an image
    Cutout {
        image: PathBuf,
        path: String,
        #[arg(long, value_enum, default_value_t = CutoutModeKind::BboxCropped)]
        mode: CutoutModeKind,
        /// Bounding box as x_min,y_min,x_max,y_max (required for bbox modes)
        #[arg(long, value_parser = parse_region)]
        bbox: Option<Region>,
        #[arg(long, value_enum, default_value_t = MaskFillRule::NonZero)]
        fill_rule: MaskFillRule,
    },
    /// Draw overlays over an image into a PNG
    Render {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// JSON array of regions
        #[arg(long)]
        regions: Option<String>,
        /// JSON array of points
        #[arg(long)]
        points: Option<String>,
        /// Normalized segmentation path
        #[arg(long)]
        path: Option<String>,
        #[arg(long, value_enum, default_value_t = FrameKind::Whole)]
        frame: FrameKind,
        /// Bounding box for a bbox-relative path, as x_min,y_min,x_max,y_max
        #[arg(long, value_parser = parse_region)]
        bbox: Option<Region>,
    },
    /// Manage cached cutouts
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached cutouts
    List,
    /// Delete every cached cutout
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let context = build_context(&cli)?;
    if let Err(err) = run(cli.command, &context).await {
        if let Some(vision) = err.downcast_ref::<VisionError>() {
            error!(category = vision.category(), "{vision}");
            eprintln!("{}", context.message(vision.message_key()));
            if let Some(hint) = vision.recovery_suggestion() {
                eprintln!("{hint}");
            }
        }
        return Err(err);
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vision_overlay=info"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    }
}

/// Environment first, then command-line flags.
fn build_context(cli: &Cli) -> Result<AppContext> {
    let mut config = AppConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(header) = &cli.api_key_header {
        config.api_key_header = header.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(lang) = cli.lang {
        config.language = lang;
    }
    if let Some((width, height)) = cli.container {
        config.container_width = width;
        config.container_height = height;
    }
    if let Some(size) = cli.marker_size {
        config.marker_size = size;
    }
    Ok(AppContext::new(config)?)
}

async fn run(command: Command, ctx: &AppContext) -> Result<()> {
    match command {
        Command::Caption { image, length } => {
            print_json(&session(ctx)?.caption(&image, length).await?)
        }
        Command::Query { image, question } => {
            print_json(&session(ctx)?.query(&image, &question).await?)
        }
        Command::Detect { image, object } => {
            let mapped = session(ctx)?.detect_overlays(&image, &object).await?;
            if mapped.overlays.is_empty() {
                eprintln!("{}", ctx.message(MessageKey::NoObjectsFound));
            }
            print_json(&mapped)
        }
        Command::Point { image, object } => {
            let mapped = session(ctx)?.point_overlays(&image, &object).await?;
            if mapped.overlays.is_empty() {
                eprintln!("{}", ctx.message(MessageKey::NoObjectsFound));
            }
            print_json(&mapped)
        }
        Command::Segment {
            image,
            object,
            frame,
            cutout,
        } => {
            let session = session(ctx)?;
            match cutout {
                Some(mode) => {
                    let artifact = session.segment_cutout(&image, &object, mode).await?;
                    eprintln!("{}", ctx.message(MessageKey::CutoutSaved));
                    print_json(&artifact)
                }
                None => print_json(&session.segment_overlay(&image, &object, frame).await?),
            }
        }
        Command::Layout { aspect, image } => {
            let aspect = match (aspect, image) {
                (Some(aspect), _) => aspect,
                (None, Some(image)) => {
                    let (w, h) = image::image_dimensions(&image)
                        .map_err(|e| VisionError::image_load(&image, e.to_string()))?;
                    aspect_ratio(w, h)
                }
                (None, None) => bail!("either --aspect or --image is required"),
            };
            let config = ctx.config();
            print_json(&compute_render_layout(
                f64::from(config.container_width),
                f64::from(config.container_height),
                aspect,
            ))
        }
        Command::ScalePath {
            path,
            scale_x,
            scale_y,
            offset_x,
            offset_y,
            precision,
        } => {
            let transform = PathTransform::new(scale_x, scale_y, offset_x, offset_y);
            let scaled = VectorPath::parse(&path)
                .map_err(VisionError::from)?
                .transformed(&transform);
            print_json(&serde_json::json!({ "path": scaled.to_path_string(precision) }))
        }
        Command::Cutout {
            image,
            path,
            mode,
            bbox,
            fill_rule,
        } => {
            let region = match (mode, bbox) {
                (CutoutModeKind::Whole, _) => Region::full(),
                (_, Some(region)) => region,
                (_, None) => bail!("--bbox is required for bounding-box modes"),
            };
            let engine = engine(ctx)?.with_options(CutoutOptions {
                fill_rule,
                ..CutoutOptions::default()
            });
            let artifact = engine
                .create_cutout_async(image, path, mode.with_region(region))
                .await?;
            eprintln!("{}", ctx.message(MessageKey::CutoutSaved));
            print_json(&artifact)
        }
        Command::Render {
            image,
            output,
            regions,
            points,
            path,
            frame,
            bbox,
        } => render(ctx, &image, &output, regions, points, path, frame, bbox),
        Command::Cache { action } => {
            let cache = CutoutCache::open(&ctx.config().cache_dir)?;
            match action {
                CacheAction::List => print_json(&cache.list()?),
                CacheAction::Clear => {
                    let removed = cache.clear()?;
                    eprintln!("{}", ctx.message(MessageKey::CacheCleared));
                    print_json(&serde_json::json!({ "removed": removed }))
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn render(
    ctx: &AppContext,
    image: &Path,
    output: &Path,
    regions: Option<String>,
    points: Option<String>,
    path: Option<String>,
    frame: FrameKind,
    bbox: Option<Region>,
) -> Result<()> {
    let config = ctx.config();
    let source = load_rgba(image)?;
    let renderer = OverlayRenderer::new(config.container_width, config.container_height)?;
    let layout = renderer.layout_for(&source);
    let palette = Palette::default();

    let mut scene = OverlayScene::new(config.marker_size);
    if let Some(raw) = regions {
        let regions: Vec<Region> = serde_json::from_str(&raw).context("--regions must be a JSON array of regions")?;
        scene.boxes = map_regions(&layout, &regions, &palette);
    }
    if let Some(raw) = points {
        let points: Vec<Point> = serde_json::from_str(&raw).context("--points must be a JSON array of points")?;
        scene.points = map_points(&layout, &points, config.marker_size, &palette);
    }
    if let Some(raw) = path {
        let parsed = VectorPath::parse(&raw).map_err(VisionError::from)?;
        let frame = match (frame, bbox) {
            (FrameKind::Bbox, None) => bail!("--bbox is required with --frame bbox"),
            (kind, region) => kind.with_region(region.unwrap_or_else(Region::full)),
        };
        scene
            .paths
            .push(map_segmentation(&layout, &parsed, bbox.as_ref(), &frame, &palette));
    }

    renderer.render_to_file(&source, &scene, output)?;
    print_json(&serde_json::json!({
        "output": output,
        "layout": layout,
        "scene": scene,
    }))
}

fn session(ctx: &AppContext) -> Result<VisionSession> {
    Ok(VisionSession::builder()
        .with_context(ctx.clone())
        .with_engine(engine(ctx)?)
        .build()?)
}

fn engine(ctx: &AppContext) -> Result<CutoutEngine> {
    Ok(CutoutEngine::new(CutoutCache::open(&ctx.config().cache_dir)?))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("invalid size '{s}': {e}"));
    Ok((parse(w)?, parse(h)?))
}

/// Parse `x_min,y_min,x_max,y_max`.
fn parse_region(s: &str) -> Result<Region, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid region '{s}': {e}"))?;
    match values.as_slice() {
        [x_min, y_min, x_max, y_max] => Ok(Region::new(*x_min, *y_min, *x_max, *y_max)),
        _ => Err(format!("expected x_min,y_min,x_max,y_max, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1280x720"), Ok((1280, 720)));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("ax1").is_err());
    }

    #[test]
    fn test_parse_region() {
        assert_eq!(parse_region("0.1, 0.2,0.5,0.6"), Ok(Region::new(0.1, 0.2, 0.5, 0.6)));
        assert!(parse_region("0.1,0.2,0.5").is_err());
    }

    #[test]
    fn test_cli_parses_cutout() {
        let cli = Cli::try_parse_from([
            "vov", "cutout", "in.png", "M0 0 L1 0 L1 1 Z", "--mode", "bbox-full", "--bbox", "0,0,0.5,0.5",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Cutout {
                mode: CutoutModeKind::BboxFull,
                bbox: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
