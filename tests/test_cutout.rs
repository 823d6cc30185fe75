//! File-based cutouts through the engine and its cache.

mod common;

use std::path::PathBuf;

use image::Rgba;
use tempfile::TempDir;
use vision_overlay::cutout::{load_rgba, CutoutCache, CutoutEngine, CutoutMode, CutoutRequest};
use vision_overlay::geom::Region;

use common::fixtures::solid_png;

const SQUARE: &str = "M0 0 L1 0 L1 1 L0 1 Z";

struct Workspace {
    _dir: TempDir,
    source: PathBuf,
    engine: CutoutEngine,
}

fn workspace(width: u32, height: u32) -> Workspace {
    let dir = TempDir::new().unwrap();
    let source = solid_png(dir.path(), "source.png", width, height, [200, 40, 40, 255]);
    let engine = CutoutEngine::new(CutoutCache::open(dir.path().join("cache")).unwrap());
    Workspace {
        _dir: dir,
        source,
        engine,
    }
}

#[test]
fn test_cropped_cutout_of_quarter_box() {
    let ws = workspace(400, 400);
    let artifact = ws
        .engine
        .create_cutout(
            &ws.source,
            SQUARE,
            &CutoutMode::BoundingBoxCropped(Region::new(0.0, 0.0, 0.5, 0.5)),
        )
        .unwrap();

    assert_eq!((artifact.width, artifact.height), (200, 200));
    assert_eq!(artifact.mode, "bbox-cropped");
    assert!(artifact.path.starts_with(ws.engine.cache().dir()));

    let written = load_rgba(&artifact.path).unwrap();
    assert_eq!(written.dimensions(), (200, 200));
    assert!(written.pixels().all(|p| *p == Rgba([200, 40, 40, 255])));
}

#[test]
fn test_output_dimensions_per_mode() {
    let ws = workspace(300, 200);
    let region = Region::new(0.1, 0.25, 0.6, 0.75);

    let whole = ws
        .engine
        .create_cutout(&ws.source, SQUARE, &CutoutMode::Whole)
        .unwrap();
    assert_eq!((whole.width, whole.height), (300, 200));

    let full = ws
        .engine
        .create_cutout(&ws.source, SQUARE, &CutoutMode::BoundingBoxFullSize(region))
        .unwrap();
    assert_eq!((full.width, full.height), (300, 200));

    let cropped = ws
        .engine
        .create_cutout(&ws.source, SQUARE, &CutoutMode::BoundingBoxCropped(region))
        .unwrap();
    assert_eq!((cropped.width, cropped.height), (150, 100));
}

#[test]
fn test_full_size_box_is_transparent_outside() {
    let ws = workspace(100, 100);
    let artifact = ws
        .engine
        .create_cutout(
            &ws.source,
            SQUARE,
            &CutoutMode::BoundingBoxFullSize(Region::new(0.5, 0.5, 1.0, 1.0)),
        )
        .unwrap();

    let written = load_rgba(&artifact.path).unwrap();
    assert_eq!(written.get_pixel(10, 10)[3], 0);
    assert_eq!(*written.get_pixel(75, 75), Rgba([200, 40, 40, 255]));
}

#[test]
fn test_relative_path_lands_inside_full_size_box() {
    let ws = workspace(100, 100);
    let region = Region::new(0.5, 0.5, 1.0, 1.0);
    for path in ["m0 0 l1 0 l0 1 l-1 0 z", SQUARE] {
        let artifact = ws
            .engine
            .create_cutout(&ws.source, path, &CutoutMode::BoundingBoxFullSize(region))
            .unwrap();
        let written = load_rgba(&artifact.path).unwrap();
        assert_eq!(written.get_pixel(10, 10)[3], 0, "path {path:?}");
        assert_eq!(written.get_pixel(75, 75)[3], 255, "path {path:?}");
    }
}

#[test]
fn test_missing_source_is_image_load() {
    let ws = workspace(10, 10);
    let err = ws
        .engine
        .create_cutout(&ws.source.with_file_name("missing.png"), SQUARE, &CutoutMode::Whole)
        .unwrap_err();
    assert_eq!(err.category(), "image_load");
}

#[test]
fn test_bad_path_is_path_parse() {
    let ws = workspace(10, 10);
    for path in ["", "L 0.5"] {
        let err = ws
            .engine
            .create_cutout(&ws.source, path, &CutoutMode::Whole)
            .unwrap_err();
        assert_eq!(err.category(), "path_parse", "path {path:?}");
    }
}

#[test]
fn test_zero_area_box_is_surface_allocation() {
    let ws = workspace(10, 10);
    let err = ws
        .engine
        .create_cutout(
            &ws.source,
            SQUARE,
            &CutoutMode::BoundingBoxCropped(Region::new(0.3, 0.3, 0.3, 0.8)),
        )
        .unwrap_err();
    assert_eq!(err.category(), "surface_allocation");
    assert!(ws.engine.cache().list().unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_keeps_request_order() {
    let ws = workspace(40, 40);
    let requests = vec![
        CutoutRequest {
            source: ws.source.clone(),
            path: SQUARE.to_string(),
            mode: CutoutMode::Whole,
        },
        CutoutRequest {
            source: ws.source.clone(),
            path: "not a path".to_string(),
            mode: CutoutMode::Whole,
        },
        CutoutRequest {
            source: ws.source.clone(),
            path: SQUARE.to_string(),
            mode: CutoutMode::BoundingBoxCropped(Region::new(0.0, 0.0, 0.25, 0.5)),
        },
    ];

    let results = ws.engine.create_cutouts(requests).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().width, 40);
    assert!(results[1].is_err());
    let third = results[2].as_ref().unwrap();
    assert_eq!((third.width, third.height), (10, 20));

    let cached = ws.engine.cache().list().unwrap();
    assert_eq!(cached.len(), 2);
    assert_ne!(cached[0], cached[1]);
}

#[test]
fn test_cache_clear_removes_cutouts() {
    let ws = workspace(8, 8);
    for _ in 0..3 {
        ws.engine
            .create_cutout(&ws.source, SQUARE, &CutoutMode::Whole)
            .unwrap();
    }
    assert_eq!(ws.engine.cache().list().unwrap().len(), 3);
    assert_eq!(ws.engine.cache().clear().unwrap(), 3);
    assert!(ws.engine.cache().list().unwrap().is_empty());
}
