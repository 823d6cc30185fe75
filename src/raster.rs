//! # Path Rasterization Helpers
//!
//! Bridges parsed [`VectorPath`]s to `tiny-skia`:
//!
//! 1. [`to_bez_path`] resolves relative commands against the current point,
//!    reflects control points for smooth curves and converts arcs to cubics,
//!    producing an absolute `kurbo::BezPath`.
//! 2. [`to_skia_path`] converts that into a `tiny_skia::Path`.
//! 3. [`build_mask`] fills a clip mask with the chosen fill rule.
//!
//! Also holds the premultiplied/straight alpha conversions between
//! `image::RgbaImage` and `tiny_skia::Pixmap`.

use image::RgbaImage;
use kurbo::{Arc, BezPath, PathEl, Point, SvgArc, Vec2};
use overlay_geom::path::{Coord, Segment};
use overlay_geom::VectorPath;
use tiny_skia::{ColorU8, FillRule, IntSize, Mask, Pixmap, Transform};
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// Flattening tolerance for arc-to-cubic conversion, in pixels.
const ARC_TOLERANCE: f64 = 0.1;

/// Fill rule for clip masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MaskFillRule {
    #[default]
    #[value(name = "nonzero")]
    NonZero,
    #[value(name = "evenodd")]
    EvenOdd,
}

impl From<MaskFillRule> for FillRule {
    fn from(rule: MaskFillRule) -> Self {
        match rule {
            MaskFillRule::NonZero => FillRule::Winding,
            MaskFillRule::EvenOdd => FillRule::EvenOdd,
        }
    }
}

/// Convert a path to absolute kurbo elements.
///
/// Unknown commands are skipped. A drawing command that follows a close-path
/// without a new move-to starts a subpath at the closed subpath's start.
pub fn to_bez_path(path: &VectorPath) -> BezPath {
    let mut bez = BezPath::new();
    let mut current = Point::ZERO;
    let mut subpath_start = Point::ZERO;
    let mut needs_move = true;
    let mut last_cubic_ctrl: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;

    for cmd in path.commands() {
        let base = if cmd.relative { current.to_vec2() } else { Vec2::ZERO };
        let resolve = |c: &Coord| Point::new(c.x, c.y) + base;
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;

        if needs_move && !matches!(cmd.segment, Segment::MoveTo(_) | Segment::Unknown { .. }) {
            bez.move_to(current);
            subpath_start = current;
            needs_move = false;
        }

        match &cmd.segment {
            Segment::MoveTo(c) => {
                let p = resolve(c);
                bez.move_to(p);
                current = p;
                subpath_start = p;
                needs_move = false;
            }
            Segment::LineTo(c) => {
                current = resolve(c);
                bez.line_to(current);
            }
            Segment::HorizontalTo(x) => {
                current.x = if cmd.relative { current.x + x } else { *x };
                bez.line_to(current);
            }
            Segment::VerticalTo(y) => {
                current.y = if cmd.relative { current.y + y } else { *y };
                bez.line_to(current);
            }
            Segment::CubicTo { ctrl1, ctrl2, to } => {
                let (c1, c2, p) = (resolve(ctrl1), resolve(ctrl2), resolve(to));
                bez.curve_to(c1, c2, p);
                cubic_ctrl = Some(c2);
                current = p;
            }
            Segment::SmoothCubicTo { ctrl2, to } => {
                let c1 = reflect(last_cubic_ctrl, current);
                let (c2, p) = (resolve(ctrl2), resolve(to));
                bez.curve_to(c1, c2, p);
                cubic_ctrl = Some(c2);
                current = p;
            }
            Segment::QuadTo { ctrl, to } => {
                let (c, p) = (resolve(ctrl), resolve(to));
                bez.quad_to(c, p);
                quad_ctrl = Some(c);
                current = p;
            }
            Segment::SmoothQuadTo(to) => {
                let c = reflect(last_quad_ctrl, current);
                let p = resolve(to);
                bez.quad_to(c, p);
                quad_ctrl = Some(c);
                current = p;
            }
            Segment::ArcTo(arc) => {
                let p = resolve(&arc.to);
                let svg = SvgArc {
                    from: current,
                    to: p,
                    radii: Vec2::new(arc.rx.abs(), arc.ry.abs()),
                    x_rotation: arc.rotation.to_radians(),
                    large_arc: arc.large_arc,
                    sweep: arc.sweep,
                };
                match Arc::from_svg_arc(&svg) {
                    Some(a) => {
                        for el in a.append_iter(ARC_TOLERANCE) {
                            bez.push(el);
                        }
                    }
                    // Zero radius or coincident end points degrade to a line.
                    None => bez.line_to(p),
                }
                current = p;
            }
            Segment::Close => {
                bez.close_path();
                current = subpath_start;
                needs_move = true;
            }
            Segment::Unknown { letter, .. } => {
                debug!(%letter, "skipping unknown path command");
                continue;
            }
        }

        last_cubic_ctrl = cubic_ctrl;
        last_quad_ctrl = quad_ctrl;
    }
    bez
}

fn reflect(ctrl: Option<Point>, current: Point) -> Point {
    match ctrl {
        Some(c) => current + (current - c),
        None => current,
    }
}

/// Convert to a `tiny_skia::Path`. `None` when nothing drawable remains.
pub fn to_skia_path(bez: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = tiny_skia::PathBuilder::new();
    for el in bez.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Clip mask of `width x height` covering the inside of `path`.
///
/// A path with no drawable area leaves the mask empty.
pub fn build_mask(
    width: u32,
    height: u32,
    path: &VectorPath,
    rule: MaskFillRule,
    anti_alias: bool,
) -> VisionResult<Mask> {
    let mut mask = Mask::new(width, height).ok_or_else(|| {
        VisionError::surface_allocation(f64::from(width), f64::from(height), "cannot allocate clip mask")
    })?;
    match to_skia_path(&to_bez_path(path)) {
        Some(skia_path) => {
            mask.fill_path(&skia_path, rule.into(), anti_alias, Transform::identity());
        }
        None => debug!(commands = path.len(), "path has no drawable area, mask left empty"),
    }
    Ok(mask)
}

/// Copy an image into a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> VisionResult<Pixmap> {
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height).ok_or_else(|| {
        VisionError::surface_allocation(f64::from(width), f64::from(height), "image has no pixels")
    })?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size).ok_or_else(|| {
        VisionError::surface_allocation(f64::from(width), f64::from(height), "pixel buffer size mismatch")
    })
}

/// Copy a pixmap back to straight-alpha RGBA.
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> VisionResult<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let (width, height) = (pixmap.width(), pixmap.height());
    RgbaImage::from_raw(width, height, data).ok_or_else(|| {
        VisionError::surface_allocation(f64::from(width), f64::from(height), "pixel buffer size mismatch")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn elements(path: &str) -> Vec<PathEl> {
        to_bez_path(&VectorPath::parse(path).unwrap()).elements().to_vec()
    }

    #[test]
    fn test_relative_commands_resolve_against_current_point() {
        let els = elements("M 10 10 l 5 0 v 5 h -5 z");
        assert_eq!(
            els,
            vec![
                PathEl::MoveTo(Point::new(10.0, 10.0)),
                PathEl::LineTo(Point::new(15.0, 10.0)),
                PathEl::LineTo(Point::new(15.0, 15.0)),
                PathEl::LineTo(Point::new(10.0, 15.0)),
                PathEl::ClosePath,
            ]
        );
    }

    #[test]
    fn test_leading_relative_move_starts_from_origin() {
        assert_eq!(elements("m 10 20 l 5 0 z"), elements("M 10 20 L 15 20 Z"));
    }

    #[test]
    fn test_smooth_cubic_reflects_previous_control() {
        let els = elements("M 0 0 C 0 10 10 10 10 0 S 20 -10 20 0");
        assert_eq!(
            els[2],
            PathEl::CurveTo(Point::new(10.0, -10.0), Point::new(20.0, -10.0), Point::new(20.0, 0.0))
        );
    }

    #[test]
    fn test_smooth_quad_without_previous_uses_current_point() {
        let els = elements("M 5 5 T 10 10");
        assert_eq!(els[1], PathEl::QuadTo(Point::new(5.0, 5.0), Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_arc_becomes_curves_ending_at_target() {
        let els = elements("M 0 10 A 10 10 0 0 1 20 10");
        assert!(els.len() > 2);
        match els.last() {
            Some(PathEl::CurveTo(_, _, end)) => {
                assert!((end.x - 20.0).abs() < 1e-6 && (end.y - 10.0).abs() < 1e-6)
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn test_unknown_commands_skipped() {
        let els = elements("M 0 0 X 3 3 L 1 1");
        assert_eq!(els.len(), 2);
    }

    #[test]
    fn test_drawing_after_close_reopens_subpath() {
        let els = elements("M 1 1 L 5 1 L 5 5 Z L 1 9");
        assert_eq!(els[4], PathEl::MoveTo(Point::new(1.0, 1.0)));
        assert_eq!(els[5], PathEl::LineTo(Point::new(1.0, 9.0)));
    }

    #[test]
    fn test_mask_fill_rules_differ_on_overlap() {
        // Two overlapping squares wound the same way.
        let path = VectorPath::parse("M 0 0 L 8 0 L 8 8 L 0 8 Z M 2 2 L 6 2 L 6 6 L 2 6 Z").unwrap();
        let nonzero = build_mask(8, 8, &path, MaskFillRule::NonZero, false).unwrap();
        let evenodd = build_mask(8, 8, &path, MaskFillRule::EvenOdd, false).unwrap();
        let centre = 4 * 8 + 4;
        assert_eq!(nonzero.data()[centre], 255);
        assert_eq!(evenodd.data()[centre], 0);
        assert_eq!(evenodd.data()[8 + 1], 255);
    }

    #[test]
    fn test_degenerate_path_gives_empty_mask() {
        let path = VectorPath::parse("M 1 1").unwrap();
        let mask = build_mask(4, 4, &path, MaskFillRule::NonZero, true).unwrap();
        assert!(mask.data().iter().all(|&a| a == 0));
    }

    #[test]
    fn test_pixmap_round_trip_keeps_opaque_pixels() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 200, 30, 255]));
        let back = rgba_from_pixmap(&pixmap_from_rgba(&img).unwrap()).unwrap();
        assert_eq!(back, img);
        assert!(Mask::new(0, 0).is_none());
    }
}
