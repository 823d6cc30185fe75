// SPDX-License-Identifier: MIT
//! # Path Scaling
//!
//! Rescales and repositions every spatial operand of a parsed path. The
//! transform is always scale first, then translate: offsets are expressed in
//! already-scaled pixel space, so `x' = x * scale_x + offset_x`.
//!
//! Not every operand is a position:
//!
//! | Command | Operands | Treatment |
//! |---------|----------|-----------|
//! | `M L T` | `(x y)` | scale + offset |
//! | `H` | `x` | `scale_x` + `offset_x` |
//! | `V` | `y` | `scale_y` + `offset_y` |
//! | `C` | `(x1 y1 x2 y2 x y)` | each pair scale + offset |
//! | `S Q` | `(x1 y1 x y)` | each pair scale + offset |
//! | `A` | `rx ry rot large sweep x y` | radii scaled only; `rot`, flags untouched; end point scale + offset |
//! | `Z` | none | unchanged |
//!
//! Radii and the operands of relative (lower case) commands are lengths, so
//! they are scaled but never offset. Unknown commands pass through untouched.

use crate::path::{ArcSegment, Coord, PathCommand, PathParseError, Segment, VectorPath};

/// Scale-then-translate transform for path operands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for PathTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl PathTransform {
    pub fn new(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 1.0, 0.0, 0.0)
    }

    /// Pure scale with no offset.
    pub fn scale(scale_x: f64, scale_y: f64) -> Self {
        Self::new(scale_x, scale_y, 0.0, 0.0)
    }

    /// Append a translation applied after the existing transform.
    pub fn then_translate(self, dx: f64, dy: f64) -> Self {
        Self {
            offset_x: self.offset_x + dx,
            offset_y: self.offset_y + dy,
            ..self
        }
    }

    /// Inverse transform, or `None` when either scale is zero or not finite.
    pub fn inverse(&self) -> Option<Self> {
        if !(self.scale_x.is_normal() && self.scale_y.is_normal()) {
            return None;
        }
        Some(Self::new(
            1.0 / self.scale_x,
            1.0 / self.scale_y,
            -self.offset_x / self.scale_x,
            -self.offset_y / self.scale_y,
        ))
    }

    #[inline]
    pub fn apply_x(&self, x: f64) -> f64 {
        x * self.scale_x + self.offset_x
    }

    #[inline]
    pub fn apply_y(&self, y: f64) -> f64 {
        y * self.scale_y + self.offset_y
    }

    #[inline]
    fn x(&self, x: f64, relative: bool) -> f64 {
        if relative {
            x * self.scale_x
        } else {
            self.apply_x(x)
        }
    }

    #[inline]
    fn y(&self, y: f64, relative: bool) -> f64 {
        if relative {
            y * self.scale_y
        } else {
            self.apply_y(y)
        }
    }

    #[inline]
    fn coord(&self, c: Coord, relative: bool) -> Coord {
        Coord {
            x: self.x(c.x, relative),
            y: self.y(c.y, relative),
        }
    }

    fn segment(&self, segment: &Segment, relative: bool) -> Segment {
        let p = |c: &Coord| self.coord(*c, relative);
        match segment {
            Segment::MoveTo(c) => Segment::MoveTo(p(c)),
            Segment::LineTo(c) => Segment::LineTo(p(c)),
            Segment::HorizontalTo(x) => Segment::HorizontalTo(self.x(*x, relative)),
            Segment::VerticalTo(y) => Segment::VerticalTo(self.y(*y, relative)),
            Segment::CubicTo { ctrl1, ctrl2, to } => Segment::CubicTo {
                ctrl1: p(ctrl1),
                ctrl2: p(ctrl2),
                to: p(to),
            },
            Segment::SmoothCubicTo { ctrl2, to } => Segment::SmoothCubicTo {
                ctrl2: p(ctrl2),
                to: p(to),
            },
            Segment::QuadTo { ctrl, to } => Segment::QuadTo {
                ctrl: p(ctrl),
                to: p(to),
            },
            Segment::SmoothQuadTo(c) => Segment::SmoothQuadTo(p(c)),
            Segment::ArcTo(arc) => Segment::ArcTo(ArcSegment {
                rx: arc.rx * self.scale_x,
                ry: arc.ry * self.scale_y,
                to: p(&arc.to),
                ..*arc
            }),
            Segment::Close => Segment::Close,
            Segment::Unknown { letter, args } => Segment::Unknown {
                letter: *letter,
                args: args.clone(),
            },
        }
    }
}

impl VectorPath {
    /// Return a copy with every spatial operand transformed.
    ///
    /// Command order, multiplicity and relative/implicit markers are kept.
    /// A leading `m` is measured from the origin, so it is offset like an
    /// absolute move-to while keeping its letter.
    pub fn transformed(&self, transform: &PathTransform) -> VectorPath {
        let commands = self
            .commands()
            .iter()
            .enumerate()
            .map(|(index, cmd)| {
                let anchored = index == 0 && matches!(cmd.segment, Segment::MoveTo(_));
                PathCommand {
                    segment: transform.segment(&cmd.segment, cmd.relative && !anchored),
                    relative: cmd.relative,
                    implicit: cmd.implicit,
                }
            })
            .collect();
        VectorPath::from_commands(commands)
    }
}

/// Parse, transform and re-serialize a path string (two decimals per number).
///
/// # Example
/// ```rust
/// use overlay_geom::scale::{scale_path, PathTransform};
///
/// let out = scale_path("M 0.1 0.2 L 0.5 0.6 Z", &PathTransform::new(200.0, 200.0, 10.0, 10.0)).unwrap();
/// assert_eq!(out, "M 30.00 50.00 L 110.00 130.00 Z");
/// ```
pub fn scale_path(path: &str, transform: &PathTransform) -> Result<String, PathParseError> {
    Ok(VectorPath::parse(path)?.transformed(transform).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(path: &VectorPath) -> Vec<f64> {
        let mut out = Vec::new();
        for cmd in path.commands() {
            match &cmd.segment {
                Segment::MoveTo(c) | Segment::LineTo(c) | Segment::SmoothQuadTo(c) => {
                    out.extend([c.x, c.y])
                }
                Segment::HorizontalTo(v) | Segment::VerticalTo(v) => out.push(*v),
                Segment::CubicTo { ctrl1, ctrl2, to } => {
                    out.extend([ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y])
                }
                Segment::SmoothCubicTo { ctrl2, to } => out.extend([ctrl2.x, ctrl2.y, to.x, to.y]),
                Segment::QuadTo { ctrl, to } => out.extend([ctrl.x, ctrl.y, to.x, to.y]),
                Segment::ArcTo(a) => out.extend([a.rx, a.ry, a.rotation, a.to.x, a.to.y]),
                Segment::Close => {}
                Segment::Unknown { args, .. } => out.extend(args.iter().copied()),
            }
        }
        out
    }

    #[test]
    fn test_scale_and_offset_line_path() {
        let out = scale_path(
            "M 0.1 0.2 L 0.5 0.6 Z",
            &PathTransform::new(200.0, 200.0, 10.0, 10.0),
        )
        .unwrap();
        assert_eq!(out, "M 30.00 50.00 L 110.00 130.00 Z");
    }

    #[test]
    fn test_horizontal_and_vertical_use_own_axis() {
        let out = scale_path("M 0 0 H 0.5 V 0.25", &PathTransform::new(100.0, 40.0, 1.0, 2.0)).unwrap();
        assert_eq!(out, "M 1.00 2.00 H 51.00 V 12.00");
    }

    #[test]
    fn test_curves_scale_every_pair() {
        let out = scale_path(
            "M 0 0 C 0.1 0.2 0.3 0.4 0.5 0.6 S 0.7 0.8 0.9 1 Q 0.1 0.1 0.2 0.2 T 0.3 0.3",
            &PathTransform::scale(10.0, 100.0),
        )
        .unwrap();
        assert_eq!(
            out,
            "M 0.00 0.00 C 1.00 20.00 3.00 40.00 5.00 60.00 S 7.00 80.00 9.00 100.00 \
             Q 1.00 10.00 2.00 20.00 T 3.00 30.00"
        );
    }

    #[test]
    fn test_arc_non_spatial_operands_untouched() {
        let path = VectorPath::parse("M 0 0 A 0.25 0.5 45 1 0 0.5 0.5").unwrap();
        for t in [
            PathTransform::new(640.0, 480.0, 12.0, -7.0),
            PathTransform::scale(-3.0, 0.001),
            PathTransform::new(0.0, 0.0, 100.0, 100.0),
        ] {
            let scaled = path.transformed(&t);
            let Segment::ArcTo(arc) = &scaled.commands()[1].segment else {
                panic!("arc lost");
            };
            assert_eq!(arc.rotation, 45.0);
            assert!(arc.large_arc);
            assert!(!arc.sweep);
            assert_eq!(arc.rx, 0.25 * t.scale_x);
            assert_eq!(arc.ry, 0.5 * t.scale_y);
            assert_eq!(arc.to.x, 0.5 * t.scale_x + t.offset_x);
        }
    }

    #[test]
    fn test_relative_operands_are_not_offset() {
        let path = VectorPath::parse("M 0.5 0.5 l 0.1 0.1 h 0.2").unwrap();
        let out = path.transformed(&PathTransform::new(10.0, 10.0, 100.0, 100.0));
        assert_eq!(out.to_string(), "M 105.00 105.00 l 1.00 1.00 h 2.00");
    }

    #[test]
    fn test_leading_relative_move_is_offset() {
        let t = PathTransform::new(200.0, 200.0, 10.0, 10.0);
        let relative = scale_path("m 0.1 0.2 l 0.4 0.4 z", &t).unwrap();
        assert_eq!(relative, "m 30.00 50.00 l 80.00 80.00 z");

        let absolute = scale_path("M 0.1 0.2 L 0.5 0.6 Z", &t).unwrap();
        assert_eq!(absolute, "M 30.00 50.00 L 110.00 130.00 Z");
    }

    #[test]
    fn test_later_relative_move_is_not_offset() {
        let out = scale_path("m 0.1 0.1 z m 0.2 0.2 z", &PathTransform::new(10.0, 10.0, 5.0, 5.0)).unwrap();
        assert_eq!(out, "m 6.00 6.00 z m 2.00 2.00 z");
    }

    #[test]
    fn test_implicit_groups_each_scaled() {
        let out = scale_path("M 0 0 L 0.1 0.1 0.2 0.2 0.3 0.3", &PathTransform::scale(10.0, 10.0)).unwrap();
        assert_eq!(out, "M 0.00 0.00 L 1.00 1.00 2.00 2.00 3.00 3.00");
    }

    #[test]
    fn test_unknown_commands_pass_through() {
        let out = scale_path("M 0.5 0.5 X 0.5 0.5", &PathTransform::scale(10.0, 10.0)).unwrap();
        assert_eq!(out, "M 5.00 5.00 X 0.50 0.50");
    }

    #[test]
    fn test_round_trip_scaling() {
        let original = VectorPath::parse(
            "M 0.123 0.456 L 0.789 0.012 C 0.3 0.3 0.6 0.6 0.9 0.1 A 0.2 0.1 30 0 1 0.4 0.4 Z",
        )
        .unwrap();
        for s in [0.5, 3.0, 1920.0, 0.0125] {
            let forward = PathTransform::scale(s, s);
            let back = PathTransform::scale(1.0 / s, 1.0 / s);
            let round = original.transformed(&forward).transformed(&back);
            for (a, b) in coords(&original).iter().zip(coords(&round).iter()) {
                assert!((a - b).abs() < 1e-3, "scale {s}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_inverse_undoes_offset() {
        let t = PathTransform::new(200.0, 50.0, 10.0, -4.0);
        let inv = t.inverse().unwrap();
        let path = VectorPath::parse("M 0.25 0.75 L 1 0").unwrap();
        let round = path.transformed(&t).transformed(&inv);
        for (a, b) in coords(&path).iter().zip(coords(&round).iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(PathTransform::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_then_translate_is_post_translate() {
        let t = PathTransform::scale(2.0, 3.0).then_translate(5.0, 7.0);
        assert_eq!(t.apply_x(1.0), 7.0);
        assert_eq!(t.apply_y(1.0), 10.0);
    }

    #[test]
    fn test_scale_path_reports_parse_errors() {
        assert_eq!(
            scale_path("", &PathTransform::identity()),
            Err(PathParseError::Empty)
        );
    }
}
