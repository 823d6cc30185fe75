// SPDX-License-Identifier: MIT
//! # Vector Path Model, Lexer and Serializer
//!
//! The segmentation endpoint returns its mask outline in a compact path
//! mini-language: one-letter commands (`M L H V C S Q T A Z`, lower case for
//! relative) followed by whitespace/comma separated numbers.
//!
//! Paths are parsed into a structured list of [`PathCommand`]s before anything
//! else touches them, so scaling, serialization and rasterization all work on
//! typed segments rather than on text.
//!
//! ## Grammar Notes
//!
//! - A command letter may be followed by several argument groups (implicit
//!   repetition). Each group becomes its own command with `implicit = true`;
//!   groups after a move-to become line-tos, as in SVG.
//! - Arc flags are single `0`/`1` characters and may be packed without
//!   separators (`a1 1 0 01 2 3`).
//! - Unknown command letters are kept verbatim with their numeric arguments.
//!   They are never scaled and rasterizers skip them.
//! - The first command must be a move-to.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Default number of decimals written by [`VectorPath`]'s `Display`.
pub const DEFAULT_PRECISION: usize = 2;

/// Errors raised while tokenizing or parsing a path string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("path is empty")]
    Empty,

    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },

    #[error("expected a number at offset {offset}")]
    ExpectedNumber { offset: usize },

    #[error("invalid arc flag at offset {offset}, expected 0 or 1")]
    InvalidFlag { offset: usize },

    #[error("path must start with a moveto command, found '{found}'")]
    MissingMoveTo { found: char },

    #[error("close-path takes no arguments (offset {offset})")]
    ArgumentsAfterClose { offset: usize },
}

/// A coordinate pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Elliptical arc parameters. Only the radii and end point are spatial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSegment {
    pub rx: f64,
    pub ry: f64,
    /// x-axis rotation in degrees.
    pub rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
    pub to: Coord,
}

/// One argument group of a path command.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    MoveTo(Coord),
    LineTo(Coord),
    HorizontalTo(f64),
    VerticalTo(f64),
    CubicTo { ctrl1: Coord, ctrl2: Coord, to: Coord },
    SmoothCubicTo { ctrl2: Coord, to: Coord },
    QuadTo { ctrl: Coord, to: Coord },
    SmoothQuadTo(Coord),
    ArcTo(ArcSegment),
    Close,
    Unknown { letter: char, args: Vec<f64> },
}

impl Segment {
    /// Absolute (upper case) command letter.
    pub fn letter(&self) -> char {
        match self {
            Segment::MoveTo(_) => 'M',
            Segment::LineTo(_) => 'L',
            Segment::HorizontalTo(_) => 'H',
            Segment::VerticalTo(_) => 'V',
            Segment::CubicTo { .. } => 'C',
            Segment::SmoothCubicTo { .. } => 'S',
            Segment::QuadTo { .. } => 'Q',
            Segment::SmoothQuadTo(_) => 'T',
            Segment::ArcTo(_) => 'A',
            Segment::Close => 'Z',
            Segment::Unknown { letter, .. } => *letter,
        }
    }
}

/// A segment together with how it was written.
#[derive(Clone, Debug, PartialEq)]
pub struct PathCommand {
    pub segment: Segment,
    /// Lower-case (relative) command letter.
    pub relative: bool,
    /// Argument group written without its own command letter.
    pub implicit: bool,
}

impl PathCommand {
    pub fn absolute(segment: Segment) -> Self {
        Self {
            segment,
            relative: false,
            implicit: false,
        }
    }

    pub fn relative(segment: Segment) -> Self {
        Self {
            segment,
            relative: true,
            implicit: false,
        }
    }

    /// Command letter as it appears in text.
    pub fn letter(&self) -> char {
        let letter = self.segment.letter();
        match self.segment {
            Segment::Unknown { .. } => letter,
            _ if self.relative => letter.to_ascii_lowercase(),
            _ => letter,
        }
    }
}

/// Parsed path: an ordered command list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorPath {
    commands: Vec<PathCommand>,
}

impl VectorPath {
    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    /// Parse a path string into structured commands.
    pub fn parse(input: &str) -> Result<Self, PathParseError> {
        Parser::new(input).parse()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<PathCommand> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Serialize with a fixed number of decimals per number.
    ///
    /// Arc flags are always written as `0`/`1`.
    pub fn to_path_string(&self, precision: usize) -> String {
        let mut out = String::new();
        let mut last_letter: Option<char> = None;

        for cmd in &self.commands {
            let letter = cmd.letter();
            let continues = match last_letter {
                Some('M') => letter == 'L',
                Some('m') => letter == 'l',
                Some(prev) => prev == letter,
                None => false,
            };

            let mut parts: Vec<String> = Vec::new();
            if !(cmd.implicit && continues) {
                parts.push(letter.to_string());
            }
            push_operands(&mut parts, &cmd.segment, precision);

            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&parts.join(" "));
            last_letter = Some(letter);
        }
        out
    }
}

fn push_operands(parts: &mut Vec<String>, segment: &Segment, precision: usize) {
    let num = |v: f64| format_number(v, precision);
    let coord = |parts: &mut Vec<String>, c: &Coord| {
        parts.push(num(c.x));
        parts.push(num(c.y));
    };
    match segment {
        Segment::MoveTo(p) | Segment::LineTo(p) | Segment::SmoothQuadTo(p) => coord(parts, p),
        Segment::HorizontalTo(x) => parts.push(num(*x)),
        Segment::VerticalTo(y) => parts.push(num(*y)),
        Segment::CubicTo { ctrl1, ctrl2, to } => {
            coord(parts, ctrl1);
            coord(parts, ctrl2);
            coord(parts, to);
        }
        Segment::SmoothCubicTo { ctrl2, to } => {
            coord(parts, ctrl2);
            coord(parts, to);
        }
        Segment::QuadTo { ctrl, to } => {
            coord(parts, ctrl);
            coord(parts, to);
        }
        Segment::ArcTo(arc) => {
            parts.push(num(arc.rx));
            parts.push(num(arc.ry));
            parts.push(num(arc.rotation));
            parts.push(flag(arc.large_arc).to_string());
            parts.push(flag(arc.sweep).to_string());
            coord(parts, &arc.to);
        }
        Segment::Close => {}
        Segment::Unknown { args, .. } => parts.extend(args.iter().map(|v| num(*v))),
    }
}

fn flag(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

/// Fixed-precision number without a negative sign on zero.
pub fn format_number(v: f64, precision: usize) -> String {
    let s = format!("{:.*}", precision, v);
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}

impl FromStr for VectorPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VectorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string(DEFAULT_PRECISION))
    }
}

impl Serialize for VectorPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy)]
enum Verb {
    Move,
    Line,
    Horizontal,
    Vertical,
    Cubic,
    SmoothCubic,
    Quad,
    SmoothQuad,
    Arc,
}

impl Verb {
    fn from_letter(upper: char) -> Option<Self> {
        Some(match upper {
            'M' => Verb::Move,
            'L' => Verb::Line,
            'H' => Verb::Horizontal,
            'V' => Verb::Vertical,
            'C' => Verb::Cubic,
            'S' => Verb::SmoothCubic,
            'Q' => Verb::Quad,
            'T' => Verb::SmoothQuad,
            'A' => Verb::Arc,
            _ => return None,
        })
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<VectorPath, PathParseError> {
        if self.at_end() {
            return Err(PathParseError::Empty);
        }

        let mut commands: Vec<PathCommand> = Vec::new();
        while !self.at_end() {
            let offset = self.pos;
            let b = self.bytes[offset];
            if !b.is_ascii_alphabetic() {
                return Err(PathParseError::UnexpectedCharacter {
                    found: self.char_at(offset),
                    offset,
                });
            }
            self.pos += 1;

            let letter = b as char;
            let upper = letter.to_ascii_uppercase();
            let relative = letter.is_ascii_lowercase();
            if commands.is_empty() && upper != 'M' {
                return Err(PathParseError::MissingMoveTo { found: letter });
            }

            if upper == 'Z' {
                if self.at_number() {
                    return Err(PathParseError::ArgumentsAfterClose { offset: self.pos });
                }
                commands.push(PathCommand {
                    segment: Segment::Close,
                    relative,
                    implicit: false,
                });
                continue;
            }

            let Some(verb) = Verb::from_letter(upper) else {
                let mut args = Vec::new();
                while self.at_number() {
                    args.push(self.number()?);
                }
                commands.push(PathCommand::absolute(Segment::Unknown { letter, args }));
                continue;
            };

            let mut implicit = false;
            loop {
                let segment = match (self.segment(verb)?, implicit) {
                    (Segment::MoveTo(p), true) => Segment::LineTo(p),
                    (segment, _) => segment,
                };
                commands.push(PathCommand {
                    segment,
                    relative,
                    implicit,
                });
                implicit = true;
                if !self.at_number() {
                    break;
                }
            }
        }

        Ok(VectorPath { commands })
    }

    fn segment(&mut self, verb: Verb) -> Result<Segment, PathParseError> {
        let segment = match verb {
            Verb::Move => Segment::MoveTo(self.coord()?),
            Verb::Line => Segment::LineTo(self.coord()?),
            Verb::Horizontal => Segment::HorizontalTo(self.number()?),
            Verb::Vertical => Segment::VerticalTo(self.number()?),
            Verb::Cubic => {
                let ctrl1 = self.coord()?;
                let ctrl2 = self.coord()?;
                let to = self.coord()?;
                Segment::CubicTo { ctrl1, ctrl2, to }
            }
            Verb::SmoothCubic => {
                let ctrl2 = self.coord()?;
                let to = self.coord()?;
                Segment::SmoothCubicTo { ctrl2, to }
            }
            Verb::Quad => {
                let ctrl = self.coord()?;
                let to = self.coord()?;
                Segment::QuadTo { ctrl, to }
            }
            Verb::SmoothQuad => Segment::SmoothQuadTo(self.coord()?),
            Verb::Arc => {
                let rx = self.number()?;
                let ry = self.number()?;
                let rotation = self.number()?;
                let large_arc = self.flag()?;
                let sweep = self.flag()?;
                let to = self.coord()?;
                Segment::ArcTo(ArcSegment {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    to,
                })
            }
        };
        Ok(segment)
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&mut self) -> bool {
        self.skip_separators();
        self.pos >= self.bytes.len()
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.peek(), Some(b'0'..=b'9' | b'.' | b'-' | b'+'))
    }

    fn char_at(&self, offset: usize) -> char {
        self.src[offset..].chars().next().unwrap_or('\0')
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self) -> Result<f64, PathParseError> {
        self.skip_separators();
        let start = self.pos;

        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let int_digits = self.digits();
        let mut frac_digits = 0;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            frac_digits = self.digits();
        }
        if int_digits + frac_digits == 0 {
            self.pos = start;
            return Err(PathParseError::ExpectedNumber { offset: start });
        }

        // Exponent only when digits follow, so a stray 'e' stays a command letter.
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                self.pos = mark;
            }
        }

        self.src[start..self.pos]
            .parse::<f64>()
            .map_err(|_| PathParseError::ExpectedNumber { offset: start })
    }

    fn coord(&mut self) -> Result<Coord, PathParseError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Coord { x, y })
    }

    fn flag(&mut self) -> Result<bool, PathParseError> {
        self.skip_separators();
        let offset = self.pos;
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(PathParseError::InvalidFlag { offset }),
        }
    }
}
