// SPDX-License-Identifier: MIT
//! Index-based overlay colours.
//!
//! Detections are coloured by their position in the API response, cycling
//! through the palette (`index mod len`), so the same response always renders
//! the same way.

use serde::Serialize;

/// 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Ten well separated hues.
pub const DEFAULT_COLORS: [Color; 10] = [
    Color::rgb(0xe6, 0x19, 0x4b),
    Color::rgb(0x3c, 0xb4, 0x4b),
    Color::rgb(0x43, 0x63, 0xd8),
    Color::rgb(0xf5, 0x82, 0x31),
    Color::rgb(0x91, 0x1e, 0xb4),
    Color::rgb(0x42, 0xd4, 0xf4),
    Color::rgb(0xf0, 0x32, 0xe6),
    Color::rgb(0xbf, 0xef, 0x45),
    Color::rgb(0xff, 0xe1, 0x19),
    Color::rgb(0x46, 0x99, 0x90),
];

/// Colour cycle used for overlays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

impl Palette {
    /// Custom palette. `None` when `colors` is empty.
    pub fn new(colors: Vec<Color>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, index: usize) -> Color {
        self.colors[index % self.colors.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let p = Palette::default();
        assert!(p.len() >= 8);
        assert_eq!(p.color(0), p.color(p.len()));
        assert_eq!(p.color(3), p.color(3 + 2 * p.len()));
    }

    #[test]
    fn test_default_colors_distinct() {
        for (i, a) in DEFAULT_COLORS.iter().enumerate() {
            for b in &DEFAULT_COLORS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(Palette::new(Vec::new()).is_none());
        assert_eq!(Color::rgb(255, 0, 16).to_hex(), "#ff0010");
    }
}
