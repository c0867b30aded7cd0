use bitvec::{bitvec, prelude::BitVec};

use crate::geometry::Point;

/// Padding around a rasterized glyph, in pixels.
const PADDING: usize = 4;

/// Font size above which only every other pixel is scanned for edges.
const COARSE_SCAN_FONT_SIZE: f64 = 30.0;

/// Ink coverage of a single character rendered on a square canvas.
///
/// One bit per pixel, set where the glyph's alpha reached the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    /// Side length in pixels.
    side: usize,
    /// Row-major ink bits.
    ink: BitVec,
    /// Scan step used by [`GlyphMask::edges`].
    step: usize,
}

impl GlyphMask {
    /// Side of the square canvas needed for a glyph of the given font size.
    pub fn side_for(font_size: f64) -> usize {
        (font_size.max(1.0) * 2.5).ceil() as usize + PADDING * 2
    }

    /// Builds a mask from per-pixel alpha values in row-major order.
    ///
    /// Missing trailing pixels count as transparent.
    pub fn from_alpha<I>(side: usize, alpha: I, threshold: u8) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let mut ink = bitvec![0; side * side];
        for (index, value) in alpha.into_iter().take(side * side).enumerate() {
            ink.set(index, value >= threshold);
        }
        Self {
            side,
            ink,
            step: 1,
        }
    }

    /// Uses a coarser edge scan for large fonts.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.step = if font_size > COARSE_SCAN_FONT_SIZE { 2 } else { 1 };
        self
    }

    /// Side length in pixels.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Returns whether the pixel at (`x`, `y`) is ink.
    pub fn is_ink(&self, x: usize, y: usize) -> bool {
        x < self.side && y < self.side && self.ink[y * self.side + x]
    }

    /// Returns the outline pixels, relative to the center of the mask.
    ///
    /// A pixel is on the outline when it is ink and at least one of its four
    /// neighbours is not. The outermost ring is never scanned.
    pub fn edges(&self) -> Vec<Point> {
        let mut edges = Vec::new();
        if self.side < 3 {
            return edges;
        }
        let half = self.side as f64 / 2.0;
        for y in (1..self.side - 1).step_by(self.step) {
            for x in (1..self.side - 1).step_by(self.step) {
                if !self.is_ink(x, y) {
                    continue;
                }
                let outline = !self.is_ink(x, y - 1)
                    || !self.is_ink(x, y + 1)
                    || !self.is_ink(x - 1, y)
                    || !self.is_ink(x + 1, y);
                if outline {
                    edges.push(Point::new(x as f64 - half, y as f64 - half));
                }
            }
        }
        edges
    }
}
