//! Deterministic shelf-based rectangle packer.
//!
//! Packing is a pure function of the ordered input size list: two packers fed
//! the same sizes in the same order produce the same canvas and the same
//! placements. The pipeline relies on this for reproducible texture pages; the
//! shelf heuristic itself is not load-bearing and could be swapped for a
//! smarter allocator as long as determinism holds.

use serde::{Deserialize, Serialize};

/// An assigned, non-overlapping sub-rectangle within a packed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PackedRect {
    /// Whether two rectangles share any pixel.
    pub fn intersects(&self, other: &PackedRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Reusable shelf allocator over a fixed canvas width.
///
/// Rectangles are placed left-to-right on the current shelf; when one does not
/// fit, a new shelf opens below. The canvas grows downward as needed.
#[derive(Debug)]
pub struct ShelfPacker {
    width: u32,
    cursor_x: u32,
    shelf_y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            cursor_x: 0,
            shelf_y: 0,
            shelf_height: 0,
        }
    }

    /// Allocate a `width x height` rectangle. Items wider than the canvas get
    /// a shelf of their own and widen the effective canvas.
    pub fn insert(&mut self, width: u32, height: u32) -> PackedRect {
        if self.cursor_x > 0 && self.cursor_x + width > self.width {
            self.shelf_y += self.shelf_height;
            self.cursor_x = 0;
            self.shelf_height = 0;
        }

        let rect = PackedRect {
            x: self.cursor_x,
            y: self.shelf_y,
            width,
            height,
        };

        self.cursor_x += width;
        self.shelf_height = self.shelf_height.max(height);
        rect
    }

    /// The smallest canvas containing everything allocated so far.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.shelf_y + self.shelf_height)
    }
}

/// Pack an ordered size list into the smallest canvas the shelf heuristic
/// finds, returning per-entry placements and the canvas dimensions.
pub fn pack(sizes: &[(u32, u32)]) -> (Vec<PackedRect>, (u32, u32)) {
    let mut packer = ShelfPacker::new(canvas_width(sizes));
    let rects = sizes
        .iter()
        .map(|&(w, h)| packer.insert(w, h))
        .collect::<Vec<_>>();

    // Oversized entries may overflow the target width; report the real extent.
    let max_extent = rects.iter().map(|r| r.x + r.width).max().unwrap_or(0);
    let (width, height) = packer.canvas_size();
    (rects, (width.max(max_extent), height))
}

/// Target width heuristic: wide enough for the widest entry, and close to the
/// square root of the total area so the page ends up roughly square.
fn canvas_width(sizes: &[(u32, u32)]) -> u32 {
    let widest = sizes.iter().map(|&(w, _)| w).max().unwrap_or(0);
    let area: u64 = sizes.iter().map(|&(w, h)| u64::from(w) * u64::from(h)).sum();
    let side = (area as f64).sqrt().ceil() as u32;
    widest.max(side).max(1)
}
