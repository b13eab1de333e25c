//! Rectangular work regions over an output domain.

use serde::{Deserialize, Serialize};

/// Represents a rectangular region of an output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRegion {
    /// X of the first column
    pub x: i32,
    /// Y of the first row
    pub y: i32,
    /// Width of the region
    pub width: i32,
    /// Height of the region
    pub height: i32,
}

impl TileRegion {
    /// Create a new tile region.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the right edge coordinate (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Get the bottom edge coordinate (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Calculate the area of this region in pixels.
    pub fn area(&self) -> u64 {
        self.width.max(0) as u64 * self.height.max(0) as u64
    }

    /// Split into one region per row.
    pub fn rows(&self) -> impl Iterator<Item = TileRegion> + '_ {
        (self.y..self.bottom()).map(move |y| TileRegion::new(self.x, y, self.width, 1))
    }
}

/// Iterator over tiles of a domain, row-major.
///
/// Edge tiles are shrunk to fit the domain.
pub struct TileIterator {
    domain: TileRegion,
    tile_width: i32,
    tile_height: i32,
    current_x: i32,
    current_y: i32,
}

impl TileIterator {
    /// Create a new tile iterator. Tile sizes below 1 are treated as 1.
    pub fn new(domain: TileRegion, tile_width: u32, tile_height: u32) -> Self {
        Self {
            domain,
            tile_width: tile_width.clamp(1, i32::MAX as u32) as i32,
            tile_height: tile_height.clamp(1, i32::MAX as u32) as i32,
            current_x: domain.x,
            current_y: domain.y,
        }
    }

    /// Get the total number of tiles.
    pub fn tile_count(&self) -> usize {
        if self.domain.width <= 0 || self.domain.height <= 0 {
            return 0;
        }
        let tiles_x = (self.domain.width + self.tile_width - 1) / self.tile_width;
        let tiles_y = (self.domain.height + self.tile_height - 1) / self.tile_height;
        tiles_x as usize * tiles_y as usize
    }
}

impl Iterator for TileIterator {
    type Item = TileRegion;

    fn next(&mut self) -> Option<Self::Item> {
        if self.domain.width <= 0 || self.current_y >= self.domain.bottom() {
            return None;
        }

        let x = self.current_x;
        let y = self.current_y;
        let width = self.tile_width.min(self.domain.right() - x);
        let height = self.tile_height.min(self.domain.bottom() - y);

        // Move to next tile
        self.current_x += self.tile_width;
        if self.current_x >= self.domain.right() {
            self.current_x = self.domain.x;
            self.current_y += self.tile_height;
        }

        Some(TileRegion::new(x, y, width, height))
    }
}
