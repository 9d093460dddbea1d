//! Terrain tile identifiers and the tile sets a discipline can harvest from.

use serde::{Deserialize, Serialize};

/// Identifier of a land tile graphic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u16);

/// The land tile at a map coordinate: its graphic and its altitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandTile {
    /// Tile graphic.
    pub id: TileId,
    /// Surface altitude.
    pub z: i32,
}

impl LandTile {
    /// Create a land tile.
    pub const fn new(id: u16, z: i32) -> Self {
        Self { id: TileId(id), z }
    }
}

/// An inclusive range of tile identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    /// First tile in the range.
    pub first: TileId,
    /// Last tile in the range (inclusive).
    pub last: TileId,
}

impl TileRange {
    /// Whether `tile` falls inside this range.
    pub const fn contains(&self, tile: TileId) -> bool {
        tile.0 >= self.first.0 && tile.0 <= self.last.0
    }
}

/// The set of tiles that are eligible targets for a discipline.
///
/// Stored as inclusive ranges because terrain graphics come in contiguous
/// runs (all the water variants sit next to each other).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSet {
    ranges: Vec<TileRange>,
}

impl TileSet {
    /// Build a tile set from inclusive `(first, last)` pairs.
    ///
    /// Pairs given in reverse order are normalized.
    pub fn from_ranges(pairs: &[(u16, u16)]) -> Self {
        let ranges = pairs
            .iter()
            .map(|&(a, b)| TileRange {
                first: TileId(a.min(b)),
                last: TileId(a.max(b)),
            })
            .collect();
        Self { ranges }
    }

    /// Build a tile set from individual tiles.
    pub fn from_tiles(tiles: &[u16]) -> Self {
        let ranges = tiles
            .iter()
            .map(|&t| TileRange {
                first: TileId(t),
                last: TileId(t),
            })
            .collect();
        Self { ranges }
    }

    /// Whether `tile` belongs to the set.
    pub fn contains(&self, tile: TileId) -> bool {
        self.ranges.iter().any(|r| r.contains(tile))
    }

    /// Whether the set has no tiles at all.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Return the ranges in declaration order.
    pub fn ranges(&self) -> &[TileRange] {
        &self.ranges
    }
}
