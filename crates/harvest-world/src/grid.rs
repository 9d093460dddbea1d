//! Spatial queries: the [`WorldQuery`] collaborator interface and an
//! in-memory [`TileGrid`] implementation.
//!
//! The harvesting engine never owns terrain. It asks a [`WorldQuery`] what
//! land tile sits under a target and derives the bank region from the
//! coordinates. Production hosts back this with their map files; tests and
//! the headless simulation use [`TileGrid`].

use std::collections::BTreeMap;

use harvest_types::{MapId, Point3D};

use crate::bank::RegionKey;
use crate::error::WorldError;
use crate::tiles::{LandTile, TileSet};

/// Read-only terrain lookups consumed by the engine and disciplines.
pub trait WorldQuery {
    /// Return the land tile at `(x, y)` on `map`, or `None` when the
    /// coordinate is off the map.
    fn land_tile(&self, map: MapId, x: i32, y: i32) -> Option<LandTile>;

    /// Whether the land tile under `point` belongs to `tiles`.
    fn is_eligible_tile(&self, map: MapId, point: Point3D, tiles: &TileSet) -> bool {
        self.land_tile(map, point.x, point.y)
            .is_some_and(|tile| tiles.contains(tile.id))
    }

    /// The tile-group key for `point` given a bank footprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidBankConfig`] if the footprint is empty.
    fn region_key(
        &self,
        map: MapId,
        point: Point3D,
        width: u32,
        height: u32,
    ) -> Result<RegionKey, WorldError> {
        RegionKey::for_point(map, point, width, height)
    }
}

/// One rectangular map layer.
#[derive(Debug, Clone)]
struct Layer {
    width: u32,
    height: u32,
    tiles: Vec<LandTile>,
}

impl Layer {
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let row = usize::try_from(y).ok()?.checked_mul(usize::try_from(self.width).ok()?)?;
        row.checked_add(usize::try_from(x).ok()?)
    }
}

/// In-memory terrain made of rectangular layers, one per map.
#[derive(Debug, Clone, Default)]
pub struct TileGrid {
    layers: BTreeMap<MapId, Layer>,
}

impl TileGrid {
    /// Create an empty grid with no maps.
    pub const fn new() -> Self {
        Self {
            layers: BTreeMap::new(),
        }
    }

    /// Add a map of `width` x `height` tiles, all set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateMap`] if the map exists, or
    /// [`WorldError::InvalidDimensions`] for empty or oversized layers.
    pub fn add_map(
        &mut self,
        map: MapId,
        width: u32,
        height: u32,
        fill: LandTile,
    ) -> Result<(), WorldError> {
        if self.layers.contains_key(&map) {
            return Err(WorldError::DuplicateMap(map));
        }
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let count = usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h))
            .ok_or(WorldError::InvalidDimensions { width, height })?;
        self.layers.insert(
            map,
            Layer {
                width,
                height,
                tiles: vec![fill; count],
            },
        );
        Ok(())
    }

    /// Set a single tile.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MapNotFound`] or [`WorldError::OutOfBounds`].
    pub fn set_tile(&mut self, map: MapId, x: i32, y: i32, tile: LandTile) -> Result<(), WorldError> {
        let layer = self.layers.get_mut(&map).ok_or(WorldError::MapNotFound(map))?;
        let slot = layer
            .index(x, y)
            .and_then(|idx| layer.tiles.get_mut(idx))
            .ok_or(WorldError::OutOfBounds { map, x, y })?;
        *slot = tile;
        Ok(())
    }

    /// Paint an inclusive rectangle, clipped to the map bounds.
    ///
    /// Returns the number of tiles written.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MapNotFound`] if the map does not exist.
    pub fn fill_rect(
        &mut self,
        map: MapId,
        from: (i32, i32),
        to: (i32, i32),
        tile: LandTile,
    ) -> Result<u32, WorldError> {
        let layer = self.layers.get_mut(&map).ok_or(WorldError::MapNotFound(map))?;
        let mut written: u32 = 0;
        for y in from.1.min(to.1)..=from.1.max(to.1) {
            for x in from.0.min(to.0)..=from.0.max(to.0) {
                if let Some(slot) = layer.index(x, y).and_then(|idx| layer.tiles.get_mut(idx)) {
                    *slot = tile;
                    written = written.saturating_add(1);
                }
            }
        }
        Ok(written)
    }

    /// Return the `(width, height)` of a map.
    pub fn dimensions(&self, map: MapId) -> Option<(u32, u32)> {
        self.layers.get(&map).map(|l| (l.width, l.height))
    }
}

impl WorldQuery for TileGrid {
    fn land_tile(&self, map: MapId, x: i32, y: i32) -> Option<LandTile> {
        let layer = self.layers.get(&map)?;
        layer.index(x, y).and_then(|idx| layer.tiles.get(idx)).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tiles::TileId;

    const GRASS: LandTile = LandTile::new(0x0003, 0);
    const WATER: LandTile = LandTile::new(0x00A8, -5);

    fn small_grid() -> TileGrid {
        let mut grid = TileGrid::new();
        grid.add_map(MapId(1), 32, 16, GRASS).unwrap();
        grid
    }

    #[test]
    fn lookups_respect_bounds() {
        let grid = small_grid();
        assert_eq!(grid.land_tile(MapId(1), 0, 0), Some(GRASS));
        assert_eq!(grid.land_tile(MapId(1), 31, 15), Some(GRASS));
        assert_eq!(grid.land_tile(MapId(1), 32, 0), None);
        assert_eq!(grid.land_tile(MapId(1), -1, 0), None);
        assert_eq!(grid.land_tile(MapId(2), 0, 0), None);
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut grid = small_grid();
        let written = grid.fill_rect(MapId(1), (30, 14), (40, 20), WATER).unwrap();
        assert_eq!(written, 4);
        assert_eq!(grid.land_tile(MapId(1), 31, 15), Some(WATER));
    }

    #[test]
    fn set_tile_out_of_bounds() {
        let mut grid = small_grid();
        let result = grid.set_tile(MapId(1), 100, 0, WATER);
        assert!(matches!(result, Err(WorldError::OutOfBounds { .. })));
    }

    #[test]
    fn duplicate_and_empty_maps_rejected() {
        let mut grid = small_grid();
        assert!(matches!(
            grid.add_map(MapId(1), 4, 4, GRASS),
            Err(WorldError::DuplicateMap(_))
        ));
        assert!(matches!(
            grid.add_map(MapId(2), 0, 4, GRASS),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn eligibility_uses_tile_set() {
        let mut grid = small_grid();
        grid.set_tile(MapId(1), 5, 5, WATER).unwrap();
        let water = TileSet::from_tiles(&[0x00A8]);
        assert!(grid.is_eligible_tile(MapId(1), Point3D::new(5, 5, 0), &water));
        assert!(!grid.is_eligible_tile(MapId(1), Point3D::new(6, 5, 0), &water));
        assert!(!water.contains(TileId(GRASS.id.0)));
    }
}
