//! Water terrain: which tiles can be fished, what counts as deep water, and
//! where a surfacing creature may be placed.

use harvest_types::{MapId, Point3D};
use harvest_world::{LandTile, TileSet, WorldQuery};
use rand::Rng;

/// Inclusive ranges of water tile graphics.
pub const WATER_TILES: [(u16, u16); 6] = [
    (0x00A8, 0x00AB),
    (0x0136, 0x0137),
    (0x5797, 0x579C),
    (0x746E, 0x7485),
    (0x7490, 0x74AB),
    (0x74B5, 0x75D5),
];

/// Open-sea tiles a creature may surface on.
pub const SHALLOW_TILES: [(u16, u16); 2] = [(0x00A8, 0x00AB), (0x0136, 0x0137)];

/// Altitude of the sea surface.
pub const SEA_LEVEL: i32 = -5;

/// Distance of the ring of samples checked around a deep-water target.
pub const DEEP_WATER_REACH: i32 = 3;

/// The fishable tile set.
pub fn water_tiles() -> TileSet {
    TileSet::from_ranges(&WATER_TILES)
}

/// Whether the land tile at `(x, y)` is water.
pub fn is_water(world: &dyn WorldQuery, map: MapId, x: i32, y: i32) -> bool {
    world
        .land_tile(map, x, y)
        .is_some_and(|tile| water_tiles().contains(tile.id))
}

/// Whether `at` lies in open water: the target and the eight points
/// [`DEEP_WATER_REACH`] tiles away are all water.
pub fn is_deep_water(world: &dyn WorldQuery, map: MapId, at: Point3D) -> bool {
    let reach = [-DEEP_WATER_REACH, 0, DEEP_WATER_REACH];
    reach.iter().all(|&dx| {
        reach.iter().all(|&dy| {
            at.offset(dx, dy)
                .is_some_and(|p| is_water(world, map, p.x, p.y))
        })
    })
}

/// Whether a creature may surface on `tile`.
pub fn is_surfacing_tile(tile: LandTile) -> bool {
    tile.z == SEA_LEVEL && TileSet::from_ranges(&SHALLOW_TILES).contains(tile.id)
}

/// Try up to `tries` random points within `radius` of `around` and return the
/// first one a creature may surface on, at sea level.
pub fn find_surfacing_spot<R: Rng + ?Sized>(
    world: &dyn WorldQuery,
    map: MapId,
    around: Point3D,
    radius: i32,
    tries: u32,
    rng: &mut R,
) -> Option<Point3D> {
    let radius = radius.max(0);
    for _ in 0..tries {
        let dx = rng.random_range(-radius..=radius);
        let dy = rng.random_range(-radius..=radius);
        let Some(candidate) = around.offset(dx, dy) else {
            continue;
        };
        if world
            .land_tile(map, candidate.x, candidate.y)
            .is_some_and(is_surfacing_tile)
        {
            return Some(Point3D::new(candidate.x, candidate.y, SEA_LEVEL));
        }
    }
    None
}
