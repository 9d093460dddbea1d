//! Sea serpents that surface with a catch the fisher never gets to keep.

use harvest_core::host::{CreatureSpawn, HarvestHost};
use harvest_types::{ActorId, ActorView, HarvestedItem, Point3D};
use harvest_world::WorldQuery;
use rand::Rng;
use tracing::debug;

use crate::water::{SEA_LEVEL, find_surfacing_spot};

/// Creature kind of the common serpent.
pub const SEA_SERPENT: &str = "sea_serpent";
/// Creature kind of the rarer, stronger serpent.
pub const DEEP_SEA_SERPENT: &str = "deep_sea_serpent";

/// Chance the serpent is a deep sea serpent.
pub const DEEP_SEA_SERPENT_CHANCE: f64 = 0.25;
/// Random placements tried before falling back to the fisher's position.
pub const SURFACING_TRIES: u32 = 20;
/// Placement search radius around the fisher.
pub const SURFACING_RADIUS: i32 = 10;
/// How far the serpent may wander from where it surfaced.
pub const HOME_RANGE: u32 = 10;

/// Spawn a serpent near `fisher` carrying `item` and return its identifier.
pub fn summon_serpent<R: Rng + ?Sized>(
    world: &dyn WorldQuery,
    host: &mut dyn HarvestHost,
    fisher: &ActorView,
    item: HarvestedItem,
    rng: &mut R,
) -> ActorId {
    let kind = if rng.random::<f64>() < DEEP_SEA_SERPENT_CHANCE {
        DEEP_SEA_SERPENT
    } else {
        SEA_SERPENT
    };
    let at = find_surfacing_spot(
        world,
        fisher.map,
        fisher.position,
        SURFACING_RADIUS,
        SURFACING_TRIES,
        rng,
    )
    .unwrap_or_else(|| Point3D::new(fisher.position.x, fisher.position.y, SEA_LEVEL));

    debug!(fisher = %fisher.id, kind, at = %at, item = %item.kind, "Serpent surfaces");
    host.spawn_creature(CreatureSpawn {
        kind: kind.to_owned(),
        map: fisher.map,
        at,
        home_range: HOME_RANGE,
        loot: vec![item],
    })
}
