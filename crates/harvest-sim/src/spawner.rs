//! Coast construction and fisher spawning.
//!
//! At simulation start the spawner lays out a single coastal map (a strip of
//! sand along the west edge, open sea everywhere else) and places fishers on
//! it: some on the shoreline casting into the shallows, some on boats out in
//! deep water. Each fisher gets a pole, a skill reading, and a fixed list of
//! targets the scripted decision source cycles through.

use harvest_core::memory::MemoryHost;
use harvest_fishing::FISHING_POLE;
use harvest_fishing::SosMarker;
use harvest_fishing::discipline::PEARL_OBJECTIVE;
use harvest_fishing::salvage::{MAX_CHEST_LEVEL, MIN_CHEST_LEVEL, SOS_RANGE};
use harvest_fishing::water::SEA_LEVEL;
use harvest_types::{ActorId, ActorView, ItemId, MapId, Point3D, SkillValue};
use harvest_world::{LandTile, TileGrid, WorldError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::info;

use crate::error::SimError;

/// The map every fisher is placed on.
pub const COAST_MAP: MapId = MapId(1);

const SAND: LandTile = LandTile::new(0x0016, 0);
const SEA: LandTile = LandTile::new(0x00A8, SEA_LEVEL);

/// Skill consulted for fishing.
const FISHING_SKILL: &str = "fishing";

/// Rainbow pearls a pearl hunter is asked for.
const PEARL_TARGET: u32 = 5;

/// Distance between a boat and each of its four targets.
const BOAT_REACH: i32 = 3;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Layout of the coastal map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoastConfig {
    /// Map width in tiles.
    #[serde(default = "default_coast_width")]
    pub width: u32,

    /// Map height in tiles.
    #[serde(default = "default_coast_height")]
    pub height: u32,

    /// Width of the sand strip along the west edge.
    #[serde(default = "default_shore_width")]
    pub shore_width: u32,
}

impl Default for CoastConfig {
    fn default() -> Self {
        Self {
            width: default_coast_width(),
            height: default_coast_height(),
            shore_width: default_shore_width(),
        }
    }
}

/// The `fishers` section of `harvest-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnerConfig {
    /// Fishers standing on the shoreline.
    #[serde(default = "default_shore_fishers")]
    pub shore_fishers: u32,

    /// Fishers on boats in open water.
    #[serde(default = "default_boat_fishers")]
    pub boat_fishers: u32,

    /// Lowest starting fishing skill.
    #[serde(default = "default_min_skill")]
    pub min_skill: f64,

    /// Highest starting fishing skill.
    #[serde(default = "default_max_skill")]
    pub max_skill: f64,

    /// Items each pack holds.
    #[serde(default = "default_pack_capacity")]
    pub pack_capacity: usize,

    /// Chance a fisher starts with a shipwreck message near their spot.
    #[serde(default = "default_sos_chance")]
    pub sos_chance: f64,

    /// Shore fishers that start on a pearl hunt.
    #[serde(default = "default_pearl_hunters")]
    pub pearl_hunters: u32,

    /// Map layout.
    #[serde(default)]
    pub coast: CoastConfig,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            shore_fishers: default_shore_fishers(),
            boat_fishers: default_boat_fishers(),
            min_skill: default_min_skill(),
            max_skill: default_max_skill(),
            pack_capacity: default_pack_capacity(),
            sos_chance: default_sos_chance(),
            pearl_hunters: default_pearl_hunters(),
            coast: CoastConfig::default(),
        }
    }
}

impl SpawnerConfig {
    /// Check the numbers make sense together.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.min_skill.is_finite() && self.max_skill.is_finite()) || self.min_skill > self.max_skill {
            return Err(SimError::Spawner {
                message: format!("invalid skill range {}..={}", self.min_skill, self.max_skill),
            });
        }
        if !(0.0..=1.0).contains(&self.sos_chance) {
            return Err(SimError::Spawner {
                message: format!("sos_chance {} is not a probability", self.sos_chance),
            });
        }
        let open_water = self.coast.width.saturating_sub(self.coast.shore_width);
        if self.coast.shore_width == 0 || open_water < 16 {
            return Err(SimError::Spawner {
                message: format!(
                    "coast of width {} leaves too little sea past a {}-tile shore",
                    self.coast.width, self.coast.shore_width
                ),
            });
        }
        if self.fisher_count() == 0 {
            return Err(SimError::Spawner {
                message: String::from("no fishers configured"),
            });
        }
        Ok(())
    }

    /// Total fishers spawned.
    pub const fn fisher_count(&self) -> u32 {
        self.shore_fishers.saturating_add(self.boat_fishers)
    }
}

const fn default_coast_width() -> u32 {
    96
}

const fn default_coast_height() -> u32 {
    96
}

const fn default_shore_width() -> u32 {
    12
}

const fn default_shore_fishers() -> u32 {
    4
}

const fn default_boat_fishers() -> u32 {
    2
}

const fn default_min_skill() -> f64 {
    40.0
}

const fn default_max_skill() -> f64 {
    100.0
}

const fn default_pack_capacity() -> usize {
    125
}

const fn default_sos_chance() -> f64 {
    0.25
}

const fn default_pearl_hunters() -> u32 {
    1
}

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Names handed out in order; later fishers get a numeric suffix.
const NAME_POOL: &[&str] = &[
    "Mirela", "Tomas", "Brin", "Odile", "Corwin", "Yseult", "Pell", "Maren", "Hale", "Sorcha",
    "Drust", "Ailis", "Gawen", "Nessa", "Ruan", "Tegan",
];

fn fisher_name(index: usize) -> String {
    let len = NAME_POOL.len();
    let base = index
        .checked_rem(len)
        .and_then(|i| NAME_POOL.get(i))
        .copied()
        .unwrap_or("Fisher");
    match index.checked_div(len) {
        Some(0) | None => base.to_owned(),
        Some(round) => format!("{base} {}", round.saturating_add(1)),
    }
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// A fisher placed on the coast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedFisher {
    /// The fisher.
    pub actor: ActorId,
    /// Their fishing pole.
    pub tool: ItemId,
    /// Display name.
    pub name: String,
    /// Targets cycled through by the decision source.
    pub targets: Vec<Point3D>,
    /// Whether the fisher is on a boat.
    pub on_boat: bool,
    /// Whether they carry a shipwreck message.
    pub has_sos: bool,
}

/// Build the coastal map.
pub fn build_coast(coast: &CoastConfig) -> Result<TileGrid, WorldError> {
    let mut grid = TileGrid::new();
    grid.add_map(COAST_MAP, coast.width, coast.height, SEA)?;
    let shore_edge = to_coord(coast.shore_width)?.saturating_sub(1);
    let bottom = to_coord(coast.height)?.saturating_sub(1);
    let _ = grid.fill_rect(COAST_MAP, (0, 0), (shore_edge, bottom), SAND)?;
    Ok(grid)
}

fn to_coord(value: u32) -> Result<i32, WorldError> {
    i32::try_from(value).map_err(|_| WorldError::ArithmeticOverflow)
}

/// Place every configured fisher into `host`.
pub fn spawn_fishers(config: &SpawnerConfig, host: &mut MemoryHost, seed: u64) -> Result<Vec<SpawnedFisher>, SimError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let coast = &config.coast;
    let shore_edge = to_coord(coast.shore_width)?.saturating_sub(1);
    let height = to_coord(coast.height)?;
    let open_water = coast.width.saturating_sub(coast.shore_width);
    let boat_x = to_coord(coast.shore_width.saturating_add(open_water.checked_div(2).unwrap_or(0)))?;

    let mut fishers = Vec::new();
    for slot in 0..config.shore_fishers {
        let y = spread(slot, config.shore_fishers, height);
        let position = Point3D::new(shore_edge, y, SAND.z);
        let targets = (1..=3)
            .map(|dx| Point3D::new(shore_edge.saturating_add(dx), y, SEA_LEVEL))
            .collect();
        let hunting = slot < config.pearl_hunters;
        fishers.push(place(config, host, &mut rng, fishers.len(), position, targets, false, hunting)?);
    }
    for slot in 0..config.boat_fishers {
        let y = spread(slot, config.boat_fishers, height);
        let position = Point3D::new(boat_x, y, SEA_LEVEL);
        let targets = [(BOAT_REACH, 0), (0, BOAT_REACH), (BOAT_REACH.saturating_neg(), 0), (0, BOAT_REACH.saturating_neg())]
            .into_iter()
            .filter_map(|(dx, dy)| position.offset(dx, dy))
            .collect();
        fishers.push(place(config, host, &mut rng, fishers.len(), position, targets, true, false)?);
    }

    info!(
        shore = config.shore_fishers,
        boats = config.boat_fishers,
        with_sos = fishers.iter().filter(|f| f.has_sos).count(),
        pearl_hunters = config.pearl_hunters.min(config.shore_fishers),
        "Fishers spawned"
    );
    Ok(fishers)
}

/// Rows kept clear at the top and bottom of the coast.
const ROW_MARGIN: i32 = 8;

/// Evenly spaced rows, away from the map's top and bottom edges.
fn spread(slot: u32, count: u32, height: i32) -> i32 {
    let margin = ROW_MARGIN;
    let usable = height.saturating_sub(margin.saturating_mul(2)).max(1);
    let count = i32::try_from(count.max(1)).unwrap_or(i32::MAX);
    let slot = i32::try_from(slot).unwrap_or(0);
    let step = usable.checked_div(count).unwrap_or(1).max(1);
    margin.saturating_add(slot.saturating_mul(step)).min(height.saturating_sub(1))
}

#[allow(clippy::too_many_arguments)]
fn place(
    config: &SpawnerConfig,
    host: &mut MemoryHost,
    rng: &mut StdRng,
    index: usize,
    position: Point3D,
    targets: Vec<Point3D>,
    on_boat: bool,
    pearl_hunter: bool,
) -> Result<SpawnedFisher, SimError> {
    let name = fisher_name(index);
    let actor = host.add_actor(ActorView {
        id: ActorId::new(),
        name: name.clone(),
        map: COAST_MAP,
        position,
        alive: true,
        mounted: false,
        young: rng.random_bool(0.1),
    });
    let skill = rng.random_range(config.min_skill..=config.max_skill);
    host.set_skill(actor, FISHING_SKILL, SkillValue::flat(skill));
    host.set_pack_capacity(actor, config.pack_capacity);
    let tool = host.give_tool(actor, FISHING_POLE).ok_or_else(|| SimError::Spawner {
        message: format!("fisher {actor} vanished before getting a pole"),
    })?;

    let has_sos = rng.random_bool(config.sos_chance);
    if has_sos {
        let wreck_offset = i32::try_from(SOS_RANGE / 2).unwrap_or(0);
        let wreck = position
            .offset(wreck_offset, 0)
            .map_or(position, |p| Point3D::new(p.x, p.y, SEA_LEVEL));
        let level = rng.random_range(MIN_CHEST_LEVEL..=MAX_CHEST_LEVEL);
        host.give_item(actor, SosMarker::item(COAST_MAP, wreck, level, rng.random_bool(0.1)));
    }
    if pearl_hunter {
        host.set_objective(actor, PEARL_OBJECTIVE, PEARL_TARGET);
    }

    info!(
        actor = %actor,
        name = %name,
        skill,
        at = %position,
        on_boat,
        has_sos,
        pearl_hunter,
        "Spawned fisher"
    );
    Ok(SpawnedFisher {
        actor,
        tool,
        name,
        targets,
        on_boat,
        has_sos,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use harvest_core::host::{ActorHost, HarvestHost};
    use harvest_fishing::items::SOS;
    use harvest_fishing::water::{is_deep_water, is_water};
    use harvest_world::WorldQuery;

    use super::*;

    fn spawned(config: &SpawnerConfig) -> (TileGrid, MemoryHost, Vec<SpawnedFisher>) {
        let grid = build_coast(&config.coast).unwrap();
        let mut host = MemoryHost::new();
        let fishers = spawn_fishers(config, &mut host, 42).unwrap();
        (grid, host, fishers)
    }

    #[test]
    fn spawns_configured_count() {
        let config = SpawnerConfig::default();
        let (_, host, fishers) = spawned(&config);
        assert_eq!(fishers.len(), 6);
        assert_eq!(fishers.iter().filter(|f| f.on_boat).count(), 2);
        assert_eq!(host.actor_ids().len(), 6);
    }

    #[test]
    fn rows_are_spread_inside_the_margins() {
        let rows: Vec<i32> = (0..4).map(|slot| spread(slot, 4, 96)).collect();
        assert_eq!(rows, vec![8, 28, 48, 68]);
        assert_eq!(spread(0, 0, 96), ROW_MARGIN);
        assert_eq!(spread(3, 4, 4), 3);
    }

    #[test]
    fn names_are_unique() {
        let config = SpawnerConfig {
            shore_fishers: 30,
            ..SpawnerConfig::default()
        };
        let (_, _, fishers) = spawned(&config);
        let names: BTreeSet<&str> = fishers.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names.len(), 32);
    }

    #[test]
    fn shore_fishers_stand_on_sand_and_cast_into_water() {
        let config = SpawnerConfig::default();
        let (grid, host, fishers) = spawned(&config);
        for fisher in fishers.iter().filter(|f| !f.on_boat) {
            let view = host.actor(fisher.actor).unwrap();
            let ground = grid.land_tile(COAST_MAP, view.position.x, view.position.y).unwrap();
            assert_eq!(ground, SAND);
            assert_eq!(fisher.targets.len(), 3);
            for target in &fisher.targets {
                assert!(is_water(&grid, COAST_MAP, target.x, target.y));
                assert!(view.position.in_range(target, 4));
                assert!(!is_deep_water(&grid, COAST_MAP, *target));
            }
        }
    }

    #[test]
    fn boats_fish_deep_water() {
        let config = SpawnerConfig::default();
        let (grid, host, fishers) = spawned(&config);
        for fisher in fishers.iter().filter(|f| f.on_boat) {
            let view = host.actor(fisher.actor).unwrap();
            assert_eq!(fisher.targets.len(), 4);
            for target in &fisher.targets {
                assert!(view.position.in_range(target, 4));
                assert!(is_deep_water(&grid, COAST_MAP, *target));
            }
        }
    }

    #[test]
    fn skills_and_poles_are_assigned() {
        let config = SpawnerConfig {
            min_skill: 70.0,
            max_skill: 80.0,
            ..SpawnerConfig::default()
        };
        let (_, host, fishers) = spawned(&config);
        for fisher in &fishers {
            let skill = host.skill(fisher.actor, FISHING_SKILL);
            assert!((70.0..=80.0).contains(&skill.value));
            assert!(host.tool(fisher.actor, fisher.tool).is_some());
        }
    }

    #[test]
    fn sos_markers_point_at_nearby_wrecks() {
        let config = SpawnerConfig {
            sos_chance: 1.0,
            ..SpawnerConfig::default()
        };
        let (_, host, fishers) = spawned(&config);
        for fisher in &fishers {
            assert!(fisher.has_sos);
            let view = host.actor(fisher.actor).unwrap();
            let markers = host.pack_items(fisher.actor, &SOS);
            let marker = SosMarker::from_item(markers.first().unwrap()).unwrap();
            assert!(marker.is_in_range(view.map, view.position));
        }
    }

    #[test]
    fn pearl_hunters_get_the_objective() {
        let config = SpawnerConfig {
            pearl_hunters: 2,
            ..SpawnerConfig::default()
        };
        let (_, host, fishers) = spawned(&config);
        let hunters = fishers
            .iter()
            .filter(|f| host.quest_objective(f.actor, PEARL_OBJECTIVE).is_some())
            .count();
        assert_eq!(hunters, 2);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut host = MemoryHost::new();
        let inverted = SpawnerConfig {
            min_skill: 90.0,
            max_skill: 10.0,
            ..SpawnerConfig::default()
        };
        assert!(spawn_fishers(&inverted, &mut host, 1).is_err());

        let empty = SpawnerConfig {
            shore_fishers: 0,
            boat_fishers: 0,
            ..SpawnerConfig::default()
        };
        assert!(spawn_fishers(&empty, &mut host, 1).is_err());

        let narrow = SpawnerConfig {
            coast: CoastConfig {
                width: 20,
                height: 20,
                shore_width: 12,
            },
            ..SpawnerConfig::default()
        };
        assert!(spawn_fishers(&narrow, &mut host, 1).is_err());
        assert!(host.actor_ids().is_empty());
    }

    #[test]
    fn config_section_parses() {
        let yaml = "shore_fishers: 3\nboat_fishers: 0\nsos_chance: 0.5\ncoast:\n  width: 64\n";
        let config: SpawnerConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.shore_fishers, 3);
        assert_eq!(config.boat_fishers, 0);
        assert_eq!(config.coast.width, 64);
        assert_eq!(config.coast.height, 96);
        assert_eq!(config.pearl_hunters, 1);
    }
}
