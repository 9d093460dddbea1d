//! Shipwreck markers and the salvage they turn a catch into.
//!
//! A fisher carrying an SOS whose wreck lies within [`SOS_RANGE`] tiles
//! always finds something, and what comes up is wreckage instead of fish.
//! Seven times in eight it is a loose piece of salvage; otherwise it is a
//! chest holding a fishing net, and the SOS is used up.

use harvest_core::host::HarvestHost;
use harvest_types::{ActorView, HarvestedItem, ItemId, ItemKind, MapId, Point3D};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::items::{
    CANDELABRA, FABLED_FISHING_NET, METAL_GOLDEN_CHEST, NAME_PROPERTY, SHIPWRECKED_ITEM, SKULL_CAP, SOS,
    SPECIAL_FISHING_NET, TRICORNE_HAT, WOODEN_CHEST,
};

/// How close to the wreck the fisher must be.
pub const SOS_RANGE: u32 = 60;

/// Hue of chests salvaged from ancient wrecks.
pub const ANCIENT_HUE: u16 = 0x0481;

/// Chest levels are clamped into this range.
pub const MIN_CHEST_LEVEL: i64 = 1;
/// Chest levels are clamped into this range.
pub const MAX_CHEST_LEVEL: i64 = 4;

const BODY_PARTS: [u16; 8] = [0x1CDD, 0x1CE5, 0x1CE0, 0x1CE8, 0x1CE1, 0x1CE9, 0x1CE2, 0x1CEC];
const BONES: [u16; 15] = [
    0x1AE0, 0x1AE1, 0x1AE2, 0x1AE3, 0x1AE4, 0x1B09, 0x1B0A, 0x1B0B, 0x1B0C, 0x1B0D, 0x1B0E, 0x1B0F,
    0x1B10, 0x1B15, 0x1B16,
];
const MISC: [u16; 9] = [0x1EB5, 0x0A2A, 0x0C1F, 0x1047, 0x1048, 0x1EB1, 0x1EB2, 0x1EB3, 0x1EB4];

/// A shipwreck message read from an item in the fisher's pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosMarker {
    /// The marker item.
    pub item: ItemId,
    /// Map of the wreck.
    pub map: MapId,
    /// Where the wreck lies.
    pub target: Point3D,
    /// Treasure level of the wreck.
    pub level: i64,
    /// Whether the wreck is ancient.
    pub ancient: bool,
}

impl SosMarker {
    /// Build a marker item.
    pub fn item(map: MapId, target: Point3D, level: i64, ancient: bool) -> HarvestedItem {
        HarvestedItem::new(SOS, 1)
            .with_property("map", map.0)
            .with_point("target", target)
            .with_property("level", level)
            .with_property("ancient", ancient)
    }

    /// Read a marker from an item, if it is one.
    pub fn from_item(item: &HarvestedItem) -> Option<Self> {
        if item.kind != SOS {
            return None;
        }
        let map = u16::try_from(item.property_i64("map")?).ok()?;
        Some(Self {
            item: item.id,
            map: MapId(map),
            target: item.property_point("target")?,
            level: item.property_i64("level").unwrap_or(MIN_CHEST_LEVEL),
            ancient: item.property_flag("ancient"),
        })
    }

    /// Whether an actor on `map` at `at` is close enough to the wreck.
    pub fn is_in_range(&self, map: MapId, at: Point3D) -> bool {
        self.map == map && at.in_range(&self.target, SOS_RANGE)
    }

    /// Treasure level of the chest this wreck yields.
    pub fn chest_level(&self) -> i64 {
        self.level.clamp(MIN_CHEST_LEVEL, MAX_CHEST_LEVEL)
    }
}

/// The first marker in the actor's pack whose wreck is in range.
pub fn marker_in_range(host: &dyn HarvestHost, actor: &ActorView) -> Option<SosMarker> {
    host.pack_items(actor.id, &SOS)
        .iter()
        .filter_map(SosMarker::from_item)
        .find(|marker| marker.is_in_range(actor.map, actor.position))
}

/// What a wreck gave up.
#[derive(Debug, Clone, PartialEq)]
pub enum Salvage {
    /// A loose piece of wreckage; the marker is kept.
    Loose(HarvestedItem),
    /// A chest with a net inside; the marker is consumed.
    Chest(HarvestedItem),
}

impl Salvage {
    /// The salvaged item.
    pub fn into_item(self) -> HarvestedItem {
        match self {
            Self::Loose(item) | Self::Chest(item) => item,
        }
    }
}

/// Draw salvage from the wreck `marker` points at.
pub fn salvage<R: Rng + ?Sized>(marker: &SosMarker, rng: &mut R) -> Salvage {
    let loose = match rng.random_range(0..8_u8) {
        0 => wreckage(&BODY_PARTS, "body part", rng),
        1 => wreckage(&BONES, "bones", rng),
        2 => graphic_in(0x0E9F, 10, "painting", rng),
        3 => graphic_in(0x13A4, 11, "pillow", rng),
        4 => graphic_in(0x0FC4, 9, "shell", rng),
        5 => {
            if rng.random_bool(0.5) {
                HarvestedItem::new(SKULL_CAP, 1)
            } else {
                HarvestedItem::new(TRICORNE_HAT, 1)
            }
        }
        6 => {
            if rng.random_range(0..=MISC.len()) == 0 {
                HarvestedItem::new(CANDELABRA, 1)
            } else {
                wreckage(&MISC, "wreckage", rng)
            }
        }
        _ => return Salvage::Chest(chest(marker, rng)),
    };
    Salvage::Loose(loose.with_property("shipwrecked", true))
}

fn wreckage<R: Rng + ?Sized>(graphics: &[u16], name: &str, rng: &mut R) -> HarvestedItem {
    let item = HarvestedItem::new(SHIPWRECKED_ITEM, 1).with_property(NAME_PROPERTY, name);
    match graphics.choose(rng) {
        Some(graphic) => item.with_property("graphic", *graphic),
        None => item,
    }
}

fn graphic_in<R: Rng + ?Sized>(first: u16, count: u16, name: &str, rng: &mut R) -> HarvestedItem {
    let graphic = first.saturating_add(rng.random_range(0..count));
    HarvestedItem::new(SHIPWRECKED_ITEM, 1)
        .with_property(NAME_PROPERTY, name)
        .with_property("graphic", graphic)
}

fn chest<R: Rng + ?Sized>(marker: &SosMarker, rng: &mut R) -> HarvestedItem {
    let kind: ItemKind = if rng.random_bool(0.5) {
        METAL_GOLDEN_CHEST
    } else {
        WOODEN_CHEST
    };
    let mut chest = HarvestedItem::new(kind, 1)
        .with_property("level", marker.chest_level())
        .with_property("locked", false);
    if marker.ancient {
        chest = chest.with_property("hue", ANCIENT_HUE);
    }
    let net = if marker.ancient {
        FABLED_FISHING_NET
    } else {
        SPECIAL_FISHING_NET
    };
    chest.push_content(HarvestedItem::new(net, 1));
    chest
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::items::is_chest;

    fn marker(level: i64, ancient: bool) -> SosMarker {
        SosMarker::from_item(&SosMarker::item(MapId(1), Point3D::new(100, 100, -5), level, ancient)).unwrap()
    }

    #[test]
    fn marker_roundtrip_through_item() {
        let m = marker(3, true);
        assert_eq!(m.map, MapId(1));
        assert_eq!(m.target, Point3D::new(100, 100, -5));
        assert_eq!(m.level, 3);
        assert!(m.ancient);
        assert!(SosMarker::from_item(&HarvestedItem::new(SHIPWRECKED_ITEM, 1)).is_none());
    }

    #[test]
    fn range_is_per_map() {
        let m = marker(1, false);
        assert!(m.is_in_range(MapId(1), Point3D::new(160, 40, 0)));
        assert!(!m.is_in_range(MapId(1), Point3D::new(161, 100, 0)));
        assert!(!m.is_in_range(MapId(2), Point3D::new(100, 100, 0)));
    }

    #[test]
    fn chest_level_is_clamped() {
        assert_eq!(marker(0, false).chest_level(), 1);
        assert_eq!(marker(9, false).chest_level(), 4);
    }

    #[test]
    fn salvage_mixes_loose_items_and_chests() {
        let mut rng = StdRng::seed_from_u64(21);
        let m = marker(2, false);
        let (mut loose, mut chests) = (0_u32, 0_u32);
        for _ in 0..400 {
            match salvage(&m, &mut rng) {
                Salvage::Loose(item) => {
                    assert!(item.property_flag("shipwrecked"));
                    assert!(!is_chest(&item.kind));
                    loose = loose.saturating_add(1);
                }
                Salvage::Chest(item) => {
                    assert!(is_chest(&item.kind));
                    assert_eq!(item.property_i64("level"), Some(2));
                    let net = item.contents.first().unwrap();
                    assert_eq!(net.kind, SPECIAL_FISHING_NET);
                    assert!(item.property_i64("hue").is_none());
                    chests = chests.saturating_add(1);
                }
            }
        }
        // One case in eight is a chest.
        assert!(chests > 20 && chests < 90, "chests = {chests}");
        assert!(loose > chests);
    }

    #[test]
    fn ancient_chests_hold_fabled_nets() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = marker(4, true);
        let chest = std::iter::repeat_with(|| salvage(&m, &mut rng))
            .find_map(|s| match s {
                Salvage::Chest(item) => Some(item),
                Salvage::Loose(_) => None,
            })
            .unwrap();
        assert_eq!(chest.property_i64("hue"), Some(i64::from(ANCIENT_HUE)));
        assert_eq!(chest.contents.first().unwrap().kind, FABLED_FISHING_NET);
    }
}
