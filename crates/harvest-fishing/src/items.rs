//! Item and tool kinds produced or consumed by fishing, and how each is
//! named in success notices.

use harvest_types::{ItemKind, ToolKind};

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// The only accepted tool.
pub const FISHING_POLE: ToolKind = ToolKind::from_static("fishing_pole");

// ---------------------------------------------------------------------------
// Catch
// ---------------------------------------------------------------------------

/// The ordinary catch.
pub const FISH: ItemKind = ItemKind::from_static("fish");
/// A trophy fish, stamped with whoever landed it.
pub const BIG_FISH: ItemKind = ItemKind::from_static("big_fish");
/// Rare fish.
pub const PRIZED_FISH: ItemKind = ItemKind::from_static("prized_fish");
/// Rare fish.
pub const WONDROUS_FISH: ItemKind = ItemKind::from_static("wondrous_fish");
/// Rare fish.
pub const TRULY_RARE_FISH: ItemKind = ItemKind::from_static("truly_rare_fish");
/// Rare fish.
pub const PECULIAR_FISH: ItemKind = ItemKind::from_static("peculiar_fish");
/// Footwear pulled from the water.
pub const BOOTS: ItemKind = ItemKind::from_static("boots");
/// Footwear pulled from the water.
pub const SHOES: ItemKind = ItemKind::from_static("shoes");
/// Footwear pulled from the water.
pub const SANDALS: ItemKind = ItemKind::from_static("sandals");
/// Footwear pulled from the water.
pub const THIGH_BOOTS: ItemKind = ItemKind::from_static("thigh_boots");
/// A deep-water net.
pub const SPECIAL_FISHING_NET: ItemKind = ItemKind::from_static("special_fishing_net");
/// The net found in chests salvaged from ancient wrecks.
pub const FABLED_FISHING_NET: ItemKind = ItemKind::from_static("fabled_fishing_net");
/// A sodden treasure map.
pub const TREASURE_MAP: ItemKind = ItemKind::from_static("treasure_map");
/// A bottle holding a shipwreck message.
pub const MESSAGE_IN_A_BOTTLE: ItemKind = ItemKind::from_static("message_in_a_bottle");
/// Bonus resource for skilled fishers.
pub const WHITE_PEARL: ItemKind = ItemKind::from_static("white_pearl");

// ---------------------------------------------------------------------------
// Shipwrecks
// ---------------------------------------------------------------------------

/// A shipwreck message pointing at a wreck site.
pub const SOS: ItemKind = ItemKind::from_static("sos");
/// Loose wreckage identified by its graphic.
pub const SHIPWRECKED_ITEM: ItemKind = ItemKind::from_static("shipwrecked_item");
/// Salvaged hat.
pub const SKULL_CAP: ItemKind = ItemKind::from_static("skull_cap");
/// Salvaged hat.
pub const TRICORNE_HAT: ItemKind = ItemKind::from_static("tricorne_hat");
/// Salvaged candelabra.
pub const CANDELABRA: ItemKind = ItemKind::from_static("candelabra");
/// Salvage chest.
pub const METAL_GOLDEN_CHEST: ItemKind = ItemKind::from_static("metal_golden_chest");
/// Salvage chest.
pub const WOODEN_CHEST: ItemKind = ItemKind::from_static("wooden_chest");

/// Property holding a display name on items that carry their own.
pub const NAME_PROPERTY: &str = "name";

/// One of the four rare fish.
pub fn is_magic_fish(kind: &ItemKind) -> bool {
    [&PRIZED_FISH, &WONDROUS_FISH, &TRULY_RARE_FISH, &PECULIAR_FISH].contains(&kind)
}

/// Boots, shoes, sandals, or thigh boots.
pub fn is_footwear(kind: &ItemKind) -> bool {
    [&BOOTS, &SHOES, &SANDALS, &THIGH_BOOTS].contains(&kind)
}

/// A salvage chest.
pub fn is_chest(kind: &ItemKind) -> bool {
    kind == &METAL_GOLDEN_CHEST || kind == &WOODEN_CHEST
}

/// Catches a sea serpent takes instead of the fisher.
pub fn attracts_serpent(kind: &ItemKind) -> bool {
    kind == &TREASURE_MAP || kind == &MESSAGE_IN_A_BOTTLE || kind == &SPECIAL_FISHING_NET
}

/// Catches too heavy for the pack, left at the fisher's feet when it is full.
pub fn is_heavy(kind: &ItemKind) -> bool {
    kind == &BIG_FISH || is_chest(kind)
}

/// Readable name for a kind: underscores become spaces.
pub fn plain_name(kind: &ItemKind) -> String {
    kind.as_str().replace('_', " ")
}

/// Prefix `name` with the right indefinite article.
pub fn with_article(name: &str) -> String {
    let vowel = name
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'));
    if vowel {
        format!("an {name}")
    } else {
        format!("a {name}")
    }
}
