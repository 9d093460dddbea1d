//! The fishing ruleset: harvest definition, mutation table, and message
//! catalog numbers.

use harvest_core::config::DisciplineOverrides;
use harvest_core::definition::{EffectCue, HarvestDefinition, HarvestMessages};
use harvest_core::mutation::{ContextFlag, MutationEntry, MutationTable};
use harvest_core::resource::{BonusResource, ResourceDescriptor, Vein};
use harvest_types::{ItemKind, Notice};
use harvest_world::{BankSizing, RespawnTrigger, RespawnWindow};

use crate::items::{
    BIG_FISH, BOOTS, FISH, FISHING_POLE, MESSAGE_IN_A_BOTTLE, PECULIAR_FISH, PRIZED_FISH, SANDALS,
    SHOES, SPECIAL_FISHING_NET, THIGH_BOOTS, TREASURE_MAP, TRULY_RARE_FISH, WHITE_PEARL,
    WONDROUS_FISH,
};
use crate::water::water_tiles;

/// Discipline name and registry key.
pub const NAME: &str = "fishing";

/// Skill consulted for every check.
pub const SKILL: &str = "fishing";

/// Set when the target and its surroundings are open water.
pub const DEEP_WATER: ContextFlag = ContextFlag("deep_water");

/// Animation played on every poll.
pub const CAST_ACTION: u16 = 12;

/// Polls spent casting before the catch is decided.
pub const CAST_POLLS: u32 = 3;

// ---------------------------------------------------------------------------
// Message catalog
// ---------------------------------------------------------------------------

/// "The fish don't seem to be biting here."
pub const MSG_NO_RESOURCES: u32 = 503_172;
/// "You fish a while, but fail to catch anything."
pub const MSG_FAIL: u32 = 503_171;
/// "You need to be closer to the water to fish!"
pub const MSG_OUT_OF_RANGE: u32 = 500_976;
/// "You do not have room in your backpack for a fish."
pub const MSG_PACK_FULL: u32 = 503_176;
/// "You broke your fishing pole."
pub const MSG_TOOL_BROKE: u32 = 503_174;
/// "You are already fishing."
pub const MSG_ALREADY_FISHING: u32 = 500_972;
/// "You can't fish while riding!"
pub const MSG_MOUNTED: u32 = 500_971;
/// "You pull a shellfish out of the water, and find a rainbow pearl inside of it."
pub const MSG_PEARL_FOUND: u32 = 1_055_086;
/// "You pull a shellfish out of the water, but it doesn't have a rainbow pearl."
pub const MSG_PEARL_MISSING: u32 = 1_055_087;
/// "Uh oh! That doesn't look like a fish!"
pub const MSG_SERPENT: u32 = 503_170;
/// "Your fishing pole bends as you pull a big fish from the depths!"
pub const MSG_BIG_FISH: u32 = 1_042_635;
/// "You pull up a heavy chest from the depths of the ocean!"
pub const MSG_CHEST: u32 = 503_175;
/// "You pull out ~1_ITEM~!"
pub const MSG_CAUGHT: u32 = 1_008_124;
/// "You pull up ~1_ITEM~!"
pub const MSG_PULLED_UP: u32 = 1_008_125;
/// "You put ~1_ITEM~ in your backpack."
pub const MSG_PUT_IN_PACK: u32 = 1_043_297;

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// The fishing definition with its built-in values.
pub fn fishing_definition() -> HarvestDefinition {
    HarvestDefinition {
        name: NAME.to_owned(),
        skill: SKILL.to_owned(),
        tool_kinds: vec![FISHING_POLE],
        tiles: water_tiles(),
        max_range: 4,
        bank: BankSizing {
            width: 8,
            height: 8,
            min_total: 5,
            max_total: 15,
        },
        respawn: RespawnWindow::from_secs(600, 1_200),
        respawn_trigger: RespawnTrigger::OnFirstHarvest,
        consumed_per_harvest: 1,
        effect_polls: CAST_POLLS,
        effect: EffectCue {
            action: Some(CAST_ACTION),
            sound: None,
        },
        messages: HarvestMessages {
            no_resources: Notice::localized(MSG_NO_RESOURCES),
            fail: Notice::localized(MSG_FAIL),
            out_of_range: Notice::localized(MSG_OUT_OF_RANGE),
            timed_out_of_range: Notice::localized(MSG_OUT_OF_RANGE),
            pack_full: Notice::localized(MSG_PACK_FULL),
            tool_broke: Notice::localized(MSG_TOOL_BROKE),
            bad_target: Notice::literal("You can't fish there."),
            bad_tool: Notice::literal("You need a fishing pole to fish."),
            cancelled: Notice::literal("You stop fishing."),
            ineligible: Notice::literal("You cannot fish right now."),
        },
        veins: vec![Vein::single(
            100.0,
            ResourceDescriptor::new(FISH, "fish", 0.0, 0.0, 100.0),
        )],
        bonus: vec![
            BonusResource::nothing(99.4),
            BonusResource {
                req_skill: 80.0,
                weight: 0.6,
                kind: Some(WHITE_PEARL),
            },
        ],
        place_at_feet_if_full: false,
    }
}

/// The fishing definition with configuration overrides applied.
pub fn configured_definition(overrides: Option<&DisciplineOverrides>) -> HarvestDefinition {
    let mut definition = fishing_definition();
    if let Some(overrides) = overrides {
        definition.apply_overrides(overrides);
    }
    definition
}

// ---------------------------------------------------------------------------
// Mutation table
// ---------------------------------------------------------------------------

/// The ordered catch substitutions.
///
/// The four deep-water rows only apply where [`DEEP_WATER`] is set. Their
/// curves are nearly flat, so a skill-100 fisher lands each about half a
/// percent of the time. The rare-fish and footwear rows fall with skill, and
/// the last row turns roughly half of a novice's catches into nothing.
pub fn mutation_table() -> MutationTable {
    let deep = |req: f64, kind: ItemKind| {
        MutationEntry::new(req, 80.0, 4080.0, vec![Some(kind)]).requiring(DEEP_WATER)
    };
    MutationTable::new(vec![
        deep(80.0, SPECIAL_FISHING_NET),
        deep(80.0, BIG_FISH),
        deep(90.0, TREASURE_MAP),
        deep(100.0, MESSAGE_IN_A_BOTTLE),
        MutationEntry::new(
            0.0,
            125.0,
            -2375.0,
            vec![
                Some(PRIZED_FISH),
                Some(WONDROUS_FISH),
                Some(TRULY_RARE_FISH),
                Some(PECULIAR_FISH),
            ],
        ),
        MutationEntry::new(
            0.0,
            105.0,
            -420.0,
            vec![Some(BOOTS), Some(SHOES), Some(SANDALS), Some(THIGH_BOOTS)],
        ),
        MutationEntry::new(0.0, 200.0, -200.0, vec![None]),
    ])
}
