//! [`FishingDiscipline`]: the fishing policy plugged into the harvest engine.

use harvest_core::config::DisciplineOverrides;
use harvest_core::definition::{DefinitionError, HarvestDefinition};
use harvest_core::discipline::{Attempt, Discipline, DisciplineError, HookContext, deliver_to_actor, notify};
use harvest_core::exclusion::LockScope;
use harvest_core::mutation::{ContextFlags, Mutation, MutationTable};
use harvest_core::resource::ResourceDescriptor;
use harvest_types::{ActorView, Delivery, HarvestOutcome, HarvestedItem, ItemKind, Notice, SkillValue};
use rand::Rng;
use tracing::debug;

use crate::definition::{
    DEEP_WATER, MSG_ALREADY_FISHING, MSG_BIG_FISH, MSG_CAUGHT, MSG_CHEST, MSG_MOUNTED, MSG_PEARL_FOUND,
    MSG_PEARL_MISSING, MSG_PULLED_UP, MSG_PUT_IN_PACK, MSG_SERPENT, configured_definition, mutation_table,
};
use crate::items::{
    BIG_FISH, FISH, MESSAGE_IN_A_BOTTLE, NAME_PROPERTY, SPECIAL_FISHING_NET, TREASURE_MAP, attracts_serpent,
    is_chest, is_footwear, is_heavy, is_magic_fish, plain_name, with_article,
};
use crate::salvage::{Salvage, marker_in_range, salvage};
use crate::serpent::summon_serpent;
use crate::water::is_deep_water;

/// Lock scope shared by every fishing attempt.
pub const LOCK_NAME: &str = "fishing";

/// Quest objective that turns a cast into a pearl hunt.
pub const PEARL_OBJECTIVE: &str = "fish_pearls";

/// Chance a pearl hunt finds a pearl.
pub const PEARL_CHANCE: f64 = 0.5;

/// Delay before the splash of a fresh cast.
pub const SPLASH_DELAY_MS: u64 = 1_500;
/// Splash effect graphic.
pub const SPLASH_EFFECT: u16 = 0x352D;
/// Splash effect speed.
pub const SPLASH_SPEED: u8 = 16;
/// Splash effect duration.
pub const SPLASH_DURATION: u8 = 4;
/// Splash sound.
pub const SPLASH_SOUND: u16 = 0x0364;

/// Treasure map level for young fishers.
pub const YOUNG_MAP_LEVEL: i64 = 0;
/// Treasure map level for everyone else.
pub const MAP_LEVEL: i64 = 1;

/// The fishing discipline.
#[derive(Debug, Clone)]
pub struct FishingDiscipline {
    definition: HarvestDefinition,
    mutations: MutationTable,
}

impl Default for FishingDiscipline {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FishingDiscipline {
    /// Build the discipline, applying configuration overrides if given.
    pub fn new(overrides: Option<&DisciplineOverrides>) -> Self {
        Self {
            definition: configured_definition(overrides),
            mutations: mutation_table(),
        }
    }

    /// The catch substitution table.
    pub const fn mutations(&self) -> &MutationTable {
        &self.mutations
    }

    fn fisher(attempt: &Attempt, ctx: &HookContext<'_>) -> Result<ActorView, DisciplineError> {
        ctx.host.actor(attempt.actor).ok_or_else(|| DisciplineError::Hook {
            hook: "fishing",
            reason: format!("fisher {} no longer exists", attempt.actor),
        })
    }
}

impl Discipline for FishingDiscipline {
    fn definition(&self) -> &HarvestDefinition {
        &self.definition
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        self.mutations.validate()
    }

    fn check_eligibility(
        &self,
        actor: &ActorView,
        _ctx: &mut HookContext<'_>,
    ) -> Result<Option<Notice>, DisciplineError> {
        Ok(actor.mounted.then_some(Notice::localized(MSG_MOUNTED)))
    }

    fn lock_scope(&self) -> LockScope {
        LockScope::Named(LOCK_NAME)
    }

    fn concurrent_notice(&self) -> Notice {
        Notice::localized(MSG_ALREADY_FISHING)
    }

    fn start_cue_delay_ms(&self) -> Option<u64> {
        Some(SPLASH_DELAY_MS)
    }

    fn on_start_cue(&self, attempt: &Attempt, ctx: &mut HookContext<'_>) -> Result<(), DisciplineError> {
        ctx.host.reveal(attempt.actor);
        ctx.host
            .location_effect(attempt.map, attempt.target, SPLASH_EFFECT, SPLASH_SPEED, SPLASH_DURATION);
        ctx.host.sound(attempt.map, attempt.target, SPLASH_SOUND);
        Ok(())
    }

    fn has_private_resources(
        &self,
        attempt: &Attempt,
        ctx: &mut HookContext<'_>,
    ) -> Result<bool, DisciplineError> {
        let fisher = Self::fisher(attempt, ctx)?;
        Ok(marker_in_range(&*ctx.host, &fisher).is_some())
    }

    fn special_harvest(&self, attempt: &Attempt, ctx: &mut HookContext<'_>) -> Result<bool, DisciplineError> {
        let hunting = ctx
            .host
            .quest_objective(attempt.actor, PEARL_OBJECTIVE)
            .is_some_and(|progress| !progress.is_complete());
        if !hunting {
            return Ok(false);
        }
        if ctx.rng.random::<f64>() < PEARL_CHANCE {
            ctx.host.advance_objective(attempt.actor, PEARL_OBJECTIVE);
            let _ = notify(ctx.host, attempt.actor, Notice::localized(MSG_PEARL_FOUND));
        } else {
            let _ = notify(ctx.host, attempt.actor, Notice::localized(MSG_PEARL_MISSING));
        }
        Ok(true)
    }

    fn mutate(
        &self,
        attempt: &Attempt,
        _kind: &ItemKind,
        skill: SkillValue,
        ctx: &mut HookContext<'_>,
    ) -> Result<Mutation, DisciplineError> {
        let deep = is_deep_water(ctx.world, attempt.map, attempt.target);
        let flags = ContextFlags::none().with(DEEP_WATER, deep);
        Ok(self.mutations.resolve(skill, &flags, ctx.rng))
    }

    fn construct(
        &self,
        attempt: &Attempt,
        kind: &ItemKind,
        ctx: &mut HookContext<'_>,
    ) -> Result<Option<HarvestedItem>, DisciplineError> {
        let fisher = Self::fisher(attempt, ctx)?;
        let item = HarvestedItem::new(kind.clone(), 1).with_origin(attempt.actor);

        if *kind == TREASURE_MAP {
            let level = if fisher.young { YOUNG_MAP_LEVEL } else { MAP_LEVEL };
            return Ok(Some(item.with_property("level", level).with_property("map", fisher.map.0)));
        }
        if *kind == MESSAGE_IN_A_BOTTLE {
            return Ok(Some(item.with_property("map", fisher.map.0)));
        }

        if let Some(marker) = marker_in_range(&*ctx.host, &fisher) {
            let found = salvage(&marker, ctx.rng);
            if matches!(found, Salvage::Chest(_)) {
                let _ = ctx.host.remove_pack_item(attempt.actor, marker.item);
                debug!(actor = %attempt.actor, sos = %marker.item, "Shipwreck marker used up");
            }
            return Ok(Some(found.into_item().with_origin(attempt.actor)));
        }

        if *kind == BIG_FISH {
            return Ok(Some(item.with_property("fisher", fisher.name)));
        }
        Ok(Some(item))
    }

    fn deliver(
        &self,
        attempt: &Attempt,
        item: HarvestedItem,
        ctx: &mut HookContext<'_>,
    ) -> Result<Delivery, DisciplineError> {
        if attracts_serpent(&item.kind) {
            let fisher = Self::fisher(attempt, ctx)?;
            let serpent = summon_serpent(ctx.world, ctx.host, &fisher, item, ctx.rng);
            debug!(actor = %attempt.actor, serpent = %serpent, "Catch taken by a serpent");
            let _ = notify(ctx.host, attempt.actor, Notice::localized(MSG_SERPENT));
            return Ok(Delivery::Redirected);
        }
        let place_at_feet = self.definition.place_at_feet_if_full || is_heavy(&item.kind);
        Ok(deliver_to_actor(ctx.host, attempt.actor, item, place_at_feet))
    }

    fn send_success(
        &self,
        attempt: &Attempt,
        item: &HarvestedItem,
        _resource: &ResourceDescriptor,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), DisciplineError> {
        let _ = notify(ctx.host, attempt.actor, success_notice(item));
        Ok(())
    }

    fn on_finished(
        &self,
        attempt: &Attempt,
        _outcome: HarvestOutcome,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), DisciplineError> {
        ctx.host.reveal(attempt.actor);
        Ok(())
    }
}

/// The notice for a catch that reached the fisher.
pub fn success_notice(item: &HarvestedItem) -> Notice {
    let kind = &item.kind;
    if *kind == BIG_FISH {
        return Notice::localized(MSG_BIG_FISH);
    }
    if is_chest(kind) {
        return Notice::localized(MSG_CHEST);
    }
    if is_magic_fish(kind) {
        return Notice::localized_with(MSG_CAUGHT, "a mess of small fish");
    }
    if *kind == FISH || is_footwear(kind) {
        return Notice::localized_with(MSG_CAUGHT, plain_name(kind));
    }
    if *kind == TREASURE_MAP {
        return Notice::localized_with(MSG_PULLED_UP, "a sodden piece of parchment");
    }
    if *kind == MESSAGE_IN_A_BOTTLE {
        return Notice::localized_with(MSG_PULLED_UP, "a bottle, with a message in it");
    }
    if *kind == SPECIAL_FISHING_NET {
        return Notice::localized_with(MSG_PULLED_UP, "a special fishing net");
    }
    let name = item
        .property_str(NAME_PROPERTY)
        .map_or_else(|| plain_name(kind), str::to_owned);
    Notice::localized_with(MSG_PUT_IN_PACK, with_article(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{BOOTS, PECULIAR_FISH, SHIPWRECKED_ITEM, WOODEN_CHEST};

    fn notice_for(kind: ItemKind) -> Notice {
        success_notice(&HarvestedItem::new(kind, 1))
    }

    #[test]
    fn notices_by_kind() {
        assert_eq!(notice_for(BIG_FISH), Notice::localized(MSG_BIG_FISH));
        assert_eq!(notice_for(WOODEN_CHEST), Notice::localized(MSG_CHEST));
        assert_eq!(
            notice_for(PECULIAR_FISH),
            Notice::localized_with(MSG_CAUGHT, "a mess of small fish")
        );
        assert_eq!(notice_for(FISH), Notice::localized_with(MSG_CAUGHT, "fish"));
        assert_eq!(notice_for(BOOTS), Notice::localized_with(MSG_CAUGHT, "boots"));
        assert_eq!(
            notice_for(TREASURE_MAP),
            Notice::localized_with(MSG_PULLED_UP, "a sodden piece of parchment")
        );
        assert_eq!(
            notice_for(ItemKind::from_static("white_pearl")),
            Notice::localized_with(MSG_PUT_IN_PACK, "a white pearl")
        );
    }

    #[test]
    fn salvage_uses_its_own_name() {
        let item = HarvestedItem::new(SHIPWRECKED_ITEM, 1).with_property(NAME_PROPERTY, "oil painting");
        assert_eq!(
            success_notice(&item),
            Notice::localized_with(MSG_PUT_IN_PACK, "an oil painting")
        );
    }

    #[test]
    fn discipline_validates() {
        let fishing = FishingDiscipline::default();
        assert!(fishing.validate().is_ok());
        assert!(fishing.definition().validate().is_ok());
        assert_eq!(fishing.lock_scope(), LockScope::Named(LOCK_NAME));
        assert_eq!(fishing.start_cue_delay_ms(), Some(SPLASH_DELAY_MS));
        assert_eq!(fishing.mutations().entries().len(), 7);
    }
}
