//! The extension interface implemented once per harvesting discipline.
//!
//! The engine runs the attempt skeleton (validation, locking, polling, bank
//! consumption, skill checks, vein resolution) and calls into a
//! [`Discipline`] at fixed points for domain policy. Every hook has a default,
//! so a minimal discipline only supplies its [`HarvestDefinition`].
//!
//! Hooks that can fail return [`DisciplineError`]. The engine never lets such
//! an error escape: it logs it, ends the attempt as failed, and releases the
//! lock.

use harvest_types::{
    ActorId, ActorView, AttemptId, Delivery, HarvestOutcome, HarvestedItem, ItemKind, MapId,
    Notice, Point3D, SkillValue, Tool,
};
use harvest_world::{WorldError, WorldQuery};
use rand::rngs::StdRng;
use tracing::debug;

use crate::definition::{DefinitionError, HarvestDefinition};
use crate::exclusion::LockScope;
use crate::host::HarvestHost;
use crate::mutation::Mutation;
use crate::resource::ResourceDescriptor;

/// Errors raised by discipline hooks.
#[derive(Debug, thiserror::Error)]
pub enum DisciplineError {
    /// A hook could not complete.
    #[error("{hook} failed: {reason}")]
    Hook {
        /// The hook that failed.
        hook: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// A world query failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// What the engine does after a failed skill check that did not break the
/// tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// End the attempt as failed.
    Stop,
    /// Poll again, up to `max_attempts` checks in total.
    Retry {
        /// Total skill checks allowed for one attempt.
        max_attempts: u32,
    },
}

/// The fixed facts of a running attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Attempt identifier.
    pub id: AttemptId,
    /// The harvesting actor.
    pub actor: ActorId,
    /// The tool used.
    pub tool: Tool,
    /// Map of the target.
    pub map: MapId,
    /// The targeted location.
    pub target: Point3D,
    /// Engine time at which the attempt started.
    pub started_ms: u64,
}

/// Everything a hook may touch besides its own discipline.
pub struct HookContext<'a> {
    /// Terrain lookups.
    pub world: &'a dyn WorldQuery,
    /// Actors, inventory, messaging, and effects.
    pub host: &'a mut dyn HarvestHost,
    /// The engine's random source.
    pub rng: &'a mut StdRng,
    /// Current engine time.
    pub now_ms: u64,
}

/// Domain policy plugged into the harvest engine.
pub trait Discipline {
    /// The static ruleset.
    fn definition(&self) -> &HarvestDefinition;

    /// Extra startup validation beyond the definition, such as a mutation
    /// table.
    fn validate(&self) -> Result<(), DefinitionError> {
        Ok(())
    }

    /// Return a notice if `actor` may not start harvesting now.
    fn check_eligibility(
        &self,
        _actor: &ActorView,
        _ctx: &mut HookContext<'_>,
    ) -> Result<Option<Notice>, DisciplineError> {
        Ok(None)
    }

    /// The scope of the lock an attempt takes.
    fn lock_scope(&self) -> LockScope {
        LockScope::Shared
    }

    /// Notice sent when the actor already holds the lock.
    fn concurrent_notice(&self) -> Notice {
        Notice::literal("You are already doing something else.")
    }

    /// Called once the lock is held and the first poll is scheduled.
    fn on_started(&self, _attempt: &Attempt, _ctx: &mut HookContext<'_>) -> Result<(), DisciplineError> {
        Ok(())
    }

    /// Delay before [`Discipline::on_start_cue`] fires, if the discipline has
    /// a start cue.
    fn start_cue_delay_ms(&self) -> Option<u64> {
        None
    }

    /// A one-off cue shortly after the attempt starts.
    fn on_start_cue(&self, _attempt: &Attempt, _ctx: &mut HookContext<'_>) -> Result<(), DisciplineError> {
        Ok(())
    }

    /// Whether the location is productive regardless of its bank.
    fn has_private_resources(
        &self,
        _attempt: &Attempt,
        _ctx: &mut HookContext<'_>,
    ) -> Result<bool, DisciplineError> {
        Ok(false)
    }

    /// What to do after a failed check.
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Stop
    }

    /// Probability that a failed check breaks the tool.
    fn tool_break_chance(&self, _attempt: &Attempt) -> f64 {
        0.0
    }

    /// Handle the success entirely, bypassing mutation and delivery.
    ///
    /// Returns `true` when it did; the hook then sends its own notice.
    fn special_harvest(
        &self,
        _attempt: &Attempt,
        _ctx: &mut HookContext<'_>,
    ) -> Result<bool, DisciplineError> {
        Ok(false)
    }

    /// Possibly swap the resolved type for a rarer one.
    fn mutate(
        &self,
        _attempt: &Attempt,
        _kind: &ItemKind,
        _skill: SkillValue,
        _ctx: &mut HookContext<'_>,
    ) -> Result<Mutation, DisciplineError> {
        Ok(Mutation::Keep)
    }

    /// Build the item for `kind`. `None` means nothing could be made.
    fn construct(
        &self,
        attempt: &Attempt,
        kind: &ItemKind,
        _ctx: &mut HookContext<'_>,
    ) -> Result<Option<HarvestedItem>, DisciplineError> {
        Ok(Some(HarvestedItem::new(kind.clone(), 1).with_origin(attempt.actor)))
    }

    /// Hand the item over.
    ///
    /// A discipline returning [`Delivery::Redirected`] has already told the
    /// actor what happened.
    fn deliver(
        &self,
        attempt: &Attempt,
        item: HarvestedItem,
        ctx: &mut HookContext<'_>,
    ) -> Result<Delivery, DisciplineError> {
        let place_at_feet = self.definition().place_at_feet_if_full;
        Ok(deliver_to_actor(ctx.host, attempt.actor, item, place_at_feet))
    }

    /// Send the success notice for a delivered item.
    fn send_success(
        &self,
        attempt: &Attempt,
        _item: &HarvestedItem,
        resource: &ResourceDescriptor,
        ctx: &mut HookContext<'_>,
    ) -> Result<(), DisciplineError> {
        notify(
            ctx.host,
            attempt.actor,
            Notice::literal(format!("You put {} in your pack.", resource.name)),
        );
        Ok(())
    }

    /// Called after the outcome notice, before the lock is released.
    fn on_finished(
        &self,
        _attempt: &Attempt,
        _outcome: HarvestOutcome,
        _ctx: &mut HookContext<'_>,
    ) -> Result<(), DisciplineError> {
        Ok(())
    }
}

/// Put `item` in the actor's pack, or at their feet if allowed.
pub fn deliver_to_actor(
    host: &mut dyn HarvestHost,
    actor: ActorId,
    item: HarvestedItem,
    place_at_feet: bool,
) -> Delivery {
    match host.add_to_pack(actor, item) {
        None => Delivery::Pack,
        Some(item) if place_at_feet => {
            host.drop_at_feet(actor, item);
            Delivery::Feet
        }
        Some(_) => Delivery::PackFull,
    }
}

/// Send `notice` to `actor`, logging when nobody is there to read it.
///
/// Returns whether the notice was delivered.
pub fn notify(host: &mut dyn HarvestHost, actor: ActorId, notice: Notice) -> bool {
    let delivered = host.send(actor, notice);
    if !delivered {
        debug!(actor = %actor, "Notice undeliverable");
    }
    delivered
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_types::{ItemKind, MapId, Point3D};

    use super::*;
    use crate::memory::MemoryHost;

    fn actor(host: &mut MemoryHost) -> ActorId {
        host.add_actor(ActorView {
            id: ActorId::new(),
            name: "Tester".to_owned(),
            map: MapId(1),
            position: Point3D::new(0, 0, 0),
            alive: true,
            mounted: false,
            young: false,
        })
    }

    #[test]
    fn notify_reports_unreachable_actors() {
        let mut host = MemoryHost::new();
        let id = actor(&mut host);
        assert!(notify(&mut host, id, Notice::literal("bite")));
        assert_eq!(host.last_notice(id), Some(&Notice::literal("bite")));

        host.actor_state_mut(id).unwrap().reachable = false;
        assert!(!notify(&mut host, id, Notice::literal("gone")));
        assert_eq!(host.last_notice(id), Some(&Notice::literal("bite")));
        assert!(!notify(&mut host, ActorId::new(), Notice::literal("nobody")));
    }

    #[test]
    fn delivery_prefers_pack() {
        let mut host = MemoryHost::new();
        let id = actor(&mut host);
        let item = HarvestedItem::new(ItemKind::from_static("fish"), 1);
        assert_eq!(deliver_to_actor(&mut host, id, item, false), Delivery::Pack);
        assert_eq!(host.pack(id).len(), 1);
    }

    #[test]
    fn full_pack_drops_or_refuses() {
        let mut host = MemoryHost::new();
        let id = actor(&mut host);
        host.set_pack_capacity(id, 0);
        let item = || HarvestedItem::new(ItemKind::from_static("fish"), 1);
        assert_eq!(deliver_to_actor(&mut host, id, item(), true), Delivery::Feet);
        assert_eq!(host.ground.len(), 1);
        assert_eq!(deliver_to_actor(&mut host, id, item(), false), Delivery::PackFull);
        assert_eq!(host.ground.len(), 1);
    }
}
