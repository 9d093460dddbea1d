//! Collaborator interfaces the engine and disciplines consume.
//!
//! The engine owns no actors, inventories, network sessions, or effect
//! channels. Everything it needs from the host server comes through three
//! narrow traits:
//!
//! - [`ActorHost`] -- actor snapshots, skills, tools, inventory, creature
//!   spawning, and quest objectives.
//! - [`MessageSink`] -- text notices to an actor.
//! - [`EffectSink`] -- fire-and-forget visual and sound cues.
//!
//! [`HarvestHost`] bundles the three so hooks can take a single
//! `&mut dyn HarvestHost`.

use harvest_types::{
    ActorId, ActorView, HarvestedItem, ItemId, ItemKind, MapId, Notice, Point3D, SkillValue, Tool,
};
use serde::{Deserialize, Serialize};

/// Progress on a quest objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    /// Units collected so far.
    pub current: u32,
    /// Units required to complete the objective.
    pub target: u32,
}

impl QuestProgress {
    /// Whether the objective is done.
    pub const fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

/// A creature to place in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureSpawn {
    /// Creature type name.
    pub kind: String,
    /// Map to spawn on.
    pub map: MapId,
    /// Spawn location; also the creature's home.
    pub at: Point3D,
    /// How far the creature may wander from home.
    pub home_range: u32,
    /// Items placed in the creature's pack.
    pub loot: Vec<HarvestedItem>,
}

/// Actor state and inventory owned by the host server.
pub trait ActorHost {
    /// Snapshot of an actor, or `None` if it no longer exists.
    fn actor(&self, actor: ActorId) -> Option<ActorView>;

    /// The actor's reading of `skill`. Unknown skills read as zero.
    fn skill(&self, actor: ActorId, skill: &str) -> SkillValue;

    /// The tool `tool` if the actor still holds it.
    fn tool(&self, actor: ActorId, tool: ItemId) -> Option<Tool>;

    /// Destroy a tool that broke.
    fn break_tool(&mut self, actor: ActorId, tool: ItemId);

    /// Told after every skill check so the host can apply skill gain.
    fn record_skill_use(&mut self, _actor: ActorId, _skill: &str, _chance: f64, _success: bool) {}

    /// Put `item` in the actor's pack, handing it back if it does not fit.
    fn add_to_pack(&mut self, actor: ActorId, item: HarvestedItem) -> Option<HarvestedItem>;

    /// Drop `item` on the ground where the actor stands.
    fn drop_at_feet(&mut self, actor: ActorId, item: HarvestedItem);

    /// Items of `kind` in the actor's pack.
    fn pack_items(&self, actor: ActorId, kind: &ItemKind) -> Vec<HarvestedItem>;

    /// Remove an item from the actor's pack.
    fn remove_pack_item(&mut self, actor: ActorId, item: ItemId) -> Option<HarvestedItem>;

    /// Spawn a creature and return its identifier.
    fn spawn_creature(&mut self, spawn: CreatureSpawn) -> ActorId;

    /// Progress on `objective` if the actor is on a quest that has it.
    fn quest_objective(&self, _actor: ActorId, _objective: &str) -> Option<QuestProgress> {
        None
    }

    /// Record one unit of progress on `objective`.
    fn advance_objective(&mut self, _actor: ActorId, _objective: &str) {}

    /// Make a hidden actor visible.
    fn reveal(&mut self, _actor: ActorId) {}
}

/// Text delivery to actors.
pub trait MessageSink {
    /// Send `notice` to `actor`. Returns `false` if the actor has no
    /// reachable channel; this is never an error.
    fn send(&mut self, actor: ActorId, notice: Notice) -> bool;
}

/// Visual and sound cues. Nothing is reported back.
pub trait EffectSink {
    /// Play a stationary effect at a location.
    fn location_effect(&mut self, map: MapId, at: Point3D, effect: u16, speed: u8, duration: u8);

    /// Play a sound at a location.
    fn sound(&mut self, map: MapId, at: Point3D, sound: u16);

    /// Animate an actor.
    fn animate(&mut self, actor: ActorId, action: u16);
}

/// Everything a harvest needs from the host.
pub trait HarvestHost: ActorHost + MessageSink + EffectSink {}

impl<T: ActorHost + MessageSink + EffectSink> HarvestHost for T {}
