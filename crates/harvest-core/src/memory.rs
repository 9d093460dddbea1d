//! In-memory host used by tests and the headless simulation.
//!
//! [`MemoryHost`] implements every collaborator trait over plain maps and
//! vectors, and records what the engine asked of it (notices, effects,
//! ground drops, spawned creatures) so callers can inspect the results.

use std::collections::BTreeMap;

use harvest_types::{
    ActorId, ActorView, HarvestedItem, ItemId, ItemKind, MapId, Notice, Point3D, SkillValue, Tool,
    ToolKind,
};
use tracing::debug;

use crate::host::{ActorHost, CreatureSpawn, EffectSink, MessageSink, QuestProgress};

/// Skill gained per successful check whose chance was uncertain.
pub const DEFAULT_SKILL_GAIN: f64 = 0.1;

/// Skill values never grow past this.
pub const DEFAULT_SKILL_CAP: f64 = 100.0;

/// Default number of items a pack holds.
pub const DEFAULT_PACK_CAPACITY: usize = 125;

/// Mutable state of one in-memory actor.
#[derive(Debug, Clone)]
pub struct MemoryActor {
    /// Snapshot returned by [`ActorHost::actor`].
    pub view: ActorView,
    /// Skill readings by name.
    pub skills: BTreeMap<String, SkillValue>,
    /// Tools held.
    pub tools: Vec<Tool>,
    /// Pack contents.
    pub pack: Vec<HarvestedItem>,
    /// Maximum number of items in the pack.
    pub pack_capacity: usize,
    /// Quest objectives by name.
    pub objectives: BTreeMap<String, QuestProgress>,
    /// Whether notices reach the actor.
    pub reachable: bool,
    /// How many times the actor was revealed.
    pub reveals: u32,
}

impl MemoryActor {
    /// A reachable actor with an empty pack and no skills.
    pub fn new(view: ActorView) -> Self {
        Self {
            view,
            skills: BTreeMap::new(),
            tools: Vec::new(),
            pack: Vec::new(),
            pack_capacity: DEFAULT_PACK_CAPACITY,
            objectives: BTreeMap::new(),
            reachable: true,
            reveals: 0,
        }
    }
}

/// A cue recorded by the [`EffectSink`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectRecord {
    /// A stationary effect.
    Location {
        /// Map.
        map: MapId,
        /// Location.
        at: Point3D,
        /// Effect graphic.
        effect: u16,
    },
    /// A sound.
    Sound {
        /// Map.
        map: MapId,
        /// Location.
        at: Point3D,
        /// Sound id.
        sound: u16,
    },
    /// An actor animation.
    Animate {
        /// The animated actor.
        actor: ActorId,
        /// Action id.
        action: u16,
    },
}

/// An item lying on the ground.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundItem {
    /// Map.
    pub map: MapId,
    /// Location.
    pub at: Point3D,
    /// The item.
    pub item: HarvestedItem,
}

/// Host state held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    actors: BTreeMap<ActorId, MemoryActor>,
    /// Every notice delivered, in order.
    pub messages: Vec<(ActorId, Notice)>,
    /// Every cue played, in order.
    pub effects: Vec<EffectRecord>,
    /// Items dropped on the ground.
    pub ground: Vec<GroundItem>,
    /// Creatures spawned, keyed by their new identifier.
    pub creatures: BTreeMap<ActorId, CreatureSpawn>,
    /// Skill gained per qualifying success.
    pub skill_gain: f64,
    /// Skill ceiling.
    pub skill_cap: f64,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Create an empty host with default skill gain.
    pub const fn new() -> Self {
        Self {
            actors: BTreeMap::new(),
            messages: Vec::new(),
            effects: Vec::new(),
            ground: Vec::new(),
            creatures: BTreeMap::new(),
            skill_gain: DEFAULT_SKILL_GAIN,
            skill_cap: DEFAULT_SKILL_CAP,
        }
    }

    /// Add an actor and return its identifier.
    pub fn add_actor(&mut self, view: ActorView) -> ActorId {
        let id = view.id;
        self.actors.insert(id, MemoryActor::new(view));
        id
    }

    /// Borrow an actor's state.
    pub fn actor_state(&self, actor: ActorId) -> Option<&MemoryActor> {
        self.actors.get(&actor)
    }

    /// Mutably borrow an actor's state.
    pub fn actor_state_mut(&mut self, actor: ActorId) -> Option<&mut MemoryActor> {
        self.actors.get_mut(&actor)
    }

    /// Identifiers of every actor, in order.
    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    /// Remove an actor, as on logout.
    pub fn remove_actor(&mut self, actor: ActorId) -> Option<MemoryActor> {
        self.actors.remove(&actor)
    }

    /// Set a skill reading.
    pub fn set_skill(&mut self, actor: ActorId, skill: &str, value: SkillValue) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.skills.insert(skill.to_owned(), value);
        }
    }

    /// Give the actor a new tool and return its identifier.
    pub fn give_tool(&mut self, actor: ActorId, kind: ToolKind) -> Option<ItemId> {
        let state = self.actors.get_mut(&actor)?;
        let id = ItemId::new();
        state.tools.push(Tool { id, kind });
        Some(id)
    }

    /// Put an item straight into the pack, ignoring capacity.
    pub fn give_item(&mut self, actor: ActorId, item: HarvestedItem) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.pack.push(item);
        }
    }

    /// Move an actor.
    pub fn set_position(&mut self, actor: ActorId, position: Point3D) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.view.position = position;
        }
    }

    /// Mount or dismount an actor.
    pub fn set_mounted(&mut self, actor: ActorId, mounted: bool) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.view.mounted = mounted;
        }
    }

    /// Set the pack capacity.
    pub fn set_pack_capacity(&mut self, actor: ActorId, capacity: usize) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.pack_capacity = capacity;
        }
    }

    /// Start a quest objective at zero progress.
    pub fn set_objective(&mut self, actor: ActorId, objective: &str, target: u32) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state
                .objectives
                .insert(objective.to_owned(), QuestProgress { current: 0, target });
        }
    }

    /// The actor's pack contents.
    pub fn pack(&self, actor: ActorId) -> &[HarvestedItem] {
        self.actors
            .get(&actor)
            .map(|s| s.pack.as_slice())
            .unwrap_or_default()
    }

    /// Notices delivered to `actor`, oldest first.
    pub fn notices_for(&self, actor: ActorId) -> Vec<&Notice> {
        self.messages
            .iter()
            .filter(|(to, _)| *to == actor)
            .map(|(_, notice)| notice)
            .collect()
    }

    /// The most recent notice delivered to `actor`.
    pub fn last_notice(&self, actor: ActorId) -> Option<&Notice> {
        self.messages
            .iter()
            .rev()
            .find(|(to, _)| *to == actor)
            .map(|(_, notice)| notice)
    }
}

impl ActorHost for MemoryHost {
    fn actor(&self, actor: ActorId) -> Option<ActorView> {
        self.actors.get(&actor).map(|s| s.view.clone())
    }

    fn skill(&self, actor: ActorId, skill: &str) -> SkillValue {
        self.actors
            .get(&actor)
            .and_then(|s| s.skills.get(skill).copied())
            .unwrap_or(SkillValue::flat(0.0))
    }

    fn tool(&self, actor: ActorId, tool: ItemId) -> Option<Tool> {
        self.actors
            .get(&actor)?
            .tools
            .iter()
            .find(|t| t.id == tool)
            .cloned()
    }

    fn break_tool(&mut self, actor: ActorId, tool: ItemId) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.tools.retain(|t| t.id != tool);
        }
    }

    fn record_skill_use(&mut self, actor: ActorId, skill: &str, chance: f64, success: bool) {
        if !success || chance <= 0.0 || chance >= 1.0 {
            return;
        }
        let (gain, cap) = (self.skill_gain, self.skill_cap);
        if let Some(reading) = self
            .actors
            .get_mut(&actor)
            .and_then(|s| s.skills.get_mut(skill))
        {
            reading.base = (reading.base + gain).min(cap);
            reading.value = (reading.value + gain).min(cap);
            debug!(actor = %actor, skill, base = reading.base, "Skill gain");
        }
    }

    fn add_to_pack(&mut self, actor: ActorId, item: HarvestedItem) -> Option<HarvestedItem> {
        match self.actors.get_mut(&actor) {
            Some(state) if state.pack.len() < state.pack_capacity => {
                state.pack.push(item);
                None
            }
            _ => Some(item),
        }
    }

    fn drop_at_feet(&mut self, actor: ActorId, item: HarvestedItem) {
        if let Some(state) = self.actors.get(&actor) {
            self.ground.push(GroundItem {
                map: state.view.map,
                at: state.view.position,
                item,
            });
        }
    }

    fn pack_items(&self, actor: ActorId, kind: &ItemKind) -> Vec<HarvestedItem> {
        self.actors.get(&actor).map_or_else(Vec::new, |s| {
            s.pack.iter().filter(|i| &i.kind == kind).cloned().collect()
        })
    }

    fn remove_pack_item(&mut self, actor: ActorId, item: ItemId) -> Option<HarvestedItem> {
        let state = self.actors.get_mut(&actor)?;
        let index = state.pack.iter().position(|i| i.id == item)?;
        Some(state.pack.remove(index))
    }

    fn spawn_creature(&mut self, spawn: CreatureSpawn) -> ActorId {
        let id = ActorId::new();
        debug!(creature = %id, kind = %spawn.kind, at = %spawn.at, "Creature spawned");
        self.creatures.insert(id, spawn);
        id
    }

    fn quest_objective(&self, actor: ActorId, objective: &str) -> Option<QuestProgress> {
        self.actors.get(&actor)?.objectives.get(objective).copied()
    }

    fn advance_objective(&mut self, actor: ActorId, objective: &str) {
        if let Some(progress) = self
            .actors
            .get_mut(&actor)
            .and_then(|s| s.objectives.get_mut(objective))
        {
            progress.current = progress.current.saturating_add(1);
        }
    }

    fn reveal(&mut self, actor: ActorId) {
        if let Some(state) = self.actors.get_mut(&actor) {
            state.reveals = state.reveals.saturating_add(1);
        }
    }
}

impl MessageSink for MemoryHost {
    fn send(&mut self, actor: ActorId, notice: Notice) -> bool {
        let reachable = self.actors.get(&actor).is_some_and(|s| s.reachable);
        if reachable {
            self.messages.push((actor, notice));
        }
        reachable
    }
}

impl EffectSink for MemoryHost {
    fn location_effect(&mut self, map: MapId, at: Point3D, effect: u16, _speed: u8, _duration: u8) {
        self.effects.push(EffectRecord::Location { map, at, effect });
    }

    fn sound(&mut self, map: MapId, at: Point3D, sound: u16) {
        self.effects.push(EffectRecord::Sound { map, at, sound });
    }

    fn animate(&mut self, actor: ActorId, action: u16) {
        self.effects.push(EffectRecord::Animate { actor, action });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn view() -> ActorView {
        ActorView {
            id: ActorId::new(),
            name: "Tester".to_owned(),
            map: MapId(1),
            position: Point3D::new(10, 10, 0),
            alive: true,
            mounted: false,
            young: false,
        }
    }

    #[test]
    fn pack_capacity_is_enforced() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(view());
        host.set_pack_capacity(actor, 1);
        let fish = || HarvestedItem::new(ItemKind::from_static("fish"), 1);
        assert!(host.add_to_pack(actor, fish()).is_none());
        assert!(host.add_to_pack(actor, fish()).is_some());
        assert_eq!(host.pack(actor).len(), 1);
    }

    #[test]
    fn unreachable_actors_get_no_notices() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(view());
        host.actor_state_mut(actor).unwrap().reachable = false;
        assert!(!host.send(actor, Notice::literal("hi")));
        assert!(host.messages.is_empty());
        assert!(!host.send(ActorId::new(), Notice::literal("nobody")));
    }

    #[test]
    fn skill_gain_only_on_uncertain_success() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(view());
        host.set_skill(actor, "fishing", SkillValue::flat(50.0));
        host.record_skill_use(actor, "fishing", 1.0, true);
        host.record_skill_use(actor, "fishing", 0.5, false);
        assert!((host.skill(actor, "fishing").base - 50.0).abs() < f64::EPSILON);
        host.record_skill_use(actor, "fishing", 0.5, true);
        assert!((host.skill(actor, "fishing").base - 50.1).abs() < 1e-9);
    }

    #[test]
    fn tools_break() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(view());
        let tool = host.give_tool(actor, ToolKind::from_static("fishing_pole")).unwrap();
        assert!(host.tool(actor, tool).is_some());
        host.break_tool(actor, tool);
        assert!(host.tool(actor, tool).is_none());
    }

    #[test]
    fn objectives_advance() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(view());
        host.set_objective(actor, "pearls", 2);
        host.advance_objective(actor, "pearls");
        host.advance_objective(actor, "pearls");
        assert!(host.quest_objective(actor, "pearls").unwrap().is_complete());
        assert!(host.quest_objective(actor, "other").is_none());
    }

    #[test]
    fn drops_land_at_actor_position() {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(view());
        host.drop_at_feet(actor, HarvestedItem::new(ItemKind::from_static("big_fish"), 1));
        let ground = host.ground.first().unwrap();
        assert_eq!(ground.at, Point3D::new(10, 10, 0));
    }
}
