//! Decision source trait and stock implementations.
//!
//! Once per tick the runner asks a [`DecisionSource`] which actors want to
//! start harvesting. The trait abstracts where those choices come from: a
//! player session, a scripted bot, or a test stub.
//!
//! - [`StubDecisionSource`] never asks for anything.
//! - [`ScriptedDecisionSource`] keeps every assigned actor busy, cycling
//!   through a fixed list of targets whenever the actor is idle.

use std::collections::BTreeMap;

use harvest_types::{ActorId, ItemId, MapId, Point3D};

use crate::engine::{DisciplineId, HarvestEngine, HarvestRequest};
use crate::host::ActorHost;

/// Errors that can occur while collecting decisions.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// An internal error in the decision source.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A harvest the runner should try to start this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedHarvest {
    /// The discipline to use.
    pub discipline: DisciplineId,
    /// The request to pass to [`HarvestEngine::begin`].
    pub request: HarvestRequest,
}

/// A source of harvest decisions.
pub trait DecisionSource {
    /// Collect the harvests to start on `tick`.
    ///
    /// The engine and host are read-only here; the runner starts the
    /// returned requests in order.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the decision process fails entirely.
    fn collect_requests(
        &mut self,
        tick: u64,
        engine: &HarvestEngine,
        host: &dyn ActorHost,
    ) -> Result<Vec<PlannedHarvest>, DecisionError>;
}

/// A decision source that never starts anything.
#[derive(Debug, Clone, Default)]
pub struct StubDecisionSource;

impl StubDecisionSource {
    /// Create a new stub decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for StubDecisionSource {
    fn collect_requests(
        &mut self,
        _tick: u64,
        _engine: &HarvestEngine,
        _host: &dyn ActorHost,
    ) -> Result<Vec<PlannedHarvest>, DecisionError> {
        Ok(Vec::new())
    }
}

/// What one scripted actor does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    /// Discipline used for every attempt.
    pub discipline: DisciplineId,
    /// Tool used for every attempt.
    pub tool: ItemId,
    /// Map of the targets.
    pub map: MapId,
    /// Targets, tried in order and then from the top again.
    pub targets: Vec<Point3D>,
    next: usize,
}

impl Routine {
    /// A routine starting at the first target.
    pub const fn new(discipline: DisciplineId, tool: ItemId, map: MapId, targets: Vec<Point3D>) -> Self {
        Self {
            discipline,
            tool,
            map,
            targets,
            next: 0,
        }
    }

    fn next_target(&mut self) -> Option<Point3D> {
        let target = self.targets.get(self.next).copied()?;
        self.next = self.next.saturating_add(1);
        if self.next >= self.targets.len() {
            self.next = 0;
        }
        Some(target)
    }
}

/// Keeps assigned actors harvesting whenever they are idle.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisionSource {
    routines: BTreeMap<ActorId, Routine>,
}

impl ScriptedDecisionSource {
    /// Create a source with no routines.
    pub const fn new() -> Self {
        Self {
            routines: BTreeMap::new(),
        }
    }

    /// Assign (or replace) an actor's routine.
    pub fn assign(&mut self, actor: ActorId, routine: Routine) {
        self.routines.insert(actor, routine);
    }

    /// Number of scripted actors.
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// Whether no actor is scripted.
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl DecisionSource for ScriptedDecisionSource {
    fn collect_requests(
        &mut self,
        _tick: u64,
        engine: &HarvestEngine,
        host: &dyn ActorHost,
    ) -> Result<Vec<PlannedHarvest>, DecisionError> {
        let mut planned = Vec::new();
        for (actor, routine) in &mut self.routines {
            let available = host.actor(*actor).is_some_and(|view| view.alive);
            if !available || engine.is_harvesting(*actor) {
                continue;
            }
            if let Some(target) = routine.next_target() {
                planned.push(PlannedHarvest {
                    discipline: routine.discipline,
                    request: HarvestRequest {
                        actor: *actor,
                        tool: routine.tool,
                        map: routine.map,
                        target,
                    },
                });
            }
        }
        Ok(planned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_types::{ActorView, ToolKind};

    use super::*;
    use crate::config::EngineConfig;
    use crate::memory::MemoryHost;

    fn host_with_actor() -> (MemoryHost, ActorId, ItemId) {
        let mut host = MemoryHost::new();
        let actor = host.add_actor(ActorView {
            id: ActorId::new(),
            name: "Scripted".to_owned(),
            map: MapId(1),
            position: Point3D::new(0, 0, 0),
            alive: true,
            mounted: false,
            young: false,
        });
        let tool = host.give_tool(actor, ToolKind::from_static("basket")).unwrap();
        (host, actor, tool)
    }

    #[test]
    fn stub_returns_nothing() {
        let (host, _, _) = host_with_actor();
        let engine = HarvestEngine::new(&EngineConfig::default(), 1);
        let mut source = StubDecisionSource::new();
        assert!(source.collect_requests(0, &engine, &host).unwrap().is_empty());
    }

    #[test]
    fn scripted_cycles_targets() {
        let (host, actor, tool) = host_with_actor();
        let engine = HarvestEngine::new(&EngineConfig::default(), 1);
        let mut source = ScriptedDecisionSource::new();
        let targets = vec![Point3D::new(1, 0, 0), Point3D::new(0, 1, 0)];
        source.assign(actor, Routine::new(DisciplineId::default(), tool, MapId(1), targets));

        let picks: Vec<Point3D> = (0..3)
            .map(|tick| source.collect_requests(tick, &engine, &host).unwrap())
            .map(|planned| planned.first().unwrap().request.target)
            .collect();
        assert_eq!(
            picks,
            vec![Point3D::new(1, 0, 0), Point3D::new(0, 1, 0), Point3D::new(1, 0, 0)]
        );
    }

    #[test]
    fn scripted_skips_absent_and_dead_actors() {
        let (mut host, actor, tool) = host_with_actor();
        let engine = HarvestEngine::new(&EngineConfig::default(), 1);
        let mut source = ScriptedDecisionSource::new();
        source.assign(
            actor,
            Routine::new(DisciplineId::default(), tool, MapId(1), vec![Point3D::new(1, 1, 0)]),
        );
        source.assign(
            ActorId::new(),
            Routine::new(DisciplineId::default(), tool, MapId(1), vec![Point3D::new(1, 1, 0)]),
        );
        assert_eq!(source.collect_requests(0, &engine, &host).unwrap().len(), 1);

        host.actor_state_mut(actor).unwrap().view.alive = false;
        assert!(source.collect_requests(1, &engine, &host).unwrap().is_empty());
    }
}
