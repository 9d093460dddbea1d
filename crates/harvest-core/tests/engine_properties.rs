//! Engine-wide guarantees exercised through the public API with a plain
//! gathering discipline.

#![allow(clippy::unwrap_used, clippy::panic)]

use harvest_core::config::EngineConfig;
use harvest_core::definition::{EffectCue, HarvestDefinition, HarvestMessages};
use harvest_core::discipline::{Discipline, FailurePolicy};
use harvest_core::engine::{AttemptReport, BeginOutcome, DisciplineId, HarvestEngine, HarvestRequest};
use harvest_core::exclusion::LockScope;
use harvest_core::memory::MemoryHost;
use harvest_core::resource::{ResourceDescriptor, Vein};
use harvest_types::{
    ActorId, ActorView, HarvestOutcome, ItemId, ItemKind, MapId, Notice, Point3D, SkillValue, ToolKind,
};
use harvest_world::{BankSizing, LandTile, RespawnTrigger, RespawnWindow, TileGrid, TileSet};

const MAP: MapId = MapId(1);
const BASKET: ToolKind = ToolKind::from_static("basket");
const POLL_MS: u64 = 2_000;
const TARGET: Point3D = Point3D::new(4, 4, 0);

fn definition(name: &str, min_skill: f64) -> HarvestDefinition {
    HarvestDefinition {
        name: name.to_owned(),
        skill: "gathering".to_owned(),
        tool_kinds: vec![BASKET],
        tiles: TileSet::from_ranges(&[(0x00A8, 0x00AB)]),
        max_range: 2,
        bank: BankSizing {
            width: 8,
            height: 8,
            min_total: 5,
            max_total: 5,
        },
        respawn: RespawnWindow::from_secs(60, 120),
        respawn_trigger: RespawnTrigger::OnDepletion,
        consumed_per_harvest: 1,
        effect_polls: 0,
        effect: EffectCue::default(),
        messages: HarvestMessages {
            no_resources: Notice::literal("nothing here"),
            fail: Notice::literal("you fail"),
            out_of_range: Notice::literal("too far"),
            timed_out_of_range: Notice::literal("you wandered off"),
            pack_full: Notice::literal("pack full"),
            tool_broke: Notice::literal("tool broke"),
            bad_target: Notice::literal("cannot harvest that"),
            bad_tool: Notice::literal("wrong tool"),
            cancelled: Notice::literal("you stop"),
            ineligible: Notice::literal("you cannot do that now"),
        },
        veins: vec![Vein::single(
            100.0,
            ResourceDescriptor::new(ItemKind::from_static("berries"), "berries", 0.0, min_skill, 100.0),
        )],
        bonus: Vec::new(),
        place_at_feet_if_full: false,
    }
}

struct Gathering {
    definition: HarvestDefinition,
    scope: LockScope,
    policy: FailurePolicy,
}

impl Gathering {
    fn new(name: &str) -> Self {
        Self {
            definition: definition(name, 0.0),
            scope: LockScope::Shared,
            policy: FailurePolicy::Stop,
        }
    }
}

impl Discipline for Gathering {
    fn definition(&self) -> &HarvestDefinition {
        &self.definition
    }

    fn lock_scope(&self) -> LockScope {
        self.scope
    }

    fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }
}

struct Field {
    engine: HarvestEngine,
    world: TileGrid,
    host: MemoryHost,
}

impl Field {
    fn new() -> Self {
        let mut world = TileGrid::new();
        world.add_map(MAP, 16, 16, LandTile::new(0x00A9, 0)).unwrap();
        world.set_tile(MAP, 6, 6, LandTile::new(0x0016, 0)).unwrap();
        Self {
            engine: HarvestEngine::new(&EngineConfig::default(), 11),
            world,
            host: MemoryHost::new(),
        }
    }

    fn register(&mut self, discipline: Gathering) -> DisciplineId {
        self.engine.register(Box::new(discipline)).unwrap()
    }

    fn gatherer(&mut self, name: &str, at: Point3D) -> (ActorId, ItemId) {
        let actor = self.host.add_actor(ActorView {
            id: ActorId::new(),
            name: name.to_owned(),
            map: MAP,
            position: at,
            alive: true,
            mounted: false,
            young: false,
        });
        self.host.set_skill(actor, "gathering", SkillValue::flat(100.0));
        self.host.set_pack_capacity(actor, 1_000);
        let tool = self.host.give_tool(actor, BASKET).unwrap();
        (actor, tool)
    }

    fn begin(&mut self, discipline: DisciplineId, who: (ActorId, ItemId), target: Point3D) -> BeginOutcome {
        let request = HarvestRequest {
            actor: who.0,
            tool: who.1,
            map: MAP,
            target,
        };
        self.engine
            .begin(discipline, request, &self.world, &mut self.host)
            .unwrap()
    }

    fn advance(&mut self, ms: u64) {
        self.engine.advance(&self.world, &mut self.host, ms).unwrap();
    }

    fn gather(&mut self, discipline: DisciplineId, who: (ActorId, ItemId)) -> AttemptReport {
        assert!(matches!(self.begin(discipline, who, TARGET), BeginOutcome::Started(_)));
        self.advance(POLL_MS);
        self.engine.drain_reports().pop().unwrap()
    }
}

fn count(reports: &[AttemptReport], outcome: HarvestOutcome) -> usize {
    reports.iter().filter(|r| r.outcome == outcome).count()
}

#[test]
fn neighbours_share_one_bank() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));
    let bo = field.gatherer("Bo", Point3D::new(5, 5, 0));

    let mut reports = Vec::new();
    for _ in 0..6 {
        assert!(matches!(field.begin(gathering, ada, TARGET), BeginOutcome::Started(_)));
        assert!(matches!(field.begin(gathering, bo, TARGET), BeginOutcome::Started(_)));
        field.advance(POLL_MS);
        reports.extend(field.engine.drain_reports());
    }
    assert_eq!(reports.len(), 12);
    assert_eq!(count(&reports, HarvestOutcome::Succeeded), 5);
    assert_eq!(count(&reports, HarvestOutcome::NoResources), 7);

    let packed = field.host.pack(ada.0).len().saturating_add(field.host.pack(bo.0).len());
    assert_eq!(packed, 5);
}

#[test]
fn depleted_bank_refills_inside_its_window() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));

    let mut depleted_at = 0;
    for _ in 0..5 {
        let report = field.gather(gathering, ada);
        assert_eq!(report.outcome, HarvestOutcome::Succeeded);
        depleted_at = report.finished_ms;
    }

    let report = field.gather(gathering, ada);
    assert_eq!(report.outcome, HarvestOutcome::NoResources);
    assert_eq!(field.host.last_notice(ada.0), Some(&Notice::literal("nothing here")));

    // Just short of the earliest refill.
    field.advance(55_000);
    let report = field.gather(gathering, ada);
    assert_eq!(report.finished_ms, depleted_at.saturating_add(59_000));
    assert_eq!(report.outcome, HarvestOutcome::NoResources);

    // Past the latest refill the full bank is back.
    field.advance(61_000);
    for _ in 0..5 {
        assert_eq!(field.gather(gathering, ada).outcome, HarvestOutcome::Succeeded);
    }
    assert_eq!(field.gather(gathering, ada).outcome, HarvestOutcome::NoResources);
}

#[test]
fn shared_scope_allows_one_attempt_per_actor() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let foraging = field.register(Gathering::new("foraging"));
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));

    assert!(matches!(field.begin(gathering, ada, TARGET), BeginOutcome::Started(_)));
    assert_eq!(
        field.begin(foraging, ada, TARGET),
        BeginOutcome::Rejected(HarvestOutcome::AlreadyHarvesting)
    );
    field.advance(POLL_MS);
    assert_eq!(field.engine.drain_reports().len(), 1);
}

#[test]
fn named_scopes_run_side_by_side() {
    let mut field = Field::new();
    let mut gathering = Gathering::new("gathering");
    gathering.scope = LockScope::Named("gathering");
    let mut foraging = Gathering::new("foraging");
    foraging.scope = LockScope::Named("foraging");
    let gathering = field.register(gathering);
    let foraging = field.register(foraging);
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));

    assert!(matches!(field.begin(gathering, ada, TARGET), BeginOutcome::Started(_)));
    assert!(matches!(field.begin(foraging, ada, TARGET), BeginOutcome::Started(_)));
    assert_eq!(
        field.begin(gathering, ada, TARGET),
        BeginOutcome::Rejected(HarvestOutcome::AlreadyHarvesting)
    );
    field.advance(POLL_MS);
    let reports = field.engine.drain_reports();
    assert_eq!(count(&reports, HarvestOutcome::Succeeded), 2);
}

#[test]
fn cancelling_frees_the_lock_and_the_bank() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));

    let BeginOutcome::Started(attempt) = field.begin(gathering, ada, TARGET) else {
        panic!("attempt was rejected");
    };
    assert!(field.engine.cancel(attempt, &field.world, &mut field.host));
    assert!(!field.engine.cancel(attempt, &field.world, &mut field.host));
    assert!(!field.engine.is_harvesting(ada.0));
    assert!(field.engine.attempt_state(attempt).is_none());
    assert_eq!(field.host.last_notice(ada.0), Some(&Notice::literal("you stop")));

    let reports = field.engine.drain_reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports.first().unwrap().outcome, HarvestOutcome::Cancelled);

    // The cancelled poll never fires.
    field.advance(POLL_MS);
    assert!(field.engine.drain_reports().is_empty());

    // Nothing was drawn: all five units are still there.
    for _ in 0..5 {
        assert_eq!(field.gather(gathering, ada).outcome, HarvestOutcome::Succeeded);
    }
}

#[test]
fn wandering_off_ends_the_attempt() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));

    assert!(matches!(field.begin(gathering, ada, TARGET), BeginOutcome::Started(_)));
    field.host.set_position(ada.0, Point3D::new(12, 12, 0));
    field.advance(POLL_MS);
    let report = field.engine.drain_reports().pop().unwrap();
    assert_eq!(report.outcome, HarvestOutcome::OutOfRange);
    assert_eq!(field.host.last_notice(ada.0), Some(&Notice::literal("you wandered off")));
    assert!(!field.engine.is_harvesting(ada.0));
}

#[test]
fn vanished_actors_are_cancelled_quietly() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));

    assert!(matches!(field.begin(gathering, ada, TARGET), BeginOutcome::Started(_)));
    let _ = field.host.remove_actor(ada.0);
    field.advance(POLL_MS);
    let report = field.engine.drain_reports().pop().unwrap();
    assert_eq!(report.outcome, HarvestOutcome::Cancelled);
    assert!(field.host.messages.is_empty());
    assert!(!field.engine.is_harvesting(ada.0));
}

#[test]
fn begin_rejects_bad_requests() {
    let mut field = Field::new();
    let gathering = field.register(Gathering::new("gathering"));
    let ada = field.gatherer("Ada", Point3D::new(5, 5, 0));

    assert_eq!(
        field.begin(gathering, ada, Point3D::new(6, 6, 0)),
        BeginOutcome::Rejected(HarvestOutcome::BadTarget)
    );
    assert_eq!(
        field.begin(gathering, ada, Point3D::new(12, 5, 0)),
        BeginOutcome::Rejected(HarvestOutcome::OutOfRange)
    );
    assert_eq!(field.host.last_notice(ada.0), Some(&Notice::literal("too far")));
    assert_eq!(
        field.begin(gathering, (ada.0, ItemId::new()), TARGET),
        BeginOutcome::Rejected(HarvestOutcome::Ineligible)
    );
    assert!(!field.engine.is_harvesting(ada.0));
    assert!(field.engine.drain_reports().iter().all(|r| r.finished_ms == r.started_ms));
}

#[test]
fn retries_stop_after_the_allowed_checks() {
    let mut field = Field::new();
    let gathering = field.register(Gathering {
        definition: definition("gathering", 50.0),
        scope: LockScope::Shared,
        policy: FailurePolicy::Retry { max_attempts: 3 },
    });
    let ada = field.gatherer("Ada", Point3D::new(3, 3, 0));
    field.host.skill_gain = 0.0;
    field.host.set_skill(ada.0, "gathering", SkillValue::flat(0.0));

    assert!(matches!(field.begin(gathering, ada, TARGET), BeginOutcome::Started(_)));
    field.advance(POLL_MS.saturating_mul(2));
    assert!(field.engine.drain_reports().is_empty());
    field.advance(POLL_MS);
    let report = field.engine.drain_reports().pop().unwrap();
    assert_eq!(report.outcome, HarvestOutcome::Failed);
    assert_eq!(report.finished_ms, POLL_MS.saturating_mul(3));
    assert_eq!(field.host.last_notice(ada.0), Some(&Notice::literal("you fail")));

    // Every check drew from the bank, failed or not.
    field.host.set_skill(ada.0, "gathering", SkillValue::flat(100.0));
    assert_eq!(field.gather(gathering, ada).outcome, HarvestOutcome::Succeeded);
    assert_eq!(field.gather(gathering, ada).outcome, HarvestOutcome::Succeeded);
    assert_eq!(field.gather(gathering, ada).outcome, HarvestOutcome::NoResources);
}
