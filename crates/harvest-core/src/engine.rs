//! The harvest engine: attempt lifecycle over registered disciplines.
//!
//! [`HarvestEngine`] owns the scheduler, the exclusion registry, one bank
//! registry per discipline, and the random source. Everything else (actors,
//! terrain, messaging) is borrowed from the caller on each call, so the
//! engine holds no references into host state between callbacks.
//!
//! # Attempt lifecycle
//!
//! 1. [`HarvestEngine::begin`] validates the request, takes the exclusion
//!    lock, and schedules the first poll. It returns immediately.
//! 2. [`HarvestEngine::advance`] moves virtual time forward and fires due
//!    polls, start cues, and bank respawns in deadline order.
//! 3. A harvest poll consumes from the bank, rolls the skill check, and
//!    either reschedules or resolves the attempt.
//! 4. Every terminal outcome sends exactly one notice, runs the finish hook,
//!    and releases the lock, in that order.

use std::collections::{BTreeMap, VecDeque};

use harvest_types::{
    ActorId, AttemptId, AttemptState, Delivery, HarvestOutcome, HarvestedItem, ItemId, ItemKind,
    MapId, Notice, Point3D, SkillValue,
};
use harvest_world::{BankRegistry, RegionKey, ResourceBank, RespawnTrigger, WorldError, WorldQuery};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::definition::{DefinitionError, HarvestDefinition};
use crate::discipline::{
    Attempt, Discipline, DisciplineError, FailurePolicy, HookContext, deliver_to_actor, notify,
};
use crate::exclusion::{ExclusionRegistry, ExclusionToken, LockKey};
use crate::host::HarvestHost;
use crate::mutation::Mutation;
use crate::probability::roll;
use crate::resource::{ResourceDescriptor, select_bonus, select_vein};
use crate::scheduler::{Scheduler, SchedulerError, TimerId};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors the engine reports to its caller.
///
/// These are programming or capacity faults. Everything that can happen to a
/// well-formed attempt is a [`HarvestOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The discipline id was not issued by this engine.
    #[error("unknown discipline id {id}")]
    UnknownDiscipline {
        /// The offending id.
        id: usize,
    },

    /// The scheduler could not represent a deadline.
    #[error("scheduler error: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },

    /// A world lookup failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Handle to a registered discipline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisciplineId(usize);

impl DisciplineId {
    /// Registration index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A request to start harvesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRequest {
    /// Who is harvesting.
    pub actor: ActorId,
    /// The tool the actor uses.
    pub tool: ItemId,
    /// Map of the target.
    pub map: MapId,
    /// The targeted location.
    pub target: Point3D,
}

/// Result of [`HarvestEngine::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// The attempt is running.
    Started(AttemptId),
    /// The attempt never started; the actor has been told why.
    Rejected(HarvestOutcome),
}

/// Timer payloads owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTimer {
    /// Poll a running attempt.
    Poll(AttemptId),
    /// Fire the discipline's start cue.
    StartCue(AttemptId),
    /// Refill a bank.
    Respawn {
        /// Owning discipline.
        discipline: DisciplineId,
        /// Bank region.
        region: RegionKey,
    },
}

/// Record of one finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Attempt identifier.
    pub attempt: AttemptId,
    /// The harvesting actor.
    pub actor: ActorId,
    /// Discipline name.
    pub discipline: String,
    /// Terminal outcome.
    pub outcome: HarvestOutcome,
    /// Kind of the item produced, if any.
    pub kind: Option<ItemKind>,
    /// Where the item went, if one was produced.
    pub delivery: Option<Delivery>,
    /// Engine time at start.
    pub started_ms: u64,
    /// Engine time at finish.
    pub finished_ms: u64,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

struct Registered {
    discipline: Box<dyn Discipline>,
    banks: BankRegistry,
}

struct ActiveAttempt {
    attempt: Attempt,
    discipline: DisciplineId,
    state: AttemptState,
    token: ExclusionToken,
    poll_timer: Option<TimerId>,
    cue_timer: Option<TimerId>,
    polls: u32,
    checks: u32,
}

struct Finish {
    outcome: HarvestOutcome,
    notice: Option<Notice>,
    kind: Option<ItemKind>,
    delivery: Option<Delivery>,
}

impl Finish {
    fn notify(outcome: HarvestOutcome, notice: &Notice) -> Self {
        Self {
            outcome,
            notice: Some(notice.clone()),
            kind: None,
            delivery: None,
        }
    }

    const fn silent(outcome: HarvestOutcome) -> Self {
        Self {
            outcome,
            notice: None,
            kind: None,
            delivery: None,
        }
    }
}

enum PollStep {
    Again,
    Done(Finish),
}

enum StepFailure {
    Hook(DisciplineError),
    Engine(EngineError),
}

impl From<DisciplineError> for StepFailure {
    fn from(err: DisciplineError) -> Self {
        Self::Hook(err)
    }
}

impl From<EngineError> for StepFailure {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<SchedulerError> for StepFailure {
    fn from(err: SchedulerError) -> Self {
        Self::Engine(err.into())
    }
}

impl From<WorldError> for StepFailure {
    fn from(err: WorldError) -> Self {
        Self::Engine(err.into())
    }
}

// ---------------------------------------------------------------------------
// HarvestEngine
// ---------------------------------------------------------------------------

/// Runs harvest attempts for every registered discipline.
pub struct HarvestEngine {
    disciplines: Vec<Registered>,
    attempts: BTreeMap<AttemptId, ActiveAttempt>,
    locks: ExclusionRegistry,
    scheduler: Scheduler<EngineTimer>,
    rng: StdRng,
    poll_interval_ms: u64,
    reports: VecDeque<AttemptReport>,
    report_capacity: usize,
}

impl HarvestEngine {
    /// Create an engine with no disciplines.
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        Self {
            disciplines: Vec::new(),
            attempts: BTreeMap::new(),
            locks: ExclusionRegistry::new(),
            scheduler: Scheduler::new(),
            rng: StdRng::seed_from_u64(seed),
            poll_interval_ms: config.poll_interval_ms,
            reports: VecDeque::new(),
            report_capacity: config.report_capacity,
        }
    }

    /// Validate and register a discipline.
    ///
    /// # Errors
    ///
    /// Returns the first [`DefinitionError`] found, or
    /// [`DefinitionError::Duplicate`] if the name is taken.
    pub fn register(&mut self, discipline: Box<dyn Discipline>) -> Result<DisciplineId, DefinitionError> {
        let definition = discipline.definition();
        definition.validate()?;
        discipline.validate()?;
        if self.discipline_id(&definition.name).is_some() {
            return Err(DefinitionError::Duplicate {
                name: definition.name.clone(),
            });
        }
        let id = DisciplineId(self.disciplines.len());
        info!(
            discipline = %definition.name,
            skill = %definition.skill,
            veins = definition.veins.len(),
            "Discipline registered"
        );
        self.disciplines.push(Registered {
            discipline,
            banks: BankRegistry::new(),
        });
        Ok(id)
    }

    /// Look up a discipline by name.
    pub fn discipline_id(&self, name: &str) -> Option<DisciplineId> {
        self.disciplines
            .iter()
            .position(|r| r.discipline.definition().name == name)
            .map(DisciplineId)
    }

    /// The definition of a registered discipline.
    pub fn definition(&self, id: DisciplineId) -> Option<&HarvestDefinition> {
        self.disciplines.get(id.0).map(|r| r.discipline.definition())
    }

    /// Current engine time.
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Number of live timers (polls, cues, respawns).
    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    /// Number of running attempts.
    pub fn active_attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Whether `actor` has a running attempt of any discipline.
    pub fn is_harvesting(&self, actor: ActorId) -> bool {
        self.attempts.values().any(|a| a.attempt.actor == actor)
    }

    /// State of a running attempt. Finished attempts are forgotten.
    pub fn attempt_state(&self, attempt: AttemptId) -> Option<AttemptState> {
        self.attempts.get(&attempt).map(|a| a.state)
    }

    /// Whether `key` is locked by a running attempt.
    pub fn is_locked(&self, key: &LockKey) -> bool {
        self.locks.is_held(key)
    }

    /// The bank of one region, if it has been touched.
    pub fn bank(&self, id: DisciplineId, region: &RegionKey) -> Option<&ResourceBank> {
        self.disciplines.get(id.0)?.banks.get(region)
    }

    /// All banks of a discipline.
    pub fn banks(&self, id: DisciplineId) -> Option<&BankRegistry> {
        self.disciplines.get(id.0).map(|r| &r.banks)
    }

    /// Drop full, idle banks across all disciplines.
    pub fn prune_banks(&mut self) -> usize {
        let pruned = self
            .disciplines
            .iter_mut()
            .map(|r| r.banks.prune_idle())
            .sum();
        if pruned > 0 {
            debug!(pruned, "Idle banks pruned");
        }
        pruned
    }

    /// Take every retained report, oldest first.
    pub fn drain_reports(&mut self) -> Vec<AttemptReport> {
        self.reports.drain(..).collect()
    }

    // -----------------------------------------------------------------------
    // Begin
    // -----------------------------------------------------------------------

    /// Validate `request` and start an attempt.
    ///
    /// Rejections send one notice and change nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownDiscipline`] for a foreign id, or a
    /// scheduler error if the first poll cannot be scheduled.
    pub fn begin(
        &mut self,
        id: DisciplineId,
        request: HarvestRequest,
        world: &dyn WorldQuery,
        host: &mut dyn HarvestHost,
    ) -> Result<BeginOutcome, EngineError> {
        let now_ms = self.scheduler.now_ms();
        let registered = self
            .disciplines
            .get(id.0)
            .ok_or(EngineError::UnknownDiscipline { id: id.0 })?;
        let discipline = registered.discipline.as_ref();
        let definition = discipline.definition();
        let messages = &definition.messages;

        let Some(actor) = host.actor(request.actor) else {
            debug!(actor = %request.actor, "Harvest requested by unknown actor");
            return Ok(BeginOutcome::Rejected(HarvestOutcome::Ineligible));
        };
        if !actor.alive {
            return Ok(reject(host, &request, HarvestOutcome::Ineligible, &messages.ineligible));
        }

        let mut ctx = HookContext {
            world,
            host: &mut *host,
            rng: &mut self.rng,
            now_ms,
        };
        match discipline.check_eligibility(&actor, &mut ctx) {
            Ok(None) => {}
            Ok(Some(notice)) => {
                return Ok(reject(host, &request, HarvestOutcome::Ineligible, &notice));
            }
            Err(err) => {
                error!(discipline = %definition.name, actor = %actor.id, error = %err, "Eligibility hook failed");
                return Ok(reject(host, &request, HarvestOutcome::Failed, &messages.fail));
            }
        }

        let Some(tool) = host
            .tool(request.actor, request.tool)
            .filter(|t| definition.accepts_tool(&t.kind))
        else {
            return Ok(reject(host, &request, HarvestOutcome::Ineligible, &messages.bad_tool));
        };
        if !world.is_eligible_tile(request.map, request.target, &definition.tiles) {
            return Ok(reject(host, &request, HarvestOutcome::BadTarget, &messages.bad_target));
        }
        if actor.map != request.map || !actor.position.in_range(&request.target, definition.max_range) {
            return Ok(reject(host, &request, HarvestOutcome::OutOfRange, &messages.out_of_range));
        }

        let attempt_id = AttemptId::new();
        let key = LockKey {
            actor: actor.id,
            scope: discipline.lock_scope(),
        };
        let Some(token) = self.locks.try_acquire(key, attempt_id) else {
            let notice = discipline.concurrent_notice();
            return Ok(reject(host, &request, HarvestOutcome::AlreadyHarvesting, &notice));
        };

        let poll_timer = match self.scheduler.schedule_in(self.poll_interval_ms, EngineTimer::Poll(attempt_id)) {
            Ok(timer) => timer,
            Err(err) => {
                self.locks.release(token);
                return Err(err.into());
            }
        };
        let cue_timer = match discipline
            .start_cue_delay_ms()
            .map(|delay| self.scheduler.schedule_in(delay, EngineTimer::StartCue(attempt_id)))
            .transpose()
        {
            Ok(timer) => timer,
            Err(err) => {
                self.scheduler.cancel(poll_timer);
                self.locks.release(token);
                return Err(err.into());
            }
        };

        let attempt = Attempt {
            id: attempt_id,
            actor: actor.id,
            tool,
            map: request.map,
            target: request.target,
            started_ms: now_ms,
        };
        debug!(
            attempt = %attempt_id,
            actor = %actor.id,
            discipline = %definition.name,
            target = %request.target,
            "Attempt started"
        );

        let mut ctx = HookContext {
            world,
            host: &mut *host,
            rng: &mut self.rng,
            now_ms,
        };
        let started = discipline.on_started(&attempt, &mut ctx);
        let name = definition.name.clone();
        self.attempts.insert(
            attempt_id,
            ActiveAttempt {
                attempt,
                discipline: id,
                state: AttemptState::Polling,
                token,
                poll_timer: Some(poll_timer),
                cue_timer,
                polls: 0,
                checks: 0,
            },
        );

        if let Err(err) = started {
            error!(discipline = %name, attempt = %attempt_id, error = %err, "Start hook failed");
            self.fail(attempt_id, world, host);
            return Ok(BeginOutcome::Rejected(HarvestOutcome::Failed));
        }
        Ok(BeginOutcome::Started(attempt_id))
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    /// Cancel a running attempt. The lock is free when this returns.
    pub fn cancel(&mut self, attempt: AttemptId, world: &dyn WorldQuery, host: &mut dyn HarvestHost) -> bool {
        let Some(active) = self.attempts.get(&attempt) else {
            return false;
        };
        let notice = self
            .disciplines
            .get(active.discipline.0)
            .map(|r| r.discipline.definition().messages.cancelled.clone());
        self.finish(
            attempt,
            Finish {
                outcome: HarvestOutcome::Cancelled,
                notice,
                kind: None,
                delivery: None,
            },
            world,
            host,
        );
        true
    }

    /// Cancel every attempt of `actor`, as on logout or death.
    pub fn cancel_actor(&mut self, actor: ActorId, world: &dyn WorldQuery, host: &mut dyn HarvestHost) -> usize {
        let ids: Vec<AttemptId> = self
            .attempts
            .values()
            .filter(|a| a.attempt.actor == actor)
            .map(|a| a.attempt.id)
            .collect();
        let mut cancelled: usize = 0;
        for id in ids {
            if self.cancel(id, world, host) {
                cancelled = cancelled.saturating_add(1);
            }
        }
        cancelled
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance virtual time by `elapsed_ms`, firing every callback that
    /// falls due, including ones scheduled along the way.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on a scheduler or world fault. The attempt
    /// involved has already been finished as failed.
    pub fn advance(
        &mut self,
        world: &dyn WorldQuery,
        host: &mut dyn HarvestHost,
        elapsed_ms: u64,
    ) -> Result<(), EngineError> {
        let now_ms = self.scheduler.now_ms();
        let until = now_ms.checked_add(elapsed_ms).ok_or(SchedulerError::Overflow {
            now_ms,
            delay_ms: elapsed_ms,
        })?;
        while let Some(due) = self.scheduler.pop_due(until) {
            match due.event {
                EngineTimer::Poll(attempt) => self.poll(attempt, world, host)?,
                EngineTimer::StartCue(attempt) => self.start_cue(attempt, world, host),
                EngineTimer::Respawn { discipline, region } => self.respawn(discipline, region),
            }
        }
        self.scheduler.advance_to(until);
        Ok(())
    }

    fn respawn(&mut self, id: DisciplineId, region: RegionKey) {
        let Some(registered) = self.disciplines.get_mut(id.0) else {
            return;
        };
        let definition = registered.discipline.definition();
        if let Some(capacity) = registered.banks.respawn(&region, &definition.bank, &mut self.rng) {
            info!(discipline = %definition.name, region = %region, capacity, "Bank respawned");
        }
    }

    fn start_cue(&mut self, attempt_id: AttemptId, world: &dyn WorldQuery, host: &mut dyn HarvestHost) {
        let Some(active) = self.attempts.get_mut(&attempt_id) else {
            return;
        };
        active.cue_timer = None;
        let (attempt, id) = (active.attempt.clone(), active.discipline);
        let Some(registered) = self.disciplines.get(id.0) else {
            return;
        };
        let mut ctx = HookContext {
            world,
            host: &mut *host,
            rng: &mut self.rng,
            now_ms: self.scheduler.now_ms(),
        };
        if let Err(err) = registered.discipline.on_start_cue(&attempt, &mut ctx) {
            error!(attempt = %attempt_id, error = %err, "Start cue hook failed");
            self.fail(attempt_id, world, host);
        }
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    fn poll(&mut self, attempt_id: AttemptId, world: &dyn WorldQuery, host: &mut dyn HarvestHost) -> Result<(), EngineError> {
        let Some(active) = self.attempts.get_mut(&attempt_id) else {
            return Ok(());
        };
        active.poll_timer = None;
        active.polls = active.polls.saturating_add(1);
        let (attempt, id, polls) = (active.attempt.clone(), active.discipline, active.polls);

        match self.poll_step(&attempt, id, polls, world, host) {
            Ok(PollStep::Again) => {
                match self.scheduler.schedule_in(self.poll_interval_ms, EngineTimer::Poll(attempt_id)) {
                    Ok(timer) => {
                        if let Some(active) = self.attempts.get_mut(&attempt_id) {
                            active.poll_timer = Some(timer);
                            active.state = AttemptState::Polling;
                        }
                        Ok(())
                    }
                    Err(err) => {
                        self.fail(attempt_id, world, host);
                        Err(err.into())
                    }
                }
            }
            Ok(PollStep::Done(finish)) => {
                self.finish(attempt_id, finish, world, host);
                Ok(())
            }
            Err(StepFailure::Hook(err)) => {
                error!(attempt = %attempt_id, actor = %attempt.actor, error = %err, "Discipline hook failed");
                self.fail(attempt_id, world, host);
                Ok(())
            }
            Err(StepFailure::Engine(err)) => {
                self.fail(attempt_id, world, host);
                Err(err)
            }
        }
    }

    fn poll_step(
        &mut self,
        attempt: &Attempt,
        id: DisciplineId,
        polls: u32,
        world: &dyn WorldQuery,
        host: &mut dyn HarvestHost,
    ) -> Result<PollStep, StepFailure> {
        let now_ms = self.scheduler.now_ms();
        let registered = self
            .disciplines
            .get_mut(id.0)
            .ok_or(EngineError::UnknownDiscipline { id: id.0 })?;
        let discipline = registered.discipline.as_ref();
        let definition = discipline.definition();
        let messages = &definition.messages;

        if let Some(finish) = check_presence(definition, attempt, host) {
            return Ok(PollStep::Done(finish));
        }
        if let Some(action) = definition.effect.action {
            host.animate(attempt.actor, action);
        }
        if let Some(sound) = definition.effect.sound {
            host.sound(attempt.map, attempt.target, sound);
        }
        if polls <= definition.effect_polls {
            return Ok(PollStep::Again);
        }

        let mut ctx = HookContext {
            world,
            host: &mut *host,
            rng: &mut self.rng,
            now_ms,
        };
        if !discipline.has_private_resources(attempt, &mut ctx)? {
            let region = world.region_key(
                attempt.map,
                attempt.target,
                definition.bank.width,
                definition.bank.height,
            )?;
            let drawn = draw_from_bank(
                &mut registered.banks,
                definition,
                BankSlot { discipline: id, region },
                now_ms,
                ctx.rng,
                &mut self.scheduler,
            )?;
            if !drawn {
                return Ok(PollStep::Done(Finish::notify(
                    HarvestOutcome::NoResources,
                    &messages.no_resources,
                )));
            }
        }

        let Some(vein) = select_vein(&definition.veins, ctx.rng) else {
            return Ok(PollStep::Done(Finish::notify(HarvestOutcome::Failed, &messages.fail)));
        };
        let resource = vein.resolve(ctx.rng);
        let skill = ctx.host.skill(attempt.actor, &definition.skill);
        let chance = if resource.is_attainable(skill.base) {
            resource.success_chance(skill.value)
        } else {
            0.0
        };
        let success = roll(ctx.rng, chance);
        ctx.host
            .record_skill_use(attempt.actor, &definition.skill, chance, success);
        let checks = self.attempts.get_mut(&attempt.id).map_or(1, |active| {
            active.checks = active.checks.saturating_add(1);
            if success {
                active.state = AttemptState::Resolving;
            }
            active.checks
        });
        debug!(
            attempt = %attempt.id,
            resource = %resource.name,
            chance,
            success,
            checks,
            "Skill check"
        );

        if !success {
            if roll(ctx.rng, discipline.tool_break_chance(attempt)) {
                ctx.host.break_tool(attempt.actor, attempt.tool.id);
                return Ok(PollStep::Done(Finish::notify(
                    HarvestOutcome::ToolBroken,
                    &messages.tool_broke,
                )));
            }
            return Ok(match discipline.failure_policy() {
                FailurePolicy::Retry { max_attempts } if checks < max_attempts => PollStep::Again,
                FailurePolicy::Retry { .. } | FailurePolicy::Stop => {
                    PollStep::Done(Finish::notify(HarvestOutcome::Failed, &messages.fail))
                }
            });
        }

        let finish = resolve_success(discipline, attempt, resource, skill, &mut ctx)?;
        Ok(PollStep::Done(finish))
    }

    // -----------------------------------------------------------------------
    // Finishing
    // -----------------------------------------------------------------------

    fn fail(&mut self, attempt_id: AttemptId, world: &dyn WorldQuery, host: &mut dyn HarvestHost) {
        let notice = self
            .attempts
            .get(&attempt_id)
            .and_then(|a| self.disciplines.get(a.discipline.0))
            .map(|r| r.discipline.definition().messages.fail.clone());
        self.finish(
            attempt_id,
            Finish {
                outcome: HarvestOutcome::Failed,
                notice,
                kind: None,
                delivery: None,
            },
            world,
            host,
        );
    }

    fn finish(&mut self, attempt_id: AttemptId, end: Finish, world: &dyn WorldQuery, host: &mut dyn HarvestHost) {
        let Some(active) = self.attempts.remove(&attempt_id) else {
            return;
        };
        for timer in [active.poll_timer, active.cue_timer].into_iter().flatten() {
            self.scheduler.cancel(timer);
        }
        let actor = active.attempt.actor;
        if let Some(notice) = end.notice {
            let _ = notify(host, actor, notice);
        }

        let now_ms = self.scheduler.now_ms();
        let mut name = String::new();
        if let Some(registered) = self.disciplines.get(active.discipline.0) {
            name.clone_from(&registered.discipline.definition().name);
            let mut ctx = HookContext {
                world,
                host: &mut *host,
                rng: &mut self.rng,
                now_ms,
            };
            if let Err(err) = registered
                .discipline
                .on_finished(&active.attempt, end.outcome, &mut ctx)
            {
                error!(attempt = %attempt_id, error = %err, "Finish hook failed");
            }
        }
        self.locks.release(active.token);

        debug!(
            attempt = %attempt_id,
            actor = %actor,
            discipline = %name,
            outcome = %end.outcome,
            elapsed_ms = now_ms.saturating_sub(active.attempt.started_ms),
            "Attempt finished"
        );

        if self.report_capacity == 0 {
            return;
        }
        if self.reports.len() >= self.report_capacity {
            self.reports.pop_front();
        }
        self.reports.push_back(AttemptReport {
            attempt: attempt_id,
            actor,
            discipline: name,
            outcome: end.outcome,
            kind: end.kind,
            delivery: end.delivery,
            started_ms: active.attempt.started_ms,
            finished_ms: now_ms,
        });
    }
}

// ---------------------------------------------------------------------------
// Poll helpers
// ---------------------------------------------------------------------------

fn reject(
    host: &mut dyn HarvestHost,
    request: &HarvestRequest,
    outcome: HarvestOutcome,
    notice: &Notice,
) -> BeginOutcome {
    debug!(actor = %request.actor, target = %request.target, outcome = %outcome, "Harvest rejected");
    let _ = notify(host, request.actor, notice.clone());
    BeginOutcome::Rejected(outcome)
}

/// The terminal outcome if the actor can no longer work the target.
fn check_presence(definition: &HarvestDefinition, attempt: &Attempt, host: &dyn HarvestHost) -> Option<Finish> {
    let messages = &definition.messages;
    let Some(actor) = host.actor(attempt.actor) else {
        return Some(Finish::silent(HarvestOutcome::Cancelled));
    };
    if !actor.alive
        || actor.map != attempt.map
        || !actor.position.in_range(&attempt.target, definition.max_range)
    {
        return Some(Finish::notify(
            HarvestOutcome::OutOfRange,
            &messages.timed_out_of_range,
        ));
    }
    if host.tool(attempt.actor, attempt.tool.id).is_none() {
        return Some(Finish::notify(HarvestOutcome::Cancelled, &messages.cancelled));
    }
    None
}

#[derive(Clone, Copy)]
struct BankSlot {
    discipline: DisciplineId,
    region: RegionKey,
}

/// Take one harvest's worth from the bank and arm its respawn when due.
fn draw_from_bank(
    banks: &mut BankRegistry,
    definition: &HarvestDefinition,
    slot: BankSlot,
    now_ms: u64,
    rng: &mut StdRng,
    scheduler: &mut Scheduler<EngineTimer>,
) -> Result<bool, StepFailure> {
    let amount = definition.consumed_per_harvest;
    let bank = banks.acquire(slot.region, &definition.bank, rng);
    let was_full = bank.is_full();
    let drawn = bank.try_consume(amount);
    // A bank that cannot cover the next harvest must still come back.
    let due = !drawn
        || match definition.respawn_trigger {
            RespawnTrigger::OnDepletion => !bank.can_supply(amount),
            RespawnTrigger::OnFirstHarvest => was_full,
        };
    if !drawn {
        debug!(discipline = %definition.name, region = %slot.region, "Bank exhausted");
    }
    if !due {
        return Ok(true);
    }
    if let Some(deadline) = bank.schedule_respawn(now_ms, &definition.respawn, rng)? {
        scheduler.schedule_at(
            deadline,
            EngineTimer::Respawn {
                discipline: slot.discipline,
                region: slot.region,
            },
        )?;
        debug!(
            discipline = %definition.name,
            region = %slot.region,
            deadline,
            "Bank respawn scheduled"
        );
    }
    Ok(drawn)
}

/// Everything after a passed skill check.
fn resolve_success(
    discipline: &dyn Discipline,
    attempt: &Attempt,
    resource: &ResourceDescriptor,
    skill: SkillValue,
    ctx: &mut HookContext<'_>,
) -> Result<Finish, DisciplineError> {
    let definition = discipline.definition();
    let messages = &definition.messages;

    if discipline.special_harvest(attempt, ctx)? {
        return Ok(Finish::silent(HarvestOutcome::Special));
    }
    let kind = match discipline.mutate(attempt, &resource.kind, skill, ctx)? {
        Mutation::Keep => resource.kind.clone(),
        Mutation::Replace(kind) => kind,
        Mutation::Nothing => return Ok(Finish::notify(HarvestOutcome::Failed, &messages.fail)),
    };
    let Some(item) = discipline.construct(attempt, &kind, ctx)? else {
        return Ok(Finish::notify(HarvestOutcome::Failed, &messages.fail));
    };
    let bonus = select_bonus(&definition.bonus, skill.base, ctx.rng).and_then(|b| b.kind.clone());

    let shown = item.clone();
    let delivery = discipline.deliver(attempt, item, ctx)?;
    let finish = |outcome, notice: Option<&Notice>| Finish {
        outcome,
        notice: notice.cloned(),
        kind: Some(shown.kind.clone()),
        delivery: Some(delivery),
    };
    match delivery {
        Delivery::PackFull => {
            return Ok(finish(HarvestOutcome::PackFull, Some(&messages.pack_full)));
        }
        Delivery::Pack | Delivery::Feet => {
            discipline.send_success(attempt, &shown, resource, ctx)?;
        }
        Delivery::Redirected => {}
    }

    if let Some(bonus) = bonus {
        let extra = HarvestedItem::new(bonus, 1).with_origin(attempt.actor);
        let placed = deliver_to_actor(ctx.host, attempt.actor, extra, definition.place_at_feet_if_full);
        debug!(attempt = %attempt.id, delivery = ?placed, "Bonus resource granted");
    }
    Ok(finish(HarvestOutcome::Succeeded, None))
}
