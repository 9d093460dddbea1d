//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the harvest engine tick by tick, with support for:
//!
//! - **Bounded simulation**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pacing**: a configured real-time sleep between ticks
//! - **Operator stop**: immediate clean stop between ticks
//!
//! Each tick collects decisions, starts the requested attempts, advances
//! engine time by a fixed step, and tallies the attempts that finished.
//! Engine code never runs concurrently with itself; `tokio` only paces the
//! loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use harvest_types::HarvestOutcome;
use harvest_world::WorldQuery;
use tracing::{debug, info, warn};

use crate::decision::{DecisionError, DecisionSource};
use crate::engine::{AttemptReport, BeginOutcome, EngineError, HarvestEngine};
use crate::host::HarvestHost;
use crate::operator::{OperatorState, SimulationEndReason};

/// Idle banks are pruned every this many ticks.
pub const PRUNE_EVERY_TICKS: u64 = 100;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The engine reported a fault.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },

    /// The decision source failed.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: DecisionError,
    },
}

/// Everything the loop mutates.
pub struct SimulationState<W, H> {
    /// The harvest engine with its disciplines registered.
    pub engine: HarvestEngine,
    /// Terrain.
    pub world: W,
    /// Actors, inventory, messaging, and effects.
    pub host: H,
    /// Ticks run so far.
    pub tick: u64,
    /// Engine milliseconds per tick.
    pub tick_ms: u64,
}

impl<W: WorldQuery, H: HarvestHost> SimulationState<W, H> {
    /// Bundle the parts of a simulation, starting at tick zero.
    pub const fn new(engine: HarvestEngine, world: W, host: H, tick_ms: u64) -> Self {
        Self {
            engine,
            world,
            host,
            tick: 0,
            tick_ms,
        }
    }
}

/// Counts of finished attempts by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    counts: BTreeMap<HarvestOutcome, u64>,
}

impl OutcomeTally {
    /// Count one outcome.
    pub fn record(&mut self, outcome: HarvestOutcome) {
        let count = self.counts.entry(outcome).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// How many attempts ended with `outcome`.
    pub fn get(&self, outcome: HarvestOutcome) -> u64 {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    /// All attempts counted.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Attempts that produced something.
    pub fn successes(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(outcome, _)| outcome.is_success())
            .fold(0, |acc, (_, n)| acc.saturating_add(*n))
    }

    /// Iterate in outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (HarvestOutcome, u64)> + '_ {
        self.counts.iter().map(|(outcome, n)| (*outcome, *n))
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that just ran (1-based).
    pub tick: u64,
    /// Engine time at the end of the tick.
    pub now_ms: u64,
    /// Attempts started this tick.
    pub started: u32,
    /// Requests rejected this tick.
    pub rejected: u32,
    /// Attempts still running.
    pub active_attempts: usize,
    /// Attempts that finished this tick.
    pub finished: Vec<AttemptReport>,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Finished attempts over the whole run.
    pub tally: OutcomeTally,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Run a single tick: start requested attempts, then advance the engine.
///
/// # Errors
///
/// Returns [`RunnerError`] if the decision source or the engine fails.
pub fn run_tick<W: WorldQuery, H: HarvestHost>(
    state: &mut SimulationState<W, H>,
    decision_source: &mut dyn DecisionSource,
) -> Result<TickSummary, RunnerError> {
    let planned = decision_source.collect_requests(state.tick, &state.engine, &state.host)?;
    let mut started: u32 = 0;
    let mut rejected: u32 = 0;
    for plan in planned {
        match state
            .engine
            .begin(plan.discipline, plan.request, &state.world, &mut state.host)?
        {
            BeginOutcome::Started(_) => started = started.saturating_add(1),
            BeginOutcome::Rejected(_) => rejected = rejected.saturating_add(1),
        }
    }

    state
        .engine
        .advance(&state.world, &mut state.host, state.tick_ms)?;
    state.tick = state.tick.saturating_add(1);

    if state.tick % PRUNE_EVERY_TICKS == 0 {
        let _ = state.engine.prune_banks();
    }

    let summary = TickSummary {
        tick: state.tick,
        now_ms: state.engine.now_ms(),
        started,
        rejected,
        active_attempts: state.engine.active_attempts(),
        finished: state.engine.drain_reports(),
    };
    debug!(
        tick = summary.tick,
        started,
        rejected,
        finished = summary.finished.len(),
        active = summary.active_attempts,
        "Tick complete"
    );
    Ok(summary)
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails unrecoverably.
pub async fn run_simulation<W: WorldQuery, H: HarvestHost>(
    state: &mut SimulationState<W, H>,
    decision_source: &mut dyn DecisionSource,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let mut tally = OutcomeTally::default();

    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        tick_ms = state.tick_ms,
        "Simulation starting"
    );

    let end_reason = loop {
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break SimulationEndReason::OperatorStop;
        }

        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            break SimulationEndReason::MaxRealTimeReached;
        }

        let summary = run_tick(state, decision_source)?;
        total_ticks = total_ticks.saturating_add(1);
        for report in &summary.finished {
            tally.record(report.outcome);
        }
        callback.on_tick(&summary);
        let tick = summary.tick;
        last_summary = Some(summary);

        if operator.tick_limit_reached(total_ticks) {
            info!(tick, max_ticks = operator.max_ticks(), "Tick limit reached");
            break SimulationEndReason::MaxTicksReached;
        }

        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    };

    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
        tally,
    })
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_now_ms = result.final_summary.as_ref().map(|s| s.now_ms),
        attempts = result.tally.total(),
        successes = result.tally.successes(),
        "Simulation ended"
    );

    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
    for (outcome, count) in result.tally.iter() {
        info!(outcome = %outcome, count, "Outcome tally");
    }
}
