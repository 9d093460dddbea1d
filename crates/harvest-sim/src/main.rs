//! Headless fishing simulation.
//!
//! This is the main entry point that wires together the harvest engine, the
//! fishing discipline, a coastal map, a population of scripted fishers, and
//! operator controls. It loads configuration, initializes all subsystems, and
//! runs the simulation loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `harvest-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the coastal map
//! 4. Register the fishing discipline with the engine
//! 5. Spawn fishers and script their casts
//! 6. Create operator state and hook Ctrl-C to a graceful stop
//! 7. Run the simulation loop
//! 8. Log the result

mod error;
mod report_log;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use harvest_core::config::{LogFormat, LoggingConfig, SimulationConfig};
use harvest_core::decision::{Routine, ScriptedDecisionSource};
use harvest_core::engine::HarvestEngine;
use harvest_core::memory::MemoryHost;
use harvest_core::operator::OperatorState;
use harvest_core::runner::{self, SimulationState};
use harvest_fishing::FishingDiscipline;
use harvest_fishing::definition::NAME as FISHING;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::SimError;
use crate::report_log::ReportLog;
use crate::spawner::{COAST_MAP, SpawnerConfig};

/// Configuration file read from the working directory.
const CONFIG_FILE: &str = "harvest-config.yaml";

/// Ticks between running summaries in the log.
const SUMMARY_EVERY_TICKS: u64 = 100;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_ms = config.world.tick_ms,
        tick_interval_ms = config.world.tick_interval_ms,
        poll_interval_ms = config.engine.poll_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the coast.
    let spawner_config = load_spawner_config()?;
    let world = spawner::build_coast(&spawner_config.coast)?;
    info!(
        width = spawner_config.coast.width,
        height = spawner_config.coast.height,
        shore_width = spawner_config.coast.shore_width,
        "Coast built"
    );

    // 4. Register the fishing discipline.
    let mut engine = HarvestEngine::new(&config.engine, config.world.seed);
    let overrides = config.overrides_for(FISHING);
    if overrides.is_some() {
        info!(discipline = FISHING, "Applying discipline overrides");
    }
    let fishing = engine.register(Box::new(FishingDiscipline::new(overrides)))?;

    // 5. Spawn fishers and script their casts.
    let mut host = MemoryHost::new();
    let fishers = spawner::spawn_fishers(&spawner_config, &mut host, config.world.seed)?;
    let mut decisions = ScriptedDecisionSource::new();
    for fisher in &fishers {
        debug!(
            fisher = %fisher.name,
            on_boat = fisher.on_boat,
            targets = fisher.targets.len(),
            "Routine assigned"
        );
        decisions.assign(
            fisher.actor,
            Routine::new(fishing, fisher.tool, COAST_MAP, fisher.targets.clone()),
        );
    }
    info!(fishers = decisions.len(), "Fishers scripted");

    // 6. Create operator state.
    let operator = Arc::new(OperatorState::new(&config.world));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current tick");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 7. Run the simulation.
    let mut state = SimulationState::new(engine, world, host, config.world.tick_ms);
    let mut callback = ReportLog::new(SUMMARY_EVERY_TICKS);
    let result = runner::run_simulation(&mut state, &mut decisions, &operator, &mut callback)
        .await
        .map_err(SimError::from)?;

    // 8. Log results.
    runner::log_simulation_end(&result);
    let with_sos = fishers.iter().filter(|f| f.has_sos).count();
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        finished = callback.finished(),
        caught = callback.caught(),
        serpents = callback.serpents(),
        creatures = state.host.creatures.len(),
        fishers_with_sos = with_sos,
        "harvest-sim shutdown complete"
    );

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Load the main simulation configuration from `harvest-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<SimulationConfig, SimError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        Ok(SimulationConfig::default())
    }
}

/// Load the `fishers` section of `harvest-config.yaml`.
///
/// If the file does not exist or lacks the `fishers` key, defaults are used.
fn load_spawner_config() -> Result<SpawnerConfig, SimError> {
    let config_path = Path::new(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(SpawnerConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| SimError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;

    // Parse the full YAML and extract just the "fishers" section.
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| SimError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("fishers") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| SimError::Spawner {
            message: format!("failed to parse fishers config: {e}"),
        }),
        None => Ok(SpawnerConfig::default()),
    }
}
