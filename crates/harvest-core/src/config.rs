//! Configuration loading and typed config structures for the harvest
//! simulation.
//!
//! The canonical configuration lives in `harvest-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every section is optional; a missing key falls back to its default.

use std::collections::BTreeMap;
use std::path::Path;

use harvest_world::RespawnTrigger;
use serde::Deserialize;

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV: &str = "HARVEST_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `harvest-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, timing, bounds).
    #[serde(default)]
    pub world: WorldConfig,

    /// Harvest engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-discipline tuning, keyed by discipline name.
    #[serde(default)]
    pub disciplines: BTreeMap<String, DisciplineOverrides>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `HARVEST_SEED` overrides `world.seed` when it holds a valid `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = lookup(SEED_ENV).and_then(|v| v.trim().parse().ok()) {
            self.world.seed = seed;
        }
    }

    /// Overrides for one discipline, if configured.
    pub fn overrides_for(&self, discipline: &str) -> Option<&DisciplineOverrides> {
        self.disciplines.get(discipline)
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Virtual milliseconds the engine advances per tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Real-time milliseconds slept between ticks (0 runs flat out).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_ms: default_tick_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
            max_real_time_seconds: 0,
        }
    }
}

/// Harvest engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Delay between polls of a running attempt.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Finished-attempt reports retained until drained.
    #[serde(default = "default_report_capacity")]
    pub report_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            report_capacity: default_report_capacity(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

/// Optional tuning for one discipline's definition.
///
/// Unset fields keep the discipline's built-in values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DisciplineOverrides {
    /// Bank footprint width in tiles.
    #[serde(default)]
    pub bank_width: Option<u32>,

    /// Bank footprint height in tiles.
    #[serde(default)]
    pub bank_height: Option<u32>,

    /// Smallest bank capacity.
    #[serde(default)]
    pub min_total: Option<u32>,

    /// Largest bank capacity.
    #[serde(default)]
    pub max_total: Option<u32>,

    /// Shortest respawn delay in seconds.
    #[serde(default)]
    pub min_respawn_secs: Option<u64>,

    /// Longest respawn delay in seconds.
    #[serde(default)]
    pub max_respawn_secs: Option<u64>,

    /// When banks schedule their respawn.
    #[serde(default)]
    pub respawn_trigger: Option<RespawnTrigger>,

    /// Reach in tiles.
    #[serde(default)]
    pub max_range: Option<u32>,

    /// Units taken per harvest poll.
    #[serde(default)]
    pub consumed_per_harvest: Option<u32>,

    /// Cue-only polls before the harvest poll.
    #[serde(default)]
    pub effect_polls: Option<u32>,
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Brittany Shoals".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_ms() -> u64 {
    500
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_max_ticks() -> u64 {
    2_000
}

const fn default_poll_interval_ms() -> u64 {
    2_000
}

const fn default_report_capacity() -> usize {
    1_024
}

fn default_log_level() -> String {
    "info".to_owned()
}
