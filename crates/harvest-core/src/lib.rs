//! Resource-harvesting engine for the harvest simulation.
//!
//! This crate owns the generic harvest cycle: validation, per-actor
//! exclusion, delayed polling, bank depletion, skill rolls, vein and mutation
//! selection, delivery, and respawn. Concrete disciplines plug in through the
//! [`Discipline`] trait; actors, inventory, messaging, and effects live behind
//! the host traits.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `harvest-config.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- [`DecisionSource`] trait, [`StubDecisionSource`], and
//!   [`ScriptedDecisionSource`].
//! - [`definition`] -- Static per-discipline parameters and their validation.
//! - [`discipline`] -- The [`Discipline`] hook trait and default delivery.
//! - [`engine`] -- [`HarvestEngine`], the attempt lifecycle state machine.
//! - [`exclusion`] -- Per-actor locks shared between disciplines.
//! - [`host`] -- Collaborator traits for actors, messages, and effects.
//! - [`memory`] -- [`MemoryHost`], an in-memory host for simulation and tests.
//! - [`mutation`] -- Skill-gated substitution tables.
//! - [`operator`] -- Pause, pacing, and stop controls for a running loop.
//! - [`probability`] -- Skill curves, rolls, and weighted picks.
//! - [`resource`] -- Resource descriptors, veins, and bonus resources.
//! - [`runner`] -- The async tick loop driving the engine.
//! - [`scheduler`] -- Virtual-time timer queue.
//!
//! [`DecisionSource`]: decision::DecisionSource
//! [`StubDecisionSource`]: decision::StubDecisionSource
//! [`ScriptedDecisionSource`]: decision::ScriptedDecisionSource
//! [`Discipline`]: discipline::Discipline
//! [`HarvestEngine`]: engine::HarvestEngine
//! [`MemoryHost`]: memory::MemoryHost

pub mod config;
pub mod decision;
pub mod definition;
pub mod discipline;
pub mod engine;
pub mod exclusion;
pub mod host;
pub mod memory;
pub mod mutation;
pub mod operator;
pub mod probability;
pub mod resource;
pub mod runner;
pub mod scheduler;

// Re-export primary types at crate root.
pub use config::{ConfigError, DisciplineOverrides, EngineConfig, SimulationConfig, WorldConfig};
pub use decision::{DecisionError, DecisionSource, PlannedHarvest, Routine, ScriptedDecisionSource};
pub use definition::{DefinitionError, EffectCue, HarvestDefinition, HarvestMessages};
pub use discipline::{Attempt, Discipline, DisciplineError, FailurePolicy, HookContext};
pub use engine::{AttemptReport, BeginOutcome, DisciplineId, EngineError, HarvestEngine, HarvestRequest};
pub use exclusion::{ExclusionRegistry, LockScope};
pub use host::{ActorHost, EffectSink, HarvestHost, MessageSink};
pub use memory::MemoryHost;
pub use mutation::{ContextFlag, ContextFlags, Mutation, MutationEntry, MutationTable};
pub use operator::{OperatorState, SimulationEndReason};
pub use resource::{BonusResource, ResourceDescriptor, Vein};
pub use runner::{SimulationState, TickSummary};
