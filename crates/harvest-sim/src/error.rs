//! Error types for the simulation binary.
//!
//! [`SimError`] is the top-level error type that wraps all possible
//! failure modes during startup and the simulation run.

/// Top-level error for the simulation binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: harvest_core::config::ConfigError,
    },

    /// Building the coast failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: harvest_world::WorldError,
    },

    /// A discipline was rejected at registration.
    #[error("definition error: {source}")]
    Definition {
        /// The underlying definition error.
        #[from]
        source: harvest_core::definition::DefinitionError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: harvest_core::runner::RunnerError,
    },

    /// Fisher spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
