//! Terrain and resource banks for the harvesting engine.
//!
//! This crate models the parts of the world a harvester touches: the land
//! tile under a target, the tile sets a discipline may harvest from, and the
//! per-region banks that bound how much can be extracted before the region
//! has to respawn.
//!
//! # Modules
//!
//! - [`bank`] -- Region keys, bank sizing, respawn windows, and the
//!   [`BankRegistry`] of lazily created [`ResourceBank`]s.
//! - [`error`] -- Error types for grid and bank operations.
//! - [`grid`] -- The [`WorldQuery`] collaborator trait and the in-memory
//!   [`TileGrid`].
//! - [`tiles`] -- Tile identifiers, land tiles, and eligible tile sets.

pub mod bank;
pub mod error;
pub mod grid;
pub mod tiles;

// Re-export primary types at crate root.
pub use bank::{BankRegistry, BankSizing, RegionKey, ResourceBank, RespawnTrigger, RespawnWindow};
pub use error::WorldError;
pub use grid::{TileGrid, WorldQuery};
pub use tiles::{LandTile, TileId, TileRange, TileSet};
