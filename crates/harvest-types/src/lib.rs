//! Shared type definitions for the harvesting engine.
//!
//! This crate is the single source of truth for the value types that flow
//! between the world model, the engine, the disciplines, and the host
//! collaborators (actors, messaging, effects).
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actors, items, and attempts
//! - [`enums`] -- Attempt outcomes, delivery results, and lifecycle states
//! - [`structs`] -- Geometry, item and tool kinds, items, actor snapshots,
//!   skill readings, and notices

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AttemptState, Delivery, HarvestOutcome};
pub use ids::{ActorId, AttemptId, ItemId};
pub use structs::{
    ActorView, HarvestedItem, ItemKind, MapId, Notice, Point3D, SkillValue, Tool, ToolKind,
};
