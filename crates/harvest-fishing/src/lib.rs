//! The fishing discipline for the harvesting engine.
//!
//! Fishers cast into water tiles within four tiles of where they stand. Each
//! cast plays out over three casting polls before the catch is decided. Most
//! catches are fish; skilled fishers in open water occasionally land big fish,
//! special nets, treasure maps, or messages in bottles (the last three get
//! snatched by a sea serpent). A fisher carrying a shipwreck message near the
//! wreck pulls up salvage instead.
//!
//! # Modules
//!
//! - [`definition`] -- The harvest definition, mutation table, and message
//!   catalog numbers.
//! - [`discipline`] -- [`FishingDiscipline`], the engine hooks.
//! - [`items`] -- Item and tool kinds, and their display names.
//! - [`salvage`] -- Shipwreck markers and salvage construction.
//! - [`serpent`] -- Sea serpents that take a catch.
//! - [`water`] -- Water tiles, deep water, and surfacing spots.

pub mod definition;
pub mod discipline;
pub mod items;
pub mod salvage;
pub mod serpent;
pub mod water;

// Re-export primary types at crate root.
pub use definition::{DEEP_WATER, fishing_definition, mutation_table};
pub use discipline::FishingDiscipline;
pub use items::FISHING_POLE;
pub use salvage::{Salvage, SosMarker};
