//! Mutation tables: ordered rules that swap a harvested type for a rarer one.
//!
//! A table is scanned top to bottom. For each entry the actor must meet the
//! entry's base-skill floor and, if the entry names a [`ContextFlag`], the
//! flag must be set for the target location. The entry then rolls its own
//! ramp chance; the first entry that wins decides the result and the scan
//! stops. If nothing wins the harvested type is kept.

use std::collections::BTreeSet;

use harvest_types::{ItemKind, SkillValue};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::definition::DefinitionError;
use crate::probability::{roll, skill_chance};

/// A named property of the target location, e.g. "deep water".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextFlag(pub &'static str);

/// The flags computed for one target location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFlags(BTreeSet<ContextFlag>);

impl ContextFlags {
    /// No flags set.
    pub const fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Set `flag`.
    pub fn insert(&mut self, flag: ContextFlag) {
        self.0.insert(flag);
    }

    /// Return a copy with `flag` set when `on` is true.
    #[must_use]
    pub fn with(mut self, flag: ContextFlag, on: bool) -> Self {
        if on {
            self.0.insert(flag);
        }
        self
    }

    /// Whether `flag` is set.
    pub fn contains(&self, flag: ContextFlag) -> bool {
        self.0.contains(&flag)
    }
}

/// What a mutation table decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Keep the type chosen by vein resolution.
    Keep,
    /// Produce this type instead.
    Replace(ItemKind),
    /// Produce nothing at all; the attempt counts as a failure.
    Nothing,
}

/// One row of a mutation table.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationEntry {
    /// Base skill floor for the entry to be considered.
    pub req_skill: f64,
    /// Ramp start.
    pub min_skill: f64,
    /// Ramp end. May be below `min_skill` for chances that fall with skill.
    pub max_skill: f64,
    /// Context flag the location must have, if any.
    pub requires: Option<ContextFlag>,
    /// Candidate outputs, one picked uniformly; `None` means "nothing".
    pub candidates: Vec<Option<ItemKind>>,
}

impl MutationEntry {
    /// An entry with no flag requirement.
    pub fn new(
        req_skill: f64,
        min_skill: f64,
        max_skill: f64,
        candidates: Vec<Option<ItemKind>>,
    ) -> Self {
        Self {
            req_skill,
            min_skill,
            max_skill,
            requires: None,
            candidates,
        }
    }

    /// Require `flag` for this entry.
    #[must_use]
    pub fn requiring(mut self, flag: ContextFlag) -> Self {
        self.requires = Some(flag);
        self
    }

    /// Whether the entry applies at all for this actor and location.
    pub fn applies(&self, skill: SkillValue, flags: &ContextFlags) -> bool {
        if self.requires.is_some_and(|flag| !flags.contains(flag)) {
            return false;
        }
        skill.base >= self.req_skill
    }

    /// The entry's win chance for this actor.
    pub fn chance(&self, skill: SkillValue) -> f64 {
        skill_chance(skill.value, self.min_skill, self.max_skill)
    }
}

/// An ordered list of [`MutationEntry`] rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationTable {
    entries: Vec<MutationEntry>,
}

impl MutationTable {
    /// Build a table; declaration order is evaluation order.
    pub const fn new(entries: Vec<MutationEntry>) -> Self {
        Self { entries }
    }

    /// The rows in evaluation order.
    pub fn entries(&self) -> &[MutationEntry] {
        &self.entries
    }

    /// Reject rows with no candidates or non-finite numbers.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidMutation`] naming the bad row.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.candidates.is_empty() {
                return Err(DefinitionError::InvalidMutation {
                    index,
                    reason: "no candidates".to_owned(),
                });
            }
            let numbers = [entry.req_skill, entry.min_skill, entry.max_skill];
            if numbers.iter().any(|n| !n.is_finite()) {
                return Err(DefinitionError::InvalidMutation {
                    index,
                    reason: "skill bounds must be finite".to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Run the table for one successful harvest.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        skill: SkillValue,
        flags: &ContextFlags,
        rng: &mut R,
    ) -> Mutation {
        for entry in &self.entries {
            if !entry.applies(skill, flags) || !roll(rng, entry.chance(skill)) {
                continue;
            }
            return match entry.candidates.choose(rng) {
                Some(Some(kind)) => Mutation::Replace(kind.clone()),
                Some(None) => Mutation::Nothing,
                None => Mutation::Keep,
            };
        }
        Mutation::Keep
    }
}
