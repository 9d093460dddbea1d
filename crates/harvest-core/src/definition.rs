//! Harvest definitions: the static ruleset of one discipline.
//!
//! A [`HarvestDefinition`] binds the eligible terrain, bank sizing, respawn
//! timing, per-harvest consumption, effect cadence, message catalog, veins,
//! and bonus resources together. Definitions are built once when a
//! discipline is constructed, optionally tuned from configuration, and
//! validated exactly once when registered with the engine. A definition that
//! fails [`HarvestDefinition::validate`] is a startup error, never an
//! attempt-time one.

use harvest_types::{Notice, ToolKind};
use harvest_world::{BankSizing, RespawnTrigger, RespawnWindow, TileSet, WorldError};

use crate::config::DisciplineOverrides;
use crate::resource::{BonusResource, ResourceDescriptor, Vein};

/// Errors that make a definition unusable.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// The definition has an empty name.
    #[error("definition has no name")]
    MissingName,

    /// No skill is named for the success checks.
    #[error("{definition}: no skill configured")]
    MissingSkill {
        /// Definition name.
        definition: String,
    },

    /// No terrain tile is eligible.
    #[error("{definition}: tile set is empty")]
    EmptyTiles {
        /// Definition name.
        definition: String,
    },

    /// No tool kind is accepted.
    #[error("{definition}: no tool kinds accepted")]
    NoTools {
        /// Definition name.
        definition: String,
    },

    /// Bank sizing or respawn timing is inconsistent.
    #[error("{definition}: {source}")]
    Bank {
        /// Definition name.
        definition: String,
        /// The underlying bank validation error.
        source: WorldError,
    },

    /// Each harvest must take at least one unit from the bank.
    #[error("{definition}: consumed_per_harvest must be at least 1")]
    ZeroConsumption {
        /// Definition name.
        definition: String,
    },

    /// The definition has no veins to harvest from.
    #[error("{definition}: no veins")]
    NoVeins {
        /// Definition name.
        definition: String,
    },

    /// A vein or one of its descriptors is malformed.
    #[error("{definition}: vein {index}: {reason}")]
    InvalidVein {
        /// Definition name.
        definition: String,
        /// Position of the vein.
        index: usize,
        /// What is wrong.
        reason: String,
    },

    /// A bonus resource entry is malformed.
    #[error("{definition}: bonus resource {index}: {reason}")]
    InvalidBonus {
        /// Definition name.
        definition: String,
        /// Position of the entry.
        index: usize,
        /// What is wrong.
        reason: String,
    },

    /// A mutation table row is malformed.
    #[error("mutation entry {index}: {reason}")]
    InvalidMutation {
        /// Position of the row.
        index: usize,
        /// What is wrong.
        reason: String,
    },

    /// A discipline with the same name is already registered.
    #[error("discipline {name} is already registered")]
    Duplicate {
        /// The clashing name.
        name: String,
    },
}

/// The notices a definition sends for each non-success outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestMessages {
    /// The bank at the target is exhausted.
    pub no_resources: Notice,
    /// The skill check failed.
    pub fail: Notice,
    /// The target is out of reach when the attempt starts.
    pub out_of_range: Notice,
    /// The actor moved out of reach while the attempt was running.
    pub timed_out_of_range: Notice,
    /// The item did not fit in the pack.
    pub pack_full: Notice,
    /// The tool broke.
    pub tool_broke: Notice,
    /// The target is not a harvestable tile.
    pub bad_target: Notice,
    /// The actor holds no tool of an accepted kind.
    pub bad_tool: Notice,
    /// The attempt was cancelled.
    pub cancelled: Notice,
    /// The actor cannot harvest right now (dead, or similar).
    pub ineligible: Notice,
}

/// The per-poll cue played while an actor works.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectCue {
    /// Animation played on the actor.
    pub action: Option<u16>,
    /// Sound played at the target.
    pub sound: Option<u16>,
}

/// The static ruleset of one discipline.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestDefinition {
    /// Discipline name, used as its registry key and in logs.
    pub name: String,
    /// Skill consulted for success checks.
    pub skill: String,
    /// Tool kinds that may be used.
    pub tool_kinds: Vec<ToolKind>,
    /// Eligible terrain tiles.
    pub tiles: TileSet,
    /// Maximum distance, in tiles on each axis, between actor and target.
    pub max_range: u32,
    /// Tile group footprint and capacity range of the banks.
    pub bank: BankSizing,
    /// Delay range before a bank refills.
    pub respawn: RespawnWindow,
    /// When a bank schedules its refill.
    pub respawn_trigger: RespawnTrigger,
    /// Units taken from the bank by each harvest poll, before the skill check.
    pub consumed_per_harvest: u32,
    /// Polls that only play the effect cue before the harvest poll.
    pub effect_polls: u32,
    /// The per-poll effect cue.
    pub effect: EffectCue,
    /// Notices for non-success outcomes.
    pub messages: HarvestMessages,
    /// Weighted veins.
    pub veins: Vec<Vein>,
    /// Bonus resources; empty for none.
    pub bonus: Vec<BonusResource>,
    /// Drop the item at the actor's feet when the pack is full.
    pub place_at_feet_if_full: bool,
}

impl HarvestDefinition {
    /// Whether `kind` is an accepted tool.
    pub fn accepts_tool(&self, kind: &ToolKind) -> bool {
        self.tool_kinds.iter().any(|k| k == kind)
    }

    /// Check every field the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`DefinitionError`] found.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::MissingName);
        }
        let definition = || self.name.clone();
        if self.skill.trim().is_empty() {
            return Err(DefinitionError::MissingSkill {
                definition: definition(),
            });
        }
        if self.tiles.is_empty() {
            return Err(DefinitionError::EmptyTiles {
                definition: definition(),
            });
        }
        if self.tool_kinds.is_empty() {
            return Err(DefinitionError::NoTools {
                definition: definition(),
            });
        }
        self.bank
            .validate()
            .and_then(|()| self.respawn.validate())
            .map_err(|source| DefinitionError::Bank {
                definition: definition(),
                source,
            })?;
        if self.consumed_per_harvest == 0 {
            return Err(DefinitionError::ZeroConsumption {
                definition: definition(),
            });
        }
        if self.veins.is_empty() {
            return Err(DefinitionError::NoVeins {
                definition: definition(),
            });
        }
        self.validate_veins()?;
        self.validate_bonus()
    }

    fn validate_veins(&self) -> Result<(), DefinitionError> {
        let invalid = |index: usize, reason: String| DefinitionError::InvalidVein {
            definition: self.name.clone(),
            index,
            reason,
        };
        let mut total = 0.0;
        for (index, vein) in self.veins.iter().enumerate() {
            if !vein.weight.is_finite() || vein.weight < 0.0 {
                return Err(invalid(index, format!("weight {} is not >= 0", vein.weight)));
            }
            if !(0.0..=1.0).contains(&vein.fallback_chance) {
                return Err(invalid(
                    index,
                    format!("fallback chance {} is outside [0, 1]", vein.fallback_chance),
                ));
            }
            check_descriptor(&vein.primary).map_err(|reason| invalid(index, reason))?;
            if let Some(fallback) = &vein.fallback {
                check_descriptor(fallback).map_err(|reason| invalid(index, reason))?;
            }
            total += vein.weight;
        }
        if total <= 0.0 {
            return Err(invalid(0, "total vein weight must be positive".to_owned()));
        }
        Ok(())
    }

    fn validate_bonus(&self) -> Result<(), DefinitionError> {
        if self.bonus.is_empty() {
            return Ok(());
        }
        let invalid = |index: usize, reason: String| DefinitionError::InvalidBonus {
            definition: self.name.clone(),
            index,
            reason,
        };
        let mut total = 0.0;
        for (index, bonus) in self.bonus.iter().enumerate() {
            if !bonus.weight.is_finite() || bonus.weight < 0.0 {
                return Err(invalid(index, format!("weight {} is not >= 0", bonus.weight)));
            }
            if !bonus.req_skill.is_finite() {
                return Err(invalid(index, "required skill must be finite".to_owned()));
            }
            total += bonus.weight;
        }
        if total <= 0.0 {
            return Err(invalid(0, "total bonus weight must be positive".to_owned()));
        }
        Ok(())
    }

    /// Apply configuration overrides in place. Unset fields are left alone.
    pub fn apply_overrides(&mut self, overrides: &DisciplineOverrides) {
        if let Some(width) = overrides.bank_width {
            self.bank.width = width;
        }
        if let Some(height) = overrides.bank_height {
            self.bank.height = height;
        }
        if let Some(min_total) = overrides.min_total {
            self.bank.min_total = min_total;
        }
        if let Some(max_total) = overrides.max_total {
            self.bank.max_total = max_total;
        }
        if let Some(secs) = overrides.min_respawn_secs {
            self.respawn.min_ms = secs.saturating_mul(1000);
        }
        if let Some(secs) = overrides.max_respawn_secs {
            self.respawn.max_ms = secs.saturating_mul(1000);
        }
        if let Some(trigger) = overrides.respawn_trigger {
            self.respawn_trigger = trigger;
        }
        if let Some(range) = overrides.max_range {
            self.max_range = range;
        }
        if let Some(consumed) = overrides.consumed_per_harvest {
            self.consumed_per_harvest = consumed;
        }
        if let Some(polls) = overrides.effect_polls {
            self.effect_polls = polls;
        }
    }
}

fn check_descriptor(descriptor: &ResourceDescriptor) -> Result<(), String> {
    let bounds = [descriptor.req_skill, descriptor.min_skill, descriptor.max_skill];
    if bounds.iter().any(|b| !b.is_finite()) {
        return Err(format!("{}: skill bounds must be finite", descriptor.name));
    }
    if descriptor.max_skill <= descriptor.min_skill {
        return Err(format!(
            "{}: max skill {} must exceed min skill {}",
            descriptor.name, descriptor.max_skill, descriptor.min_skill
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use harvest_types::ItemKind;

    use super::*;

    /// A small, valid definition shared by the engine tests.
    pub(crate) fn sample_definition() -> HarvestDefinition {
        HarvestDefinition {
            name: "gathering".to_owned(),
            skill: "gathering".to_owned(),
            tool_kinds: vec![ToolKind::from_static("basket")],
            tiles: TileSet::from_ranges(&[(0x00A8, 0x00AB)]),
            max_range: 2,
            bank: BankSizing {
                width: 8,
                height: 8,
                min_total: 5,
                max_total: 5,
            },
            respawn: RespawnWindow::from_secs(60, 120),
            respawn_trigger: RespawnTrigger::OnDepletion,
            consumed_per_harvest: 1,
            effect_polls: 0,
            effect: EffectCue::default(),
            messages: HarvestMessages {
                no_resources: Notice::literal("nothing here"),
                fail: Notice::literal("you fail"),
                out_of_range: Notice::literal("too far"),
                timed_out_of_range: Notice::literal("you wandered off"),
                pack_full: Notice::literal("pack full"),
                tool_broke: Notice::literal("tool broke"),
                bad_target: Notice::literal("cannot harvest that"),
                bad_tool: Notice::literal("wrong tool"),
                cancelled: Notice::literal("you stop"),
                ineligible: Notice::literal("you cannot do that now"),
            },
            veins: vec![Vein::single(
                100.0,
                ResourceDescriptor::new(ItemKind::from_static("berries"), "berries", 0.0, 0.0, 100.0),
            )],
            bonus: Vec::new(),
            place_at_feet_if_full: false,
        }
    }

    #[test]
    fn sample_is_valid() {
        assert!(sample_definition().validate().is_ok());
    }

    #[test]
    fn empty_tiles_fail_fast() {
        let mut def = sample_definition();
        def.tiles = TileSet::default();
        assert!(matches!(def.validate(), Err(DefinitionError::EmptyTiles { .. })));
    }

    #[test]
    fn inverted_respawn_fails() {
        let mut def = sample_definition();
        def.respawn = RespawnWindow::from_secs(120, 60);
        assert!(matches!(def.validate(), Err(DefinitionError::Bank { .. })));
    }

    #[test]
    fn vein_weights_checked() {
        let mut def = sample_definition();
        if let Some(vein) = def.veins.first_mut() {
            vein.weight = -1.0;
        }
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidVein { .. })));

        let mut def = sample_definition();
        if let Some(vein) = def.veins.first_mut() {
            vein.weight = 0.0;
        }
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidVein { .. })));
    }

    #[test]
    fn fallback_chance_checked() {
        let mut def = sample_definition();
        if let Some(vein) = def.veins.first_mut() {
            vein.fallback_chance = 1.5;
        }
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidVein { .. })));
    }

    #[test]
    fn descriptor_ramp_checked() {
        let mut def = sample_definition();
        if let Some(vein) = def.veins.first_mut() {
            vein.primary.max_skill = 0.0;
        }
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidVein { .. })));
    }

    #[test]
    fn zero_consumption_rejected() {
        let mut def = sample_definition();
        def.consumed_per_harvest = 0;
        assert!(matches!(def.validate(), Err(DefinitionError::ZeroConsumption { .. })));
    }

    #[test]
    fn bonus_needs_positive_total() {
        let mut def = sample_definition();
        def.bonus = vec![BonusResource::nothing(0.0)];
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidBonus { .. })));
        def.bonus = vec![BonusResource::nothing(99.4)];
        assert!(def.validate().is_ok());
    }

    #[test]
    fn overrides_apply_only_set_fields() {
        let mut def = sample_definition();
        let overrides = DisciplineOverrides {
            max_total: Some(9),
            max_respawn_secs: Some(300),
            effect_polls: Some(2),
            ..DisciplineOverrides::default()
        };
        def.apply_overrides(&overrides);
        assert_eq!(def.bank.min_total, 5);
        assert_eq!(def.bank.max_total, 9);
        assert_eq!(def.respawn.max_ms, 300_000);
        assert_eq!(def.respawn.min_ms, 60_000);
        assert_eq!(def.effect_polls, 2);
        assert_eq!(def.max_range, 2);
    }

    #[test]
    fn tool_acceptance() {
        let def = sample_definition();
        assert!(def.accepts_tool(&ToolKind::from_static("basket")));
        assert!(!def.accepts_tool(&ToolKind::from_static("pickaxe")));
    }
}
