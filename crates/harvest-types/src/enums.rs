//! Enumeration types for the harvesting engine.
//!
//! Outcomes are ordinary values: running out of fish, wandering away from
//! the shore, or already being busy are all expected results of an attempt,
//! reported through [`HarvestOutcome`] rather than through errors.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal result of a harvest attempt (or of a rejected start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HarvestOutcome {
    /// An item was produced and handed over (pack, feet, or a redirect).
    Succeeded,
    /// The discipline short-circuited delivery with special content.
    Special,
    /// The skill check failed, or mutation produced nothing.
    Failed,
    /// The resource bank for the target region is exhausted.
    NoResources,
    /// The actor is (or moved) out of range of the target.
    OutOfRange,
    /// The tool broke during the attempt.
    ToolBroken,
    /// The item was produced but the actor's pack had no room for it.
    PackFull,
    /// The attempt was cancelled before it resolved.
    Cancelled,
    /// The actor already holds the lock for this kind of harvesting.
    AlreadyHarvesting,
    /// The actor or tool is not eligible (mounted, wrong tool, dead).
    Ineligible,
    /// The target is not a harvestable tile for this discipline.
    BadTarget,
}

impl HarvestOutcome {
    /// Whether the actor walked away with something.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded | Self::Special)
    }

    /// Short snake-case label used in logs and tallies.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Special => "special",
            Self::Failed => "failed",
            Self::NoResources => "no_resources",
            Self::OutOfRange => "out_of_range",
            Self::ToolBroken => "tool_broken",
            Self::PackFull => "pack_full",
            Self::Cancelled => "cancelled",
            Self::AlreadyHarvesting => "already_harvesting",
            Self::Ineligible => "ineligible",
            Self::BadTarget => "bad_target",
        }
    }
}

impl core::fmt::Display for HarvestOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Where a successfully constructed item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Delivery {
    /// Placed in the actor's pack.
    Pack,
    /// Dropped on the ground at the actor's feet.
    Feet,
    /// Handed to someone or something else by the discipline.
    Redirected,
    /// Refused: the pack was full and dropping was not allowed.
    PackFull,
}

// ---------------------------------------------------------------------------
// Attempt lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a harvest attempt.
///
/// `Idle -> Validating -> Locked -> Polling -> Resolving -> Finished`.
/// Rejections jump from `Validating` or `Locked` straight to `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptState {
    /// Not yet started.
    Idle,
    /// Eligibility, tool, target, and range checks are running.
    Validating,
    /// The exclusion lock is held; the first poll is not yet scheduled.
    Locked,
    /// Waiting on the recurring poll callback.
    Polling,
    /// The skill check passed; vein, mutation, and delivery are running.
    Resolving,
    /// Terminal.
    Finished(HarvestOutcome),
}

impl AttemptState {
    /// Whether the attempt has reached a terminal state.
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_outcomes() {
        assert!(HarvestOutcome::Succeeded.is_success());
        assert!(HarvestOutcome::Special.is_success());
        assert!(!HarvestOutcome::PackFull.is_success());
        assert!(!HarvestOutcome::AlreadyHarvesting.is_success());
    }

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(HarvestOutcome::NoResources.to_string(), "no_resources");
        assert_eq!(HarvestOutcome::ToolBroken.label(), "tool_broken");
    }

    #[test]
    fn finished_state_detection() {
        assert!(AttemptState::Finished(HarvestOutcome::Cancelled).is_finished());
        assert!(!AttemptState::Polling.is_finished());
    }
}
