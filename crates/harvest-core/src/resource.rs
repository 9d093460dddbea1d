//! Resource descriptors, veins, and bonus resources.
//!
//! Selection is two-stage: a [`Vein`] is picked by weight, then the vein
//! resolves to its primary or (rarely) its fallback [`ResourceDescriptor`].
//! Bonus resources are an independent weighted draw gated by skill; a granted
//! bonus travels silently alongside the main item.

use harvest_types::ItemKind;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::probability::{pick_weighted, skill_chance};

/// One extractable resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// The item produced on success.
    pub kind: ItemKind,
    /// Display name used in success notices.
    pub name: String,
    /// Unmodified skill the actor needs before the check is attempted at all.
    pub req_skill: f64,
    /// Skill at which the success chance is zero.
    pub min_skill: f64,
    /// Skill at which the success chance reaches one.
    pub max_skill: f64,
}

impl ResourceDescriptor {
    /// Create a descriptor.
    pub fn new(
        kind: ItemKind,
        name: impl Into<String>,
        req_skill: f64,
        min_skill: f64,
        max_skill: f64,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            req_skill,
            min_skill,
            max_skill,
        }
    }

    /// Whether an actor with this base skill may try for the resource.
    pub fn is_attainable(&self, base_skill: f64) -> bool {
        base_skill >= self.req_skill
    }

    /// Chance that an actor with effective skill `value` succeeds.
    pub fn success_chance(&self, value: f64) -> f64 {
        skill_chance(value, self.min_skill, self.max_skill)
    }
}

/// A weighted choice between a primary resource and a rarer fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vein {
    /// Relative weight among the definition's veins.
    pub weight: f64,
    /// Resource yielded by default.
    pub primary: ResourceDescriptor,
    /// Resource substituted with probability `fallback_chance`.
    pub fallback: Option<ResourceDescriptor>,
    /// Probability in `[0, 1]` of yielding the fallback.
    pub fallback_chance: f64,
}

impl Vein {
    /// A vein with no fallback.
    pub const fn single(weight: f64, primary: ResourceDescriptor) -> Self {
        Self {
            weight,
            primary,
            fallback: None,
            fallback_chance: 0.0,
        }
    }

    /// Resolve to the descriptor used for this attempt.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> &ResourceDescriptor {
        match &self.fallback {
            Some(fallback) if rng.random::<f64>() < self.fallback_chance => fallback,
            _ => &self.primary,
        }
    }
}

/// Pick the active vein for an attempt, proportional to weight.
pub fn select_vein<'a, R: Rng + ?Sized>(veins: &'a [Vein], rng: &mut R) -> Option<&'a Vein> {
    pick_weighted(veins, |v| v.weight, rng)
}

/// An extra item occasionally granted alongside a successful harvest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusResource {
    /// Base skill needed for the entry to be considered.
    pub req_skill: f64,
    /// Relative weight among the eligible entries.
    pub weight: f64,
    /// The bonus item, or `None` for "no bonus this time".
    pub kind: Option<ItemKind>,
}

impl BonusResource {
    /// The weighted "nothing extra" entry.
    pub const fn nothing(weight: f64) -> Self {
        Self {
            req_skill: 0.0,
            weight,
            kind: None,
        }
    }
}

/// Pick a bonus entry among those the actor's base skill qualifies for.
pub fn select_bonus<'a, R: Rng + ?Sized>(
    bonus: &'a [BonusResource],
    base_skill: f64,
    rng: &mut R,
) -> Option<&'a BonusResource> {
    pick_weighted(
        bonus,
        |b| if base_skill >= b.req_skill { b.weight } else { 0.0 },
        rng,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn fish() -> ResourceDescriptor {
        ResourceDescriptor::new(ItemKind::from_static("fish"), "fish", 0.0, 0.0, 100.0)
    }

    fn pearl() -> ResourceDescriptor {
        ResourceDescriptor::new(ItemKind::from_static("pearl"), "pearl", 50.0, 50.0, 120.0)
    }

    #[test]
    fn attainability_uses_req_skill() {
        assert!(fish().is_attainable(0.0));
        assert!(!pearl().is_attainable(49.9));
        assert!(pearl().is_attainable(50.0));
    }

    #[test]
    fn vein_without_fallback_always_primary() {
        let mut rng = SmallRng::seed_from_u64(1);
        let vein = Vein::single(100.0, fish());
        for _ in 0..50 {
            assert_eq!(vein.resolve(&mut rng).kind.as_str(), "fish");
        }
    }

    #[test]
    fn vein_with_certain_fallback() {
        let mut rng = SmallRng::seed_from_u64(2);
        let vein = Vein {
            weight: 1.0,
            primary: fish(),
            fallback: Some(pearl()),
            fallback_chance: 1.0,
        };
        for _ in 0..50 {
            assert_eq!(vein.resolve(&mut rng).kind.as_str(), "pearl");
        }
    }

    #[test]
    fn select_vein_ignores_weightless() {
        let mut rng = SmallRng::seed_from_u64(3);
        let veins = [Vein::single(0.0, pearl()), Vein::single(5.0, fish())];
        for _ in 0..50 {
            let vein = select_vein(&veins, &mut rng).unwrap();
            assert_eq!(vein.primary.kind.as_str(), "fish");
        }
    }

    #[test]
    fn bonus_gated_by_skill() {
        let mut rng = SmallRng::seed_from_u64(4);
        let bonus = [
            BonusResource::nothing(1.0),
            BonusResource {
                req_skill: 80.0,
                weight: 1_000_000.0,
                kind: Some(ItemKind::from_static("white_pearl")),
            },
        ];
        for _ in 0..50 {
            assert!(select_bonus(&bonus, 10.0, &mut rng).unwrap().kind.is_none());
        }
        let picks = (0..50)
            .filter(|_| {
                select_bonus(&bonus, 90.0, &mut rng).is_some_and(|b| b.kind.is_some())
            })
            .count();
        assert!(picks >= 49);
    }
}
