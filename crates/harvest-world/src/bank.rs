//! Resource banks: per-region extraction budgets that deplete and respawn.
//!
//! The map is cut into rectangular tile groups (for fishing, 8x8 tiles). Each
//! group that has ever been harvested owns one [`ResourceBank`], created
//! lazily with a random capacity. Successful extractions decrement it; a
//! respawn deadline resets it to a freshly drawn capacity.
//!
//! # Invariants
//!
//! - `remaining <= capacity` at all times; both are unsigned.
//! - At most one respawn deadline is pending per bank.
//! - Banks are only mutated by their owner (the harvest engine), from a
//!   single scheduling context.

use std::collections::BTreeMap;

use harvest_types::{MapId, Point3D};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Region keys
// ---------------------------------------------------------------------------

/// Identifies one tile group: the map plus the group's column and row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionKey {
    /// The map the group lies on.
    pub map: MapId,
    /// `x` divided (flooring) by the group width.
    pub column: i32,
    /// `y` divided (flooring) by the group height.
    pub row: i32,
}

impl RegionKey {
    /// Compute the group containing `point` for a `width` x `height` footprint.
    ///
    /// Negative coordinates floor toward negative infinity, so `x = -1`
    /// lands in column `-1`, not column `0`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidBankConfig`] if either dimension is zero
    /// or does not fit in an `i32`.
    pub fn for_point(
        map: MapId,
        point: Point3D,
        width: u32,
        height: u32,
    ) -> Result<Self, WorldError> {
        let w = i32::try_from(width).ok().filter(|w| *w > 0);
        let h = i32::try_from(height).ok().filter(|h| *h > 0);
        let (Some(w), Some(h)) = (w, h) else {
            return Err(WorldError::InvalidBankConfig {
                reason: format!("bank footprint {width}x{height} is empty or too large"),
            });
        };
        let column = point
            .x
            .checked_div_euclid(w)
            .ok_or(WorldError::ArithmeticOverflow)?;
        let row = point
            .y
            .checked_div_euclid(h)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(Self { map, column, row })
    }
}

impl core::fmt::Display for RegionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}[{},{}]", self.map, self.column, self.row)
    }
}

// ---------------------------------------------------------------------------
// Sizing and timing
// ---------------------------------------------------------------------------

/// Footprint and capacity range of the banks of one discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSizing {
    /// Tile group width.
    pub width: u32,
    /// Tile group height.
    pub height: u32,
    /// Smallest capacity a bank can be drawn with.
    pub min_total: u32,
    /// Largest capacity a bank can be drawn with.
    pub max_total: u32,
}

impl BankSizing {
    /// Check the footprint is non-empty and `0 < min_total <= max_total`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidBankConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.width == 0 || self.height == 0 {
            return Err(WorldError::InvalidBankConfig {
                reason: format!("bank footprint {}x{} is empty", self.width, self.height),
            });
        }
        if self.min_total == 0 {
            return Err(WorldError::InvalidBankConfig {
                reason: "min_total must be at least 1".to_owned(),
            });
        }
        if self.min_total > self.max_total {
            return Err(WorldError::InvalidBankConfig {
                reason: format!(
                    "min_total {} exceeds max_total {}",
                    self.min_total, self.max_total
                ),
            });
        }
        Ok(())
    }

    /// Draw a capacity uniformly from `[min_total, max_total]`.
    pub fn draw_capacity<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let lo = self.min_total.min(self.max_total);
        let hi = self.min_total.max(self.max_total);
        rng.random_range(lo..=hi)
    }
}

/// Range of respawn delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnWindow {
    /// Shortest delay.
    pub min_ms: u64,
    /// Longest delay.
    pub max_ms: u64,
}

impl RespawnWindow {
    /// Build a window from whole seconds.
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min_ms: min.saturating_mul(1000),
            max_ms: max.saturating_mul(1000),
        }
    }

    /// Check `min_ms <= max_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidBankConfig`] when the range is inverted.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.min_ms > self.max_ms {
            return Err(WorldError::InvalidBankConfig {
                reason: format!(
                    "respawn window is inverted: {}ms > {}ms",
                    self.min_ms, self.max_ms
                ),
            });
        }
        Ok(())
    }

    /// Draw a delay uniformly from `[min_ms, max_ms]`.
    pub fn draw_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let lo = self.min_ms.min(self.max_ms);
        let hi = self.min_ms.max(self.max_ms);
        rng.random_range(lo..=hi)
    }
}

/// When a bank asks for its respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnTrigger {
    /// Once the bank runs dry.
    OnDepletion,
    /// As soon as the first unit is taken from a full bank.
    OnFirstHarvest,
}

// ---------------------------------------------------------------------------
// ResourceBank
// ---------------------------------------------------------------------------

/// The extraction budget of one tile group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBank {
    remaining: u32,
    capacity: u32,
    respawn_at: Option<u64>,
}

impl ResourceBank {
    /// Create a full bank with a fixed capacity.
    pub const fn with_capacity(capacity: u32) -> Self {
        Self {
            remaining: capacity,
            capacity,
            respawn_at: None,
        }
    }

    /// Create a full bank with a capacity drawn from `sizing`.
    pub fn draw<R: Rng + ?Sized>(sizing: &BankSizing, rng: &mut R) -> Self {
        Self::with_capacity(sizing.draw_capacity(rng))
    }

    /// Units still extractable.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Capacity drawn at creation or at the last respawn.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Deadline of the pending respawn, if any.
    pub const fn respawn_at(&self) -> Option<u64> {
        self.respawn_at
    }

    /// Whether nothing is left.
    pub const fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// Whether another harvest of `amount` units can still be taken.
    ///
    /// A leftover smaller than `amount` counts as dry: it can never be drawn.
    pub const fn can_supply(&self, amount: u32) -> bool {
        self.remaining > 0 && self.remaining >= amount
    }

    /// Whether nothing has been taken since the last respawn.
    pub const fn is_full(&self) -> bool {
        self.remaining == self.capacity
    }

    /// Take `amount` units if at least that many remain.
    ///
    /// Returns `false` without touching the bank otherwise; an exhausted
    /// bank is a normal condition, not an error.
    pub fn try_consume(&mut self, amount: u32) -> bool {
        match self.remaining.checked_sub(amount) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => false,
        }
    }

    /// Record a respawn deadline `now_ms + delay`, with the delay drawn from
    /// `window`.
    ///
    /// Returns `Ok(None)` without drawing if a respawn is already pending.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if the deadline overflows.
    pub fn schedule_respawn<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        window: &RespawnWindow,
        rng: &mut R,
    ) -> Result<Option<u64>, WorldError> {
        if self.respawn_at.is_some() {
            return Ok(None);
        }
        let deadline = now_ms
            .checked_add(window.draw_delay(rng))
            .ok_or(WorldError::ArithmeticOverflow)?;
        self.respawn_at = Some(deadline);
        Ok(Some(deadline))
    }

    /// Refill to `capacity` and clear the pending deadline.
    pub const fn respawn(&mut self, capacity: u32) {
        self.capacity = capacity;
        self.remaining = capacity;
        self.respawn_at = None;
    }
}

// ---------------------------------------------------------------------------
// BankRegistry
// ---------------------------------------------------------------------------

/// All banks of one discipline, keyed by region.
#[derive(Debug, Clone, Default)]
pub struct BankRegistry {
    banks: BTreeMap<RegionKey, ResourceBank>,
}

impl BankRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            banks: BTreeMap::new(),
        }
    }

    /// Return the bank for `key`, creating a full one on first use.
    pub fn acquire<R: Rng + ?Sized>(
        &mut self,
        key: RegionKey,
        sizing: &BankSizing,
        rng: &mut R,
    ) -> &mut ResourceBank {
        self.banks.entry(key).or_insert_with(|| {
            let bank = ResourceBank::draw(sizing, rng);
            debug!(region = %key, capacity = bank.capacity(), "Bank created");
            bank
        })
    }

    /// Insert or replace the bank for `key`.
    pub fn insert(&mut self, key: RegionKey, bank: ResourceBank) {
        self.banks.insert(key, bank);
    }

    /// Look up a bank without creating it.
    pub fn get(&self, key: &RegionKey) -> Option<&ResourceBank> {
        self.banks.get(key)
    }

    /// Look up a bank mutably without creating it.
    pub fn get_mut(&mut self, key: &RegionKey) -> Option<&mut ResourceBank> {
        self.banks.get_mut(key)
    }

    /// Respawn the bank for `key` with a fresh capacity.
    ///
    /// Returns the new capacity, or `None` if the bank is unknown.
    pub fn respawn<R: Rng + ?Sized>(
        &mut self,
        key: &RegionKey,
        sizing: &BankSizing,
        rng: &mut R,
    ) -> Option<u32> {
        let bank = self.banks.get_mut(key)?;
        let capacity = sizing.draw_capacity(rng);
        bank.respawn(capacity);
        Some(capacity)
    }

    /// Forget banks that are full with no respawn pending.
    ///
    /// Such a bank is indistinguishable from one that was never created,
    /// apart from its drawn capacity. Returns how many were removed.
    pub fn prune_idle(&mut self) -> usize {
        let before = self.banks.len();
        self.banks
            .retain(|_, bank| !(bank.is_full() && bank.respawn_at.is_none()));
        before.saturating_sub(self.banks.len())
    }

    /// Number of live banks.
    pub fn len(&self) -> usize {
        self.banks.len()
    }

    /// Whether no bank has been created.
    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    /// Iterate over banks in region order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionKey, &ResourceBank)> {
        self.banks.iter()
    }
}
