//! The shared probability primitive and weighted selection.
//!
//! Every chance in the engine is shaped the same way: a linear ramp between
//! two skill values, clamped to `[0, 1]`. Resource skill checks ramp upward
//! (`lo < hi`); rare-outcome entries may ramp downward (`hi < lo`) so that
//! they get *less* likely as the actor improves.

use rand::Rng;

/// Clamp `x` into `[0, 1]`, mapping `NaN` to `0`.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Success chance for a skill `value` on the ramp from `lo` to `hi`.
///
/// `clamp01((value - lo) / (hi - lo))`. When `lo` and `hi` coincide the ramp
/// degenerates to a step: certain at or above `lo`, impossible below it.
pub fn skill_chance(value: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        return if value >= lo { 1.0 } else { 0.0 };
    }
    clamp01((value - lo) / span)
}

/// Roll once against `chance`.
///
/// A chance of `1` (or more) always succeeds and a chance of `0` (or less)
/// never does, regardless of the generator.
pub fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    let chance = clamp01(chance);
    if chance >= 1.0 {
        return true;
    }
    rng.random::<f64>() < chance
}

/// Pick one item with probability proportional to `weight(item)`.
///
/// Items with a non-finite or non-positive weight are never picked. Returns
/// `None` when no item has positive weight.
pub fn pick_weighted<'a, T, R, F>(items: &'a [T], weight: F, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
    F: Fn(&T) -> f64,
{
    let usable = |w: f64| w.is_finite() && w > 0.0;
    let total: f64 = items.iter().map(&weight).filter(|w| usable(*w)).sum();
    if !usable(total) {
        return None;
    }

    let mut draw = rng.random::<f64>() * total;
    let mut last = None;
    for item in items {
        let w = weight(item);
        if !usable(w) {
            continue;
        }
        if draw < w {
            return Some(item);
        }
        draw -= w;
        last = Some(item);
    }
    // Rounding can leave a sliver past the final bucket.
    last
}
