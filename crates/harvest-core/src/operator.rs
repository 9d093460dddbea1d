//! Operator control state for a running simulation.
//!
//! [`OperatorState`] is shared between the simulation loop and whatever
//! drives it from outside (the Ctrl-C handler in the binary, tests). The
//! operator can request a clean stop without tearing the engine down
//! mid-callback; pacing and run limits are fixed from the world config.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::WorldConfig;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    stop_requested: AtomicBool,
    tick_interval_ms: u64,
    started_at: Instant,
    max_ticks: u64,
    max_real_time_seconds: u64,
}

impl OperatorState {
    /// Create operator state from the world configuration.
    pub fn new(world: &WorldConfig) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: world.tick_interval_ms,
            started_at: Instant::now(),
            max_ticks: world.max_ticks,
            max_real_time_seconds: world.max_real_time_seconds,
        }
    }

    /// Request a clean simulation stop after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Real-time milliseconds slept between ticks.
    pub const fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `ticks_run` has reached a non-zero `max_ticks`.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_ticks > 0 && ticks_run >= self.max_ticks
    }

    /// Whether a non-zero wall-clock limit has passed.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Whole seconds since the state was created.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// The configured tick limit.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// The configured wall-clock limit.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn bounds(max_ticks: u64, max_real_time_seconds: u64) -> WorldConfig {
        WorldConfig {
            tick_interval_ms: 1000,
            max_ticks,
            max_real_time_seconds,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn starts_running_with_configured_pacing() {
        let state = OperatorState::new(&bounds(0, 0));
        assert!(!state.is_stop_requested());
        assert_eq!(state.tick_interval_ms(), 1000);
    }

    #[tokio::test]
    async fn stop_is_seen_across_tasks() {
        let state = Arc::new(OperatorState::new(&bounds(0, 0)));
        let stopper = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.request_stop() })
        };
        assert!(stopper.await.is_ok());
        assert!(state.is_stop_requested());
    }

    #[test]
    fn tick_limit() {
        assert!(!OperatorState::new(&bounds(0, 0)).tick_limit_reached(999_999));
        let state = OperatorState::new(&bounds(100, 0));
        assert!(!state.tick_limit_reached(99));
        assert!(state.tick_limit_reached(100));
    }

    #[tokio::test(start_paused = true)]
    async fn time_limit_follows_clock() {
        let state = OperatorState::new(&bounds(0, 5));
        assert!(!state.time_limit_reached());
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(state.time_limit_reached());
        assert!(!OperatorState::new(&bounds(0, 0)).time_limit_reached());
    }
}
