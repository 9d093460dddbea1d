//! Single-threaded deferred callbacks on a min-heap of deadlines.
//!
//! The scheduler never runs anything itself. Its owner asks for the next due
//! event with [`Scheduler::pop_due`] and handles it; handlers may schedule
//! further events, which fire in the same pass if they fall inside the window
//! being processed.
//!
//! # Design Principles
//!
//! - Virtual time: the clock only moves when the owner advances it.
//! - Ties fire in scheduling order.
//! - Cancellation is immediate: a cancelled timer is never returned, even if
//!   its heap entry is still present.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use serde::{Deserialize, Serialize};

/// Errors raised by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A deadline or sequence number would overflow `u64`.
    #[error("scheduler overflow: deadline {now_ms} + {delay_ms} ms is unrepresentable")]
    Overflow {
        /// Clock reading when scheduling.
        now_ms: u64,
        /// Requested delay.
        delay_ms: u64,
    },
}

/// Handle to a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

/// A due event returned by [`Scheduler::pop_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueEvent<E> {
    /// The timer that fired.
    pub id: TimerId,
    /// When it was due.
    pub deadline_ms: u64,
    /// The payload.
    pub event: E,
}

/// Virtual-time event queue.
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_seq: u64,
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    pending: BTreeMap<u64, E>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    /// Create an empty scheduler at time zero.
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// The current virtual time.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of live (not cancelled, not fired) timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timer is live.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether `id` is still waiting to fire.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id.0)
    }

    /// Schedule `event` to fire `delay_ms` after the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Overflow`] if the deadline overflows.
    pub fn schedule_in(&mut self, delay_ms: u64, event: E) -> Result<TimerId, SchedulerError> {
        let deadline = self
            .now_ms
            .checked_add(delay_ms)
            .ok_or(SchedulerError::Overflow {
                now_ms: self.now_ms,
                delay_ms,
            })?;
        self.schedule_at(deadline, event)
    }

    /// Schedule `event` at an absolute deadline. Past deadlines fire on the
    /// next pass.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Overflow`] if the sequence counter is
    /// exhausted.
    pub fn schedule_at(&mut self, deadline_ms: u64, event: E) -> Result<TimerId, SchedulerError> {
        let seq = self.next_seq;
        self.next_seq = seq.checked_add(1).ok_or(SchedulerError::Overflow {
            now_ms: self.now_ms,
            delay_ms: deadline_ms.saturating_sub(self.now_ms),
        })?;
        self.heap.push(Reverse((deadline_ms, seq)));
        self.pending.insert(seq, event);
        Ok(TimerId(seq))
    }

    /// Cancel a timer. Returns its payload if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        self.pending.remove(&id.0)
    }

    /// Deadline of the earliest live timer.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Remove and return the earliest live event due at or before
    /// `until_ms`, moving the clock to its deadline.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueEvent<E>> {
        loop {
            let Reverse((deadline, seq)) = *self.heap.peek()?;
            if deadline > until_ms {
                return None;
            }
            self.heap.pop();
            if let Some(event) = self.pending.remove(&seq) {
                self.now_ms = self.now_ms.max(deadline);
                return Some(DueEvent {
                    id: TimerId(seq),
                    deadline_ms: deadline,
                    event,
                });
            }
        }
    }

    /// Move the clock forward to `to_ms`. The clock never moves backwards.
    pub fn advance_to(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, seq))) = self.heap.peek() {
            if self.pending.contains_key(seq) {
                break;
            }
            self.heap.pop();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, until: u64) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(due) = scheduler.pop_due(until) {
            fired.push(due.event);
        }
        scheduler.advance_to(until);
        fired
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut s = Scheduler::new();
        let _ = s.schedule_in(300, "c").unwrap();
        let _ = s.schedule_in(100, "a").unwrap();
        let _ = s.schedule_in(200, "b").unwrap();
        assert_eq!(drain(&mut s, 250), vec!["a", "b"]);
        assert_eq!(s.now_ms(), 250);
        assert_eq!(drain(&mut s, 1000), vec!["c"]);
        assert!(s.is_empty());
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        for name in ["first", "second", "third"] {
            let _ = s.schedule_in(50, name).unwrap();
        }
        assert_eq!(drain(&mut s, 50), vec!["first", "second", "third"]);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut s = Scheduler::new();
        let a = s.schedule_in(10, "a").unwrap();
        let _ = s.schedule_in(20, "b").unwrap();
        assert_eq!(s.cancel(a), Some("a"));
        assert_eq!(s.cancel(a), None);
        assert!(!s.is_pending(a));
        assert_eq!(s.next_deadline(), Some(20));
        assert_eq!(drain(&mut s, 100), vec!["b"]);
    }

    #[test]
    fn nested_scheduling_within_window() {
        let mut s: Scheduler<u32> = Scheduler::new();
        let _ = s.schedule_in(100, 1).unwrap();
        let mut fired = Vec::new();
        while let Some(due) = s.pop_due(1_000) {
            fired.push((due.event, due.deadline_ms));
            if due.event < 4 {
                let _ = s.schedule_in(300, due.event.saturating_add(1)).unwrap();
            }
        }
        assert_eq!(fired, vec![(1, 100), (2, 400), (3, 700), (4, 1_000)]);
    }

    #[test]
    fn deadline_overflow_is_an_error() {
        let mut s = Scheduler::new();
        s.advance_to(u64::MAX);
        assert!(matches!(
            s.schedule_in(1, "late"),
            Err(SchedulerError::Overflow { .. })
        ));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(500);
        s.advance_to(100);
        assert_eq!(s.now_ms(), 500);
    }
}
