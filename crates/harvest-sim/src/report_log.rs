//! Tick callback that writes finished attempts to the log.
//!
//! Every finished attempt is logged at `debug`; catches worth noticing
//! (serpents, salvage, big fish) at `info`. Every `summary_every` ticks a
//! running summary goes out at `info`.

use harvest_core::engine::AttemptReport;
use harvest_core::runner::{TickCallback, TickSummary};
use harvest_fishing::items::{BIG_FISH, is_chest};
use harvest_types::{Delivery, HarvestOutcome};
use tracing::{debug, info};

/// Callback that turns tick summaries into log lines.
#[derive(Debug)]
pub struct ReportLog {
    summary_every: u64,
    finished: u64,
    caught: u64,
    serpents: u64,
}

impl ReportLog {
    /// Log a running summary every `summary_every` ticks (0 disables it).
    pub const fn new(summary_every: u64) -> Self {
        Self {
            summary_every,
            finished: 0,
            caught: 0,
            serpents: 0,
        }
    }

    /// Attempts seen so far.
    pub const fn finished(&self) -> u64 {
        self.finished
    }

    /// Attempts that ended with something in hand.
    pub const fn caught(&self) -> u64 {
        self.caught
    }

    /// Catches taken by a serpent.
    pub const fn serpents(&self) -> u64 {
        self.serpents
    }

    fn record(&mut self, report: &AttemptReport) {
        self.finished = self.finished.saturating_add(1);
        let kind = report.kind.as_ref().map(ToString::to_string);
        debug!(
            attempt = %report.attempt,
            actor = %report.actor,
            outcome = %report.outcome,
            kind = kind.as_deref(),
            elapsed_ms = report.finished_ms.saturating_sub(report.started_ms),
            "Attempt finished"
        );

        match report.delivery {
            Some(Delivery::Redirected) => {
                self.serpents = self.serpents.saturating_add(1);
                info!(actor = %report.actor, kind = kind.as_deref(), "A serpent took the catch");
            }
            Some(Delivery::Pack | Delivery::Feet) if report.outcome == HarvestOutcome::Succeeded => {
                self.caught = self.caught.saturating_add(1);
                if report.kind.as_ref().is_some_and(|k| *k == BIG_FISH || is_chest(k)) {
                    info!(actor = %report.actor, kind = kind.as_deref(), "Notable catch");
                }
            }
            _ => {}
        }
    }
}

impl TickCallback for ReportLog {
    fn on_tick(&mut self, summary: &TickSummary) {
        for report in &summary.finished {
            self.record(report);
        }
        if summary.tick.checked_rem(self.summary_every) == Some(0) {
            info!(
                tick = summary.tick,
                now_ms = summary.now_ms,
                active = summary.active_attempts,
                finished = self.finished,
                caught = self.caught,
                serpents = self.serpents,
                "Fishing summary"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use harvest_fishing::items::{FISH, TREASURE_MAP};
    use harvest_types::{ActorId, AttemptId, ItemKind};

    use super::*;

    fn report(outcome: HarvestOutcome, kind: Option<ItemKind>, delivery: Option<Delivery>) -> AttemptReport {
        AttemptReport {
            attempt: AttemptId::new(),
            actor: ActorId::new(),
            discipline: "fishing".to_owned(),
            outcome,
            kind,
            delivery,
            started_ms: 0,
            finished_ms: 8_000,
        }
    }

    fn summary(tick: u64, finished: Vec<AttemptReport>) -> TickSummary {
        TickSummary {
            tick,
            now_ms: tick.saturating_mul(500),
            started: 0,
            rejected: 0,
            active_attempts: 0,
            finished,
        }
    }

    #[test]
    fn counts_catches_and_serpents() {
        let mut log = ReportLog::new(10);
        log.on_tick(&summary(
            1,
            vec![
                report(HarvestOutcome::Succeeded, Some(FISH), Some(Delivery::Pack)),
                report(HarvestOutcome::Succeeded, Some(BIG_FISH), Some(Delivery::Feet)),
                report(HarvestOutcome::Succeeded, Some(TREASURE_MAP), Some(Delivery::Redirected)),
                report(HarvestOutcome::PackFull, Some(FISH), Some(Delivery::PackFull)),
                report(HarvestOutcome::Failed, None, None),
            ],
        ));
        assert_eq!(log.finished(), 5);
        assert_eq!(log.caught(), 2);
        assert_eq!(log.serpents(), 1);
    }

    #[test]
    fn summaries_can_be_disabled() {
        let mut log = ReportLog::new(0);
        log.on_tick(&summary(10, Vec::new()));
        assert_eq!(log.finished(), 0);
    }
}
