//! Scheduler counters.
//!
//! Every event is counted locally for inspection and also reported through
//! the `metrics` facade, which is a no-op until a recorder is installed.

use std::time::Duration;

use metrics::{counter, histogram};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerMetrics {
    /// Requests sent for computation.
    pub dispatched: u64,
    /// Ticks skipped because the signature was unchanged.
    pub skipped_unchanged: u64,
    /// Results drawn.
    pub applied: u64,
    /// Results discarded because a newer request was outstanding.
    pub discarded_stale: u64,
    /// Results discarded because their id was already drawn.
    pub discarded_duplicate: u64,
    /// Computations run on the control path.
    pub inline_renders: u64,
    /// Observation snapshots installed.
    pub snapshots: u64,
}

impl SchedulerMetrics {
    pub(crate) fn record_dispatch(&mut self, inline: bool) {
        self.dispatched += 1;
        counter!("field_renders_dispatched_total").increment(1);
        if inline {
            self.inline_renders += 1;
            counter!("field_renders_inline_total").increment(1);
        }
    }

    pub(crate) fn record_skip(&mut self) {
        self.skipped_unchanged += 1;
        counter!("field_renders_skipped_total").increment(1);
    }

    pub(crate) fn record_applied(&mut self, compose: Duration) {
        self.applied += 1;
        counter!("field_renders_applied_total").increment(1);
        histogram!("field_frame_compose_ms").record(compose.as_secs_f64() * 1000.0);
    }

    pub(crate) fn record_stale(&mut self) {
        self.discarded_stale += 1;
        counter!("field_results_discarded_total", "reason" => "stale").increment(1);
    }

    pub(crate) fn record_duplicate(&mut self) {
        self.discarded_duplicate += 1;
        counter!("field_results_discarded_total", "reason" => "duplicate").increment(1);
    }

    pub(crate) fn record_snapshot(&mut self) {
        self.snapshots += 1;
        counter!("field_snapshots_total").increment(1);
    }
}
