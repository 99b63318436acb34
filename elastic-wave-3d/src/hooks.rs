//! Around-stage hooks for instrumentation.
//!
//! A hook sees every stage call of the schedule but never touches the
//! wavefield, so attaching one cannot change the numerical result.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::schedule::StageSpec;

pub trait StageHook {
    fn before(&mut self, _step: usize, _stage: &StageSpec) {}
    fn after(&mut self, _step: usize, _stage: &StageSpec) {}
}

/// One timed stage invocation.
#[derive(Clone, Debug)]
pub struct KernelRecord {
    pub label: &'static str,
    pub step: usize,
    /// Offset of the stage start from the timer's creation.
    pub start: Duration,
    pub duration: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KernelTotal {
    pub label: &'static str,
    pub calls: usize,
    pub total: Duration,
}

impl KernelTotal {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// Wall-clock timer for individual stages.
pub struct KernelTimer {
    origin: Instant,
    pending: Option<(&'static str, Instant)>,
    records: Vec<KernelRecord>,
}

impl KernelTimer {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            pending: None,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[KernelRecord] {
        &self.records
    }

    /// Per-label totals, in order of first appearance.
    pub fn totals(&self) -> Vec<KernelTotal> {
        let mut order: Vec<&'static str> = Vec::new();
        let mut sums: HashMap<&'static str, (usize, Duration)> = HashMap::new();
        for record in &self.records {
            let entry = sums.entry(record.label).or_insert_with(|| {
                order.push(record.label);
                (0, Duration::ZERO)
            });
            entry.0 += 1;
            entry.1 += record.duration;
        }
        order
            .into_iter()
            .map(|label| {
                let (calls, total) = sums[label];
                KernelTotal { label, calls, total }
            })
            .collect()
    }

    /// Logs the per-label totals at debug level.
    pub fn log_summary(&self) {
        for t in self.totals() {
            tracing::debug!(
                kernel = t.label,
                calls = t.calls,
                total_ms = t.total.as_secs_f64() * 1e3,
                mean_us = t.mean().as_secs_f64() * 1e6,
                "kernel timing"
            );
        }
    }
}

impl Default for KernelTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageHook for KernelTimer {
    fn before(&mut self, _step: usize, stage: &StageSpec) {
        self.pending = Some((stage.label, Instant::now()));
    }

    fn after(&mut self, step: usize, stage: &StageSpec) {
        let Some((label, started)) = self.pending.take() else {
            return;
        };
        if label != stage.label {
            return;
        }
        self.records.push(KernelRecord {
            label,
            step,
            start: started.duration_since(self.origin),
            duration: started.elapsed(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::SCHEDULE;

    #[test]
    fn timer_pairs_before_and_after() {
        let mut timer = KernelTimer::new();
        for step in 0..2 {
            for stage in SCHEDULE.iter() {
                timer.before(step, stage);
                timer.after(step, stage);
            }
        }
        assert_eq!(timer.records().len(), 2 * SCHEDULE.len());
        assert_eq!(timer.records()[0].label, "dxf");
        assert_eq!(timer.records()[25].step, 1);

        let totals = timer.totals();
        assert_eq!(totals.len(), SCHEDULE.len());
        assert!(totals.iter().all(|t| t.calls == 2));
        assert_eq!(totals.last().map(|t| t.label), Some("csxz"));
    }

    #[test]
    fn unmatched_after_is_ignored() {
        let mut timer = KernelTimer::new();
        timer.after(0, &SCHEDULE[0]);
        timer.before(0, &SCHEDULE[0]);
        timer.after(0, &SCHEDULE[1]);
        assert!(timer.records().is_empty());
    }

    #[test]
    fn mean_of_empty_total_is_zero() {
        let t = KernelTotal {
            label: "dxf",
            calls: 0,
            total: Duration::from_millis(3),
        };
        assert_eq!(t.mean(), Duration::ZERO);
    }
}
